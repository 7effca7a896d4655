pub mod constants;
pub use constants::*;

pub mod tracing_telemetry;

/// Macros describing the running package.
pub mod macros {
    /// Returns the package description.
    #[macro_export]
    macro_rules! package_description {
        () => {
            env!("CARGO_PKG_DESCRIPTION")
        };
    }

    /// Formats package related information.
    /// This includes the package name and version.
    #[macro_export]
    macro_rules! fmt_package_info {
        () => {
            format!(
                "{} {} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                $crate::package_description!()
            )
        };
    }

    /// Prints package related information to stderr, leaving stdout to the command's output.
    /// This includes the package name and version.
    #[macro_export]
    macro_rules! print_package_info {
        () => {
            eprintln!("{}", $crate::fmt_package_info!());
        };
    }
}
