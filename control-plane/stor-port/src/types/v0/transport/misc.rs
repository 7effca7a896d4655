use serde::{Deserialize, Serialize};

#[macro_export]
macro_rules! rpc_impl_string_id_inner {
    ($Name:ident, $Doc:literal) => {
        #[doc = $Doc]
        #[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $Name(String);

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $Name {
            /// Build Self from a string trait id.
            pub fn from<T: Into<String>>(id: T) -> Self {
                $Name(id.into())
            }
            /// Get the identifier as a string slice.
            pub fn as_str<'a>(&'a self) -> &'a str {
                self.0.as_str()
            }
            /// Check whether the identifier is empty or only whitespace.
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<&str> for $Name {
            fn from(id: &str) -> Self {
                $Name::from(id)
            }
        }
        impl From<String> for $Name {
            fn from(id: String) -> Self {
                $Name(id)
            }
        }

        impl From<&$Name> for $Name {
            fn from(id: &$Name) -> $Name {
                id.clone()
            }
        }

        impl From<$Name> for String {
            fn from(id: $Name) -> String {
                id.0
            }
        }
        impl From<&$Name> for String {
            fn from(id: &$Name) -> String {
                id.to_string()
            }
        }

        impl std::str::FromStr for $Name {
            type Err = std::convert::Infallible;

            fn from_str(source: &str) -> Result<Self, Self::Err> {
                Ok($Name::from(source))
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }
    };
}

#[macro_export]
macro_rules! rpc_impl_string_id {
    ($Name:ident, $Doc:literal) => {
        rpc_impl_string_id_inner!($Name, $Doc);
        impl Default for $Name {
            /// Generates new blank identifier.
            fn default() -> Self {
                $Name(uuid::Uuid::default().to_string())
            }
        }
        impl $Name {
            /// Generates new random identifier.
            pub fn new() -> Self {
                $Name(uuid::Uuid::new_v4().to_string())
            }
        }
    };
}

rpc_impl_string_id!(OperationId, "ID of a backup or restore operation, as given by the caller");
