/// Resolution of snapshots within a replica's chain.
pub mod chain;
/// Configuration of the backup service.
pub mod config;
/// Backup creation.
pub mod create;
/// Backup removal.
pub mod remove;
/// Restore of the replica set from a backup.
pub mod restore;
/// Replica selection and preconditions.
pub mod selector;
/// The exposed backup, restore and snapshot operations.
pub mod service;
/// Status of the long running operations.
pub mod status;

#[cfg(test)]
pub(crate) mod tests_util;

pub use config::BackupConfig;
pub use service::BackupService;
pub use status::{OperationHandle, StatusRegistry};
