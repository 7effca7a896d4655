#![warn(missing_docs)]
//! Backup control-plane library for a replicated block volume.
//!
//! It orchestrates backups of volume snapshots onto backup targets, restores of every
//! replica from a backup and removal of backups, keeping the status of the long running
//! operations so they can be polled by id.

mod common;

/// Agent level errors.
pub use common::errors;

/// Backup, restore and snapshot operations.
pub mod backup;
/// Clients for the volume controller, the replicas and the local command executor.
pub mod clients;
