#![allow(clippy::derive_partial_eq_without_eq)]

/// All the "transport" types which allow the backup components to interact with each other
/// and with the controller and replicas of the volume.
pub mod transport;
