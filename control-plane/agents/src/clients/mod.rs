/// Local command executor backed by the volume's command line tool.
pub mod cli;
/// REST clients for the volume controller and its replicas.
pub mod rest;

use crate::errors::SvcError;
use async_trait::async_trait;
use std::sync::Arc;
use stor_port::types::v0::transport::{
    BackupLocation, CreateSnapshot, Replica, ReplicaAddress, ReplicaCreateBackup, ReplicaInfo,
    SnapshotName, Volume,
};

/// The volume's controller, which knows the volume and its replica set.
#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// Get the volume managed by the controller.
    async fn get_volume(&self) -> Result<Volume, SvcError>;
    /// List the replicas of the volume, in the controller's order.
    async fn list_replicas(&self) -> Result<Vec<Replica>, SvcError>;
    /// Take a new snapshot of the volume, returning its name.
    async fn create_snapshot(&self, request: &CreateSnapshot) -> Result<SnapshotName, SvcError>;
}

/// A single replica of the volume.
#[async_trait]
pub trait ReplicaApi: Send + Sync {
    /// Get the replica's own view of its snapshot chain.
    async fn replica_info(&self) -> Result<ReplicaInfo, SvcError>;
    /// Back up a snapshot of the replica onto a backup target.
    /// Resolves once the backup is complete, with its location.
    async fn create_backup(
        &self,
        request: &ReplicaCreateBackup,
    ) -> Result<BackupLocation, SvcError>;
    /// Remove a backup from its backup target.
    async fn remove_backup(&self, location: &BackupLocation) -> Result<(), SvcError>;
    /// Restore the replica's data from a backup.
    async fn restore_backup(&self, location: &BackupLocation) -> Result<(), SvcError>;
}

/// Builds clients for replicas given their address.
pub trait ReplicaClientFactory: Send + Sync {
    /// Get a client for the replica at the given address.
    fn client(&self, address: &ReplicaAddress) -> Result<Arc<dyn ReplicaApi>, SvcError>;
}

/// Commands which run on the local host against the volume.
#[async_trait]
pub trait LocalExecutor: Send + Sync {
    /// List the volume's snapshot names.
    async fn list_snapshots(&self) -> Result<Vec<SnapshotName>, SvcError>;
    /// Remove a volume snapshot.
    async fn remove_snapshot(&self, name: &SnapshotName) -> Result<(), SvcError>;
    /// Remove a backup from its backup target.
    async fn remove_backup(&self, location: &BackupLocation) -> Result<(), SvcError>;
}
