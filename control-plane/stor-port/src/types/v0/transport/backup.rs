use super::*;

use serde::{Deserialize, Serialize};

rpc_impl_string_id_inner!(
    BackupLocation,
    "URL of a backup on a backup target, eg: vfs:///var/lib/backups/backup-1"
);

impl BackupLocation {
    /// The path after the `<scheme>://` prefix, if the location carries the given scheme.
    pub fn strip_scheme(&self, scheme: &str) -> Option<&str> {
        self.0.strip_prefix(scheme)?.strip_prefix("://")
    }
}

/// Create a backup of a volume snapshot onto a backup target.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBackup {
    /// Name of the snapshot to back up.
    pub snapshot: SnapshotName,
    /// The backup target, eg: vfs:///var/lib/backups.
    pub backup_target: String,
    /// Caller supplied id of the operation.
    pub uuid: OperationId,
}

impl CreateBackup {
    /// Create new request.
    pub fn new(
        snapshot: impl Into<SnapshotName>,
        backup_target: impl Into<String>,
        uuid: impl Into<OperationId>,
    ) -> Self {
        Self {
            snapshot: snapshot.into(),
            backup_target: backup_target.into(),
            uuid: uuid.into(),
        }
    }
}

/// Restore the volume's replicas from a backup.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreBackup {
    /// The volume to restore.
    pub volume: VolumeId,
    /// Location of the backup.
    pub location: BackupLocation,
    /// Caller supplied id of the operation.
    pub uuid: OperationId,
}

impl RestoreBackup {
    /// Create new request.
    pub fn new(
        volume: impl Into<VolumeId>,
        location: impl Into<BackupLocation>,
        uuid: impl Into<OperationId>,
    ) -> Self {
        Self {
            volume: volume.into(),
            location: location.into(),
            uuid: uuid.into(),
        }
    }
}

/// Remove a backup from its backup target.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct RemoveBackup {
    /// Location of the backup.
    pub location: BackupLocation,
}

impl RemoveBackup {
    /// Create new request.
    pub fn new(location: impl Into<BackupLocation>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

/// Outcome of a successful backup removal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, strum_macros::Display)]
pub enum RemoveBackupOutcome {
    /// The backup existed and was removed.
    Removed,
    /// There was no such backup, so nothing was done.
    NotFound,
}

/// The request sent to a replica to back up one of its snapshots.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct ReplicaCreateBackup {
    /// Name of the snapshot as found in the replica's chain.
    pub snapshot: SnapshotName,
    /// The backup target.
    #[serde(rename = "dest")]
    pub destination: String,
    /// Name of the volume the snapshot belongs to.
    pub volume: String,
}

impl ReplicaCreateBackup {
    /// Create new request.
    pub fn new(
        snapshot: SnapshotName,
        destination: impl Into<String>,
        volume: impl Into<String>,
    ) -> Self {
        Self {
            snapshot,
            destination: destination.into(),
            volume: volume.into(),
        }
    }
}
