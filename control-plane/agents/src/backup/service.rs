use crate::{
    backup::{
        config::BackupConfig,
        create::BackupOrchestrator,
        remove::{BackupRemoval, RemovalPath},
        restore::RestoreOrchestrator,
        selector::ReplicaSelector,
        status::{OperationHandle, StatusRegistry},
    },
    clients::{ControllerApi, LocalExecutor, ReplicaClientFactory},
    errors::SvcError,
};
use std::sync::Arc;
use stor_port::{
    types::v0::transport::{
        CreateBackup, CreateSnapshot, DeleteSnapshot, OperationId, OperationStatus,
        RemoveBackup, RemoveBackupOutcome, RestoreBackup, Snapshot, SnapshotName, StatusKind,
    },
    IntoVec,
};

/// The operations exposed by the backup agent.
#[derive(Clone)]
pub struct BackupService {
    config: BackupConfig,
    controller: Arc<dyn ControllerApi>,
    executor: Arc<dyn LocalExecutor>,
    statuses: StatusRegistry,
    backups: BackupOrchestrator,
    restores: RestoreOrchestrator,
    removal: BackupRemoval,
}

fn missing_argument(name: &str) -> SvcError {
    SvcError::MissingArgument {
        name: name.to_string(),
    }
}

impl BackupService {
    /// Create a new service.
    pub fn new(
        config: BackupConfig,
        controller: Arc<dyn ControllerApi>,
        replicas: Arc<dyn ReplicaClientFactory>,
        executor: Arc<dyn LocalExecutor>,
    ) -> Self {
        let statuses = StatusRegistry::new();
        let selector = ReplicaSelector::new(config.strict_writable());
        let path = if config.remove_via_replica() {
            RemovalPath::Replica {
                controller: controller.clone(),
                replicas: replicas.clone(),
                selector,
            }
        } else {
            RemovalPath::Local(executor.clone())
        };
        Self {
            backups: BackupOrchestrator::new(
                controller.clone(),
                replicas.clone(),
                statuses.clone(),
                selector,
            ),
            restores: RestoreOrchestrator::new(controller.clone(), replicas),
            removal: BackupRemoval::new(config.backup_scheme(), path),
            config,
            controller,
            executor,
            statuses,
        }
    }

    /// Get the service's configuration.
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Get the registry of the operation statuses.
    pub fn statuses(&self) -> &StatusRegistry {
        &self.statuses
    }

    /// Start backing up a snapshot onto a backup target.
    #[tracing::instrument(level = "info", skip(self), err, fields(operation.id = %request.uuid))]
    pub async fn create_backup(&self, request: &CreateBackup) -> Result<OperationHandle, SvcError> {
        if request.backup_target.trim().is_empty() {
            return Err(missing_argument("backupTarget"));
        }
        if request.uuid.is_empty() {
            return Err(missing_argument("uuid"));
        }
        if request.snapshot.is_empty() {
            return Err(missing_argument("snapshot"));
        }
        self.get_snapshot(&request.snapshot).await?;

        self.backups
            .create_backup(&request.uuid, &request.snapshot, &request.backup_target)
            .await
    }

    /// Start restoring every replica of the volume from a backup.
    #[tracing::instrument(level = "info", skip(self), err, fields(operation.id = %request.uuid))]
    pub async fn restore_from_backup(
        &self,
        request: &RestoreBackup,
    ) -> Result<OperationHandle, SvcError> {
        if &request.volume != self.config.volume() {
            return Err(SvcError::VolumeNotFound {
                volume: request.volume.clone(),
            });
        }
        if request.location.is_empty() {
            return Err(missing_argument("location"));
        }
        if request.uuid.is_empty() {
            return Err(missing_argument("uuid"));
        }

        let restores = self.restores.clone();
        let location = request.location.clone();
        let launched = tokio::spawn(async move { restores.restore_backup(&location).await });

        let status = self.statuses.begin(&request.uuid, StatusKind::Restore);
        let completion = self
            .statuses
            .track(request.uuid.clone(), StatusKind::Restore, launched);
        Ok(OperationHandle::new(status, completion))
    }

    /// Remove a backup from its backup target.
    #[tracing::instrument(level = "info", skip(self), err)]
    pub async fn remove_backup(
        &self,
        request: &RemoveBackup,
    ) -> Result<RemoveBackupOutcome, SvcError> {
        if request.location.is_empty() {
            return Err(missing_argument("location"));
        }
        self.removal.remove_backup(&request.location).await
    }

    /// Get the status of a backup operation.
    pub fn backup_status(&self, id: &OperationId) -> Result<OperationStatus, SvcError> {
        self.statuses.get(id, StatusKind::Backup)
    }

    /// Get the status of a restore operation.
    pub fn restore_status(&self, id: &OperationId) -> Result<OperationStatus, SvcError> {
        self.statuses.get(id, StatusKind::Restore)
    }

    /// List the volume's snapshots.
    pub async fn list_snapshots(&self) -> Result<Vec<Snapshot>, SvcError> {
        Ok(self.executor.list_snapshots().await?.into_vec())
    }

    /// Get a volume snapshot.
    pub async fn get_snapshot(&self, id: &SnapshotName) -> Result<Snapshot, SvcError> {
        let snapshots = self.executor.list_snapshots().await?;
        match snapshots.into_iter().find(|snapshot| snapshot == id) {
            Some(snapshot) => Ok(snapshot.into()),
            None => Err(SvcError::SnapshotNotFound {
                snapshot: id.to_string(),
            }),
        }
    }

    /// Take a new snapshot of the volume.
    #[tracing::instrument(level = "info", skip(self), err)]
    pub async fn create_snapshot(&self, request: &CreateSnapshot) -> Result<Snapshot, SvcError> {
        let name = self.controller.create_snapshot(request).await?;
        tracing::info!(snapshot.name = %name, "Snapshot created");
        Ok(name.into())
    }

    /// Delete a volume snapshot.
    #[tracing::instrument(level = "info", skip(self), err)]
    pub async fn delete_snapshot(&self, request: &DeleteSnapshot) -> Result<(), SvcError> {
        let snapshot = self.get_snapshot(&request.id).await?;
        self.executor.remove_snapshot(&snapshot.name).await
    }
}
