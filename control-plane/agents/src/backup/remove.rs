use crate::{
    backup::selector::ReplicaSelector,
    clients::{ControllerApi, LocalExecutor, ReplicaClientFactory},
    errors::SvcError,
};
use std::sync::Arc;
use stor_port::types::v0::transport::{BackupLocation, RemoveBackupOutcome};

/// Where backups are removed from.
#[derive(Clone)]
pub enum RemovalPath {
    /// Through the local command executor.
    Local(Arc<dyn LocalExecutor>),
    /// Through the writable replica of the volume.
    Replica {
        /// The volume's controller.
        controller: Arc<dyn ControllerApi>,
        /// Replica clients.
        replicas: Arc<dyn ReplicaClientFactory>,
        /// Replica selection policy.
        selector: ReplicaSelector,
    },
}

/// Removes backups from backup targets which the local host can check.
#[derive(Clone)]
pub struct BackupRemoval {
    scheme: String,
    path: RemovalPath,
}

impl BackupRemoval {
    /// Create a new removal for backups whose location carries `scheme`.
    pub fn new(scheme: impl Into<String>, path: RemovalPath) -> Self {
        Self {
            scheme: scheme.into(),
            path,
        }
    }

    /// Remove the backup at `location`.
    /// A backup which doesn't exist is not an error, so removal can be retried safely.
    #[tracing::instrument(level = "info", skip(self), err, fields(backup.location = %location))]
    pub async fn remove_backup(
        &self,
        location: &BackupLocation,
    ) -> Result<RemoveBackupOutcome, SvcError> {
        if !self.backup_exists(location).await {
            tracing::info!("Backup does not exist, nothing to remove");
            return Ok(RemoveBackupOutcome::NotFound);
        }

        match &self.path {
            RemovalPath::Local(executor) => executor.remove_backup(location).await?,
            RemovalPath::Replica {
                controller,
                replicas,
                selector,
            } => {
                let replica_set = controller.list_replicas().await?;
                let replica = selector.writable(&replica_set)?;
                tracing::debug!(replica.address = %replica.address, "Removing backup via replica");
                replicas
                    .client(&replica.address)?
                    .remove_backup(location)
                    .await?
            }
        }
        tracing::info!("Backup removed");
        Ok(RemoveBackupOutcome::Removed)
    }

    /// Check whether the backup exists.
    /// Only locations with our scheme can be checked, so any other is deemed not to exist.
    async fn backup_exists(&self, location: &BackupLocation) -> bool {
        let Some(path) = location.strip_scheme(&self.scheme) else {
            return false;
        };
        match tokio::fs::metadata(path).await {
            Ok(_) => true,
            Err(error) => error.kind() != std::io::ErrorKind::NotFound,
        }
    }
}
