use crate::{
    backup::selector::ensure_not_rebuilding,
    clients::{ControllerApi, ReplicaClientFactory},
    errors::SvcError,
};
use futures::future::try_join_all;
use std::{fmt::Display, sync::Arc};
use stor_port::types::v0::transport::{BackupLocation, Replica, ReplicaAddress, ReplicaMode};

/// What happened to a replica during a restore.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RestoreOutcome {
    /// The replica was restored from the backup.
    Restored,
    /// Restoring the replica failed.
    Failed(String),
    /// The replica was not attempted because an earlier replica failed.
    Skipped,
}

/// The outcome of a restore for one replica.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReplicaRestore {
    /// Address of the replica.
    pub address: ReplicaAddress,
    /// What happened to it.
    pub outcome: RestoreOutcome,
}

/// Record of a restore across the replica set, in the controller's replica order.
/// Replicas which were restored before a failure stay restored.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RestoreLedger {
    backup: BackupLocation,
    replicas: Vec<ReplicaRestore>,
}

impl RestoreLedger {
    /// A new ledger for a restore from `backup`.
    pub fn new(backup: BackupLocation) -> Self {
        Self {
            backup,
            replicas: Vec::new(),
        }
    }
    /// The per replica outcomes.
    pub fn replicas(&self) -> &[ReplicaRestore] {
        &self.replicas
    }
    /// Addresses of the replicas which were restored.
    pub fn restored(&self) -> Vec<&ReplicaAddress> {
        self.replicas
            .iter()
            .filter(|replica| replica.outcome == RestoreOutcome::Restored)
            .map(|replica| &replica.address)
            .collect()
    }
    fn record(&mut self, replica: &Replica, outcome: RestoreOutcome) {
        self.replicas.push(ReplicaRestore {
            address: replica.address.clone(),
            outcome,
        });
    }
}

impl Display for RestoreLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let restored = self
            .restored()
            .into_iter()
            .map(ReplicaAddress::as_str)
            .collect::<Vec<_>>();
        write!(f, "Restored {} to [{}]", self.backup, restored.join(", "))?;
        for replica in &self.replicas {
            match &replica.outcome {
                RestoreOutcome::Restored => {}
                RestoreOutcome::Failed(error) => {
                    write!(f, "; {} failed: {error}", replica.address)?
                }
                RestoreOutcome::Skipped => write!(f, "; {} skipped", replica.address)?,
            }
        }
        Ok(())
    }
}

/// Restores every replica of the volume from a backup.
#[derive(Clone)]
pub struct RestoreOrchestrator {
    controller: Arc<dyn ControllerApi>,
    replicas: Arc<dyn ReplicaClientFactory>,
}

impl RestoreOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        controller: Arc<dyn ControllerApi>,
        replicas: Arc<dyn ReplicaClientFactory>,
    ) -> Self {
        Self {
            controller,
            replicas,
        }
    }

    /// Restore every replica from the backup at `location`, one after the other in the
    /// controller's order, stopping at the first failure.
    #[tracing::instrument(level = "info", skip(self), err, fields(backup.location = %location))]
    pub async fn restore_backup(
        &self,
        location: &BackupLocation,
    ) -> Result<RestoreLedger, SvcError> {
        let mut ledger = RestoreLedger::new(location.clone());
        match self.restore_backup_with_ledger(location, &mut ledger).await {
            Ok(()) => Ok(ledger),
            Err(error) => {
                tracing::error!(restore.ledger = %ledger, "Restore did not complete");
                Err(error)
            }
        }
    }

    /// Same as `restore_backup` but records the per replica outcomes in `ledger`, which
    /// remains available when the restore fails.
    pub async fn restore_backup_with_ledger(
        &self,
        location: &BackupLocation,
        ledger: &mut RestoreLedger,
    ) -> Result<(), SvcError> {
        let replicas = self.replica_set().await?;
        ensure_not_rebuilding(&replicas)?;

        for (index, replica) in replicas.iter().enumerate() {
            match self.restore_replica(replica, location).await {
                Ok(()) => ledger.record(replica, RestoreOutcome::Restored),
                Err(error) => {
                    ledger.record(replica, RestoreOutcome::Failed(error.to_string()));
                    for skipped in &replicas[index + 1 ..] {
                        ledger.record(skipped, RestoreOutcome::Skipped);
                    }
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// The replicas of the volume, marking those which report themselves as rebuilding.
    async fn replica_set(&self) -> Result<Vec<Replica>, SvcError> {
        let replicas = self.controller.list_replicas().await?;
        try_join_all(
            replicas
                .into_iter()
                .map(|replica| self.refresh_rebuilding(replica)),
        )
        .await
    }

    async fn refresh_rebuilding(&self, replica: Replica) -> Result<Replica, SvcError> {
        if replica.rebuilding {
            return Ok(replica);
        }
        let client = self.replicas.client(&replica.address)?;
        let rebuilding = client.replica_info().await?.rebuilding;
        Ok(replica.with_rebuilding(rebuilding))
    }

    async fn restore_replica(
        &self,
        replica: &Replica,
        location: &BackupLocation,
    ) -> Result<(), SvcError> {
        if replica.mode != ReplicaMode::ReadWrite {
            return Err(SvcError::InvalidReplicaState {
                replica: replica.address.clone(),
                mode: replica.mode,
                action: "restore backup".to_string(),
            });
        }
        let client = self.replicas.client(&replica.address)?;
        tracing::info!(replica.address = %replica.address, "Restoring replica from backup");
        client
            .restore_backup(location)
            .await
            .map_err(|error| SvcError::ReplicaRestore {
                replica: replica.address.clone(),
                source: Box::new(error),
            })
    }
}
