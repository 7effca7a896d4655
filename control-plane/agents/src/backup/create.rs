use crate::{
    backup::{
        chain::resolve_historical,
        selector::ReplicaSelector,
        status::{OperationHandle, StatusRegistry},
    },
    clients::{ControllerApi, ReplicaClientFactory},
    errors::SvcError,
};
use std::sync::Arc;
use stor_port::types::v0::transport::{OperationId, ReplicaCreateBackup, SnapshotName, StatusKind};

/// Backs up volume snapshots from the writable replica onto backup targets.
#[derive(Clone)]
pub struct BackupOrchestrator {
    controller: Arc<dyn ControllerApi>,
    replicas: Arc<dyn ReplicaClientFactory>,
    statuses: StatusRegistry,
    selector: ReplicaSelector,
}

impl BackupOrchestrator {
    /// Create a new orchestrator recording its operations in `statuses`.
    pub fn new(
        controller: Arc<dyn ControllerApi>,
        replicas: Arc<dyn ReplicaClientFactory>,
        statuses: StatusRegistry,
        selector: ReplicaSelector,
    ) -> Self {
        Self {
            controller,
            replicas,
            statuses,
            selector,
        }
    }

    /// Start backing up `snapshot` onto `destination`.
    /// Fails straight away if no backup could be started; otherwise the backup carries on in
    /// the background and its outcome is recorded in the backup status of `id`.
    #[tracing::instrument(level = "info", skip(self), err, fields(operation.id = %id))]
    pub async fn create_backup(
        &self,
        id: &OperationId,
        snapshot: &SnapshotName,
        destination: &str,
    ) -> Result<OperationHandle, SvcError> {
        let volume = self.controller.get_volume().await?;
        let replicas = self.controller.list_replicas().await?;
        let replica = self.selector.writable(&replicas)?;

        let client = self.replicas.client(&replica.address)?;
        let info = client.replica_info().await?;
        let entry = resolve_historical(&info.chain, snapshot.as_str(), &replica.address)?;

        tracing::info!(
            replica.address = %replica.address,
            snapshot.disk = %entry.name,
            snapshot.position = entry.position,
            "Backing up snapshot from replica"
        );
        let request = ReplicaCreateBackup::new(entry.name, destination, volume.name);
        let launched = tokio::spawn(async move { client.create_backup(&request).await });

        let status = self.statuses.begin(id, StatusKind::Backup);
        let completion = self
            .statuses
            .track(id.clone(), StatusKind::Backup, launched);
        Ok(OperationHandle::new(status, completion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::tests_util::{replica_set, FakeController, FakeReplica, FakeReplicas};
    use std::time::Duration;
    use stor_port::types::v0::transport::{ReplicaMode, StatusState};
    use tokio::sync::Notify;

    const CHAIN: [&str; 3] = ["volume-head-002.img", "volume-snap-s2.img", "volume-snap-s1.img"];

    fn orchestrator(
        controller: Arc<FakeController>,
        replicas: Arc<FakeReplicas>,
        statuses: &StatusRegistry,
    ) -> BackupOrchestrator {
        BackupOrchestrator::new(
            controller,
            replicas,
            statuses.clone(),
            ReplicaSelector::default(),
        )
    }

    #[tokio::test]
    async fn backup_from_writable_replica() {
        let controller = FakeController::new(replica_set(&[
            ReplicaMode::Error,
            ReplicaMode::ReadWrite,
            ReplicaMode::ReadWrite,
        ]));
        let replicas = FakeReplicas::new(vec![
            FakeReplica::new("tcp://r0:9502", CHAIN.to_vec()),
            FakeReplica::new("tcp://r1:9502", CHAIN.to_vec()),
            FakeReplica::new("tcp://r2:9502", CHAIN.to_vec()),
        ]);
        let statuses = StatusRegistry::new();
        let backups = orchestrator(controller, replicas.clone(), &statuses);

        let id = OperationId::from("op-1");
        let handle = backups
            .create_backup(&id, &"s1".into(), "vfs:///b")
            .await
            .unwrap();
        let status = handle.wait().await.unwrap();
        assert_eq!(status.state, StatusState::Done);
        assert_eq!(status.message, "vfs:///b/backups/vol1-volume-snap-s1.img");

        assert!(replicas.calls("tcp://r0:9502").is_empty());
        assert_eq!(
            replicas.calls("tcp://r1:9502"),
            vec!["replica_info", "create_backup volume-snap-s1.img"]
        );
        assert!(replicas.calls("tcp://r2:9502").is_empty());
    }

    #[tokio::test]
    async fn running_until_replica_completes() {
        let gate = Arc::new(Notify::new());
        let controller = FakeController::new(replica_set(&[ReplicaMode::ReadWrite]));
        let replicas = FakeReplicas::new(vec![
            FakeReplica::new("tcp://r0:9502", CHAIN.to_vec()).gated(gate.clone())
        ]);
        let statuses = StatusRegistry::new();
        let backups = orchestrator(controller, replicas, &statuses);

        let id = OperationId::from("op-1");
        let handle = backups
            .create_backup(&id, &"s2".into(), "vfs:///b")
            .await
            .unwrap();
        assert_eq!(handle.status().state, StatusState::Running);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let status = statuses.get(&id, StatusKind::Backup).unwrap();
        assert_eq!(status.state, StatusState::Running);

        gate.notify_one();
        let status = handle.wait().await.unwrap();
        assert_eq!(status.state, StatusState::Done);
        assert_eq!(statuses.get(&id, StatusKind::Backup).unwrap(), status);
    }

    #[tokio::test]
    async fn replica_backup_failure() {
        let controller = FakeController::new(replica_set(&[ReplicaMode::ReadWrite]));
        let replicas = FakeReplicas::new(vec![
            FakeReplica::new("tcp://r0:9502", CHAIN.to_vec()).failing_backup()
        ]);
        let statuses = StatusRegistry::new();
        let backups = orchestrator(controller, replicas, &statuses);

        let id = OperationId::from("op-1");
        let status = backups
            .create_backup(&id, &"s1".into(), "vfs:///b")
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(status.state, StatusState::Error);
        assert_eq!(
            status.message,
            "Error: Request 'backup' to replica tcp://r0:9502 failed with status 500: injected failure"
        );
    }

    #[tokio::test]
    async fn nothing_recorded_when_not_started() {
        let statuses = StatusRegistry::new();
        let id = OperationId::from("op-1");

        let controller = FakeController::new(replica_set(&[ReplicaMode::ReadOnly]));
        let replicas = FakeReplicas::new(vec![FakeReplica::new("tcp://r0:9502", CHAIN.to_vec())]);
        let backups = orchestrator(controller, replicas, &statuses);
        let error = backups
            .create_backup(&id, &"s1".into(), "vfs:///b")
            .await
            .unwrap_err();
        assert!(matches!(error, SvcError::NoWritableReplica {}));

        let controller = FakeController::new(replica_set(&[ReplicaMode::ReadWrite]));
        let replicas = FakeReplicas::new(vec![FakeReplica::new("tcp://r0:9502", CHAIN.to_vec())]);
        let backups = orchestrator(controller, replicas.clone(), &statuses);
        let error = backups
            .create_backup(&id, &"volume-head-002.img".into(), "vfs:///b")
            .await
            .unwrap_err();
        assert!(matches!(error, SvcError::SnapshotIsHead { .. }));

        let error = backups
            .create_backup(&id, &"s9".into(), "vfs:///b")
            .await
            .unwrap_err();
        assert!(matches!(error, SvcError::SnapshotNotOnReplica { .. }));

        assert_eq!(
            replicas.calls("tcp://r0:9502"),
            vec!["replica_info", "replica_info"]
        );
        assert!(statuses.get(&id, StatusKind::Backup).is_err());
    }

    #[tokio::test]
    async fn strict_selection() {
        let controller = FakeController::new(replica_set(&[
            ReplicaMode::ReadWrite,
            ReplicaMode::ReadWrite,
        ]));
        let replicas = FakeReplicas::new(vec![
            FakeReplica::new("tcp://r0:9502", CHAIN.to_vec()),
            FakeReplica::new("tcp://r1:9502", CHAIN.to_vec()),
        ]);
        let statuses = StatusRegistry::new();
        let backups = BackupOrchestrator::new(
            controller,
            replicas,
            statuses.clone(),
            ReplicaSelector::new(true),
        );
        let error = backups
            .create_backup(&"op-1".into(), &"s1".into(), "vfs:///b")
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            SvcError::MultipleWritableReplicas { count: 2 }
        ));
    }
}
