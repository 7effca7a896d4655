//! In-memory controller, replicas and executor which record the calls made to them.

use crate::{
    clients::{ControllerApi, LocalExecutor, ReplicaApi, ReplicaClientFactory},
    errors::SvcError,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use stor_port::types::v0::transport::{
    BackupLocation, CreateSnapshot, Replica, ReplicaAddress, ReplicaCreateBackup, ReplicaInfo,
    ReplicaMode, SnapshotName, Volume,
};
use tokio::sync::Notify;

/// Calls made to a fake, in order.
#[derive(Default, Debug)]
pub(crate) struct Calls(Mutex<Vec<String>>);

impl Calls {
    pub(crate) fn record(&self, call: impl Into<String>) {
        self.0.lock().push(call.into());
    }
    pub(crate) fn list(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

pub(crate) fn request_failed(replica: &ReplicaAddress, request: &str) -> SvcError {
    SvcError::ReplicaRequest {
        replica: replica.clone(),
        request: request.to_string(),
        status: 500,
        reason: "injected failure".to_string(),
    }
}

#[derive(Debug)]
pub(crate) struct FakeController {
    pub(crate) volume: Volume,
    pub(crate) replicas: Mutex<Vec<Replica>>,
    pub(crate) calls: Calls,
}

impl FakeController {
    pub(crate) fn new(replicas: Vec<Replica>) -> Arc<Self> {
        Arc::new(Self {
            volume: Volume::new("vol1"),
            replicas: Mutex::new(replicas),
            calls: Calls::default(),
        })
    }
}

#[async_trait]
impl ControllerApi for FakeController {
    async fn get_volume(&self) -> Result<Volume, SvcError> {
        self.calls.record("get_volume");
        Ok(self.volume.clone())
    }
    async fn list_replicas(&self) -> Result<Vec<Replica>, SvcError> {
        self.calls.record("list_replicas");
        Ok(self.replicas.lock().clone())
    }
    async fn create_snapshot(&self, request: &CreateSnapshot) -> Result<SnapshotName, SvcError> {
        self.calls.record(format!("create_snapshot {}", request.name));
        match request.name.as_str() {
            "" => Ok("generated-snap".into()),
            name => Ok(name.into()),
        }
    }
}

#[derive(Debug)]
pub(crate) struct FakeReplica {
    pub(crate) address: ReplicaAddress,
    pub(crate) info: Mutex<ReplicaInfo>,
    pub(crate) fail_backup: bool,
    pub(crate) fail_restore: bool,
    /// When set, backups wait for a notification before completing.
    pub(crate) gate: Option<Arc<Notify>>,
    pub(crate) calls: Calls,
}

impl FakeReplica {
    pub(crate) fn new(address: &str, chain: Vec<&str>) -> Self {
        Self {
            address: address.into(),
            info: Mutex::new(ReplicaInfo::new(chain)),
            fail_backup: false,
            fail_restore: false,
            gate: None,
            calls: Calls::default(),
        }
    }
    pub(crate) fn failing_backup(mut self) -> Self {
        self.fail_backup = true;
        self
    }
    pub(crate) fn failing_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
    pub(crate) fn rebuilding(self) -> Self {
        self.info.lock().rebuilding = true;
        self
    }
}

#[async_trait]
impl ReplicaApi for FakeReplica {
    async fn replica_info(&self) -> Result<ReplicaInfo, SvcError> {
        self.calls.record("replica_info");
        Ok(self.info.lock().clone())
    }
    async fn create_backup(
        &self,
        request: &ReplicaCreateBackup,
    ) -> Result<BackupLocation, SvcError> {
        self.calls.record(format!("create_backup {}", request.snapshot));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_backup {
            return Err(request_failed(&self.address, "backup"));
        }
        Ok(format!(
            "{}/backups/{}-{}",
            request.destination, request.volume, request.snapshot
        )
        .into())
    }
    async fn remove_backup(&self, location: &BackupLocation) -> Result<(), SvcError> {
        self.calls.record(format!("remove_backup {location}"));
        Ok(())
    }
    async fn restore_backup(&self, location: &BackupLocation) -> Result<(), SvcError> {
        self.calls.record(format!("restore_backup {location}"));
        if self.fail_restore {
            return Err(request_failed(&self.address, "restore"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeReplicas {
    replicas: HashMap<ReplicaAddress, Arc<FakeReplica>>,
}

impl FakeReplicas {
    pub(crate) fn new(replicas: Vec<FakeReplica>) -> Arc<Self> {
        Arc::new(Self {
            replicas: replicas
                .into_iter()
                .map(|replica| (replica.address.clone(), Arc::new(replica)))
                .collect(),
        })
    }
    pub(crate) fn replica(&self, address: &str) -> Arc<FakeReplica> {
        self.replicas[&ReplicaAddress::from(address)].clone()
    }
    pub(crate) fn calls(&self, address: &str) -> Vec<String> {
        self.replica(address).calls.list()
    }
}

impl ReplicaClientFactory for FakeReplicas {
    fn client(&self, address: &ReplicaAddress) -> Result<Arc<dyn ReplicaApi>, SvcError> {
        match self.replicas.get(address) {
            Some(replica) => Ok(replica.clone()),
            None => Err(SvcError::Internal {
                details: format!("no fake replica at {address}"),
            }),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeExecutor {
    pub(crate) snapshots: Mutex<Vec<SnapshotName>>,
    pub(crate) calls: Calls,
}

impl FakeExecutor {
    pub(crate) fn new(snapshots: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            snapshots: Mutex::new(snapshots.into_iter().map(SnapshotName::from).collect()),
            calls: Calls::default(),
        })
    }
}

#[async_trait]
impl LocalExecutor for FakeExecutor {
    async fn list_snapshots(&self) -> Result<Vec<SnapshotName>, SvcError> {
        self.calls.record("list_snapshots");
        Ok(self.snapshots.lock().clone())
    }
    async fn remove_snapshot(&self, name: &SnapshotName) -> Result<(), SvcError> {
        self.calls.record(format!("remove_snapshot {name}"));
        self.snapshots.lock().retain(|snapshot| snapshot != name);
        Ok(())
    }
    async fn remove_backup(&self, location: &BackupLocation) -> Result<(), SvcError> {
        self.calls.record(format!("remove_backup {location}"));
        Ok(())
    }
}

/// A replica set with the given modes, at addresses `tcp://r0:9502`, `tcp://r1:9502`...
pub(crate) fn replica_set(modes: &[ReplicaMode]) -> Vec<Replica> {
    modes
        .iter()
        .enumerate()
        .map(|(index, mode)| Replica::new(format!("tcp://r{index}:9502"), *mode))
        .collect()
}
