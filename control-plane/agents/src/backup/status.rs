use crate::errors::SvcError;
use parking_lot::RwLock;
use std::{collections::HashMap, fmt::Display, ops::Deref, sync::Arc};
use stor_port::types::v0::transport::{OperationId, OperationStatus, StatusKind, TerminalState};
use tokio::task::JoinHandle;

/// Locked operation statuses of a single kind.
#[derive(Clone, Default, Debug)]
struct StatusMapLocked(Arc<RwLock<HashMap<OperationId, OperationStatus>>>);

impl Deref for StatusMapLocked {
    type Target = Arc<RwLock<HashMap<OperationId, OperationStatus>>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Statuses of the backup and restore operations, keyed by operation id.
/// Each kind has its own namespace and its own lock, and statuses are kept for the lifetime
/// of the registry.
#[derive(Clone, Default, Debug)]
pub struct StatusRegistry {
    backups: StatusMapLocked,
    restores: StatusMapLocked,
}

impl StatusRegistry {
    /// Return a new empty `Self`.
    pub fn new() -> Self {
        Default::default()
    }

    fn statuses(&self, kind: StatusKind) -> &StatusMapLocked {
        match kind {
            StatusKind::Backup => &self.backups,
            StatusKind::Restore => &self.restores,
        }
    }

    /// Record the operation as running, replacing any previous status with the same id.
    pub fn begin(&self, id: &OperationId, kind: StatusKind) -> OperationStatus {
        let status = OperationStatus::running(id.clone(), kind);
        let previous = self
            .statuses(kind)
            .write()
            .insert(id.clone(), status.clone());
        if let Some(previous) = previous {
            tracing::debug!(
                operation.id = %id,
                operation.kind = %kind,
                previous.state = %previous.state,
                "Replacing the status of a previous operation with the same id"
            );
        }
        status
    }

    /// Move the operation into its final state.
    /// An operation which has already finished keeps its first final state.
    pub fn complete(
        &self,
        id: &OperationId,
        kind: StatusKind,
        state: TerminalState,
        message: String,
    ) -> OperationStatus {
        let mut statuses = self.statuses(kind).write();
        match statuses.get_mut(id) {
            Some(status) if status.terminal() => {
                tracing::warn!(
                    operation.id = %id,
                    operation.kind = %kind,
                    state = %status.state,
                    "Operation has already finished, ignoring its completion"
                );
                status.clone()
            }
            Some(status) => {
                status.complete(state, message);
                status.clone()
            }
            None => {
                tracing::warn!(
                    operation.id = %id,
                    operation.kind = %kind,
                    "Completing an operation which was never started"
                );
                let mut status = OperationStatus::running(id.clone(), kind);
                status.complete(state, message);
                statuses.insert(id.clone(), status.clone());
                status
            }
        }
    }

    /// Get the status of the operation.
    pub fn get(&self, id: &OperationId, kind: StatusKind) -> Result<OperationStatus, SvcError> {
        match self.statuses(kind).read().get(id) {
            Some(status) => Ok(status.clone()),
            None => Err(SvcError::StatusNotFound {
                kind,
                id: id.clone(),
            }),
        }
    }

    /// Complete the operation once its `action` resolves: `Done` with the action's output or
    /// `Error` with its error.
    /// Must be called after `begin` so the completion always lands on the running status.
    pub fn track<T>(
        &self,
        id: OperationId,
        kind: StatusKind,
        action: JoinHandle<Result<T, SvcError>>,
    ) -> JoinHandle<OperationStatus>
    where
        T: Display + Send + 'static,
    {
        let registry = self.clone();
        tokio::spawn(async move {
            let (state, message) = match action.await {
                Ok(Ok(output)) => (TerminalState::Done, output.to_string()),
                Ok(Err(error)) => (TerminalState::Error, error.status_message()),
                Err(error) => (TerminalState::Error, SvcError::from(error).status_message()),
            };
            match state {
                TerminalState::Done => tracing::info!(
                    operation.id = %id,
                    operation.kind = %kind,
                    output = %message,
                    "Operation completed"
                ),
                TerminalState::Error => tracing::error!(
                    operation.id = %id,
                    operation.kind = %kind,
                    error = %message,
                    "Operation failed"
                ),
            }
            registry.complete(&id, kind, state, message)
        })
    }
}

/// A started long running operation.
#[derive(Debug)]
pub struct OperationHandle {
    status: OperationStatus,
    completion: JoinHandle<OperationStatus>,
}

impl OperationHandle {
    /// Create a new handle from the initial status and the completion task.
    pub fn new(status: OperationStatus, completion: JoinHandle<OperationStatus>) -> Self {
        Self { status, completion }
    }
    /// The status of the operation when it was started.
    pub fn status(&self) -> &OperationStatus {
        &self.status
    }
    /// Wait for the operation to finish, returning its final status.
    pub async fn wait(self) -> Result<OperationStatus, SvcError> {
        Ok(self.completion.await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stor_port::types::v0::transport::StatusState;

    #[test]
    fn begin_and_complete() {
        let registry = StatusRegistry::new();
        let id = OperationId::from("op-1");

        let status = registry.begin(&id, StatusKind::Backup);
        assert_eq!(status.state, StatusState::Running);
        assert_eq!(registry.get(&id, StatusKind::Backup).unwrap(), status);

        let status = registry.complete(
            &id,
            StatusKind::Backup,
            TerminalState::Done,
            "vfs:///b/backup-1".to_string(),
        );
        assert_eq!(status.state, StatusState::Done);
        assert_eq!(status.message, "vfs:///b/backup-1");
    }

    #[test]
    fn kinds_are_separate() {
        let registry = StatusRegistry::new();
        let id = OperationId::from("op-1");
        registry.begin(&id, StatusKind::Backup);

        let error = registry.get(&id, StatusKind::Restore).unwrap_err();
        assert!(matches!(
            error,
            SvcError::StatusNotFound {
                kind: StatusKind::Restore,
                ..
            }
        ));

        registry.begin(&id, StatusKind::Restore);
        registry.complete(&id, StatusKind::Restore, TerminalState::Error, "Error: x".into());
        let backup = registry.get(&id, StatusKind::Backup).unwrap();
        assert_eq!(backup.state, StatusState::Running);
    }

    #[test]
    fn terminal_states_are_final() {
        let registry = StatusRegistry::new();
        let id = OperationId::from("op-1");
        registry.begin(&id, StatusKind::Restore);
        registry.complete(&id, StatusKind::Restore, TerminalState::Error, "Error: a".into());

        let status = registry.complete(&id, StatusKind::Restore, TerminalState::Done, "b".into());
        assert_eq!(status.state, StatusState::Error);
        assert_eq!(status.message, "Error: a");
        assert_eq!(registry.get(&id, StatusKind::Restore).unwrap(), status);
    }

    #[test]
    fn begin_replaces_previous() {
        let registry = StatusRegistry::new();
        let id = OperationId::from("op-1");
        registry.begin(&id, StatusKind::Backup);
        registry.complete(&id, StatusKind::Backup, TerminalState::Done, "b1".into());

        registry.begin(&id, StatusKind::Backup);
        let status = registry.get(&id, StatusKind::Backup).unwrap();
        assert_eq!(status.state, StatusState::Running);
        assert!(status.message.is_empty());
    }

    #[tokio::test]
    async fn track_action() {
        let registry = StatusRegistry::new();
        let id = OperationId::from("op-ok");
        let action = tokio::spawn(async { Ok::<_, SvcError>("vfs:///b/backup-1") });
        let status = registry.begin(&id, StatusKind::Backup);
        let handle = OperationHandle::new(
            status,
            registry.track(id.clone(), StatusKind::Backup, action),
        );
        assert_eq!(handle.status().state, StatusState::Running);

        let status = handle.wait().await.unwrap();
        assert_eq!(status.state, StatusState::Done);
        assert_eq!(status.message, "vfs:///b/backup-1");
        assert_eq!(registry.get(&id, StatusKind::Backup).unwrap(), status);

        let id = OperationId::from("op-err");
        let action = tokio::spawn(async { Err::<String, _>(SvcError::NoWritableReplica {}) });
        registry.begin(&id, StatusKind::Backup);
        let status = registry
            .track(id.clone(), StatusKind::Backup, action)
            .await
            .unwrap();
        assert_eq!(status.state, StatusState::Error);
        assert_eq!(
            status.message,
            "Error: Cannot find a suitable replica for backup"
        );
    }

    #[tokio::test]
    async fn track_panicked_action() {
        let registry = StatusRegistry::new();
        let id = OperationId::from("op-1");
        let action = tokio::spawn(async {
            if true {
                panic!("replica went away");
            }
            Ok::<String, SvcError>(String::new())
        });
        registry.begin(&id, StatusKind::Restore);
        let status = registry
            .track(id.clone(), StatusKind::Restore, action)
            .await
            .unwrap();
        assert_eq!(status.state, StatusState::Error);
        assert!(status.message.starts_with("Error: Internal error"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_operations() {
        let registry = StatusRegistry::new();
        let tasks = (0 .. 200)
            .map(|index| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let id = OperationId::from(format!("op-{index}"));
                    let kind = match index % 2 {
                        0 => StatusKind::Backup,
                        _ => StatusKind::Restore,
                    };
                    registry.begin(&id, kind);
                    assert!(!registry.get(&id, kind).unwrap().terminal());

                    let action = tokio::spawn(async move {
                        tokio::task::yield_now().await;
                        Ok::<_, SvcError>(format!("backup-{index}"))
                    });
                    let completion = registry.track(id.clone(), kind, action);
                    while !registry.get(&id, kind).unwrap().terminal() {
                        tokio::task::yield_now().await;
                    }
                    let status = completion.await.unwrap();
                    assert_eq!(status.state, StatusState::Done);

                    let status =
                        registry.complete(&id, kind, TerminalState::Error, "late".to_string());
                    assert_eq!(status.state, StatusState::Done);
                    let status = registry.get(&id, kind).unwrap();
                    assert_eq!(status.state, StatusState::Done);
                    assert_eq!(status.message, format!("backup-{index}"));
                })
            })
            .collect::<Vec<_>>();

        for task in futures::future::join_all(tasks).await {
            task.unwrap();
        }
    }
}
