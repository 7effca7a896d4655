use snafu::Snafu;
use stor_port::{
    transport_api::{ErrorChain, ReplyError, ReplyErrorKind, ResourceKind},
    types::v0::transport::{OperationId, ReplicaAddress, ReplicaMode, StatusKind, VolumeId},
};

/// Common error type for the backup agent.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(false)))]
#[allow(missing_docs)]
pub enum SvcError {
    #[snafu(display("Argument '{}' was not provided", name))]
    MissingArgument { name: String },
    #[snafu(display("Snapshot '{}' not found", snapshot))]
    SnapshotNotFound { snapshot: String },
    #[snafu(display("Snapshot {} not found on replica {}", snapshot, replica))]
    SnapshotNotOnReplica {
        snapshot: String,
        replica: ReplicaAddress,
    },
    #[snafu(display("Can not backup the head disk in the chain"))]
    SnapshotIsHead {
        snapshot: String,
        replica: ReplicaAddress,
    },
    #[snafu(display("Status of {} operation '{}' not found", kind, id))]
    StatusNotFound { kind: StatusKind, id: OperationId },
    #[snafu(display("Volume '{}' not found", volume))]
    VolumeNotFound { volume: VolumeId },
    #[snafu(display("Cannot find a suitable replica for backup"))]
    NoWritableReplica {},
    #[snafu(display("Found {} writable replicas while expecting exactly one", count))]
    MultipleWritableReplicas { count: usize },
    #[snafu(display("Can not restore from backup because {} is rebuilding", replica))]
    ReplicaRebuilding { replica: ReplicaAddress },
    #[snafu(display(
        "Can only {} from replica in mode RW, got {} for replica {}",
        action,
        mode,
        replica
    ))]
    InvalidReplicaState {
        replica: ReplicaAddress,
        mode: ReplicaMode,
        action: String,
    },
    #[snafu(display(
        "Request '{}' to replica {} failed with status {}: {}",
        request,
        replica,
        status,
        reason
    ))]
    ReplicaRequest {
        replica: ReplicaAddress,
        request: String,
        status: u16,
        reason: String,
    },
    #[snafu(display("Failed to restore replica {}", replica))]
    ReplicaRestore {
        replica: ReplicaAddress,
        source: Box<SvcError>,
    },
    #[snafu(display("Invalid address for replica {}", replica))]
    InvalidReplicaAddress {
        replica: ReplicaAddress,
        source: url::ParseError,
    },
    #[snafu(display(
        "Request '{}' to the controller failed with status {}: {}",
        request,
        status,
        reason
    ))]
    ControllerRequest {
        request: String,
        status: u16,
        reason: String,
    },
    #[snafu(display("Invalid controller url '{}'", url))]
    InvalidControllerUrl {
        url: String,
        source: url::ParseError,
    },
    #[snafu(display("HTTP request to '{}' failed", url))]
    HttpRequest { url: String, source: reqwest::Error },
    #[snafu(display("Failed to run '{}'", command))]
    ExecutorSpawn {
        command: String,
        source: std::io::Error,
    },
    #[snafu(display("Command '{}' failed with {}: {}", command, status, stderr))]
    Executor {
        command: String,
        status: String,
        stderr: String,
    },
    #[snafu(display("Internal error: {}", details))]
    Internal { details: String },
}

impl From<tokio::task::JoinError> for SvcError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Internal {
            details: format!("operation task failed: {error}"),
        }
    }
}

impl SvcError {
    /// The resource the error refers to.
    fn resource(&self) -> ResourceKind {
        match self {
            SvcError::MissingArgument { .. } | SvcError::Internal { .. } => ResourceKind::Unknown,
            SvcError::SnapshotNotFound { .. }
            | SvcError::SnapshotNotOnReplica { .. }
            | SvcError::SnapshotIsHead { .. } => ResourceKind::Snapshot,
            SvcError::StatusNotFound {
                kind: StatusKind::Backup,
                ..
            } => ResourceKind::BackupStatus,
            SvcError::StatusNotFound {
                kind: StatusKind::Restore,
                ..
            } => ResourceKind::RestoreStatus,
            SvcError::VolumeNotFound { .. }
            | SvcError::ControllerRequest { .. }
            | SvcError::InvalidControllerUrl { .. } => ResourceKind::Volume,
            SvcError::NoWritableReplica { .. }
            | SvcError::MultipleWritableReplicas { .. }
            | SvcError::ReplicaRebuilding { .. }
            | SvcError::InvalidReplicaState { .. }
            | SvcError::ReplicaRequest { .. }
            | SvcError::InvalidReplicaAddress { .. } => ResourceKind::Replica,
            SvcError::ReplicaRestore { .. } => ResourceKind::Backup,
            SvcError::HttpRequest { .. } => ResourceKind::Unknown,
            SvcError::ExecutorSpawn { .. } | SvcError::Executor { .. } => ResourceKind::Executor,
        }
    }

    /// The kind of reply this error is handed back as.
    fn reply_kind(&self) -> ReplyErrorKind {
        match self {
            SvcError::MissingArgument { .. } => ReplyErrorKind::InvalidArgument,
            SvcError::SnapshotNotFound { .. }
            | SvcError::SnapshotNotOnReplica { .. }
            | SvcError::StatusNotFound { .. }
            | SvcError::VolumeNotFound { .. } => ReplyErrorKind::NotFound,
            SvcError::SnapshotIsHead { .. }
            | SvcError::NoWritableReplica { .. }
            | SvcError::InvalidReplicaState { .. } => ReplyErrorKind::FailedPrecondition,
            SvcError::MultipleWritableReplicas { .. } | SvcError::ReplicaRebuilding { .. } => {
                ReplyErrorKind::Conflict
            }
            SvcError::ReplicaRequest { .. }
            | SvcError::ControllerRequest { .. }
            | SvcError::HttpRequest { .. }
            | SvcError::Executor { .. } => ReplyErrorKind::Unavailable,
            SvcError::ReplicaRestore { source, .. } => source.reply_kind(),
            SvcError::InvalidReplicaAddress { .. }
            | SvcError::InvalidControllerUrl { .. }
            | SvcError::ExecutorSpawn { .. } => ReplyErrorKind::Internal,
            SvcError::Internal { .. } => ReplyErrorKind::Aborted,
        }
    }

    /// The message reported in an operation status when this error fails it.
    pub fn status_message(&self) -> String {
        format!("Error: {}", self.full_string())
    }
}

impl From<SvcError> for ReplyError {
    fn from(error: SvcError) -> Self {
        ReplyError {
            kind: error.reply_kind(),
            resource: error.resource(),
            source: error.to_string(),
            extra: error.full_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_error_mapping() {
        let error: ReplyError = SvcError::MissingArgument {
            name: "uuid".to_string(),
        }
        .into();
        assert_eq!(error.kind, ReplyErrorKind::InvalidArgument);
        assert_eq!(error.kind.http_status(), 400);

        let error: ReplyError = SvcError::SnapshotNotFound {
            snapshot: "s1".to_string(),
        }
        .into();
        assert_eq!(error.kind, ReplyErrorKind::NotFound);
        assert_eq!(error.resource, ResourceKind::Snapshot);

        let error: ReplyError = SvcError::StatusNotFound {
            kind: StatusKind::Restore,
            id: "op".into(),
        }
        .into();
        assert_eq!(error.resource, ResourceKind::RestoreStatus);

        let error: ReplyError = SvcError::NoWritableReplica {}.into();
        assert_eq!(error.kind, ReplyErrorKind::FailedPrecondition);
        assert_eq!(error.source, "Cannot find a suitable replica for backup");

        let error: ReplyError = SvcError::ReplicaRebuilding {
            replica: "tcp://r1:9502".into(),
        }
        .into();
        assert_eq!(error.kind, ReplyErrorKind::Conflict);
        assert_eq!(error.kind.http_status(), 409);
        assert_eq!(error.resource, ResourceKind::Replica);
    }

    #[test]
    fn replica_restore_chain() {
        let error = SvcError::ReplicaRestore {
            replica: "tcp://r2:9502".into(),
            source: Box::new(SvcError::ReplicaRequest {
                replica: "tcp://r2:9502".into(),
                request: "restore".to_string(),
                status: 500,
                reason: "disk full".to_string(),
            }),
        };
        assert_eq!(
            error.status_message(),
            "Error: Failed to restore replica tcp://r2:9502: Request 'restore' to replica \
             tcp://r2:9502 failed with status 500: disk full"
        );
        let reply = ReplyError::from(error);
        assert_eq!(reply.kind, ReplyErrorKind::Unavailable);
        assert_eq!(reply.resource, ResourceKind::Backup);
    }
}
