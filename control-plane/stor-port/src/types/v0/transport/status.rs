use super::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The kind of a long running operation, each kind having its own status namespace.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, EnumString, Display, AsRefStr, Eq, PartialEq, Hash,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Backup creation.
    Backup,
    /// Restore from a backup.
    Restore,
}

/// State of a long running operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, EnumString, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    /// The operation is in progress.
    Running,
    /// The operation completed successfully.
    Done,
    /// The operation failed.
    Error,
}

impl StatusState {
    /// Check if the state is final.
    pub fn terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Final state of a long running operation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TerminalState {
    /// The operation completed successfully.
    Done,
    /// The operation failed.
    Error,
}

impl From<TerminalState> for StatusState {
    fn from(src: TerminalState) -> Self {
        match src {
            TerminalState::Done => Self::Done,
            TerminalState::Error => Self::Error,
        }
    }
}

/// Status of a long running backup or restore operation.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    /// Id of the operation.
    pub id: OperationId,
    /// Kind of the operation.
    pub kind: StatusKind,
    /// Current state.
    pub state: StatusState,
    /// The operation's output when done, or its error when failed.
    pub message: String,
    /// When the operation was started.
    pub created: DateTime<Utc>,
    /// When the status last changed.
    pub updated: DateTime<Utc>,
}

impl OperationStatus {
    /// A freshly started operation.
    pub fn running(id: OperationId, kind: StatusKind) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            state: StatusState::Running,
            message: String::new(),
            created: now,
            updated: now,
        }
    }
    /// Move the operation into a final state.
    pub fn complete(&mut self, state: TerminalState, message: String) {
        self.state = state.into();
        self.message = message;
        self.updated = Utc::now();
    }
    /// Check if the operation has finished, successfully or not.
    pub fn terminal(&self) -> bool {
        self.state.terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        let mut status = OperationStatus::running("op".into(), StatusKind::Backup);
        assert_eq!(status.state, StatusState::Running);
        assert!(!status.terminal());
        assert!(status.message.is_empty());

        status.complete(TerminalState::Error, "Error: boom".to_string());
        assert_eq!(status.state, StatusState::Error);
        assert!(status.terminal());
        assert!(status.updated >= status.created);
    }

    #[test]
    fn status_wire() {
        let status = OperationStatus::running("op".into(), StatusKind::Restore);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "running");
        assert_eq!(json["kind"], "restore");
    }
}
