#![warn(missing_docs)]
//! The error which is handed back to the callers of the backup control-plane operations,
//! independently of the medium used to expose them.

use serde::{de::StdError, Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Report error chain.
pub trait ErrorChain {
    /// Full error chain as a string separated by ':'.
    fn full_string(&self) -> String;
    /// Get the full error chain starting from the parent.
    fn parent_full_string(&self) -> String;
}

impl<T> ErrorChain for T
where
    T: std::error::Error,
{
    /// loops through the error chain and formats into a single string
    /// containing all the lower level errors.
    fn full_string(&self) -> String {
        let mut msg = format!("{self}");
        let mut opt_source = self.source();
        while let Some(source) = opt_source {
            msg = format!("{msg}: {source}");
            opt_source = source.source();
        }
        msg
    }

    fn parent_full_string(&self) -> String {
        match self.source() {
            Some(parent) => parent.full_string(),
            None => String::new(),
        }
    }
}

/// All the different variants of Resources.
#[derive(Serialize, Deserialize, Debug, Clone, AsRefStr, Display, Eq, PartialEq)]
pub enum ResourceKind {
    /// Unknown or unspecified resource.
    Unknown,
    /// Volume resource.
    Volume,
    /// Replica resource.
    Replica,
    /// Volume snapshot.
    Snapshot,
    /// Backup stored on a backup target.
    Backup,
    /// Status of a backup operation.
    BackupStatus,
    /// Status of a restore operation.
    RestoreStatus,
    /// Local command executor.
    Executor,
}

/// Error type which is returned over the transport for any operation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReplyError {
    /// error kind.
    pub kind: ReplyErrorKind,
    /// resource kind.
    pub resource: ResourceKind,
    /// last source of this error.
    pub source: String,
    /// extra information.
    pub extra: String,
}

impl StdError for ReplyError {}

impl std::fmt::Display for ReplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}: {}{}",
            self.kind.as_ref(),
            if matches!(self.resource, ResourceKind::Unknown) {
                String::new()
            } else {
                format!("/{}", self.resource.as_ref())
            },
            self.source,
            if !self.extra.is_empty() {
                format!(": {}", self.extra)
            } else {
                String::new()
            }
        )
    }
}

/// All the different variants of `ReplyError`.
#[derive(Serialize, Deserialize, Debug, Clone, strum_macros::AsRefStr, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum ReplyErrorKind {
    Internal,
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    Conflict,
    Unavailable,
    Aborted,
}

impl ReplyErrorKind {
    /// The HTTP status code a REST front-end would answer with for this kind.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidArgument => 400,
            Self::NotFound => 404,
            Self::FailedPrecondition | Self::Conflict => 409,
            Self::Unavailable => 503,
            Self::Internal | Self::Aborted => 500,
        }
    }
}
