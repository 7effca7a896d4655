use super::*;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

rpc_impl_string_id_inner!(
    ReplicaAddress,
    "Network address of a replica, eg: tcp://10.1.0.4:9502"
);

/// Mode of a replica as seen by the volume's controller.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, EnumString, Display, AsRefStr, Eq, PartialEq, Hash,
)]
pub enum ReplicaMode {
    /// The replica is authoritative and serves reads and writes.
    #[strum(serialize = "RW")]
    #[serde(rename = "RW")]
    ReadWrite,
    /// The replica is only readable.
    #[strum(serialize = "RO")]
    #[serde(rename = "RO")]
    ReadOnly,
    /// The replica is receiving writes while being rebuilt.
    #[strum(serialize = "WO")]
    #[serde(rename = "WO")]
    WriteOnly,
    /// The replica has failed.
    #[strum(serialize = "ERR")]
    #[serde(rename = "ERR")]
    Error,
}

impl ReplicaMode {
    /// Check if the mode allows this replica to act on behalf of the volume.
    pub fn writable(&self) -> bool {
        self == &Self::ReadWrite
    }
}

/// Replica information.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Replica {
    /// Address of the replica.
    pub address: ReplicaAddress,
    /// Mode of the replica.
    pub mode: ReplicaMode,
    /// Whether the replica is currently being rebuilt.
    #[serde(default)]
    pub rebuilding: bool,
}

impl Replica {
    /// Construct a new replica, deriving the rebuilding flag from its mode.
    pub fn new(address: impl Into<ReplicaAddress>, mode: ReplicaMode) -> Self {
        Self {
            address: address.into(),
            mode,
            rebuilding: mode == ReplicaMode::WriteOnly,
        }
    }
    /// Set the rebuilding flag.
    #[must_use]
    pub fn with_rebuilding(mut self, rebuilding: bool) -> Self {
        self.rebuilding = rebuilding;
        self
    }
    /// Check if the replica is writable.
    pub fn writable(&self) -> bool {
        self.mode.writable()
    }
}

/// Information reported by a replica about itself.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaInfo {
    /// The replica's snapshot chain, head first.
    pub chain: SnapshotChain,
    /// Whether the replica reports itself as being rebuilt.
    #[serde(default)]
    pub rebuilding: bool,
}

impl ReplicaInfo {
    /// Construct replica info from its chain of disk names, head first.
    pub fn new<T: Into<SnapshotName>>(chain: Vec<T>) -> Self {
        Self {
            chain: SnapshotChain::new(chain),
            rebuilding: false,
        }
    }
}
