use super::*;

use serde::{Deserialize, Serialize};

rpc_impl_string_id_inner!(SnapshotName, "Name of a volume snapshot");

/// The ordered list of disks on a replica, head first.
/// Position 0 is the live head disk; later positions are successively older snapshots.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Eq, PartialEq)]
#[serde(transparent)]
pub struct SnapshotChain(Vec<SnapshotName>);

impl SnapshotChain {
    /// Construct a new chain, head first.
    pub fn new<T: Into<SnapshotName>>(disks: Vec<T>) -> Self {
        Self(disks.into_iter().map(Into::into).collect())
    }
    /// Get the live head disk, if any.
    pub fn head(&self) -> Option<&SnapshotName> {
        self.0.first()
    }
    /// Iterate over the chain entries, head first.
    pub fn entries(&self) -> impl Iterator<Item = SnapshotChainEntry> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(position, name)| SnapshotChainEntry::new(name.clone(), position))
    }
    /// Position of the first disk with the exact given name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|disk| disk.as_str() == name)
    }
    /// Number of disks in the chain.
    pub fn len(&self) -> usize {
        self.0.len()
    }
    /// Check if the chain has no disks.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A disk within a snapshot chain.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct SnapshotChainEntry {
    /// Name of the disk as it appears in the chain.
    pub name: SnapshotName,
    /// Position within the chain, 0 being the head.
    pub position: usize,
}

impl SnapshotChainEntry {
    /// Construct a new entry.
    pub fn new(name: SnapshotName, position: usize) -> Self {
        Self { name, position }
    }
    /// Check if this entry is the live head disk.
    pub fn is_head(&self) -> bool {
        self.position == 0
    }
}

/// A volume snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Snapshot {
    /// Id of the snapshot, which is the same as its name.
    pub id: SnapshotName,
    /// Name of the snapshot.
    pub name: SnapshotName,
}

impl From<SnapshotName> for Snapshot {
    fn from(name: SnapshotName) -> Self {
        Self {
            id: name.clone(),
            name,
        }
    }
}

/// The request type to create a volume snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Eq, PartialEq)]
pub struct CreateSnapshot {
    /// Requested name of the snapshot; the controller picks one if empty.
    #[serde(default)]
    pub name: String,
}

impl CreateSnapshot {
    /// Create new request.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The request type to delete a volume snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct DeleteSnapshot {
    /// Id of the snapshot to be deleted.
    pub id: SnapshotName,
}

impl DeleteSnapshot {
    /// Create new request.
    pub fn new(id: impl Into<SnapshotName>) -> Self {
        Self { id: id.into() }
    }
}
