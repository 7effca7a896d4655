use crate::errors::SvcError;
use stor_port::types::v0::transport::{ReplicaAddress, SnapshotChain, SnapshotChainEntry};

/// Prefix of the disk file backing a snapshot in a replica's chain.
const SNAPSHOT_DISK_PREFIX: &str = "volume-snap-";
/// Suffix of the disk file backing a snapshot in a replica's chain.
const SNAPSHOT_DISK_SUFFIX: &str = ".img";

/// The name of the disk file which backs the given snapshot.
pub fn snapshot_disk_name(snapshot: &str) -> String {
    format!("{SNAPSHOT_DISK_PREFIX}{snapshot}{SNAPSHOT_DISK_SUFFIX}")
}

/// Find a snapshot in the chain, either by its exact name or by the name of the disk file
/// backing it. The first match, counting from the head, wins.
pub fn resolve(chain: &SnapshotChain, snapshot: &str) -> Option<SnapshotChainEntry> {
    let position = chain
        .position(snapshot)
        .or_else(|| chain.position(&snapshot_disk_name(snapshot)))?;
    chain.entries().nth(position)
}

/// Find a snapshot in the replica's chain which can be backed up.
/// The live head disk can never be backed up.
pub fn resolve_historical(
    chain: &SnapshotChain,
    snapshot: &str,
    replica: &ReplicaAddress,
) -> Result<SnapshotChainEntry, SvcError> {
    match resolve(chain, snapshot) {
        None => Err(SvcError::SnapshotNotOnReplica {
            snapshot: snapshot.to_string(),
            replica: replica.clone(),
        }),
        Some(entry) if entry.is_head() => Err(SvcError::SnapshotIsHead {
            snapshot: snapshot.to_string(),
            replica: replica.clone(),
        }),
        Some(entry) => Ok(entry),
    }
}
