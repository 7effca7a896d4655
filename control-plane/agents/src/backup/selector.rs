use crate::errors::SvcError;
use stor_port::types::v0::transport::Replica;

/// Selects the replica which acts on behalf of the volume.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicaSelector {
    strict: bool,
}

impl ReplicaSelector {
    /// Create a new selector.
    /// A strict selector refuses to pick when more than one replica is writable.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Select the writable replica.
    pub fn writable<'a>(&self, replicas: &'a [Replica]) -> Result<&'a Replica, SvcError> {
        if self.strict {
            select_writable_strict(replicas)
        } else {
            select_writable(replicas)
        }
    }
}

/// Select the first writable replica, in the controller's order.
pub fn select_writable(replicas: &[Replica]) -> Result<&Replica, SvcError> {
    replicas
        .iter()
        .find(|replica| replica.writable())
        .ok_or(SvcError::NoWritableReplica {})
}

/// Select the single writable replica, failing if there's more than one.
pub fn select_writable_strict(replicas: &[Replica]) -> Result<&Replica, SvcError> {
    let mut writable = replicas.iter().filter(|replica| replica.writable());
    match (writable.next(), writable.count()) {
        (None, _) => Err(SvcError::NoWritableReplica {}),
        (Some(replica), 0) => Ok(replica),
        (Some(_), others) => Err(SvcError::MultipleWritableReplicas { count: others + 1 }),
    }
}

/// Check that no replica of the volume is being rebuilt.
pub fn ensure_not_rebuilding(replicas: &[Replica]) -> Result<(), SvcError> {
    match replicas.iter().find(|replica| replica.rebuilding) {
        Some(replica) => Err(SvcError::ReplicaRebuilding {
            replica: replica.address.clone(),
        }),
        None => Ok(()),
    }
}
