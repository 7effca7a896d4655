use super::*;

use serde::{Deserialize, Serialize};

rpc_impl_string_id_inner!(VolumeId, "ID of the volume managed by the controller");

/// Volumes
///
/// Volume information as reported by the controller.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Volume {
    /// Name of the volume.
    pub name: String,
}

impl Volume {
    /// Construct a new volume.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
        }
    }
}
