pub mod backup;
pub mod misc;
pub mod replica;
pub mod snapshot;
pub mod status;
pub mod volume;

pub use backup::*;
pub use misc::*;
pub use replica::*;
pub use snapshot::*;
pub use status::*;
pub use volume::*;

pub use crate::{rpc_impl_string_id, rpc_impl_string_id_inner};
