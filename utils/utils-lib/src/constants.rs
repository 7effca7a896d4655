/// Various common constants used by the backup control plane.

/// Default request timeout for any controller or replica request.
pub const DEFAULT_REQ_TIMEOUT: &str = "30s";

/// Default endpoint of the volume controller's REST api.
pub const DEFAULT_CONTROLLER_URL: &str = "http://localhost:9501";

/// The single volume managed by the controller.
pub const DEFAULT_VOLUME_ID: &str = "1";

/// Scheme of the backup targets which can be checked and removed locally.
pub const DEFAULT_BACKUP_SCHEME: &str = "vfs";

/// Local binary used for snapshot listing and backup removal.
pub const DEFAULT_EXECUTOR: &str = "longhorn";

/// Path of the replica resource on each replica's REST endpoint.
pub const REPLICA_RESOURCE_PATH: &str = "v1/replicas/1";

/// Default log level when RUST_LOG is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";
