use stor_port::types::v0::transport::VolumeId;

/// Configuration of the backup service.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// The volume managed by the controller.
    volume: VolumeId,
    /// Scheme of the backup targets which can be checked and removed locally.
    backup_scheme: String,
    /// Refuse to pick a replica when more than one is writable.
    strict_writable: bool,
    /// Remove backups through the writable replica rather than the local executor.
    remove_via_replica: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            volume: utils::DEFAULT_VOLUME_ID.into(),
            backup_scheme: utils::DEFAULT_BACKUP_SCHEME.to_string(),
            strict_writable: false,
            remove_via_replica: false,
        }
    }
}

impl BackupConfig {
    /// Create a new configuration.
    pub fn new(
        volume: VolumeId,
        backup_scheme: impl Into<String>,
        strict_writable: bool,
        remove_via_replica: bool,
    ) -> Self {
        Self {
            volume,
            backup_scheme: backup_scheme.into(),
            strict_writable,
            remove_via_replica,
        }
    }
    /// The volume managed by the controller.
    pub fn volume(&self) -> &VolumeId {
        &self.volume
    }
    /// Scheme of the backup targets which can be checked and removed locally.
    pub fn backup_scheme(&self) -> &str {
        &self.backup_scheme
    }
    /// Refuse to pick a replica when more than one is writable.
    pub fn strict_writable(&self) -> bool {
        self.strict_writable
    }
    /// Remove backups through the writable replica rather than the local executor.
    pub fn remove_via_replica(&self) -> bool {
        self.remove_via_replica
    }
}
