use super::LocalExecutor;
use crate::errors::{Executor, ExecutorSpawn, SvcError};
use async_trait::async_trait;
use snafu::ResultExt;
use std::path::PathBuf;
use stor_port::types::v0::transport::{BackupLocation, SnapshotName};
use tokio::process::Command;
use tracing::trace;

/// Runs the volume's command line tool on the local host.
#[derive(Debug, Clone)]
pub struct CliExecutor {
    binary: PathBuf,
}

impl CliExecutor {
    /// Create a new executor which runs `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run the binary with the given arguments, returning its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, SvcError> {
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .context(ExecutorSpawn {
                command: command.as_str(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        trace!(
            command = %command,
            status = ?output.status.code(),
            stdout = %stdout,
            "Executed local command"
        );
        if !output.status.success() {
            return Executor {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .fail();
        }
        Ok(stdout)
    }
}

/// Parse the snapshot listing, which starts with a header line followed by one name per line.
pub fn parse_snapshot_listing(stdout: &str) -> Vec<SnapshotName> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(SnapshotName::from)
        .collect()
}

#[async_trait]
impl LocalExecutor for CliExecutor {
    async fn list_snapshots(&self) -> Result<Vec<SnapshotName>, SvcError> {
        let stdout = self.run(&["snapshots"]).await?;
        Ok(parse_snapshot_listing(&stdout))
    }

    async fn remove_snapshot(&self, name: &SnapshotName) -> Result<(), SvcError> {
        self.run(&["snapshots", "rm", name.as_str()]).await?;
        Ok(())
    }

    async fn remove_backup(&self, location: &BackupLocation) -> Result<(), SvcError> {
        self.run(&["backup", "rm", location.as_str()]).await?;
        Ok(())
    }
}
