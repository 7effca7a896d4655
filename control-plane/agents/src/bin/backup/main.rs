//! The Backup Agent.
//! Backs up the volume's snapshots onto backup targets, restores the volume's replicas from
//! backups and manages the volume's snapshots.

use agents::{
    backup::{BackupConfig, BackupService},
    clients::{
        cli::CliExecutor,
        rest::{ControllerRestClient, ReplicaRestFactory},
    },
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use stor_port::types::v0::transport::{
    CreateBackup, CreateSnapshot, DeleteSnapshot, OperationId, OperationStatus, RemoveBackup,
    RestoreBackup, StatusState,
};
use utils::tracing_telemetry::{FmtLayer, FmtStyle, TracingTelemetry};

/// The Cli arguments for this binary.
#[derive(Debug, Parser)]
#[clap(name = utils::package_description!(), version)]
struct CliArgs {
    /// The REST endpoint of the volume's controller.
    #[clap(long, short, env = "CONTROLLER_URL", default_value = utils::DEFAULT_CONTROLLER_URL)]
    controller: String,

    /// The id of the volume managed by the controller.
    #[clap(long, env = "VOLUME_ID", default_value = utils::DEFAULT_VOLUME_ID)]
    volume: String,

    /// The volume's command line tool, used to list and remove snapshots and backups.
    #[clap(long, short, env = "EXECUTOR", default_value = utils::DEFAULT_EXECUTOR)]
    executor: String,

    /// Scheme of the backup targets which can be checked and removed locally.
    #[clap(long, env = "BACKUP_SCHEME", default_value = utils::DEFAULT_BACKUP_SCHEME)]
    backup_scheme: String,

    /// The timeout for the controller and replica requests.
    /// Backup and restore requests are not bounded.
    #[clap(long, short, default_value = utils::DEFAULT_REQ_TIMEOUT)]
    request_timeout: humantime::Duration,

    /// Refuse to back up when more than one replica is writable.
    #[clap(long, env = "STRICT_WRITABLE")]
    strict_writable: bool,

    /// Remove backups through the writable replica rather than the local executor.
    #[clap(long, env = "REMOVE_VIA_REPLICA")]
    remove_via_replica: bool,

    /// Formatting style for the logs.
    #[clap(long, env = "LOG_STYLE", default_value = "compact")]
    log_style: FmtStyle,

    /// Log level used when `RUST_LOG` is not set.
    #[clap(long, env = "LOG_LEVEL", default_value = utils::DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Disable ansi colours in the logs.
    #[clap(long, env = "NO_COLOURS")]
    no_colours: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Backup operations.
    #[clap(subcommand)]
    Backup(BackupCommand),
    /// Snapshot operations.
    #[clap(subcommand)]
    Snapshot(SnapshotCommand),
}

#[derive(Debug, Subcommand)]
enum BackupCommand {
    /// Back up a snapshot onto a backup target and wait for it to complete.
    Create {
        /// Name of the snapshot.
        snapshot: String,
        /// The backup target, eg: vfs:///var/lib/backups.
        #[clap(long)]
        dest: String,
        /// Id of the operation, generated when not provided.
        #[clap(long)]
        uuid: Option<String>,
    },
    /// Remove a backup.
    Rm {
        /// Location of the backup.
        location: String,
    },
    /// Restore every replica of the volume from a backup and wait for it to complete.
    Restore {
        /// Location of the backup.
        location: String,
        /// Id of the operation, generated when not provided.
        #[clap(long)]
        uuid: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum SnapshotCommand {
    /// List the volume's snapshots.
    Ls,
    /// Get a snapshot.
    Get {
        /// Name of the snapshot.
        name: String,
    },
    /// Take a snapshot of the volume.
    Create {
        /// Name of the snapshot, generated by the controller when not provided.
        #[clap(long, default_value = "")]
        name: String,
    },
    /// Remove a snapshot.
    Rm {
        /// Name of the snapshot.
        name: String,
    },
}

fn operation_id(uuid: Option<String>) -> OperationId {
    uuid.map(OperationId::from).unwrap_or_else(OperationId::new)
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_status(status: &OperationStatus) -> anyhow::Result<()> {
    print(status)?;
    if status.state == StatusState::Error {
        anyhow::bail!("operation {} failed: {}", status.id, status.message);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli_args = CliArgs::parse();
    utils::print_package_info!();
    // stdout carries the command's output
    TracingTelemetry::builder()
        .with_writer(FmtLayer::Stderr)
        .with_style(cli_args.log_style)
        .with_colours(!cli_args.no_colours)
        .with_default_level(cli_args.log_level.as_str())
        .init("backup-agent");
    tracing::debug!(options = ?cli_args, "Using options");

    let service = service(&cli_args)?;
    match cli_args.command {
        Command::Backup(command) => backup(&service, command).await,
        Command::Snapshot(command) => snapshot(&service, command).await,
    }
}

fn service(cli_args: &CliArgs) -> anyhow::Result<BackupService> {
    let timeout = cli_args.request_timeout.into();
    let volume = cli_args.volume.as_str().into();
    let controller = ControllerRestClient::new(&cli_args.controller, volume, timeout)?;
    let config = BackupConfig::new(
        cli_args.volume.as_str().into(),
        cli_args.backup_scheme.as_str(),
        cli_args.strict_writable,
        cli_args.remove_via_replica,
    );
    Ok(BackupService::new(
        config,
        Arc::new(controller),
        Arc::new(ReplicaRestFactory::new(timeout)),
        Arc::new(CliExecutor::new(&cli_args.executor)),
    ))
}

async fn backup(service: &BackupService, command: BackupCommand) -> anyhow::Result<()> {
    match command {
        BackupCommand::Create {
            snapshot,
            dest,
            uuid,
        } => {
            let request = CreateBackup::new(snapshot, dest, operation_id(uuid));
            let handle = service.create_backup(&request).await?;
            print_status(&handle.wait().await?)
        }
        BackupCommand::Rm { location } => {
            let outcome = service.remove_backup(&RemoveBackup::new(location)).await?;
            print(&outcome)
        }
        BackupCommand::Restore { location, uuid } => {
            let request = RestoreBackup::new(
                service.config().volume().clone(),
                location,
                operation_id(uuid),
            );
            let handle = service.restore_from_backup(&request).await?;
            print_status(&handle.wait().await?)
        }
    }
}

async fn snapshot(service: &BackupService, command: SnapshotCommand) -> anyhow::Result<()> {
    match command {
        SnapshotCommand::Ls => print(&service.list_snapshots().await?),
        SnapshotCommand::Get { name } => print(&service.get_snapshot(&name.into()).await?),
        SnapshotCommand::Create { name } => {
            print(&service.create_snapshot(&CreateSnapshot::new(name)).await?)
        }
        SnapshotCommand::Rm { name } => {
            service.delete_snapshot(&DeleteSnapshot::new(name)).await?;
            Ok(())
        }
    }
}
