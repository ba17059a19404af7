use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use menusync_menu::{assign_disambiguators, IdAllocator, MenuNode, RemoteCommand};
use menusync_sync::{
    match_nodes, MatchState, ReconcileOutcome, ReconcileReport, ReconciliationOperation, SyncConfig,
};
use serde::Serialize;

mod channel;
mod config;

use channel::{DryRunChannel, DryRunUploader, FrameRecord};
use config::Config;

#[derive(Parser)]
#[command(name = "menusync")]
#[command(about = "Plan and rehearse head-unit menu updates", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (defaults to ~/.menusync/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine readable JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what would change between two menus
    Plan {
        /// Menu the host shows now (JSON, with remote ids)
        #[arg(long)]
        current: Option<PathBuf>,

        /// Menu the application wants (JSON)
        #[arg(long)]
        target: PathBuf,
    },

    /// Run a full reconciliation against a simulated host
    DryRun {
        #[arg(long)]
        current: Option<PathBuf>,

        #[arg(long)]
        target: PathBuf,

        /// Simulate a host that rejects every add
        #[arg(long)]
        fail_adds: bool,
    },
}

#[derive(Serialize)]
struct PlanEntry {
    title: String,
    state: MatchState,
}

#[derive(Serialize)]
struct PlanOutput {
    removed: Vec<PlanEntry>,
    target: Vec<PlanEntry>,
    batches: Vec<Vec<RemoteCommand>>,
}

#[derive(Serialize)]
struct DryRunOutput {
    report: ReconcileReport,
    frames: Vec<FrameRecord>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan { current, target } => {
            let current = read_optional_menu(current.as_deref())?;
            let target = read_target(&target, &config.sync)?;
            plan(current, target, &config.sync, cli.json).await
        }
        Commands::DryRun {
            current,
            target,
            fail_adds,
        } => {
            let current = read_optional_menu(current.as_deref())?;
            let target = read_target(&target, &config.sync)?;
            dry_run(current, target, &config.sync, fail_adds, cli.json).await
        }
    }
}

fn read_menu(path: &Path) -> Result<Vec<MenuNode>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read menu file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse menu file: {}", path.display()))
}

fn read_optional_menu(path: Option<&Path>) -> Result<Vec<MenuNode>> {
    match path {
        Some(path) => read_menu(path),
        None => Ok(Vec::new()),
    }
}

fn read_target(path: &Path, config: &SyncConfig) -> Result<Vec<MenuNode>> {
    let mut target = read_menu(path)?;
    if config.disambiguate_titles {
        assign_disambiguators(&mut target);
    }
    Ok(target)
}

async fn reconcile(
    current: Vec<MenuNode>,
    target: Vec<MenuNode>,
    config: &SyncConfig,
    channel: Arc<DryRunChannel>,
) -> Result<ReconcileReport> {
    let ids = Arc::new(IdAllocator::following(&current));
    let operation = ReconciliationOperation::new(current, target, channel, ids, config.clone())
        .with_uploader(Arc::new(DryRunUploader));

    match operation.run().await? {
        ReconcileOutcome::Finished(report) => Ok(report),
        ReconcileOutcome::Canceled => bail!("Reconciliation was canceled"),
    }
}

async fn plan(
    current: Vec<MenuNode>,
    target: Vec<MenuNode>,
    config: &SyncConfig,
    json: bool,
) -> Result<()> {
    let mut output = PlanOutput {
        removed: Vec::new(),
        target: Vec::new(),
        batches: Vec::new(),
    };

    if let Some(matched) = match_nodes(&current, &target) {
        for index in matched.removed_indices() {
            output.removed.push(PlanEntry {
                title: current[index].display_title(),
                state: MatchState::Removed,
            });
        }
        for (node, state) in target.iter().zip(&matched.new_states) {
            output.target.push(PlanEntry {
                title: node.display_title(),
                state: *state,
            });
        }
    }

    let channel = Arc::new(DryRunChannel::new(false));
    reconcile(current, target, config, channel.clone()).await?;
    output.batches = channel.batches();

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Top level:");
    for entry in output.removed.iter().chain(&output.target) {
        println!("  {:<8} {}", format!("{:?}", entry.state), entry.title);
    }
    if output.batches.is_empty() {
        println!("Nothing to send");
    }
    for (index, batch) in output.batches.iter().enumerate() {
        println!("Batch {}:", index + 1);
        for command in batch {
            println!("  {:?} {}", command.function(), command.target_id());
        }
    }
    Ok(())
}

async fn dry_run(
    current: Vec<MenuNode>,
    target: Vec<MenuNode>,
    config: &SyncConfig,
    fail_adds: bool,
    json: bool,
) -> Result<()> {
    let channel = Arc::new(DryRunChannel::new(fail_adds));
    let report = reconcile(current, target, config, channel.clone()).await?;
    let output = DryRunOutput {
        report,
        frames: channel.frames(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for frame in &output.frames {
        println!(
            "#{:<4} {:<16} id {:<10} {} bytes",
            frame.correlation_id,
            format!("{:?}", frame.function),
            frame.target_id,
            frame.bytes
        );
    }

    let stats = &output.report.stats;
    println!(
        "{}: {} kept, {} added, {} removed, {} of {} batches failed, {} bytes in {}ms",
        if output.report.success { "Success" } else { "Partial failure" },
        stats.nodes_kept,
        stats.nodes_added,
        stats.nodes_removed,
        stats.batches_failed,
        stats.batches_sent,
        output.frames.iter().map(|f| f.bytes).sum::<usize>(),
        output.report.duration_ms()
    );
    Ok(())
}
