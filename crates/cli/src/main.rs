mod cli;
mod workload;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use taskq_scheduler::{Scheduler, SchedulerOptions};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let base = match &args.config {
        Some(path) => SchedulerOptions::from_file(path)
            .with_context(|| format!("failed to load scheduler options from {path}"))?,
        None => SchedulerOptions::default(),
    };
    let options = base
        .merged(args.limit)
        .context("invalid scheduler options")?;

    let scheduler = Scheduler::new(options).context("failed to create scheduler")?;
    let report = workload::run(&scheduler, &args).await;

    info!(
        elapsed_ms = report.elapsed_ms as u64,
        fulfilled = report.stats.fulfilled,
        rejected = report.stats.rejected,
        "workload finished"
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
