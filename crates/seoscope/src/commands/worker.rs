//! Worker command: JSON-lines worker protocol on stdin/stdout.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tracing::{info, instrument};

use seoscope_core::config::Config;
use seoscope_core::{Pluggable, worker};

/// Arguments for the `worker` subcommand.
#[derive(Args, Debug, Default)]
pub struct WorkerArgs {
    /// Initialize from the loaded configuration before reading requests.
    /// The response is sent with id 0.
    #[arg(long)]
    pub preload: bool,
}

/// Serve worker requests until stdin closes.
#[instrument(name = "cmd_worker", skip_all, fields(preload = args.preload))]
pub async fn cmd_worker(args: WorkerArgs, config: &Config) -> anyhow::Result<()> {
    info!("worker listening on stdin");
    let preload = args.preload.then(|| config.analysis.clone());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    worker::serve_lines(Arc::new(Pluggable::new()), preload, stdin, stdout)
        .await
        .context("worker I/O failed")?;
    info!("worker input closed");
    Ok(())
}
