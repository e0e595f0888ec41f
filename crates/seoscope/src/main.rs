//! seoscope CLI
#![deny(unsafe_code)]

use std::future::Future;

use anyhow::Context;
use clap::Parser;
use seoscope::{Cli, Commands, commands, utf8};
use tracing::debug;

mod observability;

fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    cli.color.apply();

    if cli.version_only {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // arg_required_else_help ensures we have --version-only or a subcommand
    let Some(command) = cli.command.take() else {
        return Ok(());
    };

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = utf8(cwd).context("current directory is not valid UTF-8")?;
    let (config, sources) = cli
        .config_loader(&cwd)?
        .load()
        .context("failed to load configuration")?;

    let obs_config = observability::ObservabilityConfig::from_env_with_overrides(
        config.log_dir.as_ref().map(|dir| dir.as_std_path().to_path_buf()),
    );
    let quiet = cli.quiet || (command.owns_stdout() && cli.verbose == 0);
    let env_filter = observability::env_filter(quiet, cli.verbose, config.log_level.as_str());
    let _guard = observability::init_observability(&obs_config, env_filter)
        .context("failed to initialize logging/tracing")?;

    debug!(
        command = ?command,
        config_files = sources.all_files().count(),
        locale = %config.analysis.locale,
        profile = %config.analysis.profile,
        "CLI initialized"
    );

    let result = match command {
        Commands::Analyze(args) => {
            commands::analyze::cmd_analyze(args, cli.json, &config, config.input_limit())
        }
        Commands::Assessments(args) => {
            commands::assessments::cmd_assessments(args, cli.json, &config)
        }
        Commands::Worker(args) => block_on(commands::worker::cmd_worker(args, &config)),
        Commands::Info(args) => {
            let log_file = obs_config.log_file_path();
            commands::info::cmd_info(args, cli.json, &config, &sources, log_file.as_deref())
        }
        #[cfg(feature = "mcp")]
        Commands::Serve(args) => block_on(commands::serve::cmd_serve(args, &config)),
    };
    if let Err(ref err) = result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}

/// Run an async command to completion on a fresh runtime.
fn block_on<F>(command: F) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    tokio::runtime::Runtime::new()
        .context("failed to create async runtime")?
        .block_on(command)
}
