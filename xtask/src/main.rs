//! Build helpers: man pages and shell completions for `seoscope`.
//!
//! ```text
//! cargo xtask man [--out-dir target/man]
//! cargo xtask completions [--out-dir target/completions]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use clap_complete::Shell;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "xtask", about = "Project automation")]
struct Xtask {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate man pages for the CLI and each subcommand
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out_dir: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/completions")]
        out_dir: PathBuf,
        /// Shells to generate for (default: all supported)
        #[arg(long, value_enum)]
        shell: Vec<Shell>,
    },
}

fn main() -> Result<()> {
    match Xtask::parse().command {
        Task::Man { out_dir } => man(&out_dir),
        Task::Completions { out_dir, shell } => completions(&out_dir, &shell),
    }
}

fn man(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    let command = seoscope::command();
    let name = command.get_name().to_string();

    render_man(&command, &out_dir.join(format!("{name}.1")))?;
    for sub in command.get_subcommands().filter(|s| !s.is_hide_set()) {
        let page_name = format!("{name}-{}", sub.get_name());
        let sub = sub.clone().name(page_name.clone());
        render_man(&sub, &out_dir.join(format!("{page_name}.1")))?;
    }
    println!("man pages written to {}", out_dir.display());
    Ok(())
}

fn render_man(command: &clap::Command, path: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(command.clone()).render(&mut buffer)?;
    fs::write(path, buffer)?;
    Ok(())
}

fn completions(out_dir: &Path, shells: &[Shell]) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    let all = [
        Shell::Bash,
        Shell::Zsh,
        Shell::Fish,
        Shell::PowerShell,
        Shell::Elvish,
    ];
    let shells = if shells.is_empty() { &all[..] } else { shells };

    let mut command = seoscope::command();
    for &shell in shells {
        let path = clap_complete::generate_to(shell, &mut command, "seoscope", out_dir)?;
        println!("{}", path.display());
    }
    Ok(())
}
