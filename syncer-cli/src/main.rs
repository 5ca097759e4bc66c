//! file-syncer: mirror a local folder into a git repository, or back.
//!
//! # Usage
//!
//! ```text
//! file-syncer --mode push --folder <path> --repo <url> [--branch main] [--ssh-key <path>]
//! file-syncer --mode pull --folder <path> --repo <url> [--branch main] [--ssh-key <path>]
//! ```
//!
//! Exit status is 0 on success and 1 on any validation or sync failure.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use syncer_core::{SyncConfig, DEFAULT_BRANCH};
use syncer_log::{LogOptions, DEFAULT_LOG_FILE};
use syncer_sync::{SyncOutcome, Syncer};
use tracing::Dispatch;

const EXAMPLES: &str = "\
Examples:
  Push files to repository:
    file-syncer --mode push --folder ./myfiles --repo https://github.com/user/repo.git

  Pull files from repository:
    file-syncer --mode pull --folder ./myfiles --repo https://github.com/user/repo.git

  Use custom SSH key:
    file-syncer --mode push --folder ./myfiles --repo git@github.com:user/repo.git --ssh-key ~/.ssh/id_rsa";

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "file-syncer",
    version,
    about = "Sync a local folder with a git repository",
    long_about = None,
    after_help = EXAMPLES,
)]
struct Cli {
    /// Operation mode: 'push' or 'pull'.
    #[arg(long)]
    mode: Option<String>,

    /// Path to the folder to sync.
    #[arg(long)]
    folder: Option<String>,

    /// Git repository URL.
    #[arg(long)]
    repo: Option<String>,

    /// Git branch to use.
    #[arg(long, default_value = DEFAULT_BRANCH)]
    branch: String,

    /// Path to SSH private key for git operations.
    #[arg(long = "ssh-key", value_name = "PATH")]
    ssh_key: Option<String>,

    /// Log file, rotated at 10 MiB with 3 compressed backups kept up to 28 days.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

impl Cli {
    fn config(&self) -> Result<SyncConfig, syncer_core::ConfigError> {
        let config = SyncConfig::new(
            self.mode.as_deref().unwrap_or_default(),
            self.folder.as_deref().unwrap_or_default(),
            self.repo.as_deref().unwrap_or_default(),
        )?;
        Ok(config
            .with_branch(self.branch.as_str())
            .with_ssh_key(self.ssh_key.as_deref()))
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let log_options = LogOptions {
        file: cli.log_file.clone(),
        ..LogOptions::default()
    };
    let dispatch = match syncer_log::build_dispatch(&log_options) {
        Ok(dispatch) => dispatch,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let config = match cli.config() {
        Ok(config) => config,
        Err(err) => {
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::error!(error = %err, "configuration validation failed");
            });
            eprintln!("{}", Cli::command().render_help());
            return ExitCode::FAILURE;
        }
    };

    match run(config, &dispatch) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let chain = format!("{err:#}");
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::error!(error = %chain, "operation failed");
            });
            ExitCode::FAILURE
        }
    }
}

fn run(config: SyncConfig, dispatch: &Dispatch) -> Result<()> {
    let mode = config.mode();
    let outcome = Syncer::new(config)
        .with_dispatch(dispatch.clone())
        .run()
        .with_context(|| format!("{mode} failed"))?;

    tracing::dispatcher::with_default(dispatch, || match outcome {
        SyncOutcome::Pushed { stats, subject } => {
            tracing::info!(files = stats.total(), %subject, "sync finished");
        }
        SyncOutcome::NoChanges => tracing::info!(files = 0, "sync finished"),
        SyncOutcome::Pulled { summary } => {
            tracing::info!(
                files = summary.files,
                directories = summary.directories,
                "sync finished"
            );
        }
    });
    Ok(())
}
