//! Push and pull state machines.
//!
//! ## Push
//!
//! 1. Resolve the folder to an absolute path; it must exist.
//! 2. Create a scratch workspace.
//! 3. `clone --branch <branch> <url> .`; on failure `clone <url> .` then
//!    `checkout -b <branch>` (brand-new branch on the remote).
//! 4. Copy the folder into the workspace.
//! 5. `status --porcelain`; empty output ends the run with no commit.
//! 6. `add -A`, `commit -m <message>`, `push origin <branch>`.
//!
//! ## Pull
//!
//! 1. Resolve the folder, creating it if absent.
//! 2. Create a scratch workspace.
//! 3. `clone --branch <branch> <url> .` (no fallback).
//! 4. Copy the workspace into the folder, minus `.git`.
//!
//! The workspace is closed, and therefore removed, on every return path.

use std::fs;
use std::path::{Path, PathBuf};

use syncer_core::{Mode, SyncConfig, REMOTE_NAME};
use tracing::Dispatch;

use crate::copier::{sync_tree, CopySummary};
use crate::error::{io_err, Stage, SyncError};
use crate::process::{CommandRunner, ProcessRunner};
use crate::status::{generate_commit_message, parse_status, FileChangeStats};
use crate::workspace::ScratchWorkspace;

const GIT: &str = "git";

/// How a run finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Changes were committed and pushed.
    Pushed {
        stats: FileChangeStats,
        subject: String,
    },
    /// Push found nothing to commit.
    NoChanges,
    /// The repository was copied into the local folder.
    Pulled { summary: CopySummary },
}

/// Runs one push or pull for a validated config.
pub struct Syncer<R = ProcessRunner> {
    config: SyncConfig,
    runner: R,
    dispatch: Option<Dispatch>,
}

impl Syncer<ProcessRunner> {
    /// Syncer driving the system `git`, with the config's ssh key applied.
    pub fn new(config: SyncConfig) -> Self {
        let runner = ProcessRunner::from_config(&config);
        Self {
            config,
            runner,
            dispatch: None,
        }
    }
}

impl<R: CommandRunner> Syncer<R> {
    /// Swap the command runner.
    pub fn with_runner<T: CommandRunner>(self, runner: T) -> Syncer<T> {
        Syncer {
            config: self.config,
            runner,
            dispatch: self.dispatch,
        }
    }

    /// Emit events to `dispatch` while running instead of the ambient default.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn run(&self) -> Result<SyncOutcome, SyncError> {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, || self.run_inner()),
            None => self.run_inner(),
        }
    }

    fn run_inner(&self) -> Result<SyncOutcome, SyncError> {
        tracing::info!(
            mode = %self.config.mode(),
            folder = %self.config.local_path().display(),
            repository = self.config.remote_url(),
            branch = self.config.branch(),
            "file syncer started"
        );

        match self.config.mode() {
            Mode::Push => self.push(),
            Mode::Pull => self.pull(),
        }
    }

    // -----------------------------------------------------------------------
    // Push
    // -----------------------------------------------------------------------

    fn push(&self) -> Result<SyncOutcome, SyncError> {
        tracing::info!("starting push operation");

        let folder = resolve(self.config.local_path())?;
        let exists = folder.try_exists().map_err(|e| io_err(&folder, e))?;
        if !exists {
            return Err(SyncError::FolderNotFound { path: folder });
        }

        let workspace = ScratchWorkspace::create()?;
        let outcome = self.push_in(&folder, workspace.path());
        workspace.close();
        outcome
    }

    fn push_in(&self, folder: &Path, dir: &Path) -> Result<SyncOutcome, SyncError> {
        self.clone_for_push(dir)?;

        tracing::info!(
            source = %folder.display(),
            destination = %dir.display(),
            "syncing files"
        );
        sync_tree(folder, dir).map_err(|source| SyncError::Copy {
            from: folder.to_path_buf(),
            to: dir.to_path_buf(),
            source,
        })?;

        let status = self
            .runner
            .run_capture(dir, GIT, &["status", "--porcelain"])
            .map_err(SyncError::process(Stage::Status))?;
        if status.trim().is_empty() {
            tracing::info!("no changes to push");
            return Ok(SyncOutcome::NoChanges);
        }
        let stats = parse_status(&status);

        tracing::info!("adding changes");
        self.runner
            .run(dir, GIT, &["add", "-A"])
            .map_err(SyncError::process(Stage::Add))?;

        let message = generate_commit_message(&stats);
        tracing::info!(
            subject = %message.subject,
            added = stats.added.len(),
            modified = stats.modified.len(),
            deleted = stats.deleted.len(),
            "committing changes"
        );
        let text = message.to_string();
        self.runner
            .run(dir, GIT, &["commit", "-m", &text])
            .map_err(SyncError::process(Stage::Commit))?;

        let branch = self.config.branch();
        tracing::info!(branch, "pushing to remote");
        self.runner
            .run(dir, GIT, &["push", REMOTE_NAME, branch])
            .map_err(SyncError::process(Stage::Push))?;

        tracing::info!("push completed successfully");
        Ok(SyncOutcome::Pushed {
            stats,
            subject: message.subject,
        })
    }

    fn clone_for_push(&self, dir: &Path) -> Result<(), SyncError> {
        let url = self.config.remote_url();
        let branch = self.config.branch();

        tracing::info!(url, branch, "cloning repository");
        let Err(err) = self
            .runner
            .run(dir, GIT, &["clone", "--branch", branch, url, "."])
        else {
            return Ok(());
        };

        tracing::info!(branch, error = %err, "branch not found, cloning default branch");
        clear_dir(dir)?;
        self.runner
            .run(dir, GIT, &["clone", url, "."])
            .map_err(|source| SyncError::CloneFallbackExhausted {
                url: url.to_owned(),
                source,
            })?;
        self.runner
            .run(dir, GIT, &["checkout", "-b", branch])
            .map_err(SyncError::process(Stage::CreateBranch))
    }

    // -----------------------------------------------------------------------
    // Pull
    // -----------------------------------------------------------------------

    fn pull(&self) -> Result<SyncOutcome, SyncError> {
        tracing::info!("starting pull operation");

        let folder = resolve(self.config.local_path())?;
        fs::create_dir_all(&folder).map_err(|e| io_err(&folder, e))?;

        let workspace = ScratchWorkspace::create()?;
        let outcome = self.pull_in(&folder, workspace.path());
        workspace.close();
        outcome
    }

    fn pull_in(&self, folder: &Path, dir: &Path) -> Result<SyncOutcome, SyncError> {
        let url = self.config.remote_url();
        let branch = self.config.branch();
        tracing::info!(url, branch, "cloning repository");
        self.runner
            .run(dir, GIT, &["clone", "--branch", branch, url, "."])
            .map_err(SyncError::process(Stage::Clone))?;

        tracing::info!(
            source = %dir.display(),
            destination = %folder.display(),
            "syncing files"
        );
        let summary = sync_tree(dir, folder).map_err(|source| SyncError::Copy {
            from: dir.to_path_buf(),
            to: folder.to_path_buf(),
            source,
        })?;

        tracing::info!(files = summary.files, "pull completed successfully");
        Ok(SyncOutcome::Pulled { summary })
    }
}

fn resolve(path: &Path) -> Result<PathBuf, SyncError> {
    std::path::absolute(path).map_err(|source| SyncError::PathResolution {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove whatever a failed clone left behind, keeping `dir` itself.
fn clear_dir(dir: &Path) -> Result<(), SyncError> {
    for entry in fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let path = entry.map_err(|e| io_err(dir, e))?.path();
        let removed = if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| io_err(&path, e))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
