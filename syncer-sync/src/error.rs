//! Error types for syncer-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::copier::CopyError;
use crate::process::ProcessError;

/// Step of the push/pull sequence that ran an external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clone,
    CreateBranch,
    Status,
    Add,
    Commit,
    Push,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Clone => "clone repository",
            Stage::CreateBranch => "create branch",
            Stage::Status => "check git status",
            Stage::Add => "add changes",
            Stage::Commit => "commit changes",
            Stage::Push => "push changes",
        };
        f.write_str(s)
    }
}

/// All errors that can arise from a push or pull run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The folder path could not be made absolute.
    #[error("failed to resolve folder path {path}: {source}")]
    PathResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Push requires the local folder to exist.
    #[error("folder does not exist: {path}")]
    FolderNotFound { path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create scratch workspace: {0}")]
    Workspace(#[source] std::io::Error),

    /// Copying between the local folder and the scratch clone failed.
    #[error("failed to sync files from {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: CopyError,
    },

    /// An external command failed, tagged with the step that ran it.
    #[error("failed to {stage}: {source}")]
    Process {
        stage: Stage,
        #[source]
        source: ProcessError,
    },

    /// Push could clone neither the branch nor the default branch.
    #[error("failed to clone repository {url}: {source}")]
    CloneFallbackExhausted {
        url: String,
        #[source]
        source: ProcessError,
    },
}

impl SyncError {
    pub(crate) fn process(stage: Stage) -> impl FnOnce(ProcessError) -> SyncError {
        move |source| SyncError::Process { stage, source }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
