//! # syncer-sync
//!
//! Push/pull orchestration between a local folder and a git remote.
//!
//! Build a [`Syncer`] from a validated [`syncer_core::SyncConfig`] and call
//! [`Syncer::run`]. The pieces it sequences are usable on their own:
//! [`copier::sync_tree`], [`process::ProcessRunner`],
//! [`status::parse_status`] / [`status::generate_commit_message`] and
//! [`workspace::ScratchWorkspace`].

pub mod copier;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod status;
pub mod workspace;

pub use copier::{sync_tree, CopyError, CopySummary};
pub use error::{Stage, SyncError};
pub use pipeline::{SyncOutcome, Syncer};
pub use process::{CommandRunner, ProcessError, ProcessRunner};
pub use status::{generate_commit_message, parse_status, CommitMessage, FileChangeStats};
pub use workspace::ScratchWorkspace;
