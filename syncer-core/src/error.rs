//! Error types for syncer-core.

use thiserror::Error;

/// Reasons a [`SyncConfig`](crate::SyncConfig) can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `--mode` was missing or not one of `push` / `pull`.
    #[error("mode must be either 'push' or 'pull' (got '{0}')")]
    InvalidMode(String),

    #[error("folder path is required")]
    MissingFolder,

    #[error("repository URL is required")]
    MissingRepo,
}
