//! file-syncer core library: sync configuration and its validation.
//!
//! - [`config`]: [`Mode`], [`SyncConfig`] and well-known names
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;

pub use config::{
    Mode, SyncConfig, DEFAULT_BRANCH, METADATA_DIR, REMOTE_NAME, SCRATCH_PREFIX, SSH_COMMAND_ENV,
};
pub use error::ConfigError;
