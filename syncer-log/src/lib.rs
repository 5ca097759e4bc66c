//! Structured logging for file-syncer.
//!
//! [`build_dispatch`] returns a [`Dispatch`] that writes one JSON object per
//! event to stdout and to a [`RotatingFile`]. Nothing is installed globally;
//! callers hand the dispatch to whatever should log through it.

mod error;
pub mod rotation;
pub mod writer;

use std::path::PathBuf;

use tracing::Dispatch;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

pub use error::LogError;
pub use rotation::RotationPolicy;
pub use writer::RotatingFile;

/// Log file written in the working directory unless told otherwise.
pub const DEFAULT_LOG_FILE: &str = "file-syncer.log";

/// Filter used when neither an explicit filter nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct LogOptions {
    pub file: PathBuf,
    pub policy: RotationPolicy,
    /// Takes precedence over `RUST_LOG` when set.
    pub filter: Option<String>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
            policy: RotationPolicy::default(),
            filter: None,
        }
    }
}

/// Build the stdout + rotating-file JSON dispatch described by `opts`.
pub fn build_dispatch(opts: &LogOptions) -> Result<Dispatch, LogError> {
    let file = RotatingFile::open(&opts.file, opts.policy.clone()).map_err(|source| {
        LogError::Open {
            path: opts.file.clone(),
            source,
        }
    })?;

    let filter = match &opts.filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stdout.and(file))
        .finish();

    Ok(Dispatch::new(subscriber))
}
