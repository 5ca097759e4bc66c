use std::path::PathBuf;

use thiserror::Error;

/// Failure to set up the log sink.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
