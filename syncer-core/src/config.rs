//! Sync configuration.
//!
//! A [`SyncConfig`] can only be obtained through [`SyncConfig::new`], which
//! enforces that the mode is known and that folder and repository are
//! non-empty. Once built it is never mutated in place.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;

/// Branch used when none is given.
pub const DEFAULT_BRANCH: &str = "main";

/// The version-control metadata directory, never copied in either direction.
pub const METADATA_DIR: &str = ".git";

/// Prefix for scratch directories created under the system temp root.
pub const SCRATCH_PREFIX: &str = "file-syncer-";

/// Remote that push targets.
pub const REMOTE_NAME: &str = "origin";

/// Environment variable carrying the alternate ssh transport command.
pub const SSH_COMMAND_ENV: &str = "GIT_SSH_COMMAND";

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Direction of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Publish the local folder into the repository.
    Push,
    /// Materialize the repository into the local folder.
    Pull,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Push => write!(f, "push"),
            Mode::Pull => write!(f, "pull"),
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Mode::Push),
            "pull" => Ok(Mode::Pull),
            other => Err(ConfigError::InvalidMode(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Validated parameters for one push or pull run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    mode: Mode,
    local_path: PathBuf,
    remote_url: String,
    branch: String,
    ssh_key: Option<PathBuf>,
}

impl SyncConfig {
    /// Validate raw inputs. Checks run in order: mode, folder, repository.
    pub fn new(mode: &str, local_path: &str, remote_url: &str) -> Result<Self, ConfigError> {
        let mode = mode.parse::<Mode>()?;
        if local_path.is_empty() {
            return Err(ConfigError::MissingFolder);
        }
        if remote_url.is_empty() {
            return Err(ConfigError::MissingRepo);
        }

        Ok(Self {
            mode,
            local_path: PathBuf::from(local_path),
            remote_url: remote_url.to_owned(),
            branch: DEFAULT_BRANCH.to_owned(),
            ssh_key: None,
        })
    }

    /// Target branch. An empty name keeps [`DEFAULT_BRANCH`].
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        if !branch.is_empty() {
            self.branch = branch;
        }
        self
    }

    /// Private key handed to ssh. An empty path means no key.
    pub fn with_ssh_key(mut self, key: Option<impl Into<PathBuf>>) -> Self {
        self.ssh_key = key
            .map(Into::into)
            .filter(|p: &PathBuf| !p.as_os_str().is_empty());
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn ssh_key(&self) -> Option<&Path> {
        self.ssh_key.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_display_matches_flag_value() {
        assert_eq!(Mode::Push.to_string(), "push");
        assert_eq!(Mode::Pull.to_string(), "pull");
    }

    #[test]
    fn mode_parse_is_case_sensitive() {
        assert_eq!("pull".parse::<Mode>(), Ok(Mode::Pull));
        assert_eq!(
            "PUSH".parse::<Mode>(),
            Err(ConfigError::InvalidMode("PUSH".into()))
        );
    }

    #[test]
    fn branch_defaults_to_main() {
        let config = SyncConfig::new("push", "/tmp/test", "https://example.com/r.git").unwrap();
        assert_eq!(config.branch(), DEFAULT_BRANCH);

        let config = config.with_branch("");
        assert_eq!(config.branch(), DEFAULT_BRANCH);

        let config = config.with_branch("release");
        assert_eq!(config.branch(), "release");
    }

    #[test]
    fn empty_ssh_key_means_none() {
        let config = SyncConfig::new("pull", "/tmp/test", "git@example.com:r.git")
            .unwrap()
            .with_ssh_key(Some(""));
        assert!(config.ssh_key().is_none());

        let config = config.with_ssh_key(Some("/home/user/.ssh/id_rsa"));
        assert_eq!(config.ssh_key(), Some(Path::new("/home/user/.ssh/id_rsa")));
    }
}
