//! Validation tests for `SyncConfig::new`.
//!
//! Each `#[case]` is isolated; there is no shared state.

use rstest::rstest;
use syncer_core::{ConfigError, Mode, SyncConfig};

const HTTPS_REPO: &str = "https://github.com/user/repo.git";
const SSH_REPO: &str = "git@github.com:user/repo.git";

// ---------------------------------------------------------------------------
// Accepted configs
// ---------------------------------------------------------------------------

#[rstest]
#[case("push", Mode::Push, HTTPS_REPO)]
#[case("pull", Mode::Pull, HTTPS_REPO)]
#[case("push", Mode::Push, SSH_REPO)]
fn valid_configs(#[case] raw_mode: &str, #[case] mode: Mode, #[case] repo: &str) {
    let config = SyncConfig::new(raw_mode, "/tmp/test", repo)
        .unwrap_or_else(|e| panic!("[{raw_mode}] rejected: {e}"));
    assert_eq!(config.mode(), mode);
    assert_eq!(config.remote_url(), repo);
    assert_eq!(config.local_path().to_str(), Some("/tmp/test"));
}

#[test]
fn valid_config_with_ssh_key() {
    let config = SyncConfig::new("push", "/tmp/test", SSH_REPO)
        .expect("valid")
        .with_branch("main")
        .with_ssh_key(Some("/home/user/.ssh/id_rsa"));
    assert!(config.ssh_key().is_some());
}

// ---------------------------------------------------------------------------
// Rejected configs
// ---------------------------------------------------------------------------

#[rstest]
#[case("invalid", "/tmp/test", HTTPS_REPO, ConfigError::InvalidMode("invalid".into()))]
#[case("", "/tmp/test", HTTPS_REPO, ConfigError::InvalidMode(String::new()))]
#[case("push", "", HTTPS_REPO, ConfigError::MissingFolder)]
#[case("pull", "/tmp/test", "", ConfigError::MissingRepo)]
#[case("sync", "", "", ConfigError::InvalidMode("sync".into()))]
#[case("push", "", "", ConfigError::MissingFolder)]
fn invalid_configs(
    #[case] mode: &str,
    #[case] folder: &str,
    #[case] repo: &str,
    #[case] expected: ConfigError,
) {
    let err = SyncConfig::new(mode, folder, repo).expect_err("must be rejected");
    assert_eq!(err, expected);
}

#[test]
fn error_messages_name_the_missing_flag() {
    assert_eq!(
        ConfigError::MissingFolder.to_string(),
        "folder path is required"
    );
    assert_eq!(
        ConfigError::MissingRepo.to_string(),
        "repository URL is required"
    );
    assert!(ConfigError::InvalidMode("x".into())
        .to_string()
        .starts_with("mode must be either 'push' or 'pull'"));
}
