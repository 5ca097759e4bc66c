//! External command execution.
//!
//! Every git step shells out to the system `git` binary. The child sees the
//! ambient environment plus, when an ssh key is configured, one extra
//! `GIT_SSH_COMMAND` entry. The environment is computed by the pure
//! [`build_environment`] and handed to the child whole; the parent process
//! environment is never touched.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use syncer_core::{SyncConfig, SSH_COMMAND_ENV};
use thiserror::Error;

/// Characters preceded by a backslash in [`escape_shell_arg`].
pub const SHELL_SPECIAL_CHARS: &str = " \t\n\r\"'`$\\|&;<>(){}[]!*?";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program is missing or could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("`{command}` exited with {status}: {output}")]
    Failed {
        command: String,
        status: ExitStatus,
        /// Combined stdout and stderr, trimmed.
        output: String,
    },
}

// ---------------------------------------------------------------------------
// Credential override
// ---------------------------------------------------------------------------

/// Backslash-escape every character in [`SHELL_SPECIAL_CHARS`].
///
/// Not idempotent: escaping an escaped string escapes the backslashes again.
pub fn escape_shell_arg(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if SHELL_SPECIAL_CHARS.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// The ssh transport command git runs when a private key is configured.
pub fn git_ssh_command(key: &Path) -> String {
    format!(
        "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
        escape_shell_arg(&key.to_string_lossy())
    )
}

/// Merge `overrides` over `base` into a fresh map. Later entries win.
pub fn build_environment<I, K, V>(
    base: I,
    overrides: &[(OsString, OsString)],
) -> BTreeMap<OsString, OsString>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let mut env: BTreeMap<OsString, OsString> = base
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    for (k, v) in overrides {
        env.insert(k.clone(), v.clone());
    }
    env
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Something that can run a program to completion in a directory.
pub trait CommandRunner {
    /// Run and report only success or failure.
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<(), ProcessError> {
        self.run_capture(dir, program, args).map(drop)
    }

    /// Run and return combined stdout and stderr.
    fn run_capture(&self, dir: &Path, program: &str, args: &[&str])
        -> Result<String, ProcessError>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    env_overrides: Vec<(OsString, OsString)>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route git's ssh transport through `key`.
    pub fn with_ssh_key(mut self, key: &Path) -> Self {
        self.env_overrides
            .push((SSH_COMMAND_ENV.into(), git_ssh_command(key).into()));
        self
    }

    /// Runner carrying the credential override implied by `config`.
    pub fn from_config(config: &SyncConfig) -> Self {
        match config.ssh_key() {
            Some(key) => Self::new().with_ssh_key(key),
            None => Self::new(),
        }
    }

    pub fn env_overrides(&self) -> &[(OsString, OsString)] {
        &self.env_overrides
    }

    fn command(&self, dir: &Path, program: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(dir)
            .env_clear()
            .envs(build_environment(std::env::vars_os(), &self.env_overrides))
            .stdin(Stdio::null());
        cmd
    }
}

impl CommandRunner for ProcessRunner {
    fn run_capture(
        &self,
        dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<String, ProcessError> {
        let command = command_line(program, args);
        tracing::debug!(%command, dir = %dir.display(), "running command");

        let output = self
            .command(dir, program, args)
            .output()
            .map_err(|source| ProcessError::Spawn {
                command: command.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(ProcessError::Failed {
                command,
                status: output.status,
                output: combined.trim().to_owned(),
            });
        }

        tracing::debug!(%command, output = %combined.trim(), "command succeeded");
        Ok(combined)
    }
}

fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_owned();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn escape_leaves_plain_paths_alone() {
        assert_eq!(
            escape_shell_arg("/home/user/.ssh/id_rsa"),
            "/home/user/.ssh/id_rsa"
        );
    }

    #[test]
    fn escape_prefixes_special_characters() {
        assert_eq!(
            escape_shell_arg("/home/user/my files/.ssh/id_rsa"),
            "/home/user/my\\ files/.ssh/id_rsa"
        );
        assert_eq!(
            escape_shell_arg("/home/user's/.ssh/id_rsa"),
            "/home/user\\'s/.ssh/id_rsa"
        );
        assert_eq!(
            escape_shell_arg("/home/user/.ssh/key$file"),
            "/home/user/.ssh/key\\$file"
        );
        assert_eq!(
            escape_shell_arg("/home/user name/.ssh/key file (1).pem"),
            "/home/user\\ name/.ssh/key\\ file\\ \\(1\\).pem"
        );
        assert_eq!(escape_shell_arg("a\"b*c?d!"), "a\\\"b\\*c\\?d\\!");
    }

    #[test]
    fn escape_is_not_idempotent() {
        let once = escape_shell_arg("a b");
        assert_eq!(escape_shell_arg(&once), "a\\\\\\ b");
    }

    #[test]
    fn ssh_command_embeds_escaped_key() {
        assert_eq!(
            git_ssh_command(Path::new("/home/user/.ssh/id_rsa")),
            "ssh -i /home/user/.ssh/id_rsa -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new"
        );
        assert_eq!(
            git_ssh_command(Path::new("/home/user/my files/.ssh/id_rsa")),
            "ssh -i /home/user/my\\ files/.ssh/id_rsa -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new"
        );
        assert_eq!(
            git_ssh_command(Path::new("/home/user's key/.ssh/deploy (prod).pem")),
            "ssh -i /home/user\\'s\\ key/.ssh/deploy\\ \\(prod\\).pem -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new"
        );
    }

    #[test]
    fn build_environment_overrides_without_touching_base() {
        let base = vec![("PATH", "/bin"), ("GIT_SSH_COMMAND", "ssh")];
        let overrides = vec![(
            OsString::from("GIT_SSH_COMMAND"),
            OsString::from("ssh -i key"),
        )];

        let env = build_environment(base.clone(), &overrides);
        assert_eq!(env.get(&OsString::from("PATH")), Some(&OsString::from("/bin")));
        assert_eq!(
            env.get(&OsString::from("GIT_SSH_COMMAND")),
            Some(&OsString::from("ssh -i key"))
        );
        assert_eq!(base[1].1, "ssh");
    }

    #[test]
    fn runner_from_config_adds_ssh_override_only_with_key() {
        let config = SyncConfig::new("push", "/tmp/x", "git@example.com:r.git").unwrap();
        assert!(ProcessRunner::from_config(&config).env_overrides().is_empty());

        let config = config.with_ssh_key(Some("/keys/id rsa"));
        let runner = ProcessRunner::from_config(&config);
        assert_eq!(
            runner.env_overrides(),
            &[(
                OsString::from(SSH_COMMAND_ENV),
                OsString::from(
                    "ssh -i /keys/id\\ rsa -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new"
                )
            )]
        );
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = TempDir::new().unwrap();
        let err = ProcessRunner::new()
            .run(dir.path(), "file-syncer-no-such-program", &["--version"])
            .expect_err("spawn must fail");
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn capture_combines_stdout_and_stderr() {
        let dir = TempDir::new().unwrap();
        let out = ProcessRunner::new()
            .run_capture(dir.path(), "sh", &["-c", "echo out; echo err >&2"])
            .unwrap();
        assert_eq!(out, "out\nerr\n");
    }

    #[test]
    #[cfg(unix)]
    fn non_zero_exit_keeps_output() {
        let dir = TempDir::new().unwrap();
        let err = ProcessRunner::new()
            .run(dir.path(), "sh", &["-c", "echo boom >&2; exit 3"])
            .expect_err("exit 3 must fail");
        match err {
            ProcessError::Failed {
                command,
                status,
                output,
            } => {
                assert_eq!(command, "sh -c echo boom >&2; exit 3");
                assert_eq!(status.code(), Some(3));
                assert_eq!(output, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn child_runs_in_given_directory_with_override() {
        let dir = TempDir::new().unwrap();
        let runner = ProcessRunner::new().with_ssh_key(Path::new("/k/id rsa"));
        let out = runner
            .run_capture(dir.path(), "sh", &["-c", "pwd; printf %s \"$GIT_SSH_COMMAND\""])
            .unwrap();
        let mut lines = out.lines();
        let pwd = lines.next().unwrap();
        assert_eq!(
            std::fs::canonicalize(pwd).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
        assert_eq!(
            lines.next().unwrap(),
            "ssh -i /k/id\\ rsa -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new"
        );
    }
}
