//! Size-based log rotation with compressed, age-limited backups.
//!
//! Backups are numbered, newest first:
//!   file-syncer.log → file-syncer.log.1.zst → … → file-syncer.log.3.zst
//!
//! Backups whose modification time is older than the policy's `max_age` are
//! deleted after each rotation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Maximum log file size before rotation (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated backup files to keep.
pub const MAX_BACKUPS: usize = 3;

/// Backups older than this are deleted (28 days).
pub const MAX_AGE: Duration = Duration::from_secs(28 * 24 * 60 * 60);

const ZSTD_LEVEL: i32 = 3;

/// When to rotate and what to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub max_backups: usize,
    pub max_age: Option<Duration>,
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_LOG_BYTES,
            max_backups: MAX_BACKUPS,
            max_age: Some(MAX_AGE),
            compress: true,
        }
    }
}

/// Rotate `log_path` if its size has reached `policy.max_bytes`.
///
/// Returns `true` if rotation occurred, `false` if the file was under the
/// threshold (or did not exist yet).
pub fn rotate_if_needed(log_path: &Path, policy: &RotationPolicy) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    if size < policy.max_bytes {
        return Ok(false);
    }

    rotate(log_path, policy)?;
    Ok(true)
}

/// Unconditionally rotate `log_path`.
///
/// Sequence:
///   backup `<max_backups>` deleted
///   backup `n` → `n+1` for n = max_backups-1 … 1
///   live file → backup `1` (compressed when the policy says so)
///   fresh empty live file created
///   expired backups pruned
pub fn rotate(log_path: &Path, policy: &RotationPolicy) -> io::Result<()> {
    if policy.max_backups == 0 {
        fs::File::create(log_path)?;
        return Ok(());
    }

    let oldest = backup_path(log_path, policy.max_backups, policy.compress);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    for n in (1..policy.max_backups).rev() {
        let src = backup_path(log_path, n, policy.compress);
        if src.exists() {
            fs::rename(&src, backup_path(log_path, n + 1, policy.compress))?;
        }
    }

    let first = backup_path(log_path, 1, policy.compress);
    if policy.compress {
        compress_into(log_path, &first)?;
        fs::remove_file(log_path)?;
    } else {
        fs::rename(log_path, &first)?;
    }

    fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(log_path)?;

    prune_expired(log_path, policy)?;
    Ok(())
}

/// Delete backups older than `policy.max_age`. Returns how many were removed.
pub fn prune_expired(log_path: &Path, policy: &RotationPolicy) -> io::Result<usize> {
    let Some(max_age) = policy.max_age else {
        return Ok(0);
    };
    let now = SystemTime::now();
    let mut removed = 0;

    for n in 1..=policy.max_backups {
        let path = backup_path(log_path, n, policy.compress);
        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err),
        };
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }

    Ok(removed)
}

/// Path of the `n`-th backup of `base`, e.g. `file-syncer.log.2.zst`.
pub fn backup_path(base: &Path, n: usize, compressed: bool) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("file-syncer.log");
    if compressed {
        base.with_file_name(format!("{name}.{n}.zst"))
    } else {
        base.with_file_name(format!("{name}.{n}"))
    }
}

fn compress_into(src: &Path, dst: &Path) -> io::Result<()> {
    let input = fs::File::open(src)?;
    let output = fs::File::create(dst)?;
    zstd::stream::copy_encode(input, output, ZSTD_LEVEL)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_policy(compress: bool) -> RotationPolicy {
        RotationPolicy {
            max_bytes: 1024,
            max_backups: MAX_BACKUPS,
            max_age: Some(MAX_AGE),
            compress,
        }
    }

    fn make_log(dir: &TempDir, name: &str, size_bytes: usize) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, vec![b'x'; size_bytes]).unwrap();
        path
    }

    #[test]
    fn rotation_noop_when_file_under_threshold() {
        let dir = TempDir::new().unwrap();
        let log = make_log(&dir, "file-syncer.log", 100);
        let rotated = rotate_if_needed(&log, &small_policy(true)).unwrap();
        assert!(!rotated, "should not rotate a small file");
        assert!(!backup_path(&log, 1, true).exists());
    }

    #[test]
    fn rotation_skips_missing_file_gracefully() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("nonexistent.log");
        assert!(!rotate_if_needed(&log, &small_policy(true)).unwrap());
    }

    #[test]
    fn rotation_compresses_backup_and_truncates_live_file() {
        let dir = TempDir::new().unwrap();
        let log = make_log(&dir, "file-syncer.log", 4096);

        assert!(rotate_if_needed(&log, &small_policy(true)).unwrap());

        assert_eq!(fs::metadata(&log).unwrap().len(), 0, "live log should be empty");
        let backup = backup_path(&log, 1, true);
        let compressed = fs::read(&backup).unwrap();
        assert!(compressed.len() < 4096, "backup should be compressed");
        let restored = zstd::decode_all(compressed.as_slice()).unwrap();
        assert_eq!(restored, vec![b'x'; 4096]);
    }

    #[test]
    fn uncompressed_policy_renames_backup() {
        let dir = TempDir::new().unwrap();
        let log = make_log(&dir, "file-syncer.log", 2048);

        rotate(&log, &small_policy(false)).unwrap();

        assert_eq!(fs::read(backup_path(&log, 1, false)).unwrap().len(), 2048);
        assert!(!backup_path(&log, 1, true).exists());
    }

    #[test]
    fn max_backups_are_capped() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("file-syncer.log");

        for round in 1..=MAX_BACKUPS + 2 {
            fs::write(&log, vec![b'0' + round as u8; 2048]).unwrap();
            rotate(&log, &small_policy(false)).unwrap();
        }

        for n in 1..=MAX_BACKUPS {
            assert!(backup_path(&log, n, false).exists(), "backup .{n} should exist");
        }
        assert!(!backup_path(&log, MAX_BACKUPS + 1, false).exists());
        let newest = fs::read(backup_path(&log, 1, false)).unwrap();
        assert_eq!(newest[0], b'0' + (MAX_BACKUPS + 2) as u8);
    }

    #[test]
    fn expired_backups_are_pruned() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("file-syncer.log");
        let policy = small_policy(false);

        let stale = backup_path(&log, 2, false);
        fs::write(&stale, "old").unwrap();
        let long_ago = SystemTime::now() - MAX_AGE - Duration::from_secs(3600);
        filetime::set_file_mtime(&stale, filetime::FileTime::from_system_time(long_ago))
            .unwrap();
        let fresh = backup_path(&log, 1, false);
        fs::write(&fresh, "new").unwrap();

        assert_eq!(prune_expired(&log, &policy).unwrap(), 1);
        assert!(!stale.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn zero_backups_just_truncates() {
        let dir = TempDir::new().unwrap();
        let log = make_log(&dir, "file-syncer.log", 2048);
        let policy = RotationPolicy {
            max_backups: 0,
            ..small_policy(true)
        };

        rotate(&log, &policy).unwrap();

        assert_eq!(fs::metadata(&log).unwrap().len(), 0);
        assert!(!backup_path(&log, 1, true).exists());
    }
}
