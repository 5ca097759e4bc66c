//! Additive tree copy between the local folder and a scratch clone.
//!
//! Every entry under the source is mirrored to the same relative path under
//! the destination. Entries named [`METADATA_DIR`] are pruned, so the
//! destination never gains a `.git` at any depth. Nothing under the
//! destination is ever removed; files absent from the source are left alone.
//!
//! Entries are visited in file-name order, parents before children.

use std::fs;
use std::path::{Path, PathBuf};

use syncer_core::METADATA_DIR;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Failure while copying a tree.
#[derive(Debug, Error)]
pub enum CopyError {
    /// The source tree could not be read.
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CopyError {
    CopyError::Io {
        path: path.into(),
        source,
    }
}

/// What [`sync_tree`] created or overwrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopySummary {
    pub directories: usize,
    pub files: usize,
    pub links: usize,
}

/// Copy `source` into `dest`, preserving permission bits.
///
/// Directories are created owner-writable and receive the source
/// directory's permissions only after everything beneath them is copied, so
/// read-only source directories can still be filled. Files are created or
/// truncated and receive the source file's permissions; an existing
/// destination file the owner cannot write is replaced. Symbolic links are
/// recreated as links on Unix.
pub fn sync_tree(source: &Path, dest: &Path) -> Result<CopySummary, CopyError> {
    let mut summary = CopySummary::default();
    let mut pending = Vec::new();

    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_metadata(e));

    for entry in walker {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let permissions = entry.metadata()?.permissions();
            prepare_dir(&target, &permissions)?;
            pending.push(PendingDir {
                path: target,
                permissions,
            });
            summary.directories += 1;
        } else if file_type.is_file() {
            copy_file(entry.path(), &target)?;
            summary.files += 1;
        } else if file_type.is_symlink() && copy_symlink(entry.path(), &target)? {
            summary.links += 1;
        }
    }

    // Parents precede children in the walk; seal deepest first.
    for dir in pending.iter().rev() {
        fs::set_permissions(&dir.path, dir.permissions.clone())
            .map_err(|e| io_err(&dir.path, e))?;
    }

    tracing::debug!(
        source = %source.display(),
        destination = %dest.display(),
        directories = summary.directories,
        files = summary.files,
        links = summary.links,
        "tree copied"
    );
    Ok(summary)
}

/// Destination directory waiting for its source permissions.
struct PendingDir {
    path: PathBuf,
    permissions: fs::Permissions,
}

fn is_metadata(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name() == METADATA_DIR
}

/// Make `target` an owner-writable directory, creating it if needed.
#[cfg(unix)]
fn prepare_dir(target: &Path, permissions: &fs::Permissions) -> Result<(), CopyError> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    let writable = (permissions.mode() & 0o7777) | 0o700;
    let result = match fs::metadata(target) {
        Ok(meta) if meta.is_dir() => {
            fs::set_permissions(target, fs::Permissions::from_mode(writable))
        }
        _ => fs::DirBuilder::new()
            .recursive(true)
            .mode(writable)
            .create(target),
    };
    result.map_err(|e| io_err(target, e))
}

#[cfg(not(unix))]
fn prepare_dir(target: &Path, _permissions: &fs::Permissions) -> Result<(), CopyError> {
    fs::create_dir_all(target).map_err(|e| io_err(target, e))
}

fn copy_file(from: &Path, to: &Path) -> Result<(), CopyError> {
    match fs::symlink_metadata(to) {
        Ok(meta) if meta.is_file() && !owner_writable(&meta) => {
            fs::remove_file(to).map_err(|e| io_err(to, e))?;
        }
        _ => {}
    }
    fs::copy(from, to).map_err(|e| io_err(to, e))?;
    Ok(())
}

#[cfg(unix)]
fn owner_writable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o200 != 0
}

#[cfg(not(unix))]
fn owner_writable(meta: &fs::Metadata) -> bool {
    !meta.permissions().readonly()
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<bool, CopyError> {
    let points_to = fs::read_link(link).map_err(|e| io_err(link, e))?;
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(target).map_err(|e| io_err(target, e))?;
        }
        Ok(_) => fs::remove_file(target).map_err(|e| io_err(target, e))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(target, e)),
    }
    std::os::unix::fs::symlink(&points_to, target).map_err(|e| io_err(target, e))?;
    Ok(true)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, _target: &Path) -> Result<bool, CopyError> {
    tracing::warn!(path = %link.display(), "skipping symbolic link");
    Ok(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
