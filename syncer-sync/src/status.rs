//! `git status --porcelain` parsing and commit message synthesis.
//!
//! Each porcelain line is a two-character code followed by whitespace and a
//! path. Classification, first match wins:
//!
//! 1. code starts with `A` → added
//! 2. code is `??` → added (untracked)
//! 3. code contains `M` → modified
//! 4. code contains `D` → deleted
//!
//! Anything else is ignored. Column position of `M`/`D` does not matter.

use std::fmt;

/// Subject used when status output had lines but none were classified.
pub const FALLBACK_SUBJECT: &str = "Sync files from local folder";

/// Paths grouped by change kind, in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileChangeStats {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl FileChangeStats {
    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Classify every porcelain line in `text`.
pub fn parse_status(text: &str) -> FileChangeStats {
    let mut stats = FileChangeStats::default();

    for line in text.lines() {
        let (Some(code), Some(rest)) = (line.get(..2), line.get(2..)) else {
            continue;
        };
        let path = rest.trim_start();
        if path.is_empty() {
            continue;
        }

        if code.starts_with('A') || code == "??" {
            stats.added.push(path.to_owned());
        } else if code.contains('M') {
            stats.modified.push(path.to_owned());
        } else if code.contains('D') {
            stats.deleted.push(path.to_owned());
        }
    }

    stats
}

/// A commit subject plus an optional multi-line body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub subject: String,
    pub body: String,
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            f.write_str(&self.subject)
        } else {
            write!(f, "{}\n\n{}", self.subject, self.body)
        }
    }
}

/// Render a subject like `Sync 4 files (2 added, 1 modified, 1 deleted)` and
/// a body listing each path under its category header.
pub fn generate_commit_message(stats: &FileChangeStats) -> CommitMessage {
    if stats.is_empty() {
        return CommitMessage {
            subject: FALLBACK_SUBJECT.to_owned(),
            body: String::new(),
        };
    }

    let categories = [
        ("added", "Added files:", '+', &stats.added),
        ("modified", "Modified files:", '~', &stats.modified),
        ("deleted", "Deleted files:", '-', &stats.deleted),
    ];

    let mut breakdown = Vec::new();
    let mut blocks = Vec::new();
    for (label, header, marker, paths) in categories {
        if paths.is_empty() {
            continue;
        }
        breakdown.push(format!("{} {label}", paths.len()));

        let mut block = String::from(header);
        for path in paths {
            block.push_str(&format!("\n  {marker} {path}"));
        }
        blocks.push(block);
    }

    let total = stats.total();
    let noun = if total == 1 { "file" } else { "files" };

    CommitMessage {
        subject: format!("Sync {total} {noun} ({})", breakdown.join(", ")),
        body: blocks.join("\n\n"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
