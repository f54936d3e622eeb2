//! The single place where generated sources touch the filesystem.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::error::{GenerateError, Result};

/// What to do when an artifact's target path already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Leave the existing file untouched
    SkipIfExists,
    /// Copy the existing file aside with a timestamped suffix, then overwrite
    BackupThenOverwrite,
    /// Replace the existing file
    Overwrite,
}

impl WritePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            WritePolicy::SkipIfExists => "skip",
            WritePolicy::BackupThenOverwrite => "backup",
            WritePolicy::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "skip" | "skip-if-exists" => Ok(WritePolicy::SkipIfExists),
            "backup" | "backup-then-overwrite" => Ok(WritePolicy::BackupThenOverwrite),
            "overwrite" => Ok(WritePolicy::Overwrite),
            other => Err(format!("unknown write policy: {other}")),
        }
    }
}

/// A target path plus the serialized source destined for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub content: String,
    /// Model the artifact was rendered from (`mod` for the index)
    pub model: String,
}

/// What happened to one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAction {
    Created,
    Overwritten,
    /// Existing file copied to `backup`, then overwritten
    BackedUp { backup: PathBuf },
    Skipped,
    /// Rendered only; the filesystem was not touched
    DryRun,
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteAction::Created => f.write_str("created"),
            WriteAction::Overwritten => f.write_str("overwritten"),
            WriteAction::BackedUp { backup } => write!(f, "backed up to {}", backup.display()),
            WriteAction::Skipped => f.write_str("skipped"),
            WriteAction::DryRun => f.write_str("dry-run"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    pub path: PathBuf,
    pub action: WriteAction,
}

/// Write one artifact under `policy`
///
/// Creates the parent directory when missing. At most one file is written,
/// plus one backup file under [`WritePolicy::BackupThenOverwrite`].
///
/// # Errors
///
/// Returns [`GenerateError::PermissionDenied`] when the target or its parent
/// cannot be written, and [`GenerateError::Io`] for any other filesystem failure.
pub fn write_artifact(
    artifact: &OutputArtifact,
    policy: WritePolicy,
    dry_run: bool,
) -> Result<WriteResult> {
    let path = artifact.path.as_path();
    let exists = path.exists();

    if exists && policy == WritePolicy::SkipIfExists {
        info!(path = %path.display(), model = %artifact.model, "skipping existing file");
        return Ok(result(path, WriteAction::Skipped));
    }
    if dry_run {
        debug!(path = %path.display(), model = %artifact.model, %policy, "dry run");
        return Ok(result(path, WriteAction::DryRun));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GenerateError::from_io(parent, e))?;
    }

    let action = match (exists, policy) {
        (false, _) => WriteAction::Created,
        (true, WritePolicy::BackupThenOverwrite) => {
            let backup = backup_path(path);
            fs::copy(path, &backup).map_err(|e| GenerateError::from_io(&backup, e))?;
            warn!(path = %path.display(), backup = %backup.display(), "backed up existing file");
            WriteAction::BackedUp { backup }
        }
        (true, _) => WriteAction::Overwritten,
    };

    fs::write(path, &artifact.content).map_err(|e| GenerateError::from_io(path, e))?;
    info!(path = %path.display(), model = %artifact.model, %action, "wrote model");
    Ok(result(path, action))
}

/// Sibling path `<stem>.<YYYYmmddHHMMSS>.bak` for `path`
///
/// Never returns a path that already exists; a counter is appended when two
/// backups land in the same second.
pub fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let candidate = path.with_extension(format!("{stamp}.bak"));
    if !candidate.exists() {
        return candidate;
    }
    let mut counter = 1;
    loop {
        let candidate = path.with_extension(format!("{stamp}.{counter}.bak"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn result(path: &Path, action: WriteAction) -> WriteResult {
    WriteResult {
        path: path.to_path_buf(),
        action,
    }
}
