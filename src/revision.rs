//! Source revisions from git history

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("Failed to run git in {dir}: {source}")]
    Spawn {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git log for {file} failed: {stderr}")]
    Git { file: PathBuf, stderr: String },
}

/// Looks up the last commit that touched a file.
pub trait RevisionSource {
    /// Commit hash of the last change to `file`, or an empty string when the
    /// file has no history.
    fn last_commit(&self, file: &Path) -> Result<String, RevisionError>;
}

/// `git log -1 --format=%H HEAD -- <file>` inside a working tree.
pub struct GitRevisions {
    repo_dir: PathBuf,
}

impl GitRevisions {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self { repo_dir: repo_dir.into() }
    }
}

impl RevisionSource for GitRevisions {
    fn last_commit(&self, file: &Path) -> Result<String, RevisionError> {
        let output = Command::new("git")
            .args(["log", "-1", "--format=%H", "HEAD", "--"])
            .arg(file)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|source| RevisionError::Spawn {
                dir: self.repo_dir.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RevisionError::Git {
                file: file.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if commit.is_empty() {
            tracing::warn!(file = %file.display(), "no commit touches this file yet");
        }
        Ok(commit)
    }
}
