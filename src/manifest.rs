//! Library manifest
//!
//! The registry library file lists, per published directory, its tags,
//! architectures and the commit that last changed its Dockerfile.

use std::fmt;
use std::path::Path;

use crate::artifact::Artifact;
use crate::matrix::{LibraryConfig, Matrix};
use crate::revision::{RevisionError, RevisionSource};
use crate::templates::TemplateVariant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub tags: Vec<String>,
    pub architectures: Vec<String>,
    pub git_commit: String,
    pub directory: String,
}

impl ManifestEntry {
    /// Resolve the entry for one artifact. The commit is looked up for the
    /// artifact's own Dockerfile, not its directory.
    pub fn for_artifact(artifact: &Artifact, revisions: &dyn RevisionSource) -> Result<Self, RevisionError> {
        let git_commit = revisions.last_commit(&artifact.dockerfile())?;
        Ok(Self {
            tags: artifact.tags(),
            architectures: artifact.registry_labels().into_iter().map(String::from).collect(),
            git_commit,
            directory: slash_path(&artifact.directory()),
        })
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Tags: {}", self.tags.join(", "))?;
        writeln!(f, "Architectures: {}", self.architectures.join(", "))?;
        writeln!(f, "GitCommit: {}", self.git_commit)?;
        writeln!(f, "Directory: {}", self.directory)
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub generator_commit: String,
    pub generator_url: String,
    pub generator_path: String,
    pub maintainers: Vec<String>,
    pub git_repo: String,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build the manifest for every published (library) channel. Windows
    /// images are not part of the library.
    pub fn generate(matrix: &Matrix, revisions: &dyn RevisionSource) -> Result<Self, RevisionError> {
        let library = &matrix.library;
        let generator_commit = revisions.last_commit(&library.generator_path)?;

        let entries = matrix
            .library_channels()
            .flat_map(|channel| matrix.channel_artifacts(channel))
            .filter(|a| a.variant != TemplateVariant::WindowsMsvc)
            .map(|a| ManifestEntry::for_artifact(&a, revisions))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::with_entries(library, generator_commit, entries))
    }

    pub fn with_entries(library: &LibraryConfig, generator_commit: String, entries: Vec<ManifestEntry>) -> Self {
        Self {
            generator_commit,
            generator_url: library.generator_url.clone(),
            generator_path: slash_path(&library.generator_path),
            maintainers: library.maintainers.clone(),
            git_repo: library.git_repo.clone(),
            entries,
        }
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# this file is generated via {}/tree/{}/{}",
            self.generator_url.trim_end_matches('/'),
            self.generator_commit,
            self.generator_path
        )?;
        writeln!(f)?;
        writeln!(f, "Maintainers: {}", self.maintainers.join(",\n             "))?;
        writeln!(f, "GitRepo: {}", self.git_repo)?;
        for entry in &self.entries {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_block_layout() {
        let entry = ManifestEntry {
            tags: vec!["1.90.0-trixie".to_string(), "trixie".to_string()],
            architectures: vec!["amd64".to_string(), "arm64v8".to_string()],
            git_commit: "abc123".to_string(),
            directory: "stable/trixie".to_string(),
        };
        assert_eq!(
            entry.to_string(),
            "\nTags: 1.90.0-trixie, trixie\nArchitectures: amd64, arm64v8\nGitCommit: abc123\nDirectory: stable/trixie\n"
        );
    }

    #[test]
    fn test_header_lines() {
        let matrix = Matrix::builtin();
        let manifest = Manifest::with_entries(&matrix.library, "deadbeef".to_string(), vec![]);
        let text = manifest.to_string();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("# this file is generated via https://github.com/rust-lang/docker-rust/tree/deadbeef/src")
        );
        assert_eq!(lines.next(), Some(""));
        assert!(lines.next().unwrap().starts_with("Maintainers: Steven Fackler"));
        assert!(lines.next().unwrap().starts_with("             Scott Schafer"));
        assert_eq!(lines.next(), Some("GitRepo: https://github.com/rust-lang/docker-rust.git"));
        assert_eq!(lines.next(), None);
    }
}
