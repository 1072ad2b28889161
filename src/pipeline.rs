//! Matrix Pipeline - Single Entry Point
//!
//! CRITICAL: expand MUST call validate internally. No bypass.
//!
//! Everything is rendered in memory first; files are only written once
//! every template, digest and CI file has been processed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::arch_case::{build_case_block, CaseDispatch};
use crate::artifact::Artifact;
use crate::checksum::{ChecksumError, ChecksumSource, RustupArtifact};
use crate::ci::{channel_fragment, replace_between_markers, MarkerError};
use crate::hashing::sha256_hex;
use crate::matrix::{Family, Matrix, MatrixError};
use crate::revision::RevisionError;
use crate::templates::{render, tokens, Bindings, TemplateError, TemplateSet, TemplateVariant};
use crate::validation::{ValidationResult, Validator};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("No template loaded for {0:?}")]
    TemplateMissing(TemplateVariant),

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CI file {path}: {source}")]
    Marker {
        path: PathBuf,
        #[source]
        source: MarkerError,
    },

    #[error("CI file {path} refers to unknown channel {channel}")]
    UnknownChannel { path: PathBuf, channel: String },

    #[error(transparent)]
    Revision(#[from] RevisionError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// A file's final contents, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub contents: String,
    pub content_hash: String,
}

impl RenderedFile {
    pub fn new(path: PathBuf, contents: String) -> Self {
        let content_hash = sha256_hex(contents.as_bytes());
        Self { path, contents, content_hash }
    }
}

/// Per-release text shared by every channel and variant of that release.
enum ReleaseBinding {
    ArchCase(String),
    WindowsDigest(String),
}

/// The matrix pipeline - single entry point for regeneration
pub struct MatrixPipeline {
    matrix: Matrix,
    templates: TemplateSet,
    checksums: Box<dyn ChecksumSource>,
    validator: Validator,
}

impl MatrixPipeline {
    pub fn new(matrix: Matrix, templates: TemplateSet, checksums: Box<dyn ChecksumSource>) -> Self {
        Self {
            matrix,
            templates,
            checksums,
            validator: Validator::new(),
        }
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Validate the matrix. Warnings are logged; any error fails.
    pub fn validate(&self) -> Result<ValidationResult, PipelineError> {
        let result = self.validator.validate(&self.matrix);

        for warning in result.warnings() {
            tracing::warn!(rule = %warning.rule, "{}", warning.message);
        }

        if !result.valid {
            let messages: Vec<_> = result
                .errors()
                .map(|v| format!("{}: {}", v.rule, v.message))
                .collect();
            return Err(PipelineError::ValidationFailed(messages.join("; ")));
        }

        Ok(result)
    }

    /// Render every Dockerfile of the matrix.
    ///
    /// CRITICAL: This ALWAYS validates first.
    pub fn expand(&self) -> Result<Vec<RenderedFile>, PipelineError> {
        self.validate()?;

        let artifacts = self.matrix.artifacts();
        let mut per_release: HashMap<(Family, String), ReleaseBinding> = HashMap::new();
        let mut files = Vec::with_capacity(artifacts.len());

        for artifact in &artifacts {
            let key = (artifact.family(), artifact.release.clone());
            if !per_release.contains_key(&key) {
                let binding = self.resolve_release(artifact)?;
                per_release.insert(key.clone(), binding);
            }

            let template = self
                .templates
                .get(artifact.variant)
                .ok_or(PipelineError::TemplateMissing(artifact.variant))?;
            let bindings = self.bindings(artifact, &per_release[&key]);
            files.push(RenderedFile::new(artifact.dockerfile(), render(template, &bindings)));
        }

        Ok(files)
    }

    fn resolve_release(&self, artifact: &Artifact) -> Result<ReleaseBinding, PipelineError> {
        let rustup_version = &self.matrix.rustup_version;
        match CaseDispatch::for_family(artifact.family()) {
            Some(dispatch) => {
                tracing::debug!(release = %artifact.release, "building architecture case block");
                let block = build_case_block(dispatch, &artifact.release_spec(), rustup_version, self.checksums.as_ref())?;
                Ok(ReleaseBinding::ArchCase(block))
            }
            None => {
                let digest = self.checksums.digest(
                    rustup_version,
                    &self.matrix.windows.target_triple,
                    RustupArtifact::InitExe,
                )?;
                Ok(ReleaseBinding::WindowsDigest(digest))
            }
        }
    }

    fn bindings(&self, artifact: &Artifact, release: &ReleaseBinding) -> Bindings {
        let mut bindings = Bindings::new()
            .bind(tokens::RUST_VERSION, &artifact.channel.version)
            .bind(tokens::RUSTUP_VERSION, &self.matrix.rustup_version)
            .bind(tokens::TAG, &artifact.tag);

        match release {
            ReleaseBinding::ArchCase(block) => {
                bindings.push(tokens::ARCH_CASE, block);
            }
            ReleaseBinding::WindowsDigest(digest) => {
                bindings.push(tokens::WINDOWS_VERSION, &artifact.tag);
                bindings.push(tokens::SDK_BUILD, artifact.sdk_build.as_deref().unwrap_or_default());
                bindings.push(tokens::RUST_ARCH, &self.matrix.windows.target_triple);
                bindings.push(tokens::RUSTUP_SHA256, digest);
            }
        }

        bindings
    }

    /// Regenerate the marked region of every configured CI file under `root`.
    pub fn ci_updates(&self, root: &Path) -> Result<Vec<RenderedFile>, PipelineError> {
        self.matrix
            .ci
            .iter()
            .map(|target| {
                let channel = self.matrix.channel(&target.channel).ok_or_else(|| {
                    PipelineError::UnknownChannel {
                        path: target.path.clone(),
                        channel: target.channel.clone(),
                    }
                })?;

                let path = root.join(&target.path);
                let config = fs::read_to_string(&path)
                    .map_err(|source| PipelineError::Read { path: path.clone(), source })?;

                let fragment = channel_fragment(&self.matrix, channel);
                let rendered = replace_between_markers(&config, &target.marker, &fragment)
                    .map_err(|source| PipelineError::Marker { path: path.clone(), source })?;

                Ok(RenderedFile::new(target.path.clone(), rendered))
            })
            .collect()
    }

    /// Full regeneration: Dockerfiles and CI files, written under `root`.
    pub fn update(&self, root: &Path) -> Result<Vec<RenderedFile>, PipelineError> {
        let mut files = self.expand()?;
        files.extend(self.ci_updates(root)?);
        write_files(root, &files)?;
        Ok(files)
    }
}

/// Write files below `root`, creating parent directories as needed.
pub fn write_files(root: &Path, files: &[RenderedFile]) -> Result<(), PipelineError> {
    for file in files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| PipelineError::Write { path: parent.to_path_buf(), source })?;
        }
        fs::write(&path, &file.contents)
            .map_err(|source| PipelineError::Write { path: path.clone(), source })?;
        tracing::info!(path = %file.path.display(), sha256 = %file.content_hash, "wrote");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDigest;

    impl ChecksumSource for FixedDigest {
        fn digest(&self, _: &str, triple: &str, artifact: RustupArtifact) -> Result<String, ChecksumError> {
            Ok(format!("{}:{}", triple, artifact.checksum_file()))
        }
    }

    fn templates() -> TemplateSet {
        let mut set = TemplateSet::new();
        set.register(TemplateVariant::Debian, "FROM debian:%%TAG%%\nENV RUST_VERSION=%%RUST-VERSION%%\n%%ARCH-CASE%%\n");
        set.register(TemplateVariant::DebianSlim, "FROM debian:%%TAG%%-slim\n%%ARCH-CASE%%\n");
        set.register(TemplateVariant::Alpine, "FROM alpine:%%TAG%%\n%%ARCH-CASE%%\n");
        set.register(
            TemplateVariant::WindowsMsvc,
            "FROM servercore:ltsc%%WINDOWS-VERSION%% sdk=%%SDK-BUILD%% arch=%%RUST-ARCH%% sha=%%RUSTUP-SHA256%%\n",
        );
        set
    }

    #[test]
    fn test_windows_bindings() {
        let pipeline = MatrixPipeline::new(Matrix::builtin(), templates(), Box::new(FixedDigest));
        let files = pipeline.expand().unwrap();
        let windows = files
            .iter()
            .find(|f| f.path == Path::new("stable/windowsservercore-1809/msvc/Dockerfile"))
            .unwrap();
        assert_eq!(
            windows.contents,
            "FROM servercore:ltsc1809 sdk=17763 arch=x86_64-pc-windows-msvc sha=x86_64-pc-windows-msvc:rustup-init.exe.sha256\n"
        );
    }

    #[test]
    fn test_windows_triple_follows_matrix() {
        let mut matrix = Matrix::builtin();
        matrix.windows.target_triple = "aarch64-pc-windows-msvc".to_string();
        let pipeline = MatrixPipeline::new(matrix, templates(), Box::new(FixedDigest));
        let files = pipeline.expand().unwrap();
        let windows = files
            .iter()
            .find(|f| f.path == Path::new("nightly/windowsservercore-1809/msvc/Dockerfile"))
            .unwrap();
        assert!(windows.contents.contains("arch=aarch64-pc-windows-msvc sha=aarch64-pc-windows-msvc:"));
        assert!(!windows.contents.contains("x86_64"));
    }

    #[test]
    fn test_missing_variant_template() {
        let mut set = TemplateSet::new();
        set.register(TemplateVariant::Debian, "x");
        let pipeline = MatrixPipeline::new(Matrix::builtin(), set, Box::new(FixedDigest));
        assert!(matches!(
            pipeline.expand(),
            Err(PipelineError::TemplateMissing(TemplateVariant::DebianSlim))
        ));
    }

    #[test]
    fn test_invalid_matrix_blocks_expansion() {
        let mut matrix = Matrix::builtin();
        matrix.debian.default = "buster".to_string();
        let pipeline = MatrixPipeline::new(matrix, templates(), Box::new(FixedDigest));
        let err = pipeline.expand().unwrap_err();
        assert!(err.to_string().contains("default_membership"));
    }

    #[test]
    fn test_unknown_ci_channel() {
        let mut matrix = Matrix::builtin();
        matrix.ci[0].channel = "beta".to_string();
        let pipeline = MatrixPipeline::new(matrix, templates(), Box::new(FixedDigest));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            pipeline.ci_updates(dir.path()),
            Err(PipelineError::UnknownChannel { .. })
        ));
    }

    #[test]
    fn test_content_hash() {
        let file = RenderedFile::new(PathBuf::from("a"), String::new());
        assert_eq!(file.content_hash, sha256_hex(b""));
    }
}
