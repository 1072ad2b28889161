//! Artifacts - one per (channel, release, variant)
//!
//! The matrix expands into artifacts; everything downstream (rendering,
//! CI fragments, manifest blocks) walks the same list, so paths and tags
//! come from one place.

use std::path::PathBuf;

use crate::matrix::{AlpineConfig, ArchSpec, Channel, Family, Matrix, ReleaseSpec, WindowsConfig};
use crate::tags::{compose_tags, TagSuffix};
use crate::templates::TemplateVariant;

pub const DOCKERFILE: &str = "Dockerfile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub channel: Channel,
    pub variant: TemplateVariant,
    /// Directory name of the release, e.g. `bookworm` or `alpine3.22`
    pub release: String,
    /// Value bound to `%%TAG%%`, e.g. `bookworm` or `3.22`
    pub tag: String,
    pub arches: Vec<ArchSpec>,
    /// Default release of its family dimension
    pub is_default: bool,
    /// Windows SDK build, windows artifacts only
    pub sdk_build: Option<String>,
}

impl Artifact {
    pub fn family(&self) -> Family {
        self.variant.family()
    }

    /// `<channel>/<release>[/<subdir>]`
    pub fn directory(&self) -> PathBuf {
        let mut dir = PathBuf::from(&self.channel.name).join(&self.release);
        if let Some(sub) = self.variant.subdir() {
            dir.push(sub);
        }
        dir
    }

    pub fn dockerfile(&self) -> PathBuf {
        self.directory().join(DOCKERFILE)
    }

    /// Path below the channel directory, as listed in CI matrices.
    pub fn variant_path(&self) -> String {
        match self.variant.subdir() {
            Some(sub) => format!("{}/{}", self.release, sub),
            None => self.release.clone(),
        }
    }

    pub fn release_spec(&self) -> ReleaseSpec {
        ReleaseSpec {
            name: self.release.clone(),
            arches: self.arches.clone(),
        }
    }

    pub fn tag_suffix(&self) -> TagSuffix {
        match self.variant {
            TemplateVariant::Debian => TagSuffix::bare(&self.release),
            TemplateVariant::DebianSlim => {
                TagSuffix::with_alias(format!("slim-{}", self.release), "slim")
            }
            TemplateVariant::Alpine => TagSuffix::with_alias(&self.release, "alpine"),
            TemplateVariant::WindowsMsvc => {
                TagSuffix::bare(format!("{}-msvc", self.release))
            }
        }
    }

    pub fn tags(&self) -> Vec<String> {
        compose_tags(&self.channel.version, &self.tag_suffix(), self.is_default)
    }

    pub fn registry_labels(&self) -> Vec<&str> {
        self.arches.iter().map(|a| a.registry_label.as_str()).collect()
    }
}

impl Matrix {
    /// Every artifact, channel by channel: debian (full then slim per
    /// release), alpine, windows.
    pub fn artifacts(&self) -> Vec<Artifact> {
        let mut artifacts = vec![];
        for channel in &self.channels {
            artifacts.extend(self.channel_artifacts(channel));
        }
        artifacts
    }

    pub fn channel_artifacts(&self, channel: &Channel) -> Vec<Artifact> {
        let mut artifacts = vec![];

        for release in &self.debian.releases {
            for variant in [TemplateVariant::Debian, TemplateVariant::DebianSlim] {
                artifacts.push(Artifact {
                    channel: channel.clone(),
                    variant,
                    release: release.name.clone(),
                    tag: release.name.clone(),
                    arches: release.arches.clone(),
                    is_default: self.debian.is_default(&release.name),
                    sdk_build: None,
                });
            }
        }

        for version in &self.alpine.versions {
            artifacts.push(Artifact {
                channel: channel.clone(),
                variant: TemplateVariant::Alpine,
                release: AlpineConfig::release_name(version),
                tag: version.clone(),
                arches: self.alpine.arches.clone(),
                is_default: self.alpine.is_default(version),
                sdk_build: None,
            });
        }

        for version in &self.windows.versions {
            artifacts.push(Artifact {
                channel: channel.clone(),
                variant: TemplateVariant::WindowsMsvc,
                release: WindowsConfig::release_name(version),
                tag: version.tag.clone(),
                arches: vec![ArchSpec::new(
                    "windows-amd64",
                    "amd64",
                    "windows/amd64",
                    &self.windows.target_triple,
                )],
                is_default: false,
                sdk_build: Some(version.sdk_build.clone()),
            });
        }

        artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_directory_layout() {
        let matrix = Matrix::builtin();
        let stable = matrix.channel("stable").unwrap();
        let dirs: Vec<_> = matrix
            .channel_artifacts(stable)
            .iter()
            .map(|a| a.dockerfile())
            .collect();
        assert!(dirs.contains(&Path::new("stable/bookworm/Dockerfile").to_path_buf()));
        assert!(dirs.contains(&Path::new("stable/bookworm/slim/Dockerfile").to_path_buf()));
        assert!(dirs.contains(&Path::new("stable/alpine3.22/Dockerfile").to_path_buf()));
        assert!(dirs.contains(&Path::new("stable/windowsservercore-1809/msvc/Dockerfile").to_path_buf()));
    }

    #[test]
    fn test_artifact_count() {
        let matrix = Matrix::builtin();
        // (3 debian * 2 variants + 3 alpine + 1 windows) * 2 channels
        assert_eq!(matrix.artifacts().len(), 20);
    }

    #[test]
    fn test_variant_path() {
        let matrix = Matrix::builtin();
        let nightly = matrix.channel("nightly").unwrap();
        let paths: Vec<_> = matrix
            .channel_artifacts(nightly)
            .iter()
            .map(|a| a.variant_path())
            .collect();
        assert_eq!(paths[0], "bullseye");
        assert_eq!(paths[1], "bullseye/slim");
        assert_eq!(paths.last().unwrap(), "windowsservercore-1809/msvc");
    }

    #[test]
    fn test_default_alpine_tags() {
        let matrix = Matrix::builtin();
        let alpine = matrix
            .artifacts()
            .into_iter()
            .find(|a| a.release == "alpine3.22" && a.channel.name == "stable")
            .unwrap();
        let tags = alpine.tags();
        assert!(tags.contains(&"1.90-alpine".to_string()));
        assert!(tags.contains(&"alpine".to_string()));
        assert!(!tags.contains(&"latest".to_string()));
    }
}
