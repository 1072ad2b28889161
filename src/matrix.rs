//! Matrix Data - Declared Once, Read Everywhere
//!
//! Everything the generator iterates over lives here: architectures,
//! releases per OS family, release channels and the defaults that earn the
//! unqualified tags. The built-in declarations can be replaced section by
//! section from a JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MARKER: &str = "#VERSIONS\n";
pub const DEFAULT_CHECKSUM_BASE_URL: &str = "https://static.rust-lang.org/rustup/archive";

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("Failed to read matrix file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid matrix file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One CPU architecture under the four names its consumers know it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchSpec {
    /// Image registry name (`arm64v8`)
    pub registry_label: String,
    /// OS package manager name (`arm64` for dpkg, `aarch64` for apk)
    pub package_label: String,
    /// Emulation / buildx platform (`linux/arm64`)
    pub platform: String,
    /// Compiler target triple (`aarch64-unknown-linux-gnu`)
    pub target_triple: String,
}

impl ArchSpec {
    pub fn new(registry_label: &str, package_label: &str, platform: &str, target_triple: &str) -> Self {
        Self {
            registry_label: registry_label.to_string(),
            package_label: package_label.to_string(),
            platform: platform.to_string(),
            target_triple: target_triple.to_string(),
        }
    }
}

/// One OS release and the architectures built for it, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSpec {
    pub name: String,
    pub arches: Vec<ArchSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub name: String,
    /// Dotted numeric version or a sentinel word such as `nightly`
    pub version: String,
    /// Whether this channel's artifacts are listed in the library manifest
    #[serde(default)]
    pub library: bool,
}

impl Channel {
    pub fn new(name: &str, version: &str, library: bool) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            library,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Debian,
    Alpine,
    Windows,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebianConfig {
    pub releases: Vec<ReleaseSpec>,
    pub default: String,
}

impl DebianConfig {
    pub fn is_default(&self, release: &str) -> bool {
        self.default == release
    }
}

/// Alpine versions all share one architecture set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlpineConfig {
    pub versions: Vec<String>,
    pub arches: Vec<ArchSpec>,
    pub default: String,
}

impl AlpineConfig {
    pub fn release_name(version: &str) -> String {
        format!("alpine{}", version)
    }

    pub fn releases(&self) -> Vec<ReleaseSpec> {
        self.versions
            .iter()
            .map(|v| ReleaseSpec {
                name: Self::release_name(v),
                arches: self.arches.clone(),
            })
            .collect()
    }

    pub fn is_default(&self, version: &str) -> bool {
        self.default == version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowsVersion {
    /// Windows Server Core tag, e.g. `1809`
    pub tag: String,
    /// Windows 10 SDK build selected from the Build Tools installer
    pub sdk_build: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowsConfig {
    pub versions: Vec<WindowsVersion>,
    pub target_triple: String,
}

impl WindowsConfig {
    pub fn release_name(version: &WindowsVersion) -> String {
        format!("windowsservercore-{}", version.tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiTarget {
    /// Pipeline file, relative to the output root
    pub path: PathBuf,
    /// Channel whose artifacts are listed in this file
    pub channel: String,
    #[serde(default = "default_marker")]
    pub marker: String,
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runners {
    pub linux: String,
    pub windows: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryConfig {
    pub maintainers: Vec<String>,
    pub git_repo: String,
    /// Browsable repository URL used in the provenance line
    pub generator_url: String,
    /// Generator source tree whose last commit is quoted in the provenance
    /// line. A directory, so matrix data changes count as well as code.
    pub generator_path: PathBuf,
}

/// The complete build matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Matrix {
    pub rustup_version: String,
    pub checksum_base_url: String,
    pub channels: Vec<Channel>,
    pub debian: DebianConfig,
    pub alpine: AlpineConfig,
    pub windows: WindowsConfig,
    pub ci: Vec<CiTarget>,
    pub runners: Runners,
    pub library: LibraryConfig,
}

impl Matrix {
    /// The literal declarations shipped with the tool.
    pub fn builtin() -> Self {
        let amd64 = ArchSpec::new("amd64", "amd64", "linux/amd64", "x86_64-unknown-linux-gnu");
        let armhf = ArchSpec::new("arm32v7", "armhf", "linux/arm/v7", "armv7-unknown-linux-gnueabihf");
        let arm64 = ArchSpec::new("arm64v8", "arm64", "linux/arm64", "aarch64-unknown-linux-gnu");
        let i386 = ArchSpec::new("i386", "i386", "linux/386", "i686-unknown-linux-gnu");
        let ppc64le = ArchSpec::new("ppc64le", "ppc64el", "linux/ppc64le", "powerpc64le-unknown-linux-gnu");
        let s390x = ArchSpec::new("s390x", "s390x", "linux/s390x", "s390x-unknown-linux-gnu");
        let riscv64 = ArchSpec::new("riscv64", "riscv64", "linux/riscv64", "riscv64gc-unknown-linux-gnu");

        let bullseye = vec![amd64.clone(), armhf.clone(), arm64.clone(), i386.clone()];
        let mut bookworm = bullseye.clone();
        bookworm.extend([ppc64le.clone(), s390x.clone()]);
        let mut trixie = bookworm.clone();
        trixie.push(riscv64);

        Self {
            rustup_version: "1.28.2".to_string(),
            checksum_base_url: DEFAULT_CHECKSUM_BASE_URL.to_string(),
            channels: vec![
                Channel::new("stable", "1.90.0", true),
                Channel::new("nightly", "nightly", false),
            ],
            debian: DebianConfig {
                releases: vec![
                    ReleaseSpec { name: "bullseye".to_string(), arches: bullseye },
                    ReleaseSpec { name: "bookworm".to_string(), arches: bookworm },
                    ReleaseSpec { name: "trixie".to_string(), arches: trixie },
                ],
                default: "trixie".to_string(),
            },
            alpine: AlpineConfig {
                versions: vec!["3.20".to_string(), "3.21".to_string(), "3.22".to_string()],
                arches: vec![
                    ArchSpec::new("amd64", "x86_64", "linux/amd64", "x86_64-unknown-linux-musl"),
                    ArchSpec::new("arm64v8", "aarch64", "linux/arm64", "aarch64-unknown-linux-musl"),
                ],
                default: "3.22".to_string(),
            },
            windows: WindowsConfig {
                versions: vec![WindowsVersion {
                    tag: "1809".to_string(),
                    sdk_build: "17763".to_string(),
                }],
                target_triple: "x86_64-pc-windows-msvc".to_string(),
            },
            ci: vec![
                CiTarget {
                    path: PathBuf::from(".github/workflows/ci.yml"),
                    channel: "stable".to_string(),
                    marker: default_marker(),
                },
                CiTarget {
                    path: PathBuf::from(".github/workflows/nightly.yml"),
                    channel: "nightly".to_string(),
                    marker: default_marker(),
                },
            ],
            runners: Runners {
                linux: "ubuntu-latest".to_string(),
                windows: "windows-2019".to_string(),
            },
            library: LibraryConfig {
                maintainers: vec![
                    "Steven Fackler <sfackler@gmail.com> (@sfackler)".to_string(),
                    "Scott Schafer <schaferjscott@gmail.com> (@Muscraft)".to_string(),
                ],
                git_repo: "https://github.com/rust-lang/docker-rust.git".to_string(),
                generator_url: "https://github.com/rust-lang/docker-rust".to_string(),
                generator_path: PathBuf::from("src"),
            },
        }
    }

    /// Load a matrix from JSON. Sections absent from the file keep their
    /// built-in values.
    pub fn load(path: &Path) -> Result<Self, MatrixError> {
        let content = fs::read_to_string(path).map_err(|source| MatrixError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| MatrixError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn library_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(|c| c.library)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::builtin()
    }
}
