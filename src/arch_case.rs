//! Architecture case blocks
//!
//! A shell `case` statement that maps the package manager's architecture
//! name to the rust target triple and the pinned rustup-init digest. The
//! block is spliced into a `RUN` instruction, so every line ends in a
//! backslash continuation except the closing `esac`.

use rayon::prelude::*;

use crate::checksum::{ChecksumError, ChecksumSource, RustupArtifact};
use crate::matrix::{ArchSpec, Family, ReleaseSpec};

/// How the running container reports its architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseDispatch {
    Dpkg,
    Apk,
}

impl CaseDispatch {
    pub fn for_family(family: Family) -> Option<Self> {
        match family {
            Family::Debian => Some(CaseDispatch::Dpkg),
            Family::Alpine => Some(CaseDispatch::Apk),
            Family::Windows => None,
        }
    }

    fn header(&self) -> &'static str {
        match self {
            CaseDispatch::Dpkg => {
                "dpkgArch=\"$(dpkg --print-architecture)\"; \\\n    case \"${dpkgArch##*-}\" in \\\n"
            }
            CaseDispatch::Apk => "apkArch=\"$(apk --print-arch)\"; \\\n    case \"$apkArch\" in \\\n",
        }
    }

    fn catch_all(&self) -> &'static str {
        match self {
            CaseDispatch::Dpkg => {
                "        *) echo >&2 \"unsupported architecture: ${dpkgArch}\"; exit 1 ;; \\\n    esac"
            }
            CaseDispatch::Apk => {
                "        *) echo >&2 \"unsupported architecture: $apkArch\"; exit 1 ;; \\\n    esac"
            }
        }
    }
}

/// Format a case block from architectures paired with their digests.
pub fn format_case_block(dispatch: CaseDispatch, entries: &[(&ArchSpec, String)]) -> String {
    let mut block = String::from(dispatch.header());
    for (arch, digest) in entries {
        block.push_str(&format!(
            "        {}) rustArch='{}'; rustupSha256='{}' ;; \\\n",
            arch.package_label, arch.target_triple, digest
        ));
    }
    block.push_str(dispatch.catch_all());
    block
}

/// Resolve a digest for every architecture of `release` and format the block.
///
/// Lookups run in parallel; the block keeps the release's declared order.
pub fn build_case_block(
    dispatch: CaseDispatch,
    release: &ReleaseSpec,
    rustup_version: &str,
    checksums: &dyn ChecksumSource,
) -> Result<String, ChecksumError> {
    let digests = release
        .arches
        .par_iter()
        .map(|arch| checksums.digest(rustup_version, &arch.target_triple, RustupArtifact::Init))
        .collect::<Result<Vec<_>, _>>()?;

    let entries: Vec<_> = release.arches.iter().zip(digests).collect();
    Ok(format_case_block(dispatch, &entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TripleDigest;

    impl ChecksumSource for TripleDigest {
        fn digest(&self, version: &str, triple: &str, _: RustupArtifact) -> Result<String, ChecksumError> {
            Ok(format!("{}@{}", triple, version))
        }
    }

    fn release(arches: Vec<ArchSpec>) -> ReleaseSpec {
        ReleaseSpec { name: "bookworm".to_string(), arches }
    }

    #[test]
    fn test_empty_release_is_still_a_case_statement() {
        let block = build_case_block(CaseDispatch::Dpkg, &release(vec![]), "1.28.2", &TripleDigest).unwrap();
        assert!(block.starts_with("dpkgArch=\"$(dpkg --print-architecture)\"; \\\n"));
        assert!(block.contains("case \"${dpkgArch##*-}\" in"));
        assert!(block.contains("*) echo >&2 \"unsupported architecture: ${dpkgArch}\"; exit 1 ;;"));
        assert!(block.ends_with("esac"));
        assert!(!block.contains("rustArch="));
    }

    #[test]
    fn test_entries_follow_declared_order() {
        let arches = vec![
            ArchSpec::new("s390x", "s390x", "linux/s390x", "s390x-unknown-linux-gnu"),
            ArchSpec::new("amd64", "amd64", "linux/amd64", "x86_64-unknown-linux-gnu"),
            ArchSpec::new("arm64v8", "arm64", "linux/arm64", "aarch64-unknown-linux-gnu"),
        ];
        let block = build_case_block(CaseDispatch::Dpkg, &release(arches), "1.28.2", &TripleDigest).unwrap();
        let lines: Vec<_> = block.lines().filter(|l| l.contains("rustArch=")).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "        s390x) rustArch='s390x-unknown-linux-gnu'; rustupSha256='s390x-unknown-linux-gnu@1.28.2' ;; \\"
        );
        assert!(lines[1].starts_with("        amd64)"));
        assert!(lines[2].starts_with("        arm64)"));
    }

    #[test]
    fn test_apk_dispatch_uses_package_labels() {
        let arches = vec![ArchSpec::new("arm64v8", "aarch64", "linux/arm64", "aarch64-unknown-linux-musl")];
        let block = build_case_block(CaseDispatch::Apk, &release(arches), "1.28.2", &TripleDigest).unwrap();
        assert!(block.contains("case \"$apkArch\" in"));
        assert!(block.contains("aarch64) rustArch='aarch64-unknown-linux-musl'"));
        assert!(block.contains("unsupported architecture: $apkArch"));
    }

    #[test]
    fn test_checksum_failure_propagates() {
        struct Offline;
        impl ChecksumSource for Offline {
            fn digest(&self, _: &str, triple: &str, _: RustupArtifact) -> Result<String, ChecksumError> {
                Err(ChecksumError::Empty { url: triple.to_string() })
            }
        }
        let arches = vec![ArchSpec::new("amd64", "amd64", "linux/amd64", "x86_64-unknown-linux-gnu")];
        assert!(build_case_block(CaseDispatch::Dpkg, &release(arches), "1.28.2", &Offline).is_err());
    }
}
