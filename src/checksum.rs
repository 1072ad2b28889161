//! Checksum Resolver - published rustup-init digests
//!
//! The rustup archive publishes a `.sha256` file next to every
//! `rustup-init` binary. Its first whitespace-delimited token is the digest
//! pinned into the generated Dockerfiles.

use thiserror::Error;

use crate::hashing::is_sha256_hex;

#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("Failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Checksum file {url} is empty")]
    Empty { url: String },

    #[error("Checksum file {url} does not start with a SHA-256 digest: {digest}")]
    Malformed { url: String, digest: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RustupArtifact {
    /// `rustup-init` for unix targets
    Init,
    /// `rustup-init.exe` for windows targets
    InitExe,
}

impl RustupArtifact {
    pub fn checksum_file(&self) -> &'static str {
        match self {
            RustupArtifact::Init => "rustup-init.sha256",
            RustupArtifact::InitExe => "rustup-init.exe.sha256",
        }
    }
}

/// Source of integrity digests keyed by tool version and target triple.
///
/// Implementations must be pure with respect to their inputs; the pipeline
/// may call them from several threads and calls them again for every
/// release that lists the same architecture.
pub trait ChecksumSource: Sync {
    fn digest(
        &self,
        rustup_version: &str,
        target_triple: &str,
        artifact: RustupArtifact,
    ) -> Result<String, ChecksumError>;
}

/// HTTP-backed resolver against the rustup archive.
pub struct RustupChecksums {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl RustupChecksums {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn url(&self, rustup_version: &str, target_triple: &str, artifact: RustupArtifact) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            rustup_version,
            target_triple,
            artifact.checksum_file()
        )
    }
}

impl ChecksumSource for RustupChecksums {
    fn digest(
        &self,
        rustup_version: &str,
        target_triple: &str,
        artifact: RustupArtifact,
    ) -> Result<String, ChecksumError> {
        let url = self.url(rustup_version, target_triple, artifact);
        tracing::debug!(%url, "fetching rustup checksum");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| ChecksumError::Http { url: url.clone(), source })?;

        if !response.status().is_success() {
            return Err(ChecksumError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|source| ChecksumError::Http { url: url.clone(), source })?;

        parse_digest(&url, &body)
    }
}

/// Take the first token of a checksum file body.
pub fn parse_digest(url: &str, body: &str) -> Result<String, ChecksumError> {
    let digest = body
        .split_whitespace()
        .next()
        .ok_or_else(|| ChecksumError::Empty { url: url.to_string() })?;

    if !is_sha256_hex(digest) {
        return Err(ChecksumError::Malformed {
            url: url.to_string(),
            digest: digest.to_string(),
        });
    }

    Ok(digest.to_string())
}
