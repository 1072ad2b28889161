//! ImageMatrix Core - Container Image Build Matrix
//!
//! # Pieces
//! 1. Matrix data is declared once and never mutated
//! 2. Templates are filled by ordered literal substitution
//! 3. Validation runs before anything is rendered
//! 4. Output paths and tags are derived, never typed by hand
//! 5. Manifests carry the revision of each generated file

pub mod matrix;
pub mod templates;
pub mod hashing;
pub mod checksum;
pub mod arch_case;
pub mod tags;
pub mod artifact;
pub mod validation;
pub mod revision;
pub mod manifest;
pub mod ci;
pub mod pipeline;

pub use matrix::{ArchSpec, Channel, Family, Matrix, MatrixError, ReleaseSpec};
pub use templates::{render, Bindings, TemplateSet, TemplateVariant};
pub use hashing::sha256_hex;
pub use checksum::{ChecksumError, ChecksumSource, RustupArtifact, RustupChecksums};
pub use artifact::Artifact;
pub use tags::{compose_tags, version_prefixes, TagSuffix};
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity};
pub use revision::{GitRevisions, RevisionError, RevisionSource};
pub use manifest::{Manifest, ManifestEntry};
pub use ci::replace_between_markers;
pub use pipeline::{MatrixPipeline, PipelineError, RenderedFile};

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
