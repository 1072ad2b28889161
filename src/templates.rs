//! Template System - Ordered Literal Substitution
//!
//! Templates are plain text with `%%NAME%%` placeholders. Bindings are
//! applied one after another over the running result, so a value that
//! contains a later token is itself substituted. Tokens without a binding
//! stay in the output untouched.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::matrix::Family;

/// Placeholder tokens understood by the shipped templates.
pub mod tokens {
    pub const RUST_VERSION: &str = "%%RUST-VERSION%%";
    pub const RUSTUP_VERSION: &str = "%%RUSTUP-VERSION%%";
    pub const TAG: &str = "%%TAG%%";
    pub const ARCH_CASE: &str = "%%ARCH-CASE%%";
    pub const WINDOWS_VERSION: &str = "%%WINDOWS-VERSION%%";
    pub const SDK_BUILD: &str = "%%SDK-BUILD%%";
    pub const RUST_ARCH: &str = "%%RUST-ARCH%%";
    pub const RUSTUP_SHA256: &str = "%%RUSTUP-SHA256%%";
}

#[derive(Debug, Error)]
#[error("Failed to read template {path}: {source}")]
pub struct TemplateError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Ordered (token, value) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    pairs: Vec<(String, String)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self { pairs: vec![] }
    }

    pub fn bind(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(token, value);
        self
    }

    pub fn push(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((token.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Apply every binding, in order, as a global replace over the cumulative text.
pub fn render(template: &str, bindings: &Bindings) -> String {
    bindings
        .iter()
        .fold(template.to_string(), |text, (token, value)| {
            if token.is_empty() {
                text
            } else {
                text.replace(token, value)
            }
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateVariant {
    Debian,
    DebianSlim,
    Alpine,
    WindowsMsvc,
}

impl TemplateVariant {
    pub const ALL: [TemplateVariant; 4] = [
        TemplateVariant::Debian,
        TemplateVariant::DebianSlim,
        TemplateVariant::Alpine,
        TemplateVariant::WindowsMsvc,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateVariant::Debian => "Dockerfile-debian.template",
            TemplateVariant::DebianSlim => "Dockerfile-slim.template",
            TemplateVariant::Alpine => "Dockerfile-alpine.template",
            TemplateVariant::WindowsMsvc => "Dockerfile-windows-msvc.template",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            TemplateVariant::Debian | TemplateVariant::DebianSlim => Family::Debian,
            TemplateVariant::Alpine => Family::Alpine,
            TemplateVariant::WindowsMsvc => Family::Windows,
        }
    }

    /// Directory appended below the release directory, if any.
    pub fn subdir(&self) -> Option<&'static str> {
        match self {
            TemplateVariant::DebianSlim => Some("slim"),
            TemplateVariant::WindowsMsvc => Some("msvc"),
            TemplateVariant::Debian | TemplateVariant::Alpine => None,
        }
    }
}

/// Raw template text per variant, read up front.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: HashMap<TemplateVariant, String>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self { templates: HashMap::new() }
    }

    /// Read every variant's template from `dir`. Any unreadable file fails
    /// the whole load.
    pub fn load_from_dir(dir: &Path) -> Result<Self, TemplateError> {
        let mut set = Self::new();
        for variant in TemplateVariant::ALL {
            let path = dir.join(variant.file_name());
            let content = fs::read_to_string(&path)
                .map_err(|source| TemplateError { path: path.clone(), source })?;
            set.register(variant, content);
        }
        Ok(set)
    }

    pub fn get(&self, variant: TemplateVariant) -> Option<&str> {
        self.templates.get(&variant).map(String::as_str)
    }

    pub fn register(&mut self, variant: TemplateVariant, content: impl Into<String>) {
        self.templates.insert(variant, content.into());
    }
}
