//! Validation System - Rule/Policy Separation
//!
//! Rules inspect the matrix and produce structured violations.
//! Errors block expansion; warnings are reported and let it through.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::artifact::Artifact;
use crate::matrix::Matrix;
use crate::templates::TemplateVariant;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub remediation: Vec<String>,
}

impl ValidationViolation {
    fn error(rule: &str, message: String, remediation: &str) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Error,
            message,
            remediation: vec![remediation.to_string()],
        }
    }

    fn warning(rule: &str, message: String, remediation: &str) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Warning,
            message,
            remediation: vec![remediation.to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Warning)
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, matrix: &Matrix) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct NonEmptyArchitecturesRule;

impl ValidationRule for NonEmptyArchitecturesRule {
    fn name(&self) -> &'static str { "non_empty_architectures" }

    fn validate(&self, matrix: &Matrix) -> Vec<ValidationViolation> {
        let mut violations: Vec<_> = matrix
            .debian
            .releases
            .iter()
            .filter(|r| r.arches.is_empty())
            .map(|r| {
                ValidationViolation::error(
                    self.name(),
                    format!("Debian release {} lists no architectures", r.name),
                    "Declare at least one architecture or drop the release",
                )
            })
            .collect();

        if !matrix.alpine.versions.is_empty() && matrix.alpine.arches.is_empty() {
            violations.push(ValidationViolation::error(
                self.name(),
                "Alpine versions are declared but the alpine architecture set is empty".to_string(),
                "Declare at least one alpine architecture",
            ));
        }

        violations
    }
}

pub struct DefaultMembershipRule;

impl ValidationRule for DefaultMembershipRule {
    fn name(&self) -> &'static str { "default_membership" }

    fn validate(&self, matrix: &Matrix) -> Vec<ValidationViolation> {
        let mut violations = vec![];

        let debian = &matrix.debian;
        if !debian.releases.is_empty() && !debian.releases.iter().any(|r| r.name == debian.default) {
            violations.push(ValidationViolation::error(
                self.name(),
                format!("Default debian release {} is not declared", debian.default),
                "Point the debian default at one of the declared releases",
            ));
        }

        let alpine = &matrix.alpine;
        if !alpine.versions.is_empty() && !alpine.versions.contains(&alpine.default) {
            violations.push(ValidationViolation::error(
                self.name(),
                format!("Default alpine version {} is not declared", alpine.default),
                "Point the alpine default at one of the declared versions",
            ));
        }

        violations
    }
}

pub struct UniqueNamesRule;

impl UniqueNamesRule {
    fn duplicates<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        let mut dups = vec![];
        for name in names {
            if !seen.insert(name) && !dups.contains(&name) {
                dups.push(name);
            }
        }
        dups
    }
}

impl ValidationRule for UniqueNamesRule {
    fn name(&self) -> &'static str { "unique_names" }

    fn validate(&self, matrix: &Matrix) -> Vec<ValidationViolation> {
        let dimensions: [(&str, Vec<&str>); 4] = [
            ("channel", matrix.channels.iter().map(|c| c.name.as_str()).collect()),
            ("debian release", matrix.debian.releases.iter().map(|r| r.name.as_str()).collect()),
            ("alpine version", matrix.alpine.versions.iter().map(String::as_str).collect()),
            ("windows version", matrix.windows.versions.iter().map(|w| w.tag.as_str()).collect()),
        ];

        dimensions
            .into_iter()
            .flat_map(|(kind, names)| {
                Self::duplicates(names)
                    .into_iter()
                    .map(move |name| {
                        ValidationViolation::error(
                            "unique_names",
                            format!("{} {} is declared more than once", kind, name),
                            "Remove the duplicate entry",
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

pub struct ChannelVersionRule;

impl ChannelVersionRule {
    /// Plain `x.y.z`: pre-release and build metadata would leak into tags.
    fn is_release(version: &str) -> bool {
        semver::Version::parse(version)
            .map(|v| v.pre.is_empty() && v.build.is_empty())
            .unwrap_or(false)
    }

    fn is_sentinel(version: &str) -> bool {
        !version.is_empty() && version.chars().all(|c| c.is_ascii_alphanumeric()) && !version.chars().all(|c| c.is_ascii_digit())
    }
}

impl ValidationRule for ChannelVersionRule {
    fn name(&self) -> &'static str { "channel_version" }

    fn validate(&self, matrix: &Matrix) -> Vec<ValidationViolation> {
        matrix
            .channels
            .iter()
            .filter(|c| !Self::is_release(&c.version) && !Self::is_sentinel(&c.version))
            .map(|c| {
                ValidationViolation::error(
                    self.name(),
                    format!("Channel {} has version {:?}, expected x.y.z or a sentinel word", c.name, c.version),
                    "Use a full dotted version such as 1.90.0, or a word such as nightly",
                )
            })
            .collect()
    }
}

/// No two published artifacts may claim the same tag.
pub struct UniqueTagsRule;

impl ValidationRule for UniqueTagsRule {
    fn name(&self) -> &'static str { "unique_tags" }

    fn validate(&self, matrix: &Matrix) -> Vec<ValidationViolation> {
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut violations = vec![];

        let published: Vec<Artifact> = matrix
            .library_channels()
            .flat_map(|c| matrix.channel_artifacts(c))
            .filter(|a| a.variant != TemplateVariant::WindowsMsvc)
            .collect();

        for artifact in &published {
            let dir = artifact.directory().display().to_string();
            for tag in artifact.tags() {
                if let Some(owner) = owners.get(&tag) {
                    violations.push(ValidationViolation::error(
                        self.name(),
                        format!("Tag {} is claimed by both {} and {}", tag, owner, dir),
                        "Mark only one entry per dimension as default and one channel per tag space as published",
                    ));
                } else {
                    owners.insert(tag, dir.clone());
                }
            }
        }

        violations
    }
}

/// Later debian releases are expected to support at least what earlier ones do.
pub struct ArchitectureSupersetRule;

impl ValidationRule for ArchitectureSupersetRule {
    fn name(&self) -> &'static str { "architecture_superset" }

    fn validate(&self, matrix: &Matrix) -> Vec<ValidationViolation> {
        matrix
            .debian
            .releases
            .windows(2)
            .filter_map(|pair| {
                let (older, newer) = (&pair[0], &pair[1]);
                let missing: Vec<_> = older
                    .arches
                    .iter()
                    .filter(|a| !newer.arches.iter().any(|n| n.registry_label == a.registry_label))
                    .map(|a| a.registry_label.as_str())
                    .collect();
                if missing.is_empty() {
                    None
                } else {
                    Some(ValidationViolation::warning(
                        self.name(),
                        format!("{} drops architectures supported by {}: {}", newer.name, older.name, missing.join(", ")),
                        "Check that dropping these architectures is intended",
                    ))
                }
            })
            .collect()
    }
}

/// Validator orchestrates rules and applies policy
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(NonEmptyArchitecturesRule),
                Box::new(DefaultMembershipRule),
                Box::new(UniqueNamesRule),
                Box::new(ChannelVersionRule),
                Box::new(UniqueTagsRule),
                Box::new(ArchitectureSupersetRule),
            ],
        }
    }

    pub fn validate(&self, matrix: &Matrix) -> ValidationResult {
        let mut violations = vec![];

        for rule in &self.rules {
            violations.extend(rule.validate(matrix));
        }

        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult { valid, violations }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
