//! Tag composition
//!
//! Every artifact is published under its full version and each shorter
//! dotted prefix, qualified by a suffix naming the variant. The default
//! artifact of a dimension also gets the unqualified forms.

/// Dotted prefixes of `version`, most specific first.
///
/// `"1.90.0"` gives `["1.90.0", "1.90", "1"]`; a sentinel such as
/// `"nightly"` has a single level.
pub fn version_prefixes(version: &str) -> Vec<String> {
    let parts: Vec<&str> = version.split('.').collect();
    (1..=parts.len())
        .rev()
        .map(|len| parts[..len].join("."))
        .collect()
}

/// The suffix an artifact's tags carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSuffix {
    /// Qualifier naming this exact artifact, e.g. `slim-bookworm`
    pub specific: String,
    /// Qualifier used when this artifact is the default of its dimension,
    /// e.g. `slim`. `None` means the default drops the qualifier entirely
    /// and publishes `latest`.
    pub general: Option<String>,
}

impl TagSuffix {
    pub fn bare(specific: impl Into<String>) -> Self {
        Self { specific: specific.into(), general: None }
    }

    pub fn with_alias(specific: impl Into<String>, general: impl Into<String>) -> Self {
        Self {
            specific: specific.into(),
            general: Some(general.into()),
        }
    }
}

pub const LATEST: &str = "latest";

/// Compose the tag list for one artifact. No tag appears twice.
pub fn compose_tags(version: &str, suffix: &TagSuffix, is_default: bool) -> Vec<String> {
    let prefixes = version_prefixes(version);
    let mut tags = Vec::new();
    let mut push = |tag: String| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    for prefix in &prefixes {
        push(format!("{}-{}", prefix, suffix.specific));
    }
    push(suffix.specific.clone());

    if is_default {
        match &suffix.general {
            Some(general) => {
                for prefix in &prefixes {
                    push(format!("{}-{}", prefix, general));
                }
                push(general.clone());
            }
            None => {
                for prefix in &prefixes {
                    push(prefix.clone());
                }
                push(LATEST.to_string());
            }
        }
    }

    tags
}
