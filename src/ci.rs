//! CI fragments
//!
//! Workflow files carry a marker line twice; the build matrix between the
//! two markers is regenerated, the rest of the file is left alone.

use thiserror::Error;

use crate::matrix::{Channel, Family, Matrix};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Marker {marker:?} appears {found} time(s), at least 2 are required")]
pub struct MarkerError {
    pub marker: String,
    pub found: usize,
}

/// Replace the text strictly between the first and second occurrence of
/// `marker`. Both markers are kept, and everything after the second marker
/// is kept verbatim even if it contains the marker again.
pub fn replace_between_markers(text: &str, marker: &str, replacement: &str) -> Result<String, MarkerError> {
    if marker.is_empty() {
        return Err(MarkerError { marker: String::new(), found: 0 });
    }

    let mut parts = text.splitn(3, marker);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(before), Some(_), Some(after)) => {
            let mut out = String::with_capacity(text.len() + replacement.len());
            out.push_str(before);
            out.push_str(marker);
            out.push_str(replacement);
            out.push_str(marker);
            out.push_str(after);
            Ok(out)
        }
        _ => Err(MarkerError {
            marker: marker.to_string(),
            found: text.matches(marker).count(),
        }),
    }
}

/// YAML matrix items for every artifact of `channel`.
pub fn channel_fragment(matrix: &Matrix, channel: &Channel) -> String {
    let mut fragment = String::new();
    for artifact in matrix.channel_artifacts(channel) {
        let runner = match artifact.family() {
            Family::Windows => &matrix.runners.windows,
            Family::Debian | Family::Alpine => &matrix.runners.linux,
        };
        fragment.push_str(&format!("          - variant: {}\n", artifact.variant_path()));
        fragment.push_str(&format!("            os: {}\n", runner));
        fragment.push_str(&format!("            version: {}\n", channel.version));
        if artifact.family() != Family::Windows {
            let platforms: Vec<_> = artifact.arches.iter().map(|a| a.platform.as_str()).collect();
            fragment.push_str(&format!("            platforms: {}\n", platforms.join(",")));
        }
    }
    fragment
}
