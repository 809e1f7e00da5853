//! Identity-marker extraction for morph and avatar item files.

use once_cell::sync::Lazy;
use regex::Regex;

static UID_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""uid"\s*:\s*"([^"]+)""#).expect("uid line regex"));
static DISPLAY_NAME_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""displayName"\s*:\s*"([^"]+)""#).expect("displayName line regex"));

/// The single identity marker an item file carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityMarker {
    /// Avatar-link id from a clothing/hair item file (`.vam`).
    InternalId(String),
    /// Morph-link name from a morph descriptor file (`.vmi`).
    MorphName(String),
}

/// Extract the identity marker from an item file's text, reading only as
/// many lines as needed. Returns `None` for extensions that carry no
/// marker or when the expected key never appears.
#[must_use]
pub fn extract_identity_marker(ext: &str, text: &str) -> Option<IdentityMarker> {
    let pattern: &Regex = match ext {
        "vam" => &UID_LINE,
        "vmi" => &DISPLAY_NAME_LINE,
        _ => return None,
    };

    for line in text.lines() {
        if let Some(captures) = pattern.captures(line) {
            let value = captures.get(1).expect("marker value group").as_str();
            return Some(match ext {
                "vam" => IdentityMarker::InternalId(value.to_string()),
                _ => IdentityMarker::MorphName(value.to_string()),
            });
        }
    }
    None
}
