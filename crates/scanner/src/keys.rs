//! Key-name heuristic for reference candidates.
//!
//! A quoted value ending in an allow-listed extension is not enough: the
//! key still present on the line decides whether the value is a genuine
//! reference path or a display string that merely ends in a matching
//! extension.

use content_model::{is_audio_ext, is_image_ext};

/// Heuristic verdict for one key + extension combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
    /// Unclassifiable combination; surfaces as a soft error.
    Unknown,
}

/// Keys that always carry a reference path, after `#<n>` suffix stripping.
const ACCEPT_KEYS: &[&str] = &["id", "uid", "url", "uri", "plugin", "audioclip", "asseturl"];

/// Key fragments that mark display strings, never paths.
const REJECT_FRAGMENTS: &[&str] = &["display", "name", "selected", "label"];

/// Package families whose description files store raw audio filenames
/// rather than paths; their audio-looking values are never references.
const AUDIO_RAW_NAME_FAMILIES: &[&str] = &["auralflux.ambience_core", "studiofoley.room_tones"];

/// Classify one key for a value with extension `ext`. `owner_family` is the
/// family key of the package being scanned, if any.
#[must_use]
pub fn classify_key(key: &str, ext: &str, owner_family: Option<&str>) -> Verdict {
    let key = key.to_ascii_lowercase();
    // Repeated-element keys carry a positional suffix ("plugin#2").
    let base = key.split('#').next().unwrap_or(key.as_str());

    if ACCEPT_KEYS.contains(&base) || base.ends_with("url") {
        if is_audio_ext(ext)
            && owner_family.is_some_and(|family| AUDIO_RAW_NAME_FAMILIES.contains(&family))
        {
            return Verdict::Reject;
        }
        return Verdict::Accept;
    }

    if is_image_ext(ext) && (base.contains("texture") || base.ends_with("tex")) {
        return Verdict::Accept;
    }

    if REJECT_FRAGMENTS
        .iter()
        .any(|fragment| base.contains(fragment))
        || base.contains("clip")
    {
        return Verdict::Reject;
    }

    Verdict::Unknown
}
