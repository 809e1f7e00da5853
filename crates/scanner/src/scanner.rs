use crate::keys::{classify_key, Verdict};
use content_model::{is_asset_ext, Reference};
use once_cell::sync::Lazy;
use regex::Regex;

/// Last `"key" : "value"` pair on a line, whitespace variants included.
static KEY_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"\s*:\s*"([^"]*)""#).expect("key/value shape regex"));

/// Result of scanning one line: at most one candidate reference, plus an
/// optional soft error. Malformed input never aborts a scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineScan {
    pub reference: Option<Reference>,
    pub warning: Option<String>,
}

/// Soft error from one line of a scanned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    /// 1-indexed line number.
    pub line: usize,
    pub message: String,
}

/// References and soft errors extracted from one document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub references: Vec<Reference>,
    pub warnings: Vec<ScanWarning>,
}

/// Scan one line for a candidate asset reference.
///
/// Locates the line's last quoted string, requires a `"key" : "value"`
/// shape immediately before it, filters the value's trailing extension
/// against the asset allow-list, then applies the key-name heuristic to
/// separate genuine reference paths from display strings.
/// `owner_family` is the scanned package's family key, used to exclude
/// known third-party packages that store raw audio filenames.
#[must_use]
pub fn scan_line(line: &str, owner_family: Option<&str>) -> LineScan {
    let Some(captures) = KEY_VALUE.captures_iter(line).last() else {
        return LineScan::default();
    };
    let key = captures.get(1).expect("key group").as_str();
    let value_match = captures.get(2).expect("value group");
    let value = value_match.as_str();

    // The matched value must be the line's last quoted string; anything
    // quoted after its closing quote means we matched an inner pair.
    if line[value_match.end()..].chars().skip(1).any(|c| c == '"') {
        return LineScan::default();
    }

    if value.starts_with("http://") || value.starts_with("https://") {
        return LineScan::default();
    }

    let Some(ext) = content_model::extension_of(value) else {
        return LineScan::default();
    };
    if !is_asset_ext(&ext) {
        return LineScan::default();
    }

    match classify_key(key, &ext, owner_family) {
        Verdict::Accept => LineScan {
            reference: Some(Reference::new(
                value.to_string(),
                value_match.start(),
                value.len(),
            )),
            warning: None,
        },
        Verdict::Reject => LineScan::default(),
        Verdict::Unknown => LineScan {
            reference: None,
            warning: Some(format!("unclassified reference key \"{key}\" for .{ext} value")),
        },
    }
}

/// Drive [`scan_line`] over a whole document, tracking byte offsets and
/// attaching identity markers from the line following a reference line.
#[must_use]
pub fn scan_text(text: &str, owner_family: Option<&str>) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let mut offset = 0usize;
    let mut last_ref_line: Option<usize> = None;

    for (line_no, line) in text.split_inclusive('\n').enumerate() {
        let trimmed = line.trim_end_matches(['\n', '\r']);

        // A reference's identity marker sits on the immediately following
        // line: "internalId" for avatar links, "name" for morph links.
        if last_ref_line == Some(line_no.wrapping_sub(1)) {
            attach_identity_marker(trimmed, outcome.references.last_mut());
        }

        let scanned = scan_line(trimmed, owner_family);
        if let Some(mut reference) = scanned.reference {
            reference.offset += offset;
            outcome.references.push(reference);
            last_ref_line = Some(line_no);
        }
        if let Some(message) = scanned.warning {
            outcome.warnings.push(ScanWarning {
                line: line_no + 1,
                message,
            });
        }

        offset += line.len();
    }

    outcome
}

fn attach_identity_marker(line: &str, reference: Option<&mut Reference>) {
    let Some(reference) = reference else {
        return;
    };
    let Some(captures) = KEY_VALUE.captures_iter(line).last() else {
        return;
    };
    let key = captures.get(1).expect("key group").as_str();
    let value = captures.get(2).expect("value group").as_str();
    if value.is_empty() {
        return;
    }

    if key.eq_ignore_ascii_case("internalid") {
        reference.internal_id = Some(value.to_string());
    } else if key.eq_ignore_ascii_case("name") {
        let is_morph = reference
            .extension()
            .is_some_and(|ext| ext == "vmi" || ext == "vmb");
        if is_morph {
            reference.morph_name = Some(value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_url_keyed_reference() {
        let scan = scan_line(r#"  "url" : "SELF:/Custom/tex.png","#, None);
        let reference = scan.reference.unwrap();
        assert_eq!(reference.value, "SELF:/Custom/tex.png");
        assert_eq!(scan.warning, None);
    }

    #[test]
    fn offsets_address_the_quoted_value() {
        let line = r#"  "url" : "a/b.png""#;
        let scan = scan_line(line, None);
        let reference = scan.reference.unwrap();
        assert_eq!(&line[reference.offset..reference.offset + reference.length], "a/b.png");
    }

    #[test]
    fn rejects_http_values() {
        let scan = scan_line(r#""url" : "https://example.com/a.png""#, None);
        assert_eq!(scan, LineScan::default());
    }

    #[test]
    fn rejects_unknown_extensions() {
        let scan = scan_line(r#""url" : "readme.xyz""#, None);
        assert_eq!(scan, LineScan::default());
    }

    #[test]
    fn rejects_display_strings_ending_in_extensions() {
        let scan = scan_line(r#""displayName" : "cool scene.json""#, None);
        assert_eq!(scan, LineScan::default());
    }

    #[test]
    fn unclassified_key_is_a_soft_error() {
        let scan = scan_line(r#""mystery" : "thing.png""#, None);
        assert!(scan.reference.is_none());
        assert!(scan.warning.unwrap().contains("mystery"));
    }

    #[test]
    fn takes_the_last_pair_on_the_line() {
        let scan = scan_line(r#"{"id" : "a.png"} , "url" : "b.png""#, None);
        assert_eq!(scan.reference.unwrap().value, "b.png");
    }

    #[test]
    fn trailing_quoted_noise_disqualifies_the_line() {
        let scan = scan_line(r#""url" : "a.png" "stray""#, None);
        assert_eq!(scan, LineScan::default());
    }

    #[test]
    fn malformed_lines_never_panic() {
        for line in ["", "{", "\"unterminated", "::::", "\"\" : \"\""] {
            let _ = scan_line(line, None);
        }
    }

    #[test]
    fn scan_text_attaches_internal_id_from_following_line() {
        let text = concat!(
            "{\n",
            "  \"id\" : \"Author.Pack.1:/Custom/Clothing/top.vam\",\n",
            "  \"internalId\" : \"Top2\"\n",
            "}\n",
        );
        let outcome = scan_text(text, None);
        assert_eq!(outcome.references.len(), 1);
        assert_eq!(outcome.references[0].internal_id.as_deref(), Some("Top2"));
        assert_eq!(outcome.references[0].morph_name, None);
    }

    #[test]
    fn scan_text_attaches_morph_name_for_morph_references() {
        let text = concat!(
            "  \"uid\" : \"a/morph.vmi\",\n",
            "  \"name\" : \"Foo\"\n",
        );
        let outcome = scan_text(text, None);
        assert_eq!(outcome.references[0].morph_name.as_deref(), Some("Foo"));
    }

    #[test]
    fn marker_lines_must_be_adjacent() {
        let text = concat!(
            "  \"uid\" : \"a/morph.vmi\",\n",
            "  \"region\" : \"chest\",\n",
            "  \"name\" : \"Foo\"\n",
        );
        let outcome = scan_text(text, None);
        assert_eq!(outcome.references[0].morph_name, None);
    }

    #[test]
    fn scan_text_tracks_global_offsets() {
        let text = "{\n  \"url\" : \"a/b.png\"\n}\n";
        let outcome = scan_text(text, None);
        let reference = &outcome.references[0];
        assert_eq!(
            &text[reference.offset..reference.offset + reference.length],
            "a/b.png"
        );
    }

    #[test]
    fn warnings_carry_line_numbers() {
        let text = "{\n  \"mystery\" : \"thing.png\"\n}\n";
        let outcome = scan_text(text, None);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].line, 2);
    }
}
