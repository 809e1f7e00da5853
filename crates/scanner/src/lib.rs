//! # Content Reference Scanner
//!
//! Line-level heuristic extraction of candidate asset references from
//! description files. Best-effort by design: this is not a JSON parser, and
//! no input aborts a scan — unclassifiable lines surface as soft errors.

mod keys;
mod marker;
mod scanner;

pub use keys::{classify_key, Verdict};
pub use marker::{extract_identity_marker, IdentityMarker};
pub use scanner::{scan_line, scan_text, LineScan, ScanOutcome, ScanWarning};
