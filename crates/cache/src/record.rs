use content_model::Reference;
use serde::{Deserialize, Serialize};

/// Persisted state of one content item between runs.
///
/// The `(size, modified_ms)` pair is the dirty fingerprint. Text assets
/// persist their raw reference list (token, byte span, identity markers) so
/// clean items replay through the resolution pipeline with zero text I/O;
/// identity files persist their single marker alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph_name: Option<String>,
}
