use serde::{Deserialize, Serialize};

/// Statistics about one scan run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Packages admitted to the corpus.
    pub packages: usize,

    /// Loose files admitted to the corpus.
    pub loose_files: usize,

    /// Text assets considered for scanning.
    pub text_assets: usize,

    /// Text assets re-read this run.
    pub dirty_assets: usize,

    /// Text assets replayed from cache.
    pub clean_assets: usize,

    /// Files actually opened for text reading (assets + identity markers).
    pub text_reads: usize,

    /// Raw references extracted or hydrated.
    pub references: usize,

    /// References resolved to a target.
    pub resolved: usize,

    /// References no resolver claimed.
    pub missing: usize,

    /// Identity matches deferred to the global pass.
    pub delayed: usize,

    /// Time taken in milliseconds.
    pub time_ms: u64,
}

impl ScanStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
