//! # Content Indexer
//!
//! Scan orchestration for the content library reference index.
//!
//! ## Pipeline
//!
//! ```text
//! Library snapshot (enumerator)
//!     │
//!     ├──> Corpus build (dedup, grouping, dirty classification)
//!     │
//!     ├──> Scan phase (bounded worker pool, dirty items only)
//!     │      └─> references + identity markers
//!     │
//!     ├──> Resolution (path, then identity; ambiguities delayed)
//!     │
//!     ├──> Dependency phase ──> Delayed-resolution phase
//!     │
//!     └──> Persist phase (scan cache)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use content_indexer::{FsEnumerator, FsEntryReader, ScanOrchestrator};
//! use content_scan_cache::{JsonFileStore, ScanCache};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let root = Path::new("/content/library");
//!     let store = JsonFileStore::open(root.join(".scan-cache.json"), root);
//!     let orchestrator = ScanOrchestrator::new(
//!         Box::new(FsEnumerator::new(root)),
//!         Arc::new(FsEntryReader::new()),
//!         ScanCache::new(Box::new(store)),
//!     );
//!     let report = orchestrator.run().await?;
//!
//!     println!(
//!         "{} resolved, {} missing",
//!         report.stats.resolved, report.stats.missing
//!     );
//!     Ok(())
//! }
//! ```

mod diagnostics;
mod error;
mod fs;
mod orchestrator;
mod source;
mod stats;

pub use diagnostics::Diagnostics;
pub use error::{IndexerError, Result};
pub use fs::{FsEntryReader, FsEnumerator};
pub use orchestrator::{ScanConfig, ScanOrchestrator, ScanReport, ScanState};
pub use source::{
    ContentEnumerator, EntryListing, EntryReader, Listing, LooseListing, PackageHandle,
    PackageListing,
};
pub use stats::ScanStats;
