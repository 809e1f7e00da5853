//! Enumeration collaborators.
//!
//! The orchestrator consumes a content enumerator (one closed snapshot of
//! packages and loose files per run) and an entry reader (sequential text
//! access to one named entry or loose file). Both are thin, replaceable
//! I/O seams; archive-blob backends plug in here.

use std::io;
use std::path::{Path, PathBuf};

/// One enumerated package archive and its entry listing.
#[derive(Debug, Clone)]
pub struct PackageListing {
    /// Archive file name, e.g. `Author.Pack.2.var`.
    pub file_name: String,
    pub location: PathBuf,
    pub size: u64,
    pub modified_ms: Option<u64>,
    pub primary: bool,
    /// False when the archive misses its manifest; such packages are
    /// excluded from the corpus.
    pub has_manifest: bool,
    pub entries: Vec<EntryListing>,
}

/// One file inside a package.
#[derive(Debug, Clone)]
pub struct EntryListing {
    /// Package-relative path with forward slashes.
    pub local_path: String,
    pub size: u64,
}

/// One file living outside any package.
#[derive(Debug, Clone)]
pub struct LooseListing {
    pub absolute_path: PathBuf,
    /// Library-relative path with forward slashes.
    pub local_path: String,
    pub size: u64,
    pub modified_ms: Option<u64>,
    pub primary: bool,
}

/// A closed snapshot of the library for one run.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub packages: Vec<PackageListing>,
    pub loose_files: Vec<LooseListing>,
}

/// Yields the run's content snapshot; owns directory/archive traversal.
pub trait ContentEnumerator: Send {
    fn enumerate(&self) -> io::Result<Listing>;
}

/// Opens packages and loose files for sequential text reading.
///
/// Each scanning worker opens its own independent handle on a package and
/// drops it as soon as the package's assets are read; concurrent reads of
/// one archive never share a handle.
pub trait EntryReader: Send + Sync {
    fn open_package(&self, location: &Path) -> io::Result<Box<dyn PackageHandle>>;
    fn read_loose(&self, path: &Path) -> io::Result<String>;
}

/// An open handle on one package archive.
pub trait PackageHandle: Send {
    fn read_entry(&mut self, local_path: &str) -> io::Result<String>;
}
