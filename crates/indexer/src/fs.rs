//! Filesystem-backed enumeration: directory-backed packages
//! (`<Author>.<Name>.<ver>.var/` trees carrying a `meta.json` manifest)
//! plus loose files everywhere else.

use crate::source::{
    ContentEnumerator, EntryListing, EntryReader, Listing, LooseListing, PackageHandle,
    PackageListing,
};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Walks the managed library root plus any external repository roots.
pub struct FsEnumerator {
    library_root: PathBuf,
    repository_roots: Vec<PathBuf>,
}

impl FsEnumerator {
    #[must_use]
    pub fn new(library_root: impl Into<PathBuf>) -> Self {
        Self {
            library_root: library_root.into(),
            repository_roots: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_repositories(mut self, roots: Vec<PathBuf>) -> Self {
        self.repository_roots = roots;
        self
    }

    fn enumerate_root(&self, root: &Path, primary: bool, listing: &mut Listing) {
        let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Failed to read entry under {}: {err}", root.display());
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_dir() && is_var_name(path) {
                listing.packages.push(package_listing(path, primary));
                walker.skip_current_dir();
                continue;
            }

            if entry.file_type().is_file() {
                let Some(local_path) = relative_slash_path(root, path) else {
                    continue;
                };
                let (size, modified_ms) = entry
                    .metadata()
                    .map(|meta| (meta.len(), mtime_ms(&meta)))
                    .unwrap_or((0, None));
                listing.loose_files.push(LooseListing {
                    absolute_path: path.to_path_buf(),
                    local_path,
                    size,
                    modified_ms,
                    primary,
                });
            }
        }
    }
}

impl ContentEnumerator for FsEnumerator {
    fn enumerate(&self) -> io::Result<Listing> {
        if !self.library_root.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("library root does not exist: {}", self.library_root.display()),
            ));
        }

        let mut listing = Listing::default();
        self.enumerate_root(&self.library_root, true, &mut listing);
        for repository in &self.repository_roots {
            self.enumerate_root(repository, false, &mut listing);
        }

        listing.packages.sort_by(|a, b| a.location.cmp(&b.location));
        listing
            .loose_files
            .sort_by(|a, b| a.absolute_path.cmp(&b.absolute_path));

        log::info!(
            "Enumerated {} packages and {} loose files",
            listing.packages.len(),
            listing.loose_files.len()
        );
        Ok(listing)
    }
}

fn package_listing(location: &Path, primary: bool) -> PackageListing {
    let file_name = location
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut entries = Vec::new();
    let mut size = 0u64;
    let mut modified_ms: Option<u64> = None;

    for entry in WalkDir::new(location).sort_by_file_name() {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(local_path) = relative_slash_path(location, entry.path()) else {
            continue;
        };
        // The manifest describes the archive; it is not content.
        if local_path.eq_ignore_ascii_case("meta.json") {
            continue;
        }
        let entry_size = entry.metadata().map(|meta| meta.len()).unwrap_or(0);
        if let Ok(meta) = entry.metadata() {
            modified_ms = modified_ms.max(mtime_ms(&meta));
        }
        size += entry_size;
        entries.push(EntryListing {
            local_path,
            size: entry_size,
        });
    }

    PackageListing {
        file_name,
        location: location.to_path_buf(),
        size,
        modified_ms,
        primary,
        has_manifest: location.join("meta.json").is_file(),
        entries,
    }
}

fn is_var_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.len() > 4 && name.to_ascii_lowercase().ends_with(".var"))
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut joined = relative.to_string_lossy().to_string();
    if joined.contains('\\') {
        joined = joined.replace('\\', "/");
    }
    Some(joined)
}

fn mtime_ms(metadata: &std::fs::Metadata) -> Option<u64> {
    let modified = metadata.modified().ok()?;
    let duration = modified.duration_since(SystemTime::UNIX_EPOCH).ok()?;
    Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Reads directory-backed packages and loose files.
#[derive(Debug, Default)]
pub struct FsEntryReader;

impl FsEntryReader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EntryReader for FsEntryReader {
    fn open_package(&self, location: &Path) -> io::Result<Box<dyn PackageHandle>> {
        if !location.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("package is not readable: {}", location.display()),
            ));
        }
        Ok(Box::new(DirPackageHandle {
            root: location.to_path_buf(),
        }))
    }

    fn read_loose(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

struct DirPackageHandle {
    root: PathBuf,
}

impl PackageHandle for DirPackageHandle {
    fn read_entry(&mut self, local_path: &str) -> io::Result<String> {
        if local_path.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("entry path escapes the package: {local_path}"),
            ));
        }
        std::fs::read_to_string(self.root.join(local_path))
    }
}
