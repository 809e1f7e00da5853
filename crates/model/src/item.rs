use crate::extensions;
use crate::package_name::PackageName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Handle to a [`crate::Library`] package slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId(pub(crate) u32);

/// Handle to a [`crate::Library`] content-item slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub(crate) u32);

impl PackageId {
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl ItemId {
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A versioned content archive and its ordered entries.
#[derive(Debug, Clone)]
pub struct ContentPackage {
    pub name: PackageName,
    /// Absolute location of the archive (or unpacked archive directory).
    pub location: PathBuf,
    pub size: u64,
    /// True when the package lives in the managed library rather than an
    /// external repository.
    pub primary: bool,
    /// Corrupt/unreadable/manifest-less packages are excluded from the
    /// corpus but keep their slot so diagnostics can point at them.
    pub invalid: bool,
    pub(crate) entries: Vec<ItemId>,
}

impl ContentPackage {
    /// Ordered entries of this package.
    #[must_use]
    pub fn entries(&self) -> &[ItemId] {
        &self.entries
    }
}

/// A raw asset reference extracted from one line of a description file.
///
/// Byte offset and length address the quoted value in the originating text
/// so collaborators can rewrite it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub value: String,
    pub offset: usize,
    pub length: usize,
    /// Avatar-link id harvested from the line following the reference line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    /// Morph-link id harvested from the line following the reference line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph_name: Option<String>,
}

impl Reference {
    #[must_use]
    pub const fn new(value: String, offset: usize, length: usize) -> Self {
        Self {
            value,
            offset,
            length,
            internal_id: None,
            morph_name: None,
        }
    }

    /// Lowercased trailing extension of the token value.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        extensions::extension_of(&self.value)
    }

    /// True when the reference carries an identity marker and must go
    /// through the identity resolver.
    #[must_use]
    pub const fn has_identity(&self) -> bool {
        self.internal_id.is_some() || self.morph_name.is_some()
    }
}

/// A reference that no resolver produced a target for; a normal, reported
/// outcome rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MissingReference {
    pub value: String,
}

impl MissingReference {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A successfully resolved link: owning text asset, index into its raw
/// reference list, and the target item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub owner: ItemId,
    pub reference: usize,
    pub target: ItemId,
}

/// One content item: a package entry (`package` is `Some`) or a loose file.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub(crate) id: ItemId,
    pub package: Option<PackageId>,
    /// Archive location for entries, filesystem path for loose files.
    pub absolute_path: PathBuf,
    /// Package-relative (entries) or library-relative (loose) path,
    /// normalized to forward slashes.
    pub local_path: String,
    pub size: u64,
    pub modified_ms: Option<u64>,
    pub primary: bool,
    /// Computed against the scan cache when the item is created.
    pub dirty: bool,
    /// Lowercased trailing extension, precomputed at creation.
    pub ext: Option<String>,
    pub internal_id: Option<String>,
    pub morph_name: Option<String>,
    pub(crate) parent: Option<ItemId>,
    pub(crate) children: Vec<ItemId>,
    /// Named gaps: expected composite sibling extensions that were absent.
    pub missing_children: Vec<String>,
    pub(crate) references: Vec<Reference>,
    pub(crate) resolved: BTreeSet<ResolvedReference>,
    pub(crate) missing: BTreeSet<MissingReference>,
    pub(crate) used_by: BTreeSet<ItemId>,
}

impl ContentItem {
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub const fn is_entry(&self) -> bool {
        self.package.is_some()
    }

    /// True when this item is scanned for embedded references.
    #[must_use]
    pub fn is_text_asset(&self) -> bool {
        self.ext
            .as_deref()
            .is_some_and(extensions::is_text_asset_ext)
    }

    /// True when this item carries a single identity marker instead of a
    /// reference list.
    #[must_use]
    pub fn is_identity_asset(&self) -> bool {
        self.ext.as_deref().is_some_and(extensions::is_identity_ext)
    }

    #[must_use]
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    #[must_use]
    pub const fn resolved(&self) -> &BTreeSet<ResolvedReference> {
        &self.resolved
    }

    #[must_use]
    pub const fn missing(&self) -> &BTreeSet<MissingReference> {
        &self.missing
    }

    /// Text assets that resolved at least one reference to this item.
    #[must_use]
    pub const fn used_by(&self) -> &BTreeSet<ItemId> {
        &self.used_by
    }

    #[must_use]
    pub fn usage_count(&self) -> usize {
        self.used_by.len()
    }

    #[must_use]
    pub const fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    /// Stable canonical form, used for cache keys and as the final
    /// lexicographic tie-break.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        if self.is_entry() {
            format!("{}:{}", self.absolute_path.display(), self.local_path)
        } else {
            self.absolute_path.display().to_string()
        }
    }
}
