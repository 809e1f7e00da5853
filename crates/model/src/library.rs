use crate::extensions;
use crate::item::{
    ContentItem, ContentPackage, ItemId, MissingReference, PackageId, Reference, ResolvedReference,
};
use crate::package_name::PackageName;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Arena owning every package and content item of one scan run.
///
/// The corpus graph is cyclic (used-by sets, parent/child links,
/// package/entry links), so all cross-entity links are `PackageId`/`ItemId`
/// handles into this arena, never owned pointers.
#[derive(Debug, Default)]
pub struct Library {
    packages: Vec<ContentPackage>,
    items: Vec<ContentItem>,
}

impl Library {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_package(
        &mut self,
        name: PackageName,
        location: PathBuf,
        size: u64,
        primary: bool,
    ) -> PackageId {
        let id = PackageId(u32::try_from(self.packages.len()).expect("package arena overflow"));
        self.packages.push(ContentPackage {
            name,
            location,
            size,
            primary,
            invalid: false,
            entries: Vec::new(),
        });
        id
    }

    pub fn add_entry(&mut self, package: PackageId, local_path: String, size: u64) -> ItemId {
        let (location, primary) = {
            let pkg = self.package(package);
            (pkg.location.clone(), pkg.primary)
        };
        let id = self.push_item(ContentItem {
            id: ItemId(0),
            package: Some(package),
            absolute_path: location,
            local_path,
            size,
            modified_ms: None,
            primary,
            dirty: true,
            ext: None,
            internal_id: None,
            morph_name: None,
            parent: None,
            children: Vec::new(),
            missing_children: Vec::new(),
            references: Vec::new(),
            resolved: BTreeSet::new(),
            missing: BTreeSet::new(),
            used_by: BTreeSet::new(),
        });
        self.packages[package.index()].entries.push(id);
        id
    }

    pub fn add_loose_file(
        &mut self,
        absolute_path: PathBuf,
        local_path: String,
        size: u64,
        modified_ms: Option<u64>,
        primary: bool,
    ) -> ItemId {
        self.push_item(ContentItem {
            id: ItemId(0),
            package: None,
            absolute_path,
            local_path,
            size,
            modified_ms,
            primary,
            dirty: true,
            ext: None,
            internal_id: None,
            morph_name: None,
            parent: None,
            children: Vec::new(),
            missing_children: Vec::new(),
            references: Vec::new(),
            resolved: BTreeSet::new(),
            missing: BTreeSet::new(),
            used_by: BTreeSet::new(),
        })
    }

    fn push_item(&mut self, mut item: ContentItem) -> ItemId {
        let id = ItemId(u32::try_from(self.items.len()).expect("item arena overflow"));
        item.id = id;
        item.ext = extensions::extension_of(&item.local_path);
        self.items.push(item);
        id
    }

    #[must_use]
    pub fn package(&self, id: PackageId) -> &ContentPackage {
        &self.packages[id.index()]
    }

    pub fn package_mut(&mut self, id: PackageId) -> &mut ContentPackage {
        &mut self.packages[id.index()]
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> &ContentItem {
        &self.items[id.index()]
    }

    pub fn item_mut(&mut self, id: ItemId) -> &mut ContentItem {
        &mut self.items[id.index()]
    }

    pub fn package_ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        (0..self.packages.len()).map(|i| PackageId(i as u32))
    }

    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        (0..self.items.len()).map(|i| ItemId(i as u32))
    }

    pub fn items(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.iter()
    }

    pub fn packages(&self) -> impl Iterator<Item = &ContentPackage> {
        self.packages.iter()
    }

    /// Items scanned for references, in arena (creation) order.
    pub fn text_asset_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items
            .iter()
            .filter(|item| item.is_text_asset())
            .map(ContentItem::id)
    }

    /// Replace the raw reference list of a text asset (scan result or cache
    /// hydration).
    pub fn set_references(&mut self, id: ItemId, references: Vec<Reference>) {
        self.items[id.index()].references = references;
    }

    /// Record a resolved link and maintain the target's used-by set.
    pub fn record_resolved(&mut self, owner: ItemId, reference: usize, target: ItemId) {
        self.items[owner.index()].resolved.insert(ResolvedReference {
            owner,
            reference,
            target,
        });
        if owner != target {
            self.items[target.index()].used_by.insert(owner);
        }
    }

    pub fn record_missing(&mut self, owner: ItemId, value: impl Into<String>) {
        self.items[owner.index()]
            .missing
            .insert(MissingReference::new(value));
    }

    /// Attach `child` under `parent` (composite grouping). A child belongs
    /// to at most one parent; later claims are ignored.
    pub fn attach_child(&mut self, parent: ItemId, child: ItemId) {
        if parent == child || self.items[child.index()].parent.is_some() {
            return;
        }
        self.items[child.index()].parent = Some(parent);
        self.items[parent.index()].children.push(child);
    }

    /// Item size including its composite children.
    #[must_use]
    pub fn total_size(&self, id: ItemId) -> u64 {
        let item = self.item(id);
        item.size
            + item
                .children
                .iter()
                .map(|child| self.items[child.index()].size)
                .sum::<u64>()
    }
}
