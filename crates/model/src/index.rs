use crate::extensions;
use crate::item::{ItemId, PackageId};
use crate::library::Library;
use crate::paths;
use std::collections::HashMap;

/// Read-only lookup indices over a [`Library`].
///
/// Built once after corpus construction and before the scan phase; never
/// mutated afterwards, so workers may share it freely.
#[derive(Debug, Default)]
pub struct LibraryIndex {
    families: HashMap<String, Vec<PackageId>>,
    package_entries: HashMap<PackageId, HashMap<String, ItemId>>,
    loose_by_path: HashMap<String, Vec<ItemId>>,
    internal_ids: HashMap<String, Vec<ItemId>>,
    morph_names: HashMap<String, Vec<ItemId>>,
}

impl LibraryIndex {
    #[must_use]
    pub fn build(library: &Library) -> Self {
        let mut index = Self::default();

        for pkg_id in library.package_ids() {
            let pkg = library.package(pkg_id);
            if pkg.invalid {
                continue;
            }
            index
                .families
                .entry(pkg.name.family_key())
                .or_default()
                .push(pkg_id);

            let entries = index.package_entries.entry(pkg_id).or_default();
            for entry in pkg.entries() {
                let item = library.item(*entry);
                entries.insert(paths::lookup_key(&item.local_path), *entry);
            }
        }

        // Deterministic family ordering: version ascending, then location.
        for packages in index.families.values_mut() {
            packages.sort_by(|a, b| {
                let pa = library.package(*a);
                let pb = library.package(*b);
                pa.name
                    .exact_version()
                    .cmp(&pb.name.exact_version())
                    .then_with(|| pa.location.cmp(&pb.location))
            });
        }

        for item in library.items() {
            if item
                .package
                .is_some_and(|pkg| library.package(pkg).invalid)
            {
                continue;
            }
            if !item.is_entry() {
                index
                    .loose_by_path
                    .entry(paths::lookup_key(&item.local_path))
                    .or_default()
                    .push(item.id());
            }

            if let Some(id) = &item.internal_id {
                if extensions::is_avatar_link_path(&item.local_path) {
                    index
                        .internal_ids
                        .entry(id.clone())
                        .or_default()
                        .push(item.id());
                }
            }
            if let Some(name) = &item.morph_name {
                index
                    .morph_names
                    .entry(name.clone())
                    .or_default()
                    .push(item.id());
            }
        }

        for items in index.loose_by_path.values_mut() {
            items.sort_by(|a, b| library.item(*a).absolute_path.cmp(&library.item(*b).absolute_path));
        }

        index
    }

    /// Packages of a family, sorted by version ascending.
    #[must_use]
    pub fn family(&self, family_key: &str) -> &[PackageId] {
        self.families.get(family_key).map_or(&[], Vec::as_slice)
    }

    /// Entry of a package by normalized lookup key (entry paths are unique
    /// within a package, case-insensitively).
    #[must_use]
    pub fn entry(&self, package: PackageId, path_key: &str) -> Option<ItemId> {
        self.package_entries.get(&package)?.get(path_key).copied()
    }

    /// Loose files sharing a library-relative path, sorted by absolute path.
    #[must_use]
    pub fn loose(&self, path_key: &str) -> &[ItemId] {
        self.loose_by_path.get(path_key).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn by_internal_id(&self, id: &str) -> &[ItemId] {
        self.internal_ids.get(id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn by_morph_name(&self, name: &str) -> &[ItemId] {
        self.morph_names.get(name).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_name::PackageName;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn families_sort_by_version() {
        let mut library = Library::new();
        let v3 = library.add_package(
            PackageName::parse("Author.Pack.3").unwrap(),
            PathBuf::from("/lib/Author.Pack.3.var"),
            0,
            true,
        );
        let v1 = library.add_package(
            PackageName::parse("Author.Pack.1").unwrap(),
            PathBuf::from("/lib/Author.Pack.1.var"),
            0,
            true,
        );

        let index = LibraryIndex::build(&library);
        assert_eq!(index.family("author.pack"), &[v1, v3]);
    }

    #[test]
    fn invalid_packages_are_not_indexed() {
        let mut library = Library::new();
        let pkg = library.add_package(
            PackageName::parse("Author.Pack.1").unwrap(),
            PathBuf::from("/lib/Author.Pack.1.var"),
            0,
            true,
        );
        library.package_mut(pkg).invalid = true;

        let index = LibraryIndex::build(&library);
        assert!(index.family("author.pack").is_empty());
    }

    #[test]
    fn entry_lookup_is_case_insensitive() {
        let mut library = Library::new();
        let pkg = library.add_package(
            PackageName::parse("Author.Pack.1").unwrap(),
            PathBuf::from("/lib/Author.Pack.1.var"),
            0,
            true,
        );
        let entry = library.add_entry(pkg, "Custom/Tex/Skin.png".into(), 1);

        let index = LibraryIndex::build(&library);
        assert_eq!(index.entry(pkg, "custom/tex/skin.png"), Some(entry));
        assert_eq!(index.entry(pkg, "custom/tex/missing.png"), None);
    }

    #[test]
    fn internal_id_index_respects_avatar_prefixes() {
        let mut library = Library::new();
        let inside = library.add_loose_file(
            "/lib/Custom/Clothing/Female/top.vam".into(),
            "Custom/Clothing/Female/top.vam".into(),
            1,
            None,
            true,
        );
        let outside = library.add_loose_file(
            "/lib/Saves/top.vam".into(),
            "Saves/top.vam".into(),
            1,
            None,
            true,
        );
        library.item_mut(inside).internal_id = Some("Top2".into());
        library.item_mut(outside).internal_id = Some("Top2".into());

        let index = LibraryIndex::build(&library);
        assert_eq!(index.by_internal_id("Top2"), &[inside]);
    }

    #[test]
    fn morph_names_index_anywhere() {
        let mut library = Library::new();
        let a = library.add_loose_file("/lib/a/morph.vmi".into(), "a/morph.vmi".into(), 1, None, true);
        library.item_mut(a).morph_name = Some("Foo".into());

        let index = LibraryIndex::build(&library);
        assert_eq!(index.by_morph_name("Foo"), &[a]);
    }
}
