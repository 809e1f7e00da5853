use crate::token::ReferenceToken;
use content_model::{
    join_normalized, lookup_key, normalize, ItemId, Library, LibraryIndex, PackageId, PackageName,
    Reference, VersionToken,
};

/// Outcome of a path-based resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResolution {
    Resolved(ItemId),
    /// No target; the identity resolver may still claim the reference.
    Missing,
    /// The token names a package family with no available package; the
    /// name feeds the unresolved-packages diagnostic.
    UnknownPackage(String),
}

impl PathResolution {
    #[must_use]
    pub const fn target(&self) -> Option<ItemId> {
        match self {
            Self::Resolved(item) => Some(*item),
            _ => None,
        }
    }
}

/// Resolves path/version-qualified reference tokens against the read-only
/// library indices.
///
/// Lookup precedence is fixed: the path is first tried relative to the
/// referencing asset's containing directory, then as an absolute path from
/// the package/library root. Both lookups are case-insensitive and never
/// traverse above the root.
pub struct PathResolver<'a> {
    library: &'a Library,
    index: &'a LibraryIndex,
}

impl<'a> PathResolver<'a> {
    #[must_use]
    pub const fn new(library: &'a Library, index: &'a LibraryIndex) -> Self {
        Self { library, index }
    }

    /// Resolve one reference. `owner` is the package being scanned (None
    /// for loose assets); `local_dir` is the referencing asset's
    /// containing directory, normalized, empty at the root.
    #[must_use]
    pub fn resolve(
        &self,
        owner: Option<PackageId>,
        reference: &Reference,
        local_dir: &str,
    ) -> PathResolution {
        match ReferenceToken::parse(&reference.value) {
            ReferenceToken::SelfScoped(rel) => match owner {
                Some(package) => self
                    .find_in_package(package, &rel, local_dir)
                    .map_or(PathResolution::Missing, PathResolution::Resolved),
                // SELF outside a package degrades to a bare library path.
                None => self.resolve_loose(&rel, local_dir),
            },
            ReferenceToken::Packaged(name, rel) => self.resolve_packaged(&name, &rel, local_dir),
            ReferenceToken::Bare(rel) => {
                if let Some(package) = owner {
                    if let Some(item) = self.find_in_package(package, &rel, local_dir) {
                        return PathResolution::Resolved(item);
                    }
                }
                self.resolve_loose(&rel, local_dir)
            }
        }
    }

    fn resolve_packaged(&self, name: &PackageName, rel: &str, local_dir: &str) -> PathResolution {
        let family = self.index.family(&name.family_key());
        if family.is_empty() {
            return PathResolution::UnknownPackage(name.to_string());
        }

        let Some(package) = self.select_version(family, name.version) else {
            return PathResolution::UnknownPackage(name.to_string());
        };

        self.find_in_package(package, rel, local_dir)
            .map_or(PathResolution::Missing, PathResolution::Resolved)
    }

    /// Pick one package out of a family for a version token.
    ///
    /// Exact and `min` requests that cannot be satisfied fall back to the
    /// maximum version available in the family; `latest` always takes the
    /// maximum. Ties on the chosen version are broken by shortest absolute
    /// path, then lexicographically.
    fn select_version(&self, family: &[PackageId], token: VersionToken) -> Option<PackageId> {
        let matching: Vec<PackageId> = match token {
            VersionToken::Exact(wanted) => family
                .iter()
                .copied()
                .filter(|id| self.version_of(*id) == Some(wanted))
                .collect(),
            VersionToken::Min(min) => family
                .iter()
                .copied()
                .filter(|id| self.version_of(*id) >= Some(min))
                .collect(),
            VersionToken::Latest => Vec::new(),
        };
        let pool: &[PackageId] = if matching.is_empty() { family } else { &matching };

        let top = pool.iter().copied().filter_map(|id| self.version_of(id)).max()?;
        pool.iter()
            .copied()
            .filter(|id| self.version_of(*id) == Some(top))
            .min_by(|a, b| {
                let pa = &self.library.package(*a).location;
                let pb = &self.library.package(*b).location;
                pa.as_os_str()
                    .len()
                    .cmp(&pb.as_os_str().len())
                    .then_with(|| pa.cmp(pb))
            })
    }

    fn version_of(&self, id: PackageId) -> Option<u32> {
        self.library.package(id).name.exact_version()
    }

    /// Scene-relative lookup first, then absolute from the package root.
    fn find_in_package(&self, package: PackageId, rel: &str, local_dir: &str) -> Option<ItemId> {
        if let Some(relative) = join_normalized(local_dir, rel) {
            if let Some(item) = self.index.entry(package, &lookup_key(&relative)) {
                return Some(item);
            }
        }
        let absolute = normalize(rel)?;
        self.index.entry(package, &lookup_key(&absolute))
    }

    /// Bare-path lookup among loose files of the library.
    fn resolve_loose(&self, rel: &str, local_dir: &str) -> PathResolution {
        if let Some(relative) = join_normalized(local_dir, rel) {
            if let Some(item) = self.pick_loose(&lookup_key(&relative)) {
                return PathResolution::Resolved(item);
            }
        }
        match normalize(rel) {
            Some(absolute) => self
                .pick_loose(&lookup_key(&absolute))
                .map_or(PathResolution::Missing, PathResolution::Resolved),
            None => PathResolution::Missing,
        }
    }

    /// Duplicate loose paths: prefer a primary copy, then the one used by
    /// the most other text assets, then the first by absolute path (the
    /// index pre-sorts on absolute path).
    fn pick_loose(&self, key: &str) -> Option<ItemId> {
        let candidates = self.index.loose(key);
        match candidates {
            [] => None,
            [only] => Some(*only),
            _ => {
                let primaries: Vec<ItemId> = candidates
                    .iter()
                    .copied()
                    .filter(|id| self.library.item(*id).primary)
                    .collect();
                let pool: &[ItemId] = if primaries.is_empty() {
                    candidates
                } else {
                    &primaries
                };
                pool.iter().copied().min_by_key(|id| {
                    let item = self.library.item(*id);
                    (
                        std::cmp::Reverse(item.usage_count()),
                        item.absolute_path.clone(),
                    )
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn package(
        library: &mut Library,
        name: &str,
        location: &str,
        primary: bool,
    ) -> PackageId {
        library.add_package(
            PackageName::parse(name).unwrap(),
            PathBuf::from(location),
            0,
            primary,
        )
    }

    fn reference(value: &str) -> Reference {
        Reference::new(value.to_string(), 0, value.len())
    }

    #[test]
    fn self_token_resolves_within_the_package() {
        let mut library = Library::new();
        let pkg = package(&mut library, "Author.Pack.1", "/lib/Author.Pack.1.var", true);
        let tex = library.add_entry(pkg, "Custom/tex.png".into(), 1);
        let index = LibraryIndex::build(&library);
        let resolver = PathResolver::new(&library, &index);

        let outcome = resolver.resolve(Some(pkg), &reference("SELF:/Custom/tex.png"), "Saves");
        assert_eq!(outcome, PathResolution::Resolved(tex));
    }

    #[test]
    fn scene_relative_wins_over_root_absolute() {
        let mut library = Library::new();
        let pkg = package(&mut library, "Author.Pack.1", "/lib/Author.Pack.1.var", true);
        let near = library.add_entry(pkg, "Saves/scene/tex.png".into(), 1);
        let _far = library.add_entry(pkg, "tex.png".into(), 1);
        let index = LibraryIndex::build(&library);
        let resolver = PathResolver::new(&library, &index);

        let outcome = resolver.resolve(Some(pkg), &reference("tex.png"), "Saves/scene");
        assert_eq!(outcome, PathResolution::Resolved(near));
    }

    #[test]
    fn latest_selects_the_maximum_version() {
        let mut library = Library::new();
        let v1 = package(&mut library, "Author.Pack.1", "/lib/Author.Pack.1.var", true);
        let v2 = package(&mut library, "Author.Pack.2", "/lib/Author.Pack.2.var", true);
        let _old = library.add_entry(v1, "Custom/model.vam".into(), 1);
        let new = library.add_entry(v2, "Custom/model.vam".into(), 1);
        let index = LibraryIndex::build(&library);
        let resolver = PathResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &reference("Author.Pack.latest:/Custom/model.vam"), "");
        assert_eq!(outcome, PathResolution::Resolved(new));
    }

    #[test]
    fn min_prefers_qualifying_versions() {
        let mut library = Library::new();
        let v1 = package(&mut library, "Author.Pack.1", "/lib/Author.Pack.1.var", true);
        let v3 = package(&mut library, "Author.Pack.3", "/lib/Author.Pack.3.var", true);
        let _old = library.add_entry(v1, "x.png".into(), 1);
        let wanted = library.add_entry(v3, "x.png".into(), 1);
        let index = LibraryIndex::build(&library);
        let resolver = PathResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &reference("Author.Pack.min2:/x.png"), "");
        assert_eq!(outcome, PathResolution::Resolved(wanted));
    }

    #[test]
    fn exact_miss_falls_back_to_the_family_maximum() {
        let mut library = Library::new();
        let v2 = package(&mut library, "Author.Pack.2", "/lib/Author.Pack.2.var", true);
        let entry = library.add_entry(v2, "x.png".into(), 1);
        let index = LibraryIndex::build(&library);
        let resolver = PathResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &reference("Author.Pack.1:/x.png"), "");
        assert_eq!(outcome, PathResolution::Resolved(entry));
    }

    #[test]
    fn unknown_family_reports_the_package_name() {
        let library = Library::new();
        let index = LibraryIndex::build(&library);
        let resolver = PathResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &reference("Nobody.Home.latest:/x.png"), "");
        assert_eq!(
            outcome,
            PathResolution::UnknownPackage("Nobody.Home.latest".into())
        );
    }

    #[test]
    fn loose_duplicates_prefer_primary() {
        let mut library = Library::new();
        let _repo = library.add_loose_file(
            "/repo/Custom/tex.png".into(),
            "Custom/tex.png".into(),
            1,
            None,
            false,
        );
        let primary = library.add_loose_file(
            "/lib/Custom/tex.png".into(),
            "Custom/tex.png".into(),
            1,
            None,
            true,
        );
        let index = LibraryIndex::build(&library);
        let resolver = PathResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &reference("Custom/tex.png"), "");
        assert_eq!(outcome, PathResolution::Resolved(primary));
    }

    #[test]
    fn loose_duplicates_fall_back_to_usage_then_path() {
        let mut library = Library::new();
        let a = library.add_loose_file(
            "/lib/a/Custom/tex.png".into(),
            "Custom/tex.png".into(),
            1,
            None,
            false,
        );
        let b = library.add_loose_file(
            "/lib/b/Custom/tex.png".into(),
            "Custom/tex.png".into(),
            1,
            None,
            false,
        );
        let scene = library.add_loose_file(
            "/lib/scene.json".into(),
            "scene.json".into(),
            1,
            None,
            true,
        );
        library.record_resolved(scene, 0, b);
        let index = LibraryIndex::build(&library);
        let resolver = PathResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &reference("Custom/tex.png"), "");
        assert_eq!(outcome, PathResolution::Resolved(b));

        // With equal usage the lowest absolute path wins.
        let mut library2 = Library::new();
        let a2 = library2.add_loose_file(
            "/lib/a/Custom/tex.png".into(),
            "Custom/tex.png".into(),
            1,
            None,
            false,
        );
        let _b2 = library2.add_loose_file(
            "/lib/b/Custom/tex.png".into(),
            "Custom/tex.png".into(),
            1,
            None,
            false,
        );
        let index2 = LibraryIndex::build(&library2);
        let resolver2 = PathResolver::new(&library2, &index2);
        let outcome2 = resolver2.resolve(None, &reference("Custom/tex.png"), "");
        assert_eq!(outcome2, PathResolution::Resolved(a2));
        let _ = a;
    }

    #[test]
    fn traversal_cannot_escape_the_root() {
        let mut library = Library::new();
        let pkg = package(&mut library, "Author.Pack.1", "/lib/Author.Pack.1.var", true);
        let _tex = library.add_entry(pkg, "Custom/tex.png".into(), 1);
        let index = LibraryIndex::build(&library);
        let resolver = PathResolver::new(&library, &index);

        let outcome = resolver.resolve(Some(pkg), &reference("../../Custom/tex.png"), "");
        assert_eq!(outcome, PathResolution::Missing);
    }
}
