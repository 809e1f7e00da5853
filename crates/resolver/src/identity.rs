use crate::token::ReferenceToken;
use content_model::{
    morph_gender, normalize, ItemId, Library, LibraryIndex, PackageId, Reference,
};

/// Outcome of the in-scan identity matching pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    Resolved(ItemId),
    /// No candidate shares the id: permanently missing.
    Missing,
    /// Still ambiguous after narrowing; queued for the global pass.
    Delayed { id: String, candidates: Vec<ItemId> },
}

/// Resolves identity-qualified references (avatar internal ids and morph
/// names) against the read-only identity indices.
pub struct IdentityResolver<'a> {
    library: &'a Library,
    index: &'a LibraryIndex,
}

impl<'a> IdentityResolver<'a> {
    #[must_use]
    pub const fn new(library: &'a Library, index: &'a LibraryIndex) -> Self {
        Self { library, index }
    }

    /// Match one identity-carrying reference. `fallback` is the candidate a
    /// prior path-based attempt produced, if any.
    #[must_use]
    pub fn resolve(
        &self,
        owner: Option<PackageId>,
        reference: &Reference,
        fallback: Option<ItemId>,
    ) -> IdentityOutcome {
        let (id, is_morph) = match (&reference.internal_id, &reference.morph_name) {
            (Some(id), _) => (id.as_str(), false),
            (None, Some(name)) => (name.as_str(), true),
            (None, None) => return IdentityOutcome::Missing,
        };

        let mut candidates: Vec<ItemId> = if is_morph {
            let reference_gender = normalize(ReferenceToken::parse(&reference.value).relative_path())
                .as_deref()
                .and_then(morph_gender);
            self.index
                .by_morph_name(id)
                .iter()
                .copied()
                .filter(|candidate| {
                    let candidate_gender = morph_gender(&self.library.item(*candidate).local_path);
                    match (reference_gender, candidate_gender) {
                        (Some(a), Some(b)) => a.compatible(b),
                        _ => true,
                    }
                })
                .collect()
        } else {
            self.index.by_internal_id(id).to_vec()
        };

        if let Some(fallback) = fallback {
            if !candidates.contains(&fallback) {
                candidates.push(fallback);
            }
        }
        candidates.sort_by_key(|id| self.library.item(*id).canonical_key());

        match candidates.len() {
            0 => return IdentityOutcome::Missing,
            1 => return IdentityOutcome::Resolved(candidates[0]),
            _ => {}
        }

        // Narrow to primary-location candidates, when any exist.
        let primaries: Vec<ItemId> = candidates
            .iter()
            .copied()
            .filter(|id| self.library.item(*id).primary)
            .collect();
        if !primaries.is_empty() {
            candidates = primaries;
        }
        if candidates.len() == 1 {
            return IdentityOutcome::Resolved(candidates[0]);
        }

        // Narrow to the package currently being scanned.
        if let Some(owner) = owner {
            if let Some(local) = candidates
                .iter()
                .copied()
                .find(|id| self.library.item(*id).package == Some(owner))
            {
                return IdentityOutcome::Resolved(local);
            }
        }

        IdentityOutcome::Delayed {
            id: id.to_string(),
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn morph(library: &mut Library, path: &str, name: &str, primary: bool) -> ItemId {
        let id = library.add_loose_file(
            format!("/lib/{path}").into(),
            path.to_string(),
            1,
            None,
            primary,
        );
        library.item_mut(id).morph_name = Some(name.to_string());
        id
    }

    fn morph_reference(value: &str, name: &str) -> Reference {
        let mut reference = Reference::new(value.to_string(), 0, value.len());
        reference.morph_name = Some(name.to_string());
        reference
    }

    #[test]
    fn single_candidate_resolves_immediately() {
        let mut library = Library::new();
        let only = morph(&mut library, "a/morph.vmi", "Foo", true);
        let index = LibraryIndex::build(&library);
        let resolver = IdentityResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &morph_reference("missing/m.vmi", "Foo"), None);
        assert_eq!(outcome, IdentityOutcome::Resolved(only));
    }

    #[test]
    fn no_candidate_is_permanently_missing() {
        let library = Library::new();
        let index = LibraryIndex::build(&library);
        let resolver = IdentityResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &morph_reference("missing/m.vmi", "Foo"), None);
        assert_eq!(outcome, IdentityOutcome::Missing);
    }

    #[test]
    fn primary_narrowing_yields_the_unique_survivor() {
        let mut library = Library::new();
        let _repo = morph(&mut library, "a/morph.vmi", "Foo", false);
        let primary = morph(&mut library, "b/morph.vmi", "Foo", true);
        let index = LibraryIndex::build(&library);
        let resolver = IdentityResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &morph_reference("missing/m.vmi", "Foo"), None);
        assert_eq!(outcome, IdentityOutcome::Resolved(primary));
    }

    #[test]
    fn ambiguous_candidates_are_delayed() {
        let mut library = Library::new();
        let a = morph(&mut library, "a/morph.vmi", "Foo", true);
        let b = morph(&mut library, "b/morph.vmi", "Foo", true);
        let index = LibraryIndex::build(&library);
        let resolver = IdentityResolver::new(&library, &index);

        let outcome = resolver.resolve(None, &morph_reference("missing/m.vmi", "Foo"), None);
        assert_eq!(
            outcome,
            IdentityOutcome::Delayed {
                id: "Foo".into(),
                candidates: vec![a, b],
            }
        );
    }

    #[test]
    fn genders_never_cross() {
        let mut library = Library::new();
        let _male = morph(
            &mut library,
            "Custom/Atom/Person/Morphs/male/shape.vmi",
            "Foo",
            true,
        );
        let female = morph(
            &mut library,
            "Custom/Atom/Person/Morphs/female/shape.vmi",
            "Foo",
            true,
        );
        let index = LibraryIndex::build(&library);
        let resolver = IdentityResolver::new(&library, &index);

        let outcome = resolver.resolve(
            None,
            &morph_reference("Custom/Atom/Person/Morphs/female/missing.vmi", "Foo"),
            None,
        );
        assert_eq!(outcome, IdentityOutcome::Resolved(female));
    }

    #[test]
    fn gen_subcategory_matches_its_own_gender_base() {
        let mut library = Library::new();
        let gen = morph(
            &mut library,
            "Custom/Atom/Person/Morphs/female_genitalia/g.vmi",
            "Foo",
            true,
        );
        let index = LibraryIndex::build(&library);
        let resolver = IdentityResolver::new(&library, &index);

        let outcome = resolver.resolve(
            None,
            &morph_reference("Custom/Atom/Person/Morphs/female/missing.vmi", "Foo"),
            None,
        );
        assert_eq!(outcome, IdentityOutcome::Resolved(gen));
    }

    #[test]
    fn fallback_candidate_joins_the_pool() {
        let mut library = Library::new();
        let fallback = library.add_loose_file(
            "/lib/other/thing.vmi".into(),
            "other/thing.vmi".into(),
            1,
            None,
            true,
        );
        let index = LibraryIndex::build(&library);
        let resolver = IdentityResolver::new(&library, &index);

        let outcome = resolver.resolve(
            None,
            &morph_reference("missing/m.vmi", "Foo"),
            Some(fallback),
        );
        assert_eq!(outcome, IdentityOutcome::Resolved(fallback));
    }

    #[test]
    fn same_package_candidates_win_remaining_ties() {
        use content_model::PackageName;
        let mut library = Library::new();
        let pkg = library.add_package(
            PackageName::parse("Author.Pack.1").unwrap(),
            "/lib/Author.Pack.1.var".into(),
            0,
            true,
        );
        let inside = library.add_entry(pkg, "Custom/Hair/a.vam".into(), 1);
        library.item_mut(inside).internal_id = Some("Top2".into());
        let outside = library.add_loose_file(
            "/lib/Custom/Clothing/b.vam".into(),
            "Custom/Clothing/b.vam".into(),
            1,
            None,
            true,
        );
        library.item_mut(outside).internal_id = Some("Top2".into());
        let index = LibraryIndex::build(&library);
        let resolver = IdentityResolver::new(&library, &index);

        let mut reference = Reference::new("missing/x.vam".into(), 0, 13);
        reference.internal_id = Some("Top2".into());

        let outcome = resolver.resolve(Some(pkg), &reference, None);
        assert_eq!(outcome, IdentityOutcome::Resolved(inside));
    }
}
