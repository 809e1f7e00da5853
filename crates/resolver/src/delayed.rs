use content_deps::DependencyCalculator;
use content_model::{ItemId, Library};
use std::cmp::Reverse;
use std::collections::HashMap;

/// One identity match deferred until global corpus knowledge exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedReference {
    pub owner: ItemId,
    /// Index into the owner's raw reference list.
    pub reference: usize,
    pub id: String,
    pub candidates: Vec<ItemId>,
}

/// Work queue of delayed identity matches, drained by the global pass.
#[derive(Debug, Default)]
pub struct DelayedQueue {
    entries: Vec<DelayedReference>,
}

impl DelayedQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DelayedReference) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = DelayedReference> + '_ {
        self.entries.drain(..)
    }
}

/// Deterministic global tie-break over delayed identity matches.
///
/// Runs after scanning and dependency computation: the chain needs full
/// dependency weights and usage counts. The winner for each distinct id is
/// cached for the rest of the run, so repeated occurrences resolve
/// identically without re-running the tie-break.
#[derive(Debug, Default)]
pub struct GlobalTieBreak {
    winners: HashMap<String, ItemId>,
}

impl GlobalTieBreak {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the winning candidate for an id: lowest transitive dependency
    /// weight restricted to non-primary items, then highest used-by count,
    /// then smallest total size including composite children, then the
    /// stable lexicographic order of the canonical key.
    pub fn winner(
        &mut self,
        library: &Library,
        calculator: &mut DependencyCalculator,
        id: &str,
        candidates: &[ItemId],
    ) -> Option<ItemId> {
        if let Some(winner) = self.winners.get(id) {
            return Some(*winner);
        }

        let winner = candidates.iter().copied().min_by_key(|candidate| {
            let item = library.item(*candidate);
            (
                calculator.external_weight(library, *candidate),
                Reverse(item.usage_count()),
                library.total_size(*candidate),
                item.canonical_key(),
            )
        })?;

        log::debug!("delayed id \"{id}\" resolved to {}", library.item(winner).canonical_key());
        self.winners.insert(id.to_string(), winner);
        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_model::{PackageName, Reference};
    use pretty_assertions::assert_eq;

    fn loose(library: &mut Library, path: &str, primary: bool) -> ItemId {
        library.add_loose_file(
            format!("/lib/{path}").into(),
            path.to_string(),
            1,
            None,
            primary,
        )
    }

    fn link(library: &mut Library, from: ItemId, to: ItemId) {
        let value = library.item(to).local_path.clone();
        let index = library.item(from).references().len();
        let mut refs = library.item(from).references().to_vec();
        refs.push(Reference::new(value.clone(), 0, value.len()));
        library.set_references(from, refs);
        library.record_resolved(from, index, to);
    }

    #[test]
    fn lower_external_weight_wins() {
        let mut library = Library::new();
        let repo_pkg = library.add_package(
            PackageName::parse("Repo.Pack.1").unwrap(),
            "/repo/Repo.Pack.1.var".into(),
            0,
            false,
        );
        let heavy = loose(&mut library, "a/morph.vmi", true);
        let light = loose(&mut library, "b/morph.vmi", true);
        let external = library.add_entry(repo_pkg, "Custom/part.vap".into(), 1);
        link(&mut library, heavy, external);

        let mut calculator = DependencyCalculator::new();
        let mut tie_break = GlobalTieBreak::new();
        let winner = tie_break.winner(&library, &mut calculator, "Foo", &[heavy, light]);
        assert_eq!(winner, Some(light));
    }

    #[test]
    fn equal_weights_fall_back_to_usage() {
        let mut library = Library::new();
        let a = loose(&mut library, "a/morph.vmi", true);
        let b = loose(&mut library, "b/morph.vmi", true);
        let scene = loose(&mut library, "scene.json", true);
        link(&mut library, scene, b);

        let mut calculator = DependencyCalculator::new();
        let mut tie_break = GlobalTieBreak::new();
        let winner = tie_break.winner(&library, &mut calculator, "Foo", &[a, b]);
        assert_eq!(winner, Some(b));
    }

    #[test]
    fn size_breaks_remaining_ties() {
        let mut library = Library::new();
        let big = loose(&mut library, "a/morph.vmi", true);
        let big_child = loose(&mut library, "a/morph.vmb", true);
        library.item_mut(big_child).size = 100;
        library.attach_child(big, big_child);
        let small = loose(&mut library, "b/morph.vmi", true);

        let mut calculator = DependencyCalculator::new();
        let mut tie_break = GlobalTieBreak::new();
        let winner = tie_break.winner(&library, &mut calculator, "Foo", &[big, small]);
        assert_eq!(winner, Some(small));
    }

    #[test]
    fn final_tie_is_lexicographic_and_cached() {
        let mut library = Library::new();
        let a = loose(&mut library, "a/morph.vmi", true);
        let b = loose(&mut library, "b/morph.vmi", true);

        let mut calculator = DependencyCalculator::new();
        let mut tie_break = GlobalTieBreak::new();
        let first = tie_break.winner(&library, &mut calculator, "Foo", &[b, a]);
        assert_eq!(first, Some(a));

        // Cached winner: same id resolves identically even with a
        // different candidate set.
        let second = tie_break.winner(&library, &mut calculator, "Foo", &[b]);
        assert_eq!(second, Some(a));
    }

    #[test]
    fn queue_drains_in_order() {
        let mut library = Library::new();
        let owner = loose(&mut library, "scene.json", true);

        let mut queue = DelayedQueue::new();
        assert!(queue.is_empty());
        queue.push(DelayedReference {
            owner,
            reference: 0,
            id: "Foo".into(),
            candidates: Vec::new(),
        });
        assert_eq!(queue.len(), 1);
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained[0].id, "Foo");
        assert!(queue.is_empty());
    }
}
