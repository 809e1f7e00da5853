use content_model::{is_preset_like_ext, ItemId, Library, PackageId};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Trimmed transitive dependency closure of one or more text assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    pub packages: BTreeSet<PackageId>,
    /// Loose-file dependencies.
    pub files: BTreeSet<ItemId>,
    /// Every resolved target the traversal touched, loose or packaged;
    /// memo invalidation checks membership here.
    targets: BTreeSet<ItemId>,
}

impl DependencySet {
    fn absorb(&mut self, other: &Self) {
        self.packages.extend(other.packages.iter().copied());
        self.files.extend(other.files.iter().copied());
        self.targets.extend(other.targets.iter().copied());
    }
}

/// Computes trimmed dependency closures over the resolved graph.
///
/// Traversal is iterative (explicit stack + seen set, the corpus graph is
/// cyclic) and only expands through preset-like targets that carry
/// references of their own: scene -> sub-scene -> preset chains. Consumed
/// leaf assets (textures, audio) are recorded but never fanned out through,
/// so two scenes sharing a texture stay independent.
#[derive(Debug, Default)]
pub struct DependencyCalculator {
    memo: HashMap<ItemId, DependencySet>,
}

impl DependencyCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Closure from the resolved references of one item, memoized.
    pub fn item_dependencies(&mut self, library: &Library, start: ItemId) -> &DependencySet {
        if !self.memo.contains_key(&start) {
            let computed = compute(library, start);
            self.memo.insert(start, computed);
        }
        &self.memo[&start]
    }

    /// Union closure over several starting text assets.
    pub fn items_dependencies(&mut self, library: &Library, starts: &[ItemId]) -> DependencySet {
        let mut union = DependencySet::default();
        for start in starts {
            union.absorb(self.item_dependencies(library, *start));
        }
        union
    }

    /// Union closure over a package's own text assets, excluding the
    /// package itself.
    pub fn package_dependencies(&mut self, library: &Library, package: PackageId) -> DependencySet {
        let starts: Vec<ItemId> = library
            .package(package)
            .entries()
            .iter()
            .copied()
            .filter(|entry| !library.item(*entry).references().is_empty())
            .collect();
        let mut set = self.items_dependencies(library, &starts);
        set.packages.remove(&package);
        set
    }

    /// Count of non-primary packages and non-primary loose files in the
    /// closure; the first identity tie-break criterion.
    pub fn external_weight(&mut self, library: &Library, start: ItemId) -> usize {
        let set = self.item_dependencies(library, start);
        let packages = set
            .packages
            .iter()
            .filter(|p| !library.package(**p).primary)
            .count();
        let files = set
            .files
            .iter()
            .filter(|f| !library.item(**f).primary)
            .count();
        packages + files
    }

    /// Drop memo entries whose closure runs through `item`; called whenever
    /// new references are appended to it (delayed resolution).
    pub fn invalidate(&mut self, item: ItemId) {
        let before = self.memo.len();
        self.memo
            .retain(|start, set| *start != item && !set.targets.contains(&item));
        let dropped = before - self.memo.len();
        if dropped > 0 {
            log::debug!("invalidated {dropped} dependency memo entries");
        }
    }
}

fn compute(library: &Library, start: ItemId) -> DependencySet {
    let mut set = DependencySet::default();
    let mut seen: HashSet<ItemId> = HashSet::new();
    let mut stack: Vec<ItemId> = Vec::new();

    // A composite parent travels with its children; their references are
    // its references.
    seen.insert(start);
    for resolved in library.item(start).resolved() {
        stack.push(resolved.target);
    }
    for child in library.item(start).children() {
        seen.insert(*child);
        for resolved in library.item(*child).resolved() {
            stack.push(resolved.target);
        }
    }

    while let Some(target) = stack.pop() {
        if !seen.insert(target) {
            continue;
        }
        set.targets.insert(target);

        let item = library.item(target);
        match item.package {
            Some(package) => {
                set.packages.insert(package);
            }
            None => {
                set.files.insert(target);
            }
        }

        let preset_like = item.ext.as_deref().is_some_and(is_preset_like_ext);
        if preset_like && !item.references().is_empty() {
            for resolved in item.resolved() {
                stack.push(resolved.target);
            }
        }
    }

    set
}
