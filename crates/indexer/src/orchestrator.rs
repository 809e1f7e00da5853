use crate::diagnostics::Diagnostics;
use crate::error::{IndexerError, Result};
use crate::source::{ContentEnumerator, EntryReader, Listing, PackageListing};
use crate::stats::ScanStats;
use content_deps::{DependencyCalculator, DependencySet};
use content_model::{
    group_composites, parent_dir, ItemId, Library, LibraryIndex, PackageId, PackageName,
};
use content_ref_scanner::{extract_identity_marker, scan_text, IdentityMarker, ScanOutcome};
use content_resolver::{
    DelayedQueue, DelayedReference, GlobalTieBreak, IdentityOutcome, IdentityResolver,
    PathResolution, PathResolver,
};
use content_scan_cache::{Classification, ScanCache};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Per-asset scan state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Pending,
    Scanning,
    /// Every reference resolved or recorded missing.
    Resolved,
    /// At least one identity match waits for the global pass.
    HasDelayed,
}

/// Tuning knobs for one scan run.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Worker-pool width; defaults to available parallelism, clamped to a
    /// small range (file reads mix IO and CPU; a high fan-out only spikes
    /// memory).
    pub max_concurrency: Option<usize>,
}

impl ScanConfig {
    fn worker_width(&self) -> usize {
        match self.max_concurrency {
            Some(width) => width.max(1),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .clamp(2, 8),
        }
    }
}

/// Drives one full scan run: enumerate, classify, scan, resolve, compute
/// dependencies, settle delayed identities, persist.
pub struct ScanOrchestrator {
    enumerator: Box<dyn ContentEnumerator>,
    reader: Arc<dyn EntryReader>,
    cache: ScanCache,
    config: ScanConfig,
}

/// Everything a run produces: the resolved text-asset graph, dependency
/// access, diagnostics and counters.
pub struct ScanReport {
    pub library: Library,
    pub diagnostics: Diagnostics,
    pub stats: ScanStats,
    pub asset_states: HashMap<ItemId, ScanState>,
    calculator: DependencyCalculator,
}

impl ScanReport {
    /// Trimmed dependency closure of one text asset or loose file.
    pub fn item_dependencies(&mut self, item: ItemId) -> DependencySet {
        self.calculator.item_dependencies(&self.library, item).clone()
    }

    /// Trimmed dependency closure of a whole package.
    pub fn package_dependencies(&mut self, package: PackageId) -> DependencySet {
        self.calculator.package_dependencies(&self.library, package)
    }
}

impl ScanOrchestrator {
    pub fn new(
        enumerator: Box<dyn ContentEnumerator>,
        reader: Arc<dyn EntryReader>,
        cache: ScanCache,
    ) -> Self {
        Self {
            enumerator,
            reader,
            cache,
            config: ScanConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the full pipeline over one closed snapshot of the library.
    pub async fn run(mut self) -> Result<ScanReport> {
        let start = Instant::now();
        let mut stats = ScanStats::new();
        let mut diagnostics = Diagnostics::new();

        // 1. Enumerate the snapshot and build the corpus.
        let listing = self.enumerator.enumerate()?;
        let mut library = Library::new();
        build_corpus(&mut library, listing, &mut diagnostics);
        group_composites(&mut library);

        stats.packages = library.packages().filter(|p| !p.invalid).count();
        stats.loose_files = library.items().filter(|i| !i.is_entry()).count();

        // 2. Classify against the cache; clean items hydrate from their
        // stored record and are never re-read.
        let mut dirty: Vec<ItemId> = Vec::new();
        let scannable: Vec<ItemId> = library
            .item_ids()
            .filter(|id| {
                let item = library.item(*id);
                item.is_text_asset() || item.is_identity_asset()
            })
            .collect();
        for id in &scannable {
            match self.cache.classify(library.item(*id)) {
                Classification::Clean => {
                    if let Some(record) = self.cache.load(library.item(*id)) {
                        library.set_references(*id, record.references);
                        let item = library.item_mut(*id);
                        item.internal_id = record.internal_id;
                        item.morph_name = record.morph_name;
                        item.dirty = false;
                    }
                }
                Classification::Dirty => dirty.push(*id),
            }
        }
        stats.text_assets = library.text_asset_ids().count();
        stats.dirty_assets = dirty
            .iter()
            .filter(|id| library.item(**id).is_text_asset())
            .count();
        stats.clean_assets = stats.text_assets - stats.dirty_assets;
        log::info!(
            "Scanning {} of {} text assets ({} clean)",
            stats.dirty_assets,
            stats.text_assets,
            stats.clean_assets
        );

        // 3. Scan phase: read dirty items through a bounded worker pool.
        let units = build_units(&library, &dirty);
        stats.text_reads = units.iter().map(ScanUnit::item_count).sum();
        let outcomes = self.scan_units_parallel(units).await?;
        apply_outcomes(&mut library, outcomes, &mut diagnostics);

        // 4. Read-only indices, then deterministic sequential resolution.
        let index = LibraryIndex::build(&library);
        let mut queue = DelayedQueue::new();
        let mut asset_states: HashMap<ItemId, ScanState> = HashMap::new();
        resolve_references(
            &mut library,
            &index,
            &mut queue,
            &mut asset_states,
            &mut diagnostics,
            &mut stats,
        );

        // 5. Dependency phase: closures exist before the global identity
        // pass needs their weights.
        let mut calculator = DependencyCalculator::new();
        let started_assets: Vec<ItemId> = library
            .text_asset_ids()
            .filter(|id| !library.item(*id).references().is_empty())
            .collect();
        for id in &started_assets {
            calculator.item_dependencies(&library, *id);
        }

        // 6. Delayed-resolution phase: one deterministic winner per id.
        let mut tie_break = GlobalTieBreak::new();
        let delayed: Vec<DelayedReference> = queue.drain().collect();
        for entry in delayed {
            match tie_break.winner(&library, &mut calculator, &entry.id, &entry.candidates) {
                Some(winner) => {
                    library.record_resolved(entry.owner, entry.reference, winner);
                    stats.resolved += 1;
                    // New references on the owner invalidate closures that
                    // run through it (and through its composite parent).
                    calculator.invalidate(entry.owner);
                    if let Some(parent) = library.item(entry.owner).parent() {
                        calculator.invalidate(parent);
                    }
                }
                None => {
                    let value = library.item(entry.owner).references()[entry.reference]
                        .value
                        .clone();
                    library.record_missing(entry.owner, value);
                    stats.missing += 1;
                }
            }
            asset_states.insert(entry.owner, ScanState::Resolved);
        }

        // 7. Persist phase: store scan results of dirty items; entries of
        // packages that went invalid mid-run are not cached.
        let cacheable: Vec<ItemId> = dirty
            .into_iter()
            .filter(|id| {
                library
                    .item(*id)
                    .package
                    .is_none_or(|pkg| !library.package(pkg).invalid)
            })
            .collect();
        self.cache.save(&library, &cacheable);
        self.cache.flush()?;

        #[allow(clippy::cast_possible_truncation)]
        {
            stats.time_ms = start.elapsed().as_millis() as u64;
            if stats.time_ms == 0 {
                stats.time_ms = 1;
            }
        }
        log::info!(
            "Scan completed: {} resolved, {} missing, {} delayed",
            stats.resolved,
            stats.missing,
            stats.delayed
        );

        Ok(ScanReport {
            library,
            diagnostics,
            stats,
            asset_states,
            calculator,
        })
    }

    /// Process units in chunks of the configured width; each worker owns
    /// its unit (and its own archive handle).
    async fn scan_units_parallel(&self, units: Vec<ScanUnit>) -> Result<Vec<UnitOutcome>> {
        let width = self.config.worker_width();
        let mut outcomes = Vec::with_capacity(units.len());
        let mut pending = units.into_iter();

        loop {
            let chunk: Vec<ScanUnit> = pending.by_ref().take(width).collect();
            if chunk.is_empty() {
                break;
            }
            let mut tasks = Vec::with_capacity(chunk.len());
            for unit in chunk {
                let reader = Arc::clone(&self.reader);
                tasks.push(tokio::task::spawn_blocking(move || {
                    scan_unit(reader.as_ref(), unit)
                }));
            }
            for task in tasks {
                match task.await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(err) => {
                        return Err(IndexerError::Other(format!("scan worker panicked: {err}")))
                    }
                }
            }
        }

        Ok(outcomes)
    }
}

/// Admit enumerated packages and loose files into the arena.
fn build_corpus(library: &mut Library, listing: Listing, diagnostics: &mut Diagnostics) {
    let (packages, duplicates) = dedup_packages(listing.packages);
    for (dropped, kept) in duplicates {
        diagnostics.duplicate_package(&dropped, &kept);
    }

    for package in packages {
        let location = package.location.display().to_string();
        if !package.has_manifest {
            diagnostics.invalid_package(&location, "missing manifest");
            continue;
        }
        let name = match PackageName::parse_filename(&package.file_name) {
            Ok(name) => name,
            Err(err) => {
                diagnostics.invalid_package(&location, &err.to_string());
                continue;
            }
        };

        let id = library.add_package(name, package.location, package.size, package.primary);
        for entry in package.entries {
            let entry_id = library.add_entry(id, entry.local_path, entry.size);
            library.item_mut(entry_id).modified_ms = package.modified_ms;
        }
    }

    for loose in listing.loose_files {
        library.add_loose_file(
            loose.absolute_path,
            loose.local_path,
            loose.size,
            loose.modified_ms,
            loose.primary,
        );
    }
}

/// Keep one copy per package filename: primary location first, then the
/// shortest path, then lexicographic. Returns `(kept, dropped-vs-kept)`.
fn dedup_packages(packages: Vec<PackageListing>) -> (Vec<PackageListing>, Vec<(String, String)>) {
    let mut by_name: BTreeMap<String, Vec<PackageListing>> = BTreeMap::new();
    for package in packages {
        by_name
            .entry(package.file_name.to_ascii_lowercase())
            .or_default()
            .push(package);
    }

    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for (_, mut group) in by_name {
        group.sort_by(|a, b| {
            b.primary
                .cmp(&a.primary)
                .then_with(|| a.location.as_os_str().len().cmp(&b.location.as_os_str().len()))
                .then_with(|| a.location.cmp(&b.location))
        });
        let winner = group.remove(0);
        for loser in group {
            dropped.push((
                loser.location.display().to_string(),
                winner.location.display().to_string(),
            ));
        }
        kept.push(winner);
    }
    kept.sort_by(|a, b| a.location.cmp(&b.location));
    (kept, dropped)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadKind {
    /// Scan the document for references.
    Text,
    /// Extract the single identity marker.
    Marker,
}

#[derive(Debug)]
struct UnitItem {
    id: ItemId,
    local_path: String,
    ext: String,
    kind: PayloadKind,
    family: Option<String>,
}

/// One unit of worker-pool work: a package (opened once, read wholly, then
/// closed) or a single loose file.
#[derive(Debug)]
enum ScanUnit {
    Package {
        package: PackageId,
        location: PathBuf,
        items: Vec<UnitItem>,
    },
    Loose {
        path: PathBuf,
        item: UnitItem,
    },
}

impl ScanUnit {
    fn item_count(&self) -> usize {
        match self {
            Self::Package { items, .. } => items.len(),
            Self::Loose { .. } => 1,
        }
    }
}

enum Payload {
    Text(ScanOutcome),
    Marker(Option<IdentityMarker>),
}

struct UnitOutcome {
    package: Option<(PackageId, String)>,
    open_error: Option<String>,
    assets: Vec<(ItemId, std::result::Result<Payload, String>)>,
}

fn build_units(library: &Library, dirty: &[ItemId]) -> Vec<ScanUnit> {
    let mut by_package: BTreeMap<PackageId, Vec<UnitItem>> = BTreeMap::new();
    let mut units = Vec::new();

    for id in dirty {
        let item = library.item(*id);
        let unit_item = UnitItem {
            id: *id,
            local_path: item.local_path.clone(),
            ext: item.ext.clone().unwrap_or_default(),
            kind: if item.is_text_asset() {
                PayloadKind::Text
            } else {
                PayloadKind::Marker
            },
            family: item.package.map(|pkg| library.package(pkg).name.family_key()),
        };
        match item.package {
            Some(package) => by_package.entry(package).or_default().push(unit_item),
            None => units.push(ScanUnit::Loose {
                path: item.absolute_path.clone(),
                item: unit_item,
            }),
        }
    }

    for (package, items) in by_package {
        units.push(ScanUnit::Package {
            package,
            location: library.package(package).location.clone(),
            items,
        });
    }
    units
}

/// Worker body: bounded I/O per item, isolated results, no shared state.
fn scan_unit(reader: &dyn EntryReader, unit: ScanUnit) -> UnitOutcome {
    match unit {
        ScanUnit::Loose { path, item } => {
            let result = reader
                .read_loose(&path)
                .map(|text| payload_for(&item, &text))
                .map_err(|err| err.to_string());
            UnitOutcome {
                package: None,
                open_error: None,
                assets: vec![(item.id, result)],
            }
        }
        ScanUnit::Package {
            package,
            location,
            items,
        } => {
            let location_display = location.display().to_string();
            let mut handle = match reader.open_package(&location) {
                Ok(handle) => handle,
                Err(err) => {
                    return UnitOutcome {
                        package: Some((package, location_display)),
                        open_error: Some(err.to_string()),
                        assets: Vec::new(),
                    }
                }
            };
            let assets = items
                .into_iter()
                .map(|item| {
                    let result = handle
                        .read_entry(&item.local_path)
                        .map(|text| payload_for(&item, &text))
                        .map_err(|err| err.to_string());
                    (item.id, result)
                })
                .collect();
            // The handle drops here: one open per worker per package.
            UnitOutcome {
                package: Some((package, location_display)),
                open_error: None,
                assets,
            }
        }
    }
}

fn payload_for(item: &UnitItem, text: &str) -> Payload {
    match item.kind {
        PayloadKind::Text => Payload::Text(scan_text(text, item.family.as_deref())),
        PayloadKind::Marker => Payload::Marker(extract_identity_marker(&item.ext, text)),
    }
}

/// Fold isolated worker results into the arena, in unit order.
fn apply_outcomes(
    library: &mut Library,
    outcomes: Vec<UnitOutcome>,
    diagnostics: &mut Diagnostics,
) {
    for outcome in outcomes {
        if let Some(error) = outcome.open_error {
            let (package, location) = outcome.package.expect("open errors come from packages");
            library.package_mut(package).invalid = true;
            diagnostics.invalid_package(&location, &error);
            continue;
        }

        for (id, result) in outcome.assets {
            let origin = library.item(id).canonical_key();
            match result {
                Ok(Payload::Text(scan)) => {
                    for warning in &scan.warnings {
                        diagnostics.parse_warning(&origin, warning.line, &warning.message);
                    }
                    library.set_references(id, scan.references);
                }
                Ok(Payload::Marker(marker)) => match marker {
                    Some(IdentityMarker::InternalId(value)) => {
                        library.item_mut(id).internal_id = Some(value);
                    }
                    Some(IdentityMarker::MorphName(value)) => {
                        library.item_mut(id).morph_name = Some(value);
                    }
                    None => {}
                },
                Err(error) => diagnostics.read_error(&origin, &error),
            }
        }
    }
}

enum Action {
    Record(ItemId),
    Missing(String),
    Delay(String, Vec<ItemId>),
}

struct Decision {
    reference: usize,
    action: Action,
    unresolved_package: Option<String>,
}

/// Resolve every text asset's references against the read-only indices, in
/// arena order. Each asset's decisions are computed immutably, then folded
/// into the arena before the next asset, so used-by tie-breaks see every
/// earlier resolution.
fn resolve_references(
    library: &mut Library,
    index: &LibraryIndex,
    queue: &mut DelayedQueue,
    asset_states: &mut HashMap<ItemId, ScanState>,
    diagnostics: &mut Diagnostics,
    stats: &mut ScanStats,
) {
    let assets: Vec<ItemId> = library.text_asset_ids().collect();
    for id in assets {
        let owner_package = library.item(id).package;
        if owner_package.is_some_and(|pkg| library.package(pkg).invalid) {
            asset_states.insert(id, ScanState::Pending);
            continue;
        }
        asset_states.insert(id, ScanState::Scanning);

        let decisions: Vec<Decision> = {
            let paths = PathResolver::new(library, index);
            let identities = IdentityResolver::new(library, index);
            let item = library.item(id);
            let local_dir = parent_dir(&item.local_path).to_string();

            item.references()
                .iter()
                .enumerate()
                .map(|(reference, raw)| {
                    let path_outcome = paths.resolve(owner_package, raw, &local_dir);
                    let unresolved_package = match &path_outcome {
                        PathResolution::UnknownPackage(name) => Some(name.clone()),
                        _ => None,
                    };

                    let action = if raw.has_identity() {
                        match identities.resolve(owner_package, raw, path_outcome.target()) {
                            IdentityOutcome::Resolved(target) => Action::Record(target),
                            IdentityOutcome::Missing => Action::Missing(raw.value.clone()),
                            IdentityOutcome::Delayed { id, candidates } => {
                                Action::Delay(id, candidates)
                            }
                        }
                    } else {
                        match path_outcome {
                            PathResolution::Resolved(target) => Action::Record(target),
                            PathResolution::Missing | PathResolution::UnknownPackage(_) => {
                                Action::Missing(raw.value.clone())
                            }
                        }
                    };

                    Decision {
                        reference,
                        action,
                        unresolved_package,
                    }
                })
                .collect()
        };

        stats.references += decisions.len();
        let mut has_delayed = false;
        for decision in decisions {
            if let Some(name) = decision.unresolved_package {
                diagnostics.unresolved_package(&name);
            }
            match decision.action {
                Action::Record(target) => {
                    library.record_resolved(id, decision.reference, target);
                    stats.resolved += 1;
                }
                Action::Missing(value) => {
                    library.record_missing(id, value);
                    stats.missing += 1;
                }
                Action::Delay(delayed_id, candidates) => {
                    queue.push(DelayedReference {
                        owner: id,
                        reference: decision.reference,
                        id: delayed_id,
                        candidates,
                    });
                    stats.delayed += 1;
                    has_delayed = true;
                }
            }
        }

        asset_states.insert(
            id,
            if has_delayed {
                ScanState::HasDelayed
            } else {
                ScanState::Resolved
            },
        );
    }
}
