//! Composite sibling grouping.
//!
//! Library-relative siblings sharing a stem and differing only by a known
//! sibling extension are merged: the class parent becomes the parent item,
//! the rest become its children, and expected-but-absent siblings are
//! recorded as named gaps. A stateless post-pass over the flat listing,
//! independent of scanning.

use crate::item::{ItemId, PackageId};
use crate::library::Library;
use std::collections::BTreeMap;

/// One composite class: the parent extension and its companion extensions.
#[derive(Debug, Clone, Copy)]
pub struct SiblingClass {
    pub parent: &'static str,
    pub children: &'static [&'static str],
}

/// Known composite classes: a morph's binary payload, a clothing/hair
/// item's joint and bone companions, a preset's preview image.
pub const SIBLING_CLASSES: &[SiblingClass] = &[
    SiblingClass {
        parent: "vmi",
        children: &["vmb"],
    },
    SiblingClass {
        parent: "vam",
        children: &["vaj", "vab"],
    },
    SiblingClass {
        parent: "vap",
        children: &["jpg"],
    },
];

#[derive(Default)]
struct Group {
    parent: Option<ItemId>,
    children: Vec<(String, ItemId)>,
}

/// Run the grouping pass over every item in the arena.
pub fn group_composites(library: &mut Library) {
    for class in SIBLING_CLASSES {
        // BTreeMap keeps group application order deterministic.
        let mut groups: BTreeMap<(Option<PackageId>, String), Group> = BTreeMap::new();

        for item in library.items() {
            let Some(ext) = item.ext.as_deref() else {
                continue;
            };
            let is_parent = ext == class.parent;
            let is_child = class.children.contains(&ext);
            if !is_parent && !is_child {
                continue;
            }

            let stem = stem_key(&item.local_path, ext);
            let group = groups.entry((item.package, stem)).or_default();
            if is_parent {
                // Entry paths are unique per package; loose duplicates keep
                // the first (arena-order) claim.
                group.parent.get_or_insert(item.id());
            } else {
                group.children.push((ext.to_string(), item.id()));
            }
        }

        for group in groups.into_values() {
            let Some(parent) = group.parent else {
                continue;
            };
            for (_, child) in &group.children {
                library.attach_child(parent, *child);
            }
            for expected in class.children {
                if !group.children.iter().any(|(ext, _)| ext == expected) {
                    library
                        .item_mut(parent)
                        .missing_children
                        .push((*expected).to_string());
                }
            }
        }
    }
}

/// Directory + stem, lowercased: the grouping key within one scope.
fn stem_key(local_path: &str, ext: &str) -> String {
    local_path[..local_path.len() - ext.len() - 1].to_ascii_lowercase()
}
