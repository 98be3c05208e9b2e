//! Id-based index over a bin's flat item sequence.
//!
//! The bin's `Vec<Item>` is the source of truth. A [`HierarchyIndex`] borrows it,
//! is rebuilt in O(n) whenever it is needed, and is dropped before the sequence is
//! mutated again.

use std::collections::{HashMap, HashSet};

use crate::model::{Item, ItemId};

pub struct HierarchyIndex<'a> {
    items: &'a [Item],
    positions: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> HierarchyIndex<'a> {
    /// Builds the id map and the parent → ordered children map.
    ///
    /// `child_ids` entries pointing at ids missing from `items` are skipped.
    pub fn build(items: &'a [Item]) -> Self {
        let mut positions = HashMap::with_capacity(items.len());
        for (ix, item) in items.iter().enumerate() {
            positions.entry(item.id.as_str()).or_insert(ix);
        }

        let mut children = HashMap::new();
        for item in items.iter().filter(|item| item.has_children()) {
            let ids = item
                .child_ids
                .iter()
                .map(ItemId::as_str)
                .filter(|id| *id != item.id.as_str() && positions.contains_key(id))
                .collect::<Vec<_>>();
            children.insert(item.id.as_str(), ids);
        }

        Self {
            items,
            positions,
            children,
        }
    }

    pub fn items(&self) -> &'a [Item] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&'a Item> {
        self.position(id).map(|ix| &self.items[ix])
    }

    /// Position of `id` in the flat sequence.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Resolved children of `id`, in `child_ids` order.
    pub fn children_of(&self, id: &str) -> Vec<&'a Item> {
        self.children
            .get(id)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn parent_of(&self, item: &Item) -> Option<&'a Item> {
        item.parent_id
            .as_ref()
            .and_then(|parent_id| self.get(parent_id.as_str()))
    }

    /// Whether `item` renders at the top level.
    ///
    /// Items whose parent is missing, or whose parent does not list them, are
    /// orphans and render as roots so they never disappear from view. The second
    /// case is intentional: a one-sided link is treated like a missing parent
    /// until [`repair_links`] clears it.
    pub fn is_root(&self, item: &Item) -> bool {
        let Some(parent_id) = item.parent_id.as_ref() else {
            return true;
        };
        match self.children.get(parent_id.as_str()) {
            Some(ids) => !ids.iter().any(|id| *id == item.id.as_str()),
            None => true,
        }
    }

    pub fn roots(&self) -> Vec<&'a Item> {
        self.items
            .iter()
            .filter(|item| self.is_root(item))
            .collect()
    }

    /// Flat positions of the root items, in sequence order.
    pub fn root_positions(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.is_root(item))
            .map(|(ix, _)| ix)
            .collect()
    }

    /// Transitive closure over `child_ids`, excluding `id` itself.
    pub fn descendant_ids(&self, id: &str) -> HashSet<ItemId> {
        let mut out = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(ids) = self.children.get(current) else {
                continue;
            };
            for child in ids {
                if *child == id {
                    continue;
                }
                if out.insert(ItemId::from(*child)) {
                    stack.push(*child);
                }
            }
        }
        out
    }

    /// Maps a root-slot index (insert before the n-th root) to a flat position.
    pub fn flat_index_for_root_slot(&self, slot: usize) -> usize {
        self.root_positions()
            .get(slot)
            .copied()
            .unwrap_or(self.items.len())
    }

    /// Root-slot index of a root item, if `id` is one.
    pub fn root_slot_of(&self, id: &str) -> Option<usize> {
        self.items
            .iter()
            .filter(|item| self.is_root(item))
            .position(|item| item.id.as_str() == id)
    }
}

pub fn build_index(items: &[Item]) -> HierarchyIndex<'_> {
    HierarchyIndex::build(items)
}

/// Items without a (reachable) parent, in original sequence order.
pub fn root_items(items: &[Item]) -> Vec<&Item> {
    HierarchyIndex::build(items).roots()
}

pub fn descendant_ids(item: &Item, index: &HierarchyIndex<'_>) -> HashSet<ItemId> {
    index.descendant_ids(item.id.as_str())
}

/// Returns the survivors of `items` after dropping every id in `ids`.
///
/// Relative order is preserved, removed ids are stripped from the remaining
/// items' `child_ids`, and survivors whose parent was removed become roots.
pub fn remove_by_ids(items: &[Item], ids: &HashSet<ItemId>) -> Vec<Item> {
    items
        .iter()
        .filter(|item| !ids.contains(&item.id))
        .cloned()
        .map(|mut item| {
            item.child_ids.retain(|id| !ids.contains(id));
            if item.parent_id.as_ref().is_some_and(|id| ids.contains(id)) {
                item.parent_id = None;
            }
            item
        })
        .collect()
}

/// Drops dangling `child_ids` and clears `parent_id`s that point at missing items.
///
/// Returns `true` if anything changed.
pub fn repair_links(items: &mut [Item]) -> bool {
    let present = items
        .iter()
        .map(|item| item.id.clone())
        .collect::<HashSet<_>>();
    let mut changed = false;
    for item in items.iter_mut() {
        let before = item.child_ids.len();
        let own_id = item.id.clone();
        item.child_ids
            .retain(|id| *id != own_id && present.contains(id));
        changed |= item.child_ids.len() != before;

        if item
            .parent_id
            .as_ref()
            .is_some_and(|id| !present.contains(id))
        {
            item.parent_id = None;
            changed = true;
        }
    }
    if changed {
        tracing::debug!(target: "twodo_board::hierarchy", "repaired dangling item links");
    }
    changed
}
