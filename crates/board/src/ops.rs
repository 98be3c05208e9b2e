//! Committed board mutations.
//!
//! Every function validates the references it was handed before touching the
//! board, returns `Ok(None)` when the request would not change anything, and for
//! cross-bin moves mutates the source bin before the destination bin.

use std::collections::HashSet;

use crate::error::{BoardError, Result};
use crate::hierarchy::{HierarchyIndex, remove_by_ids};
use crate::model::{BinId, Board, Item, ItemId, PageId};

/// Where an item sat when a drag started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLocation {
    pub bin: BinId,
    /// Position in the bin's flat sequence.
    pub index: usize,
    pub id: ItemId,
}

impl ItemLocation {
    pub fn new(bin: impl Into<BinId>, index: usize, id: impl Into<ItemId>) -> Self {
        Self {
            bin: bin.into(),
            index,
            id: id.into(),
        }
    }
}

/// A mutation that was applied to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Moved {
        item: ItemId,
        from: BinId,
        to: BinId,
        /// Flat position of the item in the destination bin.
        index: usize,
    },
    Unnested {
        item: ItemId,
        parent: ItemId,
        from: BinId,
        to: BinId,
        index: usize,
    },
    Deleted {
        bin: BinId,
        ids: Vec<ItemId>,
    },
    Relocated {
        bin: BinId,
        from: PageId,
        to: PageId,
    },
}

impl Change {
    /// Bins whose item sequences were touched.
    pub fn affected_bins(&self) -> Vec<&BinId> {
        match self {
            Change::Moved { from, to, .. } | Change::Unnested { from, to, .. } => {
                if from == to {
                    vec![from]
                } else {
                    vec![from, to]
                }
            }
            Change::Deleted { bin, .. } => vec![bin],
            Change::Relocated { bin, .. } => vec![bin],
        }
    }
}

fn checked_items<'a>(board: &'a Board, location: &ItemLocation) -> Result<&'a [Item]> {
    let items = board.require_bin(&location.bin)?.resident_items()?;
    match items.get(location.index) {
        Some(item) if item.id == location.id => Ok(items),
        _ => Err(BoardError::stale(&location.bin, location.id.as_str())),
    }
}

/// The item followed by its descendants, in sequence order, detached from any
/// parent outside the block.
fn family_block(items: &[Item], id: &ItemId) -> (HashSet<ItemId>, Vec<Item>) {
    let index = HierarchyIndex::build(items);
    let mut family = index.descendant_ids(id.as_str());
    family.insert(id.clone());

    let mut block = items
        .iter()
        .filter(|item| family.contains(&item.id))
        .cloned()
        .collect::<Vec<_>>();
    block.sort_by_key(|item| item.id != *id);
    if let Some(head) = block.first_mut() {
        head.parent_id = None;
    }
    (family, block)
}

fn ensure_no_duplicates(board: &Board, bin: &BinId, block: &[Item]) -> Result<()> {
    let existing = board.require_bin(bin)?.resident_items()?;
    let existing = existing
        .iter()
        .map(|item| item.id.as_str())
        .collect::<HashSet<_>>();
    match block
        .iter()
        .find(|item| existing.contains(item.id.as_str()))
    {
        Some(item) => Err(BoardError::DuplicateItem {
            bin: bin.clone(),
            item: item.id.to_string(),
        }),
        None => Ok(()),
    }
}

/// Removes `family` from the source bin, then splices `block` into the
/// destination at the flat position for root `slot` (`None` appends).
fn transfer_block(
    board: &mut Board,
    from: &BinId,
    to: &BinId,
    family: &HashSet<ItemId>,
    block: Vec<Item>,
    slot: Option<usize>,
) -> Result<usize> {
    ensure_no_duplicates(board, to, &block)?;
    let dest_ix = {
        let dest = board.require_bin(to)?.resident_items()?;
        match slot {
            Some(slot) => HierarchyIndex::build(dest).flat_index_for_root_slot(slot),
            None => dest.len(),
        }
    };

    let source = board.require_bin_mut(from)?.resident_items_mut()?;
    let survivors = remove_by_ids(source, family);
    *source = survivors;

    let dest = board.require_bin_mut(to)?.resident_items_mut()?;
    let at = dest_ix.min(dest.len());
    dest.splice(at..at, block);
    Ok(at)
}

/// Moves a root item to root `slot` of bin `to`.
///
/// Within one bin only the item itself moves; its children follow it through
/// `child_ids`. Across bins the item travels together with its descendants.
/// `slot == None` appends.
pub fn move_item(
    board: &mut Board,
    source: &ItemLocation,
    to: &BinId,
    slot: Option<usize>,
) -> Result<Option<Change>> {
    let items = checked_items(board, source)?;
    let index = HierarchyIndex::build(items);
    let Some(own_slot) = index.root_slot_of(source.id.as_str()) else {
        return Err(BoardError::stale(&source.bin, source.id.as_str()));
    };

    if source.bin == *to {
        let root_len = index.root_positions().len();
        let slot = slot.unwrap_or(root_len).min(root_len);
        if slot == own_slot || slot == own_slot + 1 {
            return Ok(None);
        }
        let target = index.flat_index_for_root_slot(slot);

        let items = board.require_bin_mut(to)?.resident_items_mut()?;
        let moved = items.remove(source.index);
        let target = if target > source.index {
            target - 1
        } else {
            target
        };
        items.insert(target, moved);
        return Ok(Some(Change::Moved {
            item: source.id.clone(),
            from: source.bin.clone(),
            to: to.clone(),
            index: target,
        }));
    }

    let (family, block) = family_block(items, &source.id);
    let index = transfer_block(board, &source.bin, to, &family, block, slot)?;
    Ok(Some(Change::Moved {
        item: source.id.clone(),
        from: source.bin.clone(),
        to: to.clone(),
        index,
    }))
}

/// Detaches a child from its parent and inserts it as a root item.
///
/// Within the parent's bin the item lands at root `slot`, or directly after the
/// parent when `slot` is `None`. In another bin `None` appends.
pub fn unnest_item(
    board: &mut Board,
    source: &ItemLocation,
    parent_index: usize,
    to: &BinId,
    slot: Option<usize>,
) -> Result<Option<Change>> {
    let items = checked_items(board, source)?;
    let item = &items[source.index];
    let parent_id = match items.get(parent_index) {
        Some(parent)
            if item.parent_id.as_ref() == Some(&parent.id)
                && parent.child_ids.contains(&item.id) =>
        {
            parent.id.clone()
        }
        _ => return Err(BoardError::stale(&source.bin, source.id.as_str())),
    };

    if source.bin == *to {
        let target = match slot {
            Some(slot) => HierarchyIndex::build(items).flat_index_for_root_slot(slot),
            None => parent_index + 1,
        };

        let items = board.require_bin_mut(to)?.resident_items_mut()?;
        items[parent_index]
            .child_ids
            .retain(|id| *id != source.id);
        let mut moved = items.remove(source.index);
        moved.parent_id = None;
        let target = if target > source.index {
            target - 1
        } else {
            target
        };
        let target = target.min(items.len());
        items.insert(target, moved);
        return Ok(Some(Change::Unnested {
            item: source.id.clone(),
            parent: parent_id,
            from: source.bin.clone(),
            to: to.clone(),
            index: target,
        }));
    }

    let (family, block) = family_block(items, &source.id);
    let index = transfer_block(board, &source.bin, to, &family, block, slot)?;
    Ok(Some(Change::Unnested {
        item: source.id.clone(),
        parent: parent_id,
        from: source.bin.clone(),
        to: to.clone(),
        index,
    }))
}

/// Removes an item and all of its descendants.
pub fn delete_item(board: &mut Board, source: &ItemLocation) -> Result<Change> {
    let items = checked_items(board, source)?;
    let index = HierarchyIndex::build(items);
    let mut family = index.descendant_ids(source.id.as_str());
    family.insert(source.id.clone());

    let ids = items
        .iter()
        .filter(|item| family.contains(&item.id))
        .map(|item| item.id.clone())
        .collect::<Vec<_>>();
    let survivors = remove_by_ids(items, &family);

    *board.require_bin_mut(&source.bin)?.resident_items_mut()? = survivors;
    Ok(Change::Deleted {
        bin: source.bin.clone(),
        ids,
    })
}

/// Moves a whole bin onto another page, appending it there.
pub fn relocate_bin(board: &mut Board, bin: &BinId, to: &PageId) -> Result<Option<Change>> {
    let (page_ix, bin_ix) = board
        .locate_bin(bin)
        .ok_or_else(|| BoardError::UnknownBin(bin.clone()))?;
    let to_ix = board
        .page_index(to)
        .ok_or_else(|| BoardError::UnknownPage(to.clone()))?;
    if page_ix == to_ix {
        return Ok(None);
    }

    let moved = board.pages[page_ix].bins.remove(bin_ix);
    board.pages[to_ix].bins.push(moved);
    Ok(Some(Change::Relocated {
        bin: bin.clone(),
        from: board.pages[page_ix].id.clone(),
        to: to.clone(),
    }))
}
