//! Property tests for the item operations and the drop resolver.
//!
//! 1. Reorders, cross-bin moves and un-nests conserve the set of ids.
//! 2. Delete removes exactly the item and its descendants.
//! 3. The resolver answers the same with and without virtualization, also when
//!    roots render child rows beneath them.

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use twodo_board::{
    Bin, BinId, Board, BoardConfig, DropQuery, Item, ItemId, ItemLocation, MountedRow, Page,
    RowHost, RowKey, activate_viewport, build_index, delete_item, move_item,
    resolve_drop_position, unnest_item,
};

// ── Helpers ─────────────────────────────────────────────────────────────

/// Builds a bin of `shape.len()` roots where root `i` has `shape[i]` children,
/// children stored right after their parent.
fn nested_items(prefix: &str, shape: &[usize]) -> Vec<Item> {
    let mut items = Vec::new();
    for (ix, children) in shape.iter().enumerate() {
        let parent = format!("{prefix}{ix}");
        let child_ids = (0..*children)
            .map(|c| format!("{parent}.{c}"))
            .collect::<Vec<_>>();
        items.push(Item::new(parent.as_str(), "note").children(child_ids.clone()));
        for child in child_ids {
            items.push(Item::new(child, "note").parent(parent.as_str()));
        }
    }
    items
}

fn two_bins(x: &[usize], y: &[usize]) -> Board {
    Board::new(vec![
        Page::new("p", "Page")
            .bin(Bin::new("x", "X").with_items(nested_items("x", x)))
            .bin(Bin::new("y", "Y").with_items(nested_items("y", y))),
    ])
}

fn all_ids(board: &Board) -> HashSet<ItemId> {
    board
        .bins()
        .filter_map(Bin::items)
        .flatten()
        .map(|item| item.id.clone())
        .collect()
}

fn item_count(board: &Board) -> usize {
    board.bins().filter_map(Bin::items).map(<[Item]>::len).sum()
}

fn shape() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(0usize..=3, 1..=12)
}

const CHILD_HEIGHT: f32 = 24.0;

/// Root rows of the given heights, each followed by its child rows.
struct Surface {
    roots: Vec<f32>,
    children: Vec<usize>,
    live: BTreeSet<usize>,
}

impl Surface {
    fn block_rows(&self, ix: usize, top: f32) -> Vec<MountedRow> {
        let mut rows = vec![MountedRow::new(RowKey::Root(ix), top, self.roots[ix])];
        for child in 0..self.children[ix] {
            rows.push(MountedRow::new(
                RowKey::Child { parent: ix, child },
                top + self.roots[ix] + child as f32 * CHILD_HEIGHT,
                CHILD_HEIGHT,
            ));
        }
        rows
    }
}

impl RowHost for Surface {
    fn mount(&mut self, index: usize) -> f32 {
        self.live.insert(index);
        self.roots[index] + self.children[index] as f32 * CHILD_HEIGHT
    }

    fn unmount(&mut self, index: usize) {
        self.live.remove(&index);
    }

    fn tail_height(&self, index: usize) -> Option<f32> {
        (self.children[index] > 0).then_some(CHILD_HEIGHT)
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Conservation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn moves_conserve_ids(
        x in shape(),
        y in shape(),
        pick in any::<prop::sample::Index>(),
        slot in 0usize..16,
        across in any::<bool>(),
    ) {
        let mut board = two_bins(&x, &y);
        let ids_before = all_ids(&board);
        let len_before = item_count(&board);

        let source_items = board.bin(&"x".into()).and_then(Bin::items).unwrap();
        let index = build_index(source_items);
        let roots = index.root_positions();
        let flat = roots[pick.index(roots.len())];
        let location = ItemLocation::new("x", flat, source_items[flat].id.clone());

        let to = BinId::from(if across { "y" } else { "x" });
        move_item(&mut board, &location, &to, Some(slot)).unwrap();

        prop_assert_eq!(item_count(&board), len_before);
        prop_assert_eq!(all_ids(&board), ids_before);
    }

    #[test]
    fn unnest_conserves_ids(
        x in shape(),
        pick in any::<prop::sample::Index>(),
        slot in proptest::option::of(0usize..16),
    ) {
        let mut board = two_bins(&x, &[1]);
        let ids_before = all_ids(&board);

        let items = board.bin(&"x".into()).and_then(Bin::items).unwrap();
        let children = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.parent_id.is_some())
            .map(|(ix, _)| ix)
            .collect::<Vec<_>>();
        prop_assume!(!children.is_empty());

        let flat = children[pick.index(children.len())];
        let child = &items[flat];
        let parent_index = items
            .iter()
            .position(|item| Some(&item.id) == child.parent_id.as_ref())
            .unwrap();
        let location = ItemLocation::new("x", flat, child.id.clone());

        unnest_item(&mut board, &location, parent_index, &"x".into(), slot).unwrap();

        prop_assert_eq!(all_ids(&board), ids_before);
        let items = board.bin(&"x".into()).and_then(Bin::items).unwrap();
        let moved = items.iter().find(|item| item.id == location.id).unwrap();
        prop_assert!(moved.parent_id.is_none());
        prop_assert!(items.iter().all(|item| !item.child_ids.contains(&location.id)));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Delete removes exactly the family
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn delete_removes_exactly_the_family(
        x in shape(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut board = two_bins(&x, &[0]);
        let ids_before = all_ids(&board);

        let items = board.bin(&"x".into()).and_then(Bin::items).unwrap();
        let flat = pick.index(items.len());
        let target = items[flat].clone();
        let mut family = build_index(items).descendant_ids(target.id.as_str());
        family.insert(target.id.clone());
        let location = ItemLocation::new("x", flat, target.id.clone());

        delete_item(&mut board, &location).unwrap();

        let expected = ids_before
            .difference(&family)
            .cloned()
            .collect::<HashSet<_>>();
        prop_assert_eq!(all_ids(&board), expected);

        let survivors = all_ids(&board);
        for item in board.bins().filter_map(Bin::items).flatten() {
            prop_assert!(item.child_ids.iter().all(|id| survivors.contains(id)));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Virtualization transparency, child rows included
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn resolver_ignores_virtualization(
        blocks in proptest::collection::vec((8.0f32..90.0, 0usize..=3), 50..160),
        viewport in 120.0f32..480.0,
        scroll_fraction in 0.0f32..1.0,
        pointer_fraction in 0.0f32..1.0,
    ) {
        let len = blocks.len();
        let config = BoardConfig::default();
        let mut surface = Surface {
            roots: blocks.iter().map(|(height, _)| *height).collect(),
            children: blocks.iter().map(|(_, children)| *children).collect(),
            live: BTreeSet::new(),
        };
        let mut scroller = activate_viewport(len, viewport, &config, &mut surface).unwrap();

        // Scroll through once so every block has been measured.
        let mut top = 0.0;
        while top <= scroller.total_height() {
            scroller.on_scroll(top, &mut surface);
            top += viewport / 2.0;
        }
        prop_assert_eq!(scroller.heights().measured_count(), len);

        let scroll_top = scroll_fraction * (scroller.total_height() - viewport).max(0.0);
        scroller.on_scroll(scroll_top, &mut surface);

        let container_top = 300.0;
        let query = DropQuery::new(container_top + pointer_fraction * viewport, container_top);

        let mounted = scroller
            .mounted()
            .flat_map(|ix| surface.block_rows(ix, scroller.offset_of(ix) - scroll_top))
            .collect::<Vec<_>>();
        let virtualized = resolve_drop_position(query, &mounted, len, Some(&scroller));

        let all = (0..len)
            .flat_map(|ix| surface.block_rows(ix, scroller.offset_of(ix) - scroll_top))
            .collect::<Vec<_>>();
        let full = resolve_drop_position(query, &all, len, None);

        prop_assert_eq!(virtualized.insert_index, full.insert_index);
    }
}
