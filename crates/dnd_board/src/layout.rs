//! Row geometry for one bin column.

use std::collections::BTreeSet;
use std::ops::Range;

use twodo_board::{
    BoardConfig, HierarchyIndex, Item, MountedRow, RowHost, RowKey, VirtualScroller,
    activate_viewport,
};

pub(crate) const ROW_HEIGHT: f32 = 40.0;
pub(crate) const CHILD_ROW_HEIGHT: f32 = 30.0;

/// Heights of the root blocks of a bin. A block is a root row plus the rows of
/// its children rendered beneath it.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BinLayout {
    heights: Vec<f32>,
    child_counts: Vec<usize>,
}

impl BinLayout {
    pub(crate) fn build(items: &[Item]) -> Self {
        let index = HierarchyIndex::build(items);
        let child_counts = index
            .roots()
            .iter()
            .map(|root| index.children_of(root.id.as_str()).len())
            .collect::<Vec<_>>();
        let heights = child_counts
            .iter()
            .map(|count| block_height(*count))
            .collect();
        Self {
            heights,
            child_counts,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.heights.len()
    }

    pub(crate) fn height(&self, ix: usize) -> f32 {
        self.heights.get(ix).copied().unwrap_or(ROW_HEIGHT)
    }

    pub(crate) fn child_count(&self, ix: usize) -> usize {
        self.child_counts.get(ix).copied().unwrap_or(0)
    }

    fn offset_of(&self, ix: usize) -> f32 {
        self.heights[..ix.min(self.len())].iter().sum()
    }

    pub(crate) fn total_height(&self) -> f32 {
        self.heights.iter().sum()
    }
}

fn block_height(children: usize) -> f32 {
    ROW_HEIGHT + children as f32 * CHILD_ROW_HEIGHT
}

/// Mounts rows by reading their height from the layout.
struct LayoutHost<'a> {
    layout: &'a BinLayout,
    live: &'a mut BTreeSet<usize>,
}

impl RowHost for LayoutHost<'_> {
    fn mount(&mut self, index: usize) -> f32 {
        self.live.insert(index);
        self.layout.height(index)
    }

    fn unmount(&mut self, index: usize) {
        self.live.remove(&index);
    }

    fn tail_height(&self, index: usize) -> Option<f32> {
        (self.layout.child_count(index) > 0).then_some(CHILD_ROW_HEIGHT)
    }
}

/// Render session of one bin: its layout and, for long bins, the scroller.
#[derive(Debug, Default)]
pub(crate) struct BinWindow {
    layout: BinLayout,
    scroller: Option<VirtualScroller>,
    live: BTreeSet<usize>,
    scroll_top: f32,
}

impl BinWindow {
    pub(crate) fn layout(&self) -> &BinLayout {
        &self.layout
    }

    pub(crate) fn scroller(&self) -> Option<&VirtualScroller> {
        self.scroller.as_ref()
    }

    /// Applies fresh items and the current scroll geometry.
    pub(crate) fn sync(
        &mut self,
        items: &[Item],
        viewport_height: f32,
        scroll_top: f32,
        config: &BoardConfig,
    ) {
        self.layout = BinLayout::build(items);
        self.scroll_top = scroll_top.max(0.0);
        let len = self.layout.len();

        if len < config.virtualize_threshold {
            if self.scroller.take().is_some() {
                self.live.clear();
            }
            return;
        }

        let mut host = LayoutHost {
            layout: &self.layout,
            live: &mut self.live,
        };
        match self.scroller.as_mut() {
            Some(scroller) => {
                scroller.set_len(len, &mut host);
                scroller.set_viewport_height(viewport_height, &mut host);
                scroller.on_scroll(self.scroll_top, &mut host);
            }
            None => {
                self.scroller = activate_viewport(len, viewport_height, config, &mut host);
                if let Some(scroller) = self.scroller.as_mut() {
                    scroller.on_scroll(self.scroll_top, &mut host);
                }
            }
        }
    }

    /// Re-measures the mounted rows after their content changed.
    pub(crate) fn invalidate(&mut self) {
        let mut host = LayoutHost {
            layout: &self.layout,
            live: &mut self.live,
        };
        if let Some(scroller) = self.scroller.as_mut() {
            let mounted = scroller.mounted();
            scroller.invalidate(mounted, &mut host);
        }
    }

    /// Root rows that currently have a live representation.
    pub(crate) fn visible(&self) -> Range<usize> {
        match self.scroller.as_ref() {
            Some(scroller) => scroller.mounted(),
            None => 0..self.layout.len(),
        }
    }

    pub(crate) fn offset_of(&self, ix: usize) -> f32 {
        match self.scroller.as_ref() {
            Some(scroller) => scroller.offset_of(ix),
            None => self.layout.offset_of(ix),
        }
    }

    pub(crate) fn total_height(&self) -> f32 {
        match self.scroller.as_ref() {
            Some(scroller) => scroller.total_height(),
            None => self.layout.total_height(),
        }
    }

    /// Mounted rows relative to the viewport top, children included.
    pub(crate) fn mounted_rows(&self) -> Vec<MountedRow> {
        let mut rows = Vec::new();
        for ix in self.visible() {
            let top = self.offset_of(ix) - self.scroll_top;
            rows.push(MountedRow::new(RowKey::Root(ix), top, ROW_HEIGHT));
            for child in 0..self.layout.child_count(ix) {
                rows.push(MountedRow::new(
                    RowKey::Child { parent: ix, child },
                    top + ROW_HEIGHT + child as f32 * CHILD_ROW_HEIGHT,
                    CHILD_ROW_HEIGHT,
                ));
            }
        }
        rows
    }

    /// Content offset of the indicator line for a root slot.
    pub(crate) fn indicator_y(&self, slot: usize) -> f32 {
        if slot >= self.layout.len() {
            self.total_height()
        } else {
            self.offset_of(slot)
        }
    }
}

#[cfg(test)]
mod tests {
    use twodo_board::{DropQuery, resolve_drop_position};

    use super::*;

    fn items(roots: usize, children_of_first: usize) -> Vec<Item> {
        let mut items = Vec::new();
        let child_ids = (0..children_of_first)
            .map(|c| format!("c{c}"))
            .collect::<Vec<_>>();
        items.push(Item::new("r0", "note").children(child_ids.clone()));
        for child in child_ids {
            items.push(Item::new(child, "note").parent("r0"));
        }
        for ix in 1..roots {
            items.push(Item::new(format!("r{ix}"), "note"));
        }
        items
    }

    #[test]
    fn blocks_include_children() {
        let layout = BinLayout::build(&items(3, 2));
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.height(0), ROW_HEIGHT + 2.0 * CHILD_ROW_HEIGHT);
        assert_eq!(layout.height(1), ROW_HEIGHT);
        assert_eq!(layout.offset_of(2), 2.0 * ROW_HEIGHT + 2.0 * CHILD_ROW_HEIGHT);
    }

    #[test]
    fn short_bins_render_every_row() {
        let mut window = BinWindow::default();
        window.sync(&items(3, 1), 200.0, 0.0, &BoardConfig::default());
        assert!(window.scroller().is_none());
        assert_eq!(window.visible(), 0..3);

        let keys = window
            .mounted_rows()
            .iter()
            .map(|row| row.key.to_string())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["0", "0-0", "1", "2"]);
    }

    #[test]
    fn drop_below_window_matches_full_render() {
        let config = BoardConfig::default()
            .default_row_height(ROW_HEIGHT)
            .overscan(0);
        let mut items = Vec::new();
        for ix in 0..120 {
            let id = format!("r{ix}");
            if ix % 3 == 2 {
                items.push(Item::new(id.as_str(), "note").children([format!("{id}.c")]));
                items.push(Item::new(format!("{id}.c"), "note").parent(id.as_str()));
            } else {
                items.push(Item::new(id, "note"));
            }
        }

        let mut window = BinWindow::default();
        // Measure every block once.
        let mut top = 0.0;
        while top < 6_000.0 {
            window.sync(&items, 200.0, top, &config);
            top += 100.0;
        }
        window.sync(&items, 200.0, 1_000.0, &config);
        let mounted = window.mounted_rows();
        let root_len = window.layout().len();

        let mut all = Vec::new();
        for ix in 0..root_len {
            let block_top = window.layout().offset_of(ix) - 1_000.0;
            all.push(MountedRow::new(RowKey::Root(ix), block_top, ROW_HEIGHT));
            for child in 0..window.layout().child_count(ix) {
                all.push(MountedRow::new(
                    RowKey::Child { parent: ix, child },
                    block_top + ROW_HEIGHT + child as f32 * CHILD_ROW_HEIGHT,
                    CHILD_ROW_HEIGHT,
                ));
            }
        }

        let mut y = 0.0;
        while y < 600.0 {
            let query = DropQuery::new(y, 0.0);
            let virtualized = resolve_drop_position(query, &mounted, root_len, window.scroller());
            let full = resolve_drop_position(query, &all, root_len, None);
            assert_eq!(virtualized.insert_index, full.insert_index, "pointer at {y}");
            y += 5.0;
        }
    }

    #[test]
    fn long_bins_mount_a_window() {
        let config = BoardConfig::default().default_row_height(ROW_HEIGHT);
        let mut window = BinWindow::default();
        window.sync(&items(200, 0), 400.0, 0.0, &config);
        let visible = window.visible();
        assert_eq!(visible.start, 0);
        assert!(visible.end < 200);

        window.sync(&items(200, 0), 400.0, 4_000.0, &config);
        let visible = window.visible();
        assert_eq!(visible.start, 100 - config.overscan);
        assert_eq!(window.mounted_rows()[0].top, -(config.overscan as f32) * ROW_HEIGHT);

        window.sync(&items(10, 0), 400.0, 0.0, &config);
        assert!(window.scroller().is_none());
        assert_eq!(window.visible(), 0..10);
    }
}
