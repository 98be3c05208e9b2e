//! Windowed rendering of a bin's root items.
//!
//! The scroller never touches a rendering surface directly: rows are mounted and
//! measured through a caller-provided [`RowHost`], so all scroll math here is pure.

use std::ops::Range;

use crate::config::BoardConfig;

const MIN_ROW_HEIGHT: f32 = 1.0;
const MAX_SETTLE_PASSES: usize = 8;

/// Rendering capability injected by the caller.
pub trait RowHost {
    /// Materializes the root row at `index` and returns its measured height.
    fn mount(&mut self, index: usize) -> f32;

    /// Drops the live representation of the root row at `index`.
    fn unmount(&mut self, index: usize);

    /// Height of the last visual row of the block at `index`, when the root row
    /// renders its children beneath it. `None` means the block is a single row.
    fn tail_height(&self, _index: usize) -> Option<f32> {
        None
    }
}

fn sanitize_height(height: f32) -> f32 {
    if !height.is_finite() || height < MIN_ROW_HEIGHT {
        MIN_ROW_HEIGHT
    } else {
        height
    }
}

/// Binary indexed tree over row heights: O(log n) prefix sums and offset lookup.
#[derive(Debug, Clone, Default)]
struct Fenwick {
    tree: Vec<f64>,
}

impl Fenwick {
    fn from_values(values: impl ExactSizeIterator<Item = f64>) -> Self {
        let len = values.len();
        let mut tree = vec![0.0; len + 1];
        for (ix, value) in values.enumerate() {
            tree[ix + 1] += value;
            let parent = (ix + 1) + ((ix + 1) & (ix + 1).wrapping_neg());
            if parent <= len {
                tree[parent] += tree[ix + 1];
            }
        }
        Self { tree }
    }

    fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    fn add(&mut self, ix: usize, delta: f64) {
        let mut i = ix + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += i & i.wrapping_neg();
        }
    }

    /// Sum of the first `count` values.
    fn prefix(&self, count: usize) -> f64 {
        let mut i = count.min(self.len());
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree[i];
            i -= i & i.wrapping_neg();
        }
        sum
    }

    /// Number of leading values whose running sum stays `<= target`
    /// (or `< target` when `strict`).
    fn leading_count(&self, target: f64, strict: bool) -> usize {
        let len = self.len();
        if len == 0 {
            return 0;
        }
        let mut pos = 0usize;
        let mut remaining = target;
        let mut step = 1usize << (usize::BITS - 1 - len.leading_zeros());
        while step > 0 {
            let next = pos + step;
            if next <= len {
                let value = self.tree[next];
                let fits = if strict {
                    value < remaining
                } else {
                    value <= remaining
                };
                if fits {
                    pos = next;
                    remaining -= value;
                }
            }
            step >>= 1;
        }
        pos
    }
}

/// Per-row heights: measured values where known, the default estimate elsewhere.
///
/// Once a row is measured it stays measured; later measurements only overwrite it.
#[derive(Debug, Clone)]
pub struct HeightCache {
    measured: Vec<Option<f32>>,
    tails: Vec<Option<f32>>,
    sums: Fenwick,
    default_height: f32,
}

impl HeightCache {
    pub fn new(len: usize, default_height: f32) -> Self {
        let default_height = sanitize_height(default_height);
        Self {
            measured: vec![None; len],
            tails: vec![None; len],
            sums: Fenwick::from_values(std::iter::repeat_n(default_height as f64, len)),
            default_height,
        }
    }

    pub fn len(&self) -> usize {
        self.measured.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measured.is_empty()
    }

    pub fn default_height(&self) -> f32 {
        self.default_height
    }

    /// Effective height of `ix`: the measurement if any, otherwise the estimate.
    pub fn height(&self, ix: usize) -> f32 {
        self.measured
            .get(ix)
            .copied()
            .flatten()
            .unwrap_or(self.default_height)
    }

    /// Offset within row `ix` of its last drop midpoint: the midpoint of the
    /// block's last visual row. Pointers above it resolve to `ix`.
    pub fn drop_edge(&self, ix: usize) -> f32 {
        let height = self.height(ix);
        let tail = self
            .tails
            .get(ix)
            .copied()
            .flatten()
            .map_or(height, |tail| tail.min(height));
        height - tail / 2.0
    }

    /// Records the height of the last visual row of block `ix`.
    pub fn record_tail(&mut self, ix: usize, tail: Option<f32>) {
        if let Some(slot) = self.tails.get_mut(ix) {
            *slot = tail.map(sanitize_height);
        }
    }

    pub fn is_measured(&self, ix: usize) -> bool {
        self.measured.get(ix).is_some_and(Option::is_some)
    }

    pub fn measured_count(&self) -> usize {
        self.measured.iter().filter(|h| h.is_some()).count()
    }

    /// Records a measurement. Returns `true` if the effective height changed.
    pub fn record(&mut self, ix: usize, height: f32) -> bool {
        let Some(slot) = self.measured.get_mut(ix) else {
            return false;
        };
        let height = sanitize_height(height);
        let previous = slot.unwrap_or(self.default_height);
        *slot = Some(height);
        if previous == height {
            return false;
        }
        self.sums.add(ix, (height - previous) as f64);
        true
    }

    /// Resizes to `len` rows, keeping measurements of surviving indices.
    pub fn set_len(&mut self, len: usize) {
        if len == self.measured.len() {
            return;
        }
        self.measured.resize(len, None);
        self.tails.resize(len, None);
        let default_height = self.default_height;
        self.sums = Fenwick::from_values(
            self.measured
                .iter()
                .map(|h| h.unwrap_or(default_height) as f64),
        );
    }

    /// Top offset of row `ix` (sum of the heights before it).
    pub fn offset_of(&self, ix: usize) -> f32 {
        self.sums.prefix(ix) as f32
    }

    pub fn total_height(&self) -> f32 {
        self.sums.prefix(self.len()) as f32
    }

    /// Index of the row containing content offset `y`, clamped to `len`.
    pub fn index_at(&self, y: f32) -> usize {
        self.sums.leading_count(y.max(0.0) as f64, false)
    }

    /// Number of rows whose top edge lies strictly above `y`.
    fn rows_starting_before(&self, y: f32) -> usize {
        if y <= 0.0 || self.is_empty() {
            return 0;
        }
        (self.sums.leading_count(y as f64, true) + 1).min(self.len())
    }
}

/// A live window over a bin's root items.
#[derive(Debug, Clone)]
pub struct VirtualScroller {
    heights: HeightCache,
    viewport_height: f32,
    scroll_top: f32,
    overscan: usize,
    range: Range<usize>,
}

impl VirtualScroller {
    /// Returns `None` when `len` is below the configured threshold; the caller then
    /// renders every row.
    pub fn activate(len: usize, viewport_height: f32, config: &BoardConfig) -> Option<Self> {
        if len < config.virtualize_threshold {
            tracing::debug!(
                target: "twodo_board::viewport",
                len,
                threshold = config.virtualize_threshold,
                "rendering bin in full"
            );
            return None;
        }
        Some(Self {
            heights: HeightCache::new(len, config.default_row_height),
            viewport_height: viewport_height.max(0.0),
            scroll_top: 0.0,
            overscan: config.overscan,
            range: 0..0,
        })
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn heights(&self) -> &HeightCache {
        &self.heights
    }

    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    /// Currently mounted range.
    pub fn mounted(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn offset_of(&self, ix: usize) -> f32 {
        self.heights.offset_of(ix)
    }

    pub fn total_height(&self) -> f32 {
        self.heights.total_height()
    }

    /// Range that should be mounted for the current scroll offset, padding included.
    pub fn visible_range(&self) -> Range<usize> {
        let len = self.len();
        if len == 0 {
            return 0..0;
        }
        let top = self.scroll_top.max(0.0);
        let bottom = top + self.viewport_height;

        let first = self.heights.index_at(top).min(len - 1);
        let end = self.heights.rows_starting_before(bottom).max(first + 1);

        let start = first.saturating_sub(self.overscan);
        let end = end.saturating_add(self.overscan).min(len);
        start..end
    }

    /// Recomputes the window for `scroll_top`, unmounting rows that left it and
    /// mounting (and measuring) rows that entered it.
    ///
    /// Returns `true` if the mounted range changed.
    pub fn on_scroll(&mut self, scroll_top: f32, host: &mut impl RowHost) -> bool {
        self.scroll_top = if scroll_top.is_finite() {
            scroll_top.max(0.0)
        } else {
            0.0
        };
        self.sync(host)
    }

    pub fn set_viewport_height(&mut self, viewport_height: f32, host: &mut impl RowHost) -> bool {
        self.viewport_height = viewport_height.max(0.0);
        self.sync(host)
    }

    /// Applies a new root item count. An empty list collapses the range to `0..0`.
    pub fn set_len(&mut self, len: usize, host: &mut impl RowHost) -> bool {
        if len < self.range.end {
            for ix in len.max(self.range.start)..self.range.end {
                host.unmount(ix);
            }
            self.range = self.range.start.min(len)..len;
        }
        self.heights.set_len(len);
        self.sync(host)
    }

    /// Re-renders the mounted rows in `range`, e.g. after a drop changed them.
    pub fn invalidate(&mut self, range: Range<usize>, host: &mut impl RowHost) {
        let start = range.start.max(self.range.start);
        let end = range.end.min(self.range.end);
        for ix in start..end {
            host.unmount(ix);
            self.measure(ix, host);
        }
    }

    fn measure(&mut self, ix: usize, host: &mut impl RowHost) {
        let height = host.mount(ix);
        self.heights.record(ix, height);
        self.heights.record_tail(ix, host.tail_height(ix));
    }

    /// Mounts the visible range. Fresh measurements can shift the range again, so
    /// this repeats until it settles.
    fn sync(&mut self, host: &mut impl RowHost) -> bool {
        let mut changed = false;
        for _ in 0..MAX_SETTLE_PASSES {
            let next = self.visible_range();
            if next == self.range {
                break;
            }

            let previous = std::mem::replace(&mut self.range, next.clone());
            for ix in previous.clone() {
                if !next.contains(&ix) {
                    host.unmount(ix);
                }
            }
            for ix in next.clone() {
                if !previous.contains(&ix) {
                    self.measure(ix, host);
                }
            }
            changed = true;
        }

        if changed {
            tracing::trace!(
                target: "twodo_board::viewport",
                start = self.range.start,
                end = self.range.end,
                scroll_top = self.scroll_top,
                "visible range changed"
            );
        }
        changed
    }
}

/// Activates virtualization for a bin and mounts its first window.
///
/// Returns `None` (render everything) below the configured threshold.
pub fn activate_viewport(
    root_len: usize,
    viewport_height: f32,
    config: &BoardConfig,
    host: &mut impl RowHost,
) -> Option<VirtualScroller> {
    let mut scroller = VirtualScroller::activate(root_len, viewport_height, config)?;
    scroller.sync(host);
    Some(scroller)
}
