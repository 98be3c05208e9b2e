//! Pointer → insertion index resolution for bin surfaces.

use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;
use crate::viewport::VirtualScroller;

/// Identity of a rendered row: a root item, or a child rendered under its parent.
///
/// The string form is `"<ix>"` for roots and `"<parent>-<child>"` for children,
/// where `parent` is the parent's root index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    Root(usize),
    Child { parent: usize, child: usize },
}

impl RowKey {
    /// Root index this row belongs to.
    pub fn root_index(self) -> usize {
        match self {
            RowKey::Root(ix) => ix,
            RowKey::Child { parent, .. } => parent,
        }
    }

    pub fn is_child(self) -> bool {
        matches!(self, RowKey::Child { .. })
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Root(ix) => write!(f, "{ix}"),
            RowKey::Child { parent, child } => write!(f, "{parent}-{child}"),
        }
    }
}

impl FromStr for RowKey {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BoardError::InvalidRowKey(s.to_string());
        match s.split_once('-') {
            None => s.parse().map(RowKey::Root).map_err(|_| invalid()),
            Some((parent, child)) => {
                let parent = parent.parse().map_err(|_| invalid())?;
                let child = child.parse().map_err(|_| invalid())?;
                Ok(RowKey::Child { parent, child })
            }
        }
    }
}

/// A row that currently has a live visual representation.
///
/// `top` is relative to the bin viewport's top edge (already scrolled).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountedRow {
    pub key: RowKey,
    pub top: f32,
    pub height: f32,
}

impl MountedRow {
    pub fn new(key: RowKey, top: f32, height: f32) -> Self {
        Self { key, top, height }
    }

    pub fn midpoint(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

/// Pointer position in window coordinates plus the bin viewport's top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropQuery {
    pub pointer_y: f32,
    pub container_top: f32,
}

impl DropQuery {
    pub fn new(pointer_y: f32, container_top: f32) -> Self {
        Self {
            pointer_y,
            container_top,
        }
    }

    fn local_y(&self) -> f32 {
        self.pointer_y - self.container_top
    }
}

/// Resolved drop slot.
///
/// `insert_index` counts root items: the dragged item goes before the root at that
/// index, or at the end when it equals the root count. `target` is the mounted row
/// the indicator should be drawn against, if there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropPosition {
    pub insert_index: usize,
    pub target: Option<RowKey>,
}

impl DropPosition {
    pub fn at_end(root_len: usize) -> Self {
        Self {
            insert_index: root_len,
            target: None,
        }
    }
}

/// Computes where a drop at `query` lands.
///
/// `rows` are the mounted rows in visual order. Without a scroller every row is
/// mounted; with one, only the window is, and positions below the last mounted row
/// are resolved from the height cache instead. Both paths use the same midpoint
/// rule, so virtualization never changes the result.
pub fn resolve_drop_position(
    query: DropQuery,
    rows: &[MountedRow],
    root_len: usize,
    scroller: Option<&VirtualScroller>,
) -> DropPosition {
    if root_len == 0 {
        return DropPosition::at_end(0);
    }

    let local_y = query.local_y();
    if !local_y.is_finite() {
        return DropPosition::at_end(root_len);
    }

    // Ties go to the earlier index.
    if let Some(row) = rows.iter().find(|row| local_y <= row.midpoint()) {
        let insert_index = row.key.root_index().min(root_len);
        let target = match row.key {
            RowKey::Root(ix) => Some(RowKey::Root(ix)),
            RowKey::Child { parent, .. } => rows
                .iter()
                .any(|row| row.key == RowKey::Root(parent))
                .then_some(RowKey::Root(parent)),
        };
        return DropPosition {
            insert_index,
            target,
        };
    }

    let Some(scroller) = scroller else {
        return DropPosition::at_end(root_len);
    };

    let start = rows
        .iter()
        .map(|row| row.key.root_index() + 1)
        .max()
        .unwrap_or(0);
    let content_y = scroller.scroll_top() + local_y;
    let insert_index = analytic_insert_index(scroller, start, content_y, root_len);
    tracing::trace!(
        target: "twodo_board::drop",
        start,
        content_y,
        insert_index,
        "resolved drop below mounted rows"
    );
    DropPosition {
        insert_index,
        target: None,
    }
}

fn analytic_insert_index(
    scroller: &VirtualScroller,
    start: usize,
    content_y: f32,
    root_len: usize,
) -> usize {
    let heights = scroller.heights();
    let len = root_len.min(heights.len());
    let mut accumulated = heights.offset_of(start);
    for ix in start..len {
        // A block's child rows resolve to the block, so its last drop midpoint
        // is that of its last row.
        if content_y <= accumulated + heights.drop_edge(ix) {
            return ix;
        }
        accumulated += heights.height(ix);
    }
    root_len
}
