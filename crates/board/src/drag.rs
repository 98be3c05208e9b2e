//! The drag session and the coordinator that owns it.
//!
//! A [`DragCoordinator`] holds at most one [`DragSession`]. Drag-over events are
//! resolved into a single drop indicator, and a drop commits exactly one mutation
//! no matter how many surfaces see the same [`DropEvent`].

use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::BoardConfig;
use crate::drop::{DropPosition, DropQuery, MountedRow, RowKey, resolve_drop_position};
use crate::error::{BoardError, Result};
use crate::hierarchy::HierarchyIndex;
use crate::model::{Availability, BinId, Board, ItemId, PageId};
use crate::ops::{Change, ItemLocation, delete_item, move_item, relocate_bin, unnest_item};
use crate::viewport::VirtualScroller;

/// Collaborators the coordinator reports to.
pub trait BoardHost {
    /// Persist the board; called once after every committed mutation.
    fn save_data(&mut self);

    /// Re-render after a mutation.
    fn render(&mut self);

    /// Start fetching a bin that is not resident yet.
    fn request_load(&mut self, _bin: &BinId) {}

    /// Show a one-line notice to the user.
    fn notify(&mut self, _message: &str) {}

    fn show_indicator(&mut self, _indicator: &Indicator) {}

    fn clear_indicator(&mut self, _bin: &BinId) {}
}

/// Where on the row the pointer went down.
///
/// Only `Row` starts a drag. Hosts that cannot stop a press on a nested control
/// before the drag starts report it here and the coordinator declines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOrigin {
    Row,
    /// A button or input nested inside the row.
    Control,
    /// The row is in inline text edit mode.
    InlineEditor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragRequest {
    Item {
        bin: BinId,
        row: RowKey,
        origin: PointerOrigin,
    },
    Bin {
        bin: BinId,
        origin: PointerOrigin,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDrag {
    pub source_bin: BinId,
    /// Flat position of the dragged item.
    pub source_index: usize,
    pub item_id: ItemId,
    pub is_child: bool,
    /// Flat position of the parent, for children.
    pub parent_index: Option<usize>,
    /// Position among the parent's children, for children.
    pub child_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinDrag {
    pub source_page: PageId,
    pub bin: BinId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSession {
    Item(ItemDrag),
    Bin(BinDrag),
}

impl DragSession {
    pub fn payload(&self) -> DragPayload {
        match self {
            DragSession::Item(drag) => DragPayload::Item {
                bin_id: drag.source_bin.clone(),
                item_id: drag.item_id.clone(),
            },
            DragSession::Bin(drag) => DragPayload::Bin {
                page_id: drag.source_page.clone(),
                bin_id: drag.bin.clone(),
            },
        }
    }
}

/// Transfer data attached to a drag, carried as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DragPayload {
    #[serde(rename_all = "camelCase")]
    Item { bin_id: BinId, item_id: ItemId },
    #[serde(rename_all = "camelCase")]
    Bin { page_id: PageId, bin_id: BinId },
}

impl DragPayload {
    pub fn parse(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(BoardError::MalformedPayload)
    }

    pub fn to_transfer(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A surface the pointer is currently over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropSurface {
    Bin(BinId),
    Page(PageId),
    Delete,
}

/// One drag-over sample.
#[derive(Debug, Clone)]
pub struct DragOver<'a> {
    pub surface: DropSurface,
    pub query: DropQuery,
    /// Animation frame the sample belongs to.
    pub frame: u64,
    /// Mounted rows of the hovered bin, in visual order.
    pub rows: &'a [MountedRow],
    /// Root item count of the hovered bin.
    pub root_len: usize,
    pub scroller: Option<&'a VirtualScroller>,
}

/// The single drop indicator on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub bin: BinId,
    pub position: DropPosition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragFeedback {
    /// No drag is in progress.
    Idle,
    /// The sample was too close to the previous one; nothing recomputed.
    Throttled,
    Indicator(Indicator),
    /// The bin's items are being fetched; show a loading state.
    Loading,
    Unavailable,
    Delete,
    Relocate(PageId),
    /// The surface does not accept the dragged entity.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Bin {
        bin: BinId,
        position: Option<DropPosition>,
    },
    Page(PageId),
    Delete,
}

/// A drop as delivered by the UI.
///
/// Several nested surfaces may see the same event; the first one to commit it
/// claims it and the rest become no-ops.
#[derive(Debug, Clone)]
pub struct DropEvent {
    pub target: DropTarget,
    pub payload: String,
    claimed: bool,
}

impl DropEvent {
    pub fn new(target: DropTarget, payload: impl Into<String>) -> Self {
        Self {
            target,
            payload: payload.into(),
            claimed: false,
        }
    }

    /// Claims the event. Returns `false` if it was already claimed.
    pub fn claim(&mut self) -> bool {
        !std::mem::replace(&mut self.claimed, true)
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

#[derive(Debug)]
pub enum DropOutcome {
    /// A more specific surface already handled this event.
    AlreadyClaimed,
    /// The drop resolved to the item's current place.
    Unchanged,
    Committed(Change),
    /// Malformed payload, stale reference or unsupported target; nothing changed.
    Aborted(BoardError),
}

impl DropOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, DropOutcome::Committed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PointerSample {
    surface: DropSurface,
    y: f32,
    frame: u64,
}

pub struct DragCoordinator {
    config: BoardConfig,
    session: Option<DragSession>,
    indicator: Option<Indicator>,
    touched: BTreeSet<BinId>,
    last_sample: Option<PointerSample>,
    cancel_deadline: Option<Instant>,
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

impl DragCoordinator {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            config: config.with_defaults(),
            session: None,
            indicator: None,
            touched: BTreeSet::new(),
            last_sample: None,
            cancel_deadline: None,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn indicator(&self) -> Option<&Indicator> {
        self.indicator.as_ref()
    }

    /// Starts a drag session and returns the transfer payload for it.
    ///
    /// Declines (returns `None`) for drags that start on a nested control or an
    /// item being edited, and for rows that do not resolve to an item.
    pub fn begin_drag(
        &mut self,
        board: &Board,
        request: DragRequest,
        host: &mut impl BoardHost,
    ) -> Option<DragPayload> {
        let origin = match &request {
            DragRequest::Item { origin, .. } | DragRequest::Bin { origin, .. } => *origin,
        };
        if origin != PointerOrigin::Row {
            tracing::debug!(target: "twodo_board::drag", ?origin, "drag declined");
            return None;
        }

        let session = match request {
            DragRequest::Item { bin, row, .. } => item_session(board, bin, row)?,
            DragRequest::Bin { bin, .. } => {
                let (page_ix, _) = board.locate_bin(&bin)?;
                DragSession::Bin(BinDrag {
                    source_page: board.pages[page_ix].id.clone(),
                    bin,
                })
            }
        };

        if self.session.is_some() {
            tracing::debug!(target: "twodo_board::drag", "replacing abandoned drag session");
            self.finish(false, host);
        }

        tracing::debug!(target: "twodo_board::drag", ?session, "drag started");
        let payload = session.payload();
        self.session = Some(session);
        Some(payload)
    }

    /// Handles a drag-over sample, updating the drop indicator.
    pub fn update_drag(
        &mut self,
        board: &mut Board,
        over: DragOver<'_>,
        host: &mut impl BoardHost,
    ) -> DragFeedback {
        let Some(session) = self.session.as_ref() else {
            return DragFeedback::Idle;
        };

        if let Some(last) = self.last_sample.as_ref()
            && last.surface == over.surface
            && (last.frame == over.frame
                || (last.y - over.query.pointer_y).abs() <= self.config.pointer_move_threshold)
        {
            return DragFeedback::Throttled;
        }
        self.last_sample = Some(PointerSample {
            surface: over.surface.clone(),
            y: over.query.pointer_y,
            frame: over.frame,
        });

        let feedback = match (session, &over.surface) {
            (_, DropSurface::Delete) => DragFeedback::Delete,
            (DragSession::Bin(_), DropSurface::Page(page)) => DragFeedback::Relocate(page.clone()),
            (DragSession::Item(_), DropSurface::Page(_))
            | (DragSession::Bin(_), DropSurface::Bin(_)) => DragFeedback::Rejected,
            (DragSession::Item(_), DropSurface::Bin(bin)) => {
                match board.bin(bin).map(|bin| bin.availability()) {
                    None => DragFeedback::Rejected,
                    Some(Availability::NotLoaded) => {
                        if board.begin_load(bin) {
                            host.request_load(bin);
                        }
                        DragFeedback::Loading
                    }
                    Some(Availability::Loading) => DragFeedback::Loading,
                    Some(Availability::Unavailable) => DragFeedback::Unavailable,
                    Some(Availability::Ready) => {
                        let position = resolve_drop_position(
                            over.query,
                            over.rows,
                            over.root_len,
                            over.scroller,
                        );
                        DragFeedback::Indicator(Indicator {
                            bin: bin.clone(),
                            position,
                        })
                    }
                }
            }
        };

        let next = match &feedback {
            DragFeedback::Indicator(indicator) => Some(indicator.clone()),
            _ => None,
        };
        self.set_indicator(next, host);
        feedback
    }

    /// Commits a drop. At most one mutation is applied per event.
    pub fn commit_drop(
        &mut self,
        board: &mut Board,
        event: &mut DropEvent,
        host: &mut impl BoardHost,
    ) -> DropOutcome {
        if !event.claim() {
            return DropOutcome::AlreadyClaimed;
        }

        let Some(session) = self.session.take() else {
            self.finish(false, host);
            return DropOutcome::Aborted(BoardError::NoSession);
        };

        let result = DragPayload::parse(&event.payload)
            .and_then(|payload| apply_drop(board, &session, &payload, &event.target));

        match result {
            Ok(Some(change)) => {
                tracing::debug!(target: "twodo_board::drag", ?change, "drop committed");
                self.finish(true, host);
                DropOutcome::Committed(change)
            }
            Ok(None) => {
                tracing::debug!(target: "twodo_board::drag", "drop left board unchanged");
                self.finish(false, host);
                DropOutcome::Unchanged
            }
            Err(err) => {
                tracing::warn!(target: "twodo_board::drag", %err, "drop aborted");
                if err.is_user_visible() {
                    host.notify(&err.to_string());
                }
                self.finish(false, host);
                DropOutcome::Aborted(err)
            }
        }
    }

    /// The transfer reported no effect. The session is cleared once the grace
    /// delay passes, unless a drop still arrives in the meantime.
    pub fn cancel_drag(&mut self, now: Instant) {
        if self.session.is_some() {
            self.cancel_deadline = Some(now + self.config.cancel_grace());
        }
    }

    /// Expires a pending cancel. Returns `true` if the session was cleared.
    pub fn tick(&mut self, now: Instant, host: &mut impl BoardHost) -> bool {
        match self.cancel_deadline {
            Some(deadline) if now >= deadline => {
                tracing::debug!(target: "twodo_board::drag", "drag cancelled");
                self.finish(false, host);
                true
            }
            _ => false,
        }
    }

    /// Drops the session immediately without touching the board.
    pub fn abort(&mut self, host: &mut impl BoardHost) {
        self.finish(false, host);
    }

    fn set_indicator(&mut self, next: Option<Indicator>, host: &mut impl BoardHost) {
        if self.indicator == next {
            return;
        }
        if let Some(previous) = self.indicator.take() {
            host.clear_indicator(&previous.bin);
        }
        if let Some(next) = next {
            self.touched.insert(next.bin.clone());
            host.show_indicator(&next);
            self.indicator = Some(next);
        }
    }

    fn finish(&mut self, changed: bool, host: &mut impl BoardHost) {
        self.session = None;
        self.indicator = None;
        self.last_sample = None;
        self.cancel_deadline = None;
        // Indicators may be left in every bin the pointer crossed.
        for bin in std::mem::take(&mut self.touched) {
            host.clear_indicator(&bin);
        }
        if changed {
            host.save_data();
            host.render();
        }
    }
}

fn item_session(board: &Board, bin: BinId, row: RowKey) -> Option<DragSession> {
    let items = board.bin(&bin)?.items()?;
    let index = HierarchyIndex::build(items);
    let roots = index.roots();

    let drag = match row {
        RowKey::Root(ix) => {
            let item = roots.get(ix)?;
            ItemDrag {
                source_index: index.position(item.id.as_str())?,
                item_id: item.id.clone(),
                source_bin: bin,
                is_child: false,
                parent_index: None,
                child_index: None,
            }
        }
        RowKey::Child { parent, child } => {
            let parent = roots.get(parent)?;
            let item = *index.children_of(parent.id.as_str()).get(child)?;
            ItemDrag {
                source_index: index.position(item.id.as_str())?,
                item_id: item.id.clone(),
                source_bin: bin,
                is_child: true,
                parent_index: index.position(parent.id.as_str()),
                child_index: Some(child),
            }
        }
    };
    Some(DragSession::Item(drag))
}

fn apply_drop(
    board: &mut Board,
    session: &DragSession,
    payload: &DragPayload,
    target: &DropTarget,
) -> Result<Option<Change>> {
    match (session, payload) {
        (DragSession::Item(drag), DragPayload::Item { bin_id, item_id }) => {
            if *bin_id != drag.source_bin || *item_id != drag.item_id {
                return Err(BoardError::stale(bin_id, item_id.as_str()));
            }
            let source = ItemLocation {
                bin: drag.source_bin.clone(),
                index: drag.source_index,
                id: drag.item_id.clone(),
            };
            match target {
                DropTarget::Delete => delete_item(board, &source).map(Some),
                DropTarget::Bin { bin, position } => {
                    if drag.is_child {
                        let parent_index = drag.parent_index.ok_or_else(|| {
                            BoardError::stale(&drag.source_bin, drag.item_id.as_str())
                        })?;
                        // Without a target row the child lands right after its parent.
                        let slot = position
                            .filter(|position| position.target.is_some())
                            .map(|position| position.insert_index);
                        unnest_item(board, &source, parent_index, bin, slot)
                    } else {
                        let slot = position.map(|position| position.insert_index);
                        move_item(board, &source, bin, slot)
                    }
                }
                DropTarget::Page(_) => Err(BoardError::Unsupported),
            }
        }
        (DragSession::Bin(drag), DragPayload::Bin { bin_id, .. }) => {
            if *bin_id != drag.bin {
                return Err(BoardError::stale(bin_id, bin_id.as_str()));
            }
            match target {
                DropTarget::Page(page) => relocate_bin(board, &drag.bin, page),
                _ => Err(BoardError::Unsupported),
            }
        }
        _ => Err(BoardError::Unsupported),
    }
}
