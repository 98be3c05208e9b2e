use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gpui::{
    App, AppContext as _, Context, CursorStyle, DragMoveEvent, ElementId, Entity, EntityId,
    FocusHandle, InteractiveElement as _, IntoElement, MouseButton, ParentElement as _, Pixels,
    Render, RenderOnce, ScrollHandle, SharedString, StatefulInteractiveElement as _,
    StyleRefinement, Styled, Window, div, prelude::FluentBuilder as _, px,
};
use gpui_component::notification::Notification;
use gpui_component::{ActiveTheme as _, StyledExt as _, WindowExt as _, h_flex, v_flex};
use twodo_board::{
    Availability, Bin, BinId, Board, BoardConfig, BoardHost, DragCoordinator, DragFeedback,
    DragOver, DragRequest, DragSession, DropEvent, DropOutcome, DropPosition, DropQuery,
    DropSurface, DropTarget, HierarchyIndex, Indicator, Item, ItemId, PageId, PointerOrigin,
    RowKey,
};

use crate::common::DragGhost;
use crate::layout::{BinWindow, CHILD_ROW_HEIGHT, ROW_HEIGHT};

const CONTEXT: &str = "DndBoard";
const BIN_WIDTH: Pixels = px(280.);
const INDICATOR_THICKNESS: Pixels = px(2.);
const FRAME: Duration = Duration::from_millis(16);

/// Fetches the items of a bin that is not resident yet. Runs on the background
/// executor; `Ok(None)` means the bin has no stored items.
pub type BinLoader = Arc<dyn Fn(&BinId) -> Result<Option<Vec<Item>>, String> + Send + Sync>;

/// Create a [`DndBoard`].
pub fn dnd_board(state: &Entity<DndBoardState>) -> DndBoard {
    DndBoard::new(state)
}

#[derive(Clone)]
struct BoardDrag {
    board_id: EntityId,
    request: DragRequest,
    label: SharedString,
    children: usize,
}

impl BoardDrag {
    fn is_item(&self) -> bool {
        matches!(self.request, DragRequest::Item { .. })
    }
}

/// What the coordinator asked of the view while handling one event.
#[derive(Default)]
struct HostEffects {
    save: bool,
    render: bool,
    loads: Vec<BinId>,
    notices: Vec<String>,
}

struct ViewHost<'a> {
    indicators: &'a mut HashMap<BinId, DropPosition>,
    effects: HostEffects,
}

impl<'a> ViewHost<'a> {
    fn new(indicators: &'a mut HashMap<BinId, DropPosition>) -> Self {
        Self {
            indicators,
            effects: HostEffects::default(),
        }
    }

    fn finish(self) -> HostEffects {
        self.effects
    }
}

impl BoardHost for ViewHost<'_> {
    fn save_data(&mut self) {
        self.effects.save = true;
    }

    fn render(&mut self) {
        self.effects.render = true;
    }

    fn request_load(&mut self, bin: &BinId) {
        self.effects.loads.push(bin.clone());
    }

    fn notify(&mut self, message: &str) {
        self.effects.notices.push(message.to_string());
    }

    fn show_indicator(&mut self, indicator: &Indicator) {
        self.indicators
            .insert(indicator.bin.clone(), indicator.position);
        self.effects.render = true;
    }

    fn clear_indicator(&mut self, bin: &BinId) {
        if self.indicators.remove(bin).is_some() {
            self.effects.render = true;
        }
    }
}

#[derive(Default)]
struct BinView {
    scroll_handle: ScrollHandle,
    window: BinWindow,
}

impl BinView {
    fn sync(&mut self, items: &[Item], config: &BoardConfig) {
        let viewport_height: f32 = self.scroll_handle.bounds().size.height.into();
        let offset: f32 = self.scroll_handle.offset().y.into();
        self.window.sync(items, viewport_height, -offset, config);
    }
}

/// State for a board of bins whose items can be dragged between bins, un-nested,
/// deleted, and whose bins can be moved between pages.
pub struct DndBoardState {
    focus_handle: FocusHandle,
    board: Board,
    coordinator: DragCoordinator,
    bins: HashMap<BinId, BinView>,
    indicators: HashMap<BinId, DropPosition>,
    transfer: Option<String>,
    gesture: u64,
    pending_drop: Option<(u64, DropEvent)>,
    cancel_scheduled: bool,
    epoch: Instant,
    editing: Option<ItemId>,
    loader: Option<BinLoader>,
    on_change: Option<Rc<dyn Fn(&Board, &mut App)>>,
}

impl DndBoardState {
    pub fn new(board: Board, cx: &mut App) -> Self {
        Self {
            focus_handle: cx.focus_handle(),
            board,
            coordinator: DragCoordinator::default(),
            bins: HashMap::new(),
            indicators: HashMap::new(),
            transfer: None,
            gesture: 0,
            pending_drop: None,
            cancel_scheduled: false,
            epoch: Instant::now(),
            editing: None,
            loader: None,
            on_change: None,
        }
    }

    pub fn config(mut self, config: BoardConfig) -> Self {
        self.coordinator = DragCoordinator::new(config);
        self
    }

    /// Provide the loader used for bins whose items are not resident.
    pub fn loader(mut self, loader: BinLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Provide a callback invoked after every committed change, e.g. to persist.
    pub fn on_change(mut self, on_change: impl Fn(&Board, &mut App) + 'static) -> Self {
        self.on_change = Some(Rc::new(on_change));
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_board(&mut self, board: Board, cx: &mut Context<Self>) {
        let mut host = ViewHost::new(&mut self.indicators);
        self.coordinator.abort(&mut host);
        self.board = board;
        self.bins.clear();
        self.transfer = None;
        self.pending_drop = None;
        self.editing = None;
        cx.notify();
    }

    /// Start loading a bin that is not resident yet.
    pub fn load_bin(&mut self, bin: &BinId, window: &mut Window, cx: &mut Context<Self>) {
        if self.board.begin_load(bin) {
            self.spawn_load(bin.clone(), window, cx);
            cx.notify();
        }
    }

    fn spawn_load(&mut self, bin: BinId, window: &mut Window, cx: &mut Context<Self>) {
        let Some(loader) = self.loader.clone() else {
            tracing::warn!(target: "gpui_dnd_board", %bin, "no loader configured");
            if let Err(err) = self.board.complete_load(&bin, Ok(None)) {
                tracing::warn!(target: "gpui_dnd_board", %err, "failed to mark bin unavailable");
            }
            return;
        };

        let this = cx.entity();
        cx.spawn_in(window, async move |_, window| {
            let key = bin.clone();
            let result = window
                .background_executor()
                .spawn(async move { loader(&key) })
                .await;

            let _ = window.update(|window, cx| {
                this.update(cx, |this, cx| this.finish_load(&bin, result, window, cx));
            });
            Some(())
        })
        .detach();
    }

    fn finish_load(
        &mut self,
        bin: &BinId,
        result: Result<Option<Vec<Item>>, String>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if let Err(err) = self.board.complete_load(bin, result)
            && err.is_user_visible()
        {
            window.push_notification(Notification::new().message(err.to_string()), cx);
        }
        cx.notify();
    }

    fn apply_effects(&mut self, effects: HostEffects, window: &mut Window, cx: &mut Context<Self>) {
        if effects.save
            && let Some(on_change) = self.on_change.clone()
        {
            on_change(&self.board, cx);
        }
        for bin in effects.loads {
            self.spawn_load(bin, window, cx);
        }
        for message in effects.notices {
            window.push_notification(Notification::new().message(message), cx);
        }
        if effects.render {
            cx.notify();
        }
    }

    fn frame(&self) -> u64 {
        (self.epoch.elapsed().as_millis() / FRAME.as_millis()) as u64
    }

    fn toggle_editing(&mut self, id: &ItemId, window: &mut Window, cx: &mut Context<Self>) {
        window.focus(&self.focus_handle);
        self.editing = match self.editing.take() {
            Some(current) if current == *id => None,
            _ => Some(id.clone()),
        };
        cx.notify();
    }

    fn origin_for(&self, item: &Item) -> PointerOrigin {
        if self.editing.as_ref() == Some(&item.id) {
            PointerOrigin::InlineEditor
        } else {
            PointerOrigin::Row
        }
    }

    /// A press on a row's nested control never starts a drag; the coordinator
    /// declines it before the row's own drag handler sees the press.
    fn press_control(&mut self, bin: &BinId, row: RowKey) {
        let mut host = ViewHost::new(&mut self.indicators);
        let request = DragRequest::Item {
            bin: bin.clone(),
            row,
            origin: PointerOrigin::Control,
        };
        let started = self.coordinator.begin_drag(&self.board, request, &mut host);
        debug_assert!(started.is_none());
    }

    fn on_key_down(&mut self, event: &gpui::KeyDownEvent, cx: &mut Context<Self>) -> bool {
        if event.keystroke.key.as_str() == "escape" && self.editing.take().is_some() {
            cx.notify();
            return true;
        }
        false
    }

    fn on_drag_start(&mut self, drag: &BoardDrag, _window: &mut Window, cx: &mut Context<Self>) {
        let mut host = ViewHost::new(&mut self.indicators);
        let payload = self
            .coordinator
            .begin_drag(&self.board, drag.request.clone(), &mut host);
        self.transfer = match payload.map(|payload| payload.to_transfer()) {
            Some(Ok(transfer)) => Some(transfer),
            Some(Err(err)) => {
                tracing::warn!(target: "gpui_dnd_board", %err, "failed to encode drag payload");
                None
            }
            None => None,
        };
        self.gesture += 1;
        self.pending_drop = None;
        self.cancel_scheduled = false;
        cx.notify();
    }

    fn on_drag_move_over(
        &mut self,
        surface: DropSurface,
        event: &DragMoveEvent<BoardDrag>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() || event.drag(cx).board_id != cx.entity_id() {
            return;
        }
        let position = event.event.position;
        if !event.bounds.contains(&position) {
            return;
        }

        let empty = BinView::default();
        let view = match &surface {
            DropSurface::Bin(bin) => self.bins.get(bin).unwrap_or(&empty),
            _ => &empty,
        };
        let rows = view.window.mounted_rows();
        let over = DragOver {
            surface,
            query: DropQuery::new(position.y.into(), event.bounds.origin.y.into()),
            frame: self.frame(),
            rows: &rows,
            root_len: view.window.layout().len(),
            scroller: view.window.scroller(),
        };

        let mut host = ViewHost::new(&mut self.indicators);
        let feedback = self
            .coordinator
            .update_drag(&mut self.board, over, &mut host);
        let effects = host.finish();
        if matches!(feedback, DragFeedback::Loading) {
            cx.notify();
        }
        self.apply_effects(effects, window, cx);
    }

    fn on_drop(
        &mut self,
        target: DropTarget,
        drag: &BoardDrag,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if drag.board_id != cx.entity_id() {
            return;
        }

        let gesture = self.gesture;
        if self
            .pending_drop
            .as_ref()
            .is_none_or(|(pending, _)| *pending != gesture)
        {
            let payload = self.transfer.clone().unwrap_or_default();
            self.pending_drop = Some((gesture, DropEvent::new(target, payload)));
        }
        let Some((_, event)) = self.pending_drop.as_mut() else {
            return;
        };

        let mut host = ViewHost::new(&mut self.indicators);
        let outcome = self
            .coordinator
            .commit_drop(&mut self.board, event, &mut host);
        let effects = host.finish();

        match &outcome {
            DropOutcome::Committed(change) => {
                for bin in change.affected_bins() {
                    self.refresh_bin(bin);
                }
                self.transfer = None;
            }
            DropOutcome::AlreadyClaimed => return,
            DropOutcome::Unchanged | DropOutcome::Aborted(_) => {
                self.transfer = None;
            }
        }
        self.apply_effects(effects, window, cx);
        cx.notify();
    }

    fn on_drop_on_bin(
        &mut self,
        bin: &BinId,
        drag: &BoardDrag,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !drag.is_item() {
            return;
        }
        let position = self.indicators.get(bin).copied();
        let target = DropTarget::Bin {
            bin: bin.clone(),
            position,
        };
        self.on_drop(target, drag, window, cx);
    }

    fn on_drop_on_page(
        &mut self,
        page: &PageId,
        drag: &BoardDrag,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if drag.is_item() {
            return;
        }
        self.on_drop(DropTarget::Page(page.clone()), drag, window, cx);
    }

    fn refresh_bin(&mut self, bin: &BinId) {
        let config = self.coordinator.config().clone();
        let Some(items) = self.board.bin(bin).and_then(Bin::items) else {
            return;
        };
        if let Some(view) = self.bins.get_mut(bin) {
            view.sync(items, &config);
            view.window.invalidate();
        }
    }

    /// The transfer ended without a drop reaching us; let the coordinator expire
    /// the session after its grace delay.
    fn schedule_cancel(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.cancel_scheduled = true;
        self.coordinator.cancel_drag(Instant::now());
        let grace = self.coordinator.config().cancel_grace();
        let this = cx.entity();
        cx.spawn_in(window, async move |_, window| {
            window.background_executor().timer(grace).await;
            let _ = window.update(|window, cx| {
                this.update(cx, |this, cx| this.expire_drag(window, cx));
            });
            Some(())
        })
        .detach();
    }

    fn expire_drag(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.cancel_scheduled = false;
        let mut host = ViewHost::new(&mut self.indicators);
        if self.coordinator.tick(Instant::now(), &mut host) {
            self.transfer = None;
        }
        let effects = host.finish();
        self.apply_effects(effects, window, cx);
    }

    fn render_page(&mut self, page_ix: usize, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let page = &self.board.pages[page_ix];
        let page_id = page.id.clone();
        let title = SharedString::from(page.title.clone());
        let bin_ids = page.bins.iter().map(|bin| bin.id.clone()).collect::<Vec<_>>();
        let drop_target_bg = cx.theme().drop_target;
        let muted = cx.theme().muted_foreground;

        let columns = bin_ids
            .iter()
            .map(|bin| self.render_bin(bin, window, cx).into_any_element())
            .collect::<Vec<_>>();

        let drop_page = page_id.clone();
        let move_page = page_id.clone();
        v_flex()
            .id(SharedString::from(format!("page-{page_id}")))
            .gap_y_2()
            .p(px(12.))
            .rounded(px(12.))
            .border_1()
            .border_color(cx.theme().border)
            .drag_over::<BoardDrag>(move |style, drag, _window, _cx| {
                if drag.is_item() {
                    return style;
                }
                style.bg(drop_target_bg.alpha(drop_target_bg.a.max(0.2)))
            })
            .on_drag_move::<BoardDrag>(cx.listener(move |this, event: &DragMoveEvent<BoardDrag>, window, cx| {
                if event.drag(cx).is_item() {
                    return;
                }
                this.on_drag_move_over(DropSurface::Page(move_page.clone()), event, window, cx);
            }))
            .on_drop::<BoardDrag>(cx.listener(move |this, drag: &BoardDrag, window, cx| {
                this.on_drop_on_page(&drop_page, drag, window, cx);
            }))
            .child(
                div()
                    .text_sm()
                    .font_semibold()
                    .text_color(muted)
                    .child(title),
            )
            .child(h_flex().gap_x_3().items_start().children(columns))
    }

    fn render_bin(&mut self, bin_id: &BinId, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let config = self.coordinator.config().clone();
        let theme = cx.theme();
        let (border, background, muted, accent) = (
            theme.border,
            theme.secondary,
            theme.muted_foreground,
            theme.foreground,
        );
        let Some(bin) = self.board.bin(bin_id) else {
            return div().into_any_element();
        };
        let title = SharedString::from(bin.title.clone());
        let availability = bin.availability();
        let state_entity = cx.entity();
        let board_id = cx.entity_id();

        let header_drag = BoardDrag {
            board_id,
            request: DragRequest::Bin {
                bin: bin_id.clone(),
                origin: PointerOrigin::Row,
            },
            label: title.clone(),
            children: 0,
        };
        let header = h_flex()
            .id(SharedString::from(format!("bin-header-{bin_id}")))
            .justify_between()
            .px_2()
            .py_1()
            .cursor(CursorStyle::OpenHand)
            .child(div().font_semibold().child(title))
            .child(
                div()
                    .text_xs()
                    .text_color(muted)
                    .child(format!("{}", bin.len())),
            )
            .on_drag(header_drag, {
                let state_entity = state_entity.clone();
                move |drag, _offset, window, cx: &mut App| {
                    state_entity.update(cx, |state, cx| state.on_drag_start(drag, window, cx));
                    let label = drag.label.clone();
                    cx.new(|_| DragGhost::new(label))
                }
            });

        let body = match availability {
            Availability::Ready => {
                let items = bin.items().unwrap_or_default();
                let view = self.bins.entry(bin_id.clone()).or_default();
                view.sync(items, &config);
                self.render_bin_rows(bin_id, cx).into_any_element()
            }
            Availability::NotLoaded => {
                let load_bin = bin_id.clone();
                div()
                    .id(SharedString::from(format!("bin-load-{bin_id}")))
                    .p_2()
                    .text_sm()
                    .text_color(muted)
                    .cursor_pointer()
                    .child("Not loaded · click to load")
                    .on_click(cx.listener(move |this, _, window, cx| {
                        this.load_bin(&load_bin, window, cx);
                    }))
                    .into_any_element()
            }
            Availability::Loading => div()
                .p_2()
                .text_sm()
                .text_color(muted)
                .child("Loading…")
                .into_any_element(),
            Availability::Unavailable => div()
                .p_2()
                .text_sm()
                .text_color(muted)
                .child("Unavailable")
                .into_any_element(),
        };

        v_flex()
            .w(BIN_WIDTH)
            .h(px(420.))
            .rounded(px(10.))
            .border_1()
            .border_color(border)
            .bg(background)
            .child(header)
            .child(
                div()
                    .h(px(1.))
                    .w_full()
                    .bg(border),
            )
            .child(div().flex_1().min_h(px(0.)).text_color(accent).child(body))
            .into_any_element()
    }

    fn render_bin_rows(&self, bin_id: &BinId, cx: &mut Context<Self>) -> impl IntoElement {
        let Some(items) = self.board.bin(bin_id).and_then(Bin::items) else {
            return div().into_any_element();
        };
        let Some(view) = self.bins.get(bin_id) else {
            return div().into_any_element();
        };
        let indicator_color = cx.theme().foreground;
        let index = HierarchyIndex::build(items);
        let roots = index.roots();
        let visible = view.window.visible();

        let top_spacer = view.window.offset_of(visible.start);
        let bottom_spacer = (view.window.total_height() - view.window.offset_of(visible.end)).max(0.0);

        let mut rows = Vec::with_capacity(visible.len());
        for ix in visible {
            let Some(root) = roots.get(ix) else {
                break;
            };
            let children = index.children_of(root.id.as_str());
            let mut block = v_flex().child(self.render_item_row(
                bin_id,
                RowKey::Root(ix),
                root,
                children.len(),
                cx,
            ));
            for (child_ix, child) in children.iter().enumerate() {
                block = block.child(self.render_item_row(
                    bin_id,
                    RowKey::Child {
                        parent: ix,
                        child: child_ix,
                    },
                    child,
                    0,
                    cx,
                ));
            }
            rows.push(block);
        }

        let line = self.indicators.get(bin_id).map(|position| {
            let y = view.window.indicator_y(position.insert_index);
            div()
                .absolute()
                .left(px(6.))
                .right(px(6.))
                .top(px(y) - INDICATOR_THICKNESS / 2.0)
                .h(INDICATOR_THICKNESS)
                .bg(indicator_color)
        });

        let move_bin = bin_id.clone();
        let drop_bin = bin_id.clone();
        div()
            .id(SharedString::from(format!("bin-body-{bin_id}")))
            .relative()
            .size_full()
            .overflow_y_scroll()
            .track_scroll(&view.scroll_handle)
            .on_drag_move::<BoardDrag>(cx.listener(move |this, event: &DragMoveEvent<BoardDrag>, window, cx| {
                if !event.drag(cx).is_item() {
                    return;
                }
                this.on_drag_move_over(DropSurface::Bin(move_bin.clone()), event, window, cx);
            }))
            .on_drop::<BoardDrag>(cx.listener(move |this, drag: &BoardDrag, window, cx| {
                this.on_drop_on_bin(&drop_bin, drag, window, cx);
            }))
            .child(div().h(px(top_spacer)))
            .children(rows)
            .child(div().h(px(bottom_spacer)))
            .children(line)
            .into_any_element()
    }

    fn render_item_row(
        &self,
        bin_id: &BinId,
        key: RowKey,
        item: &Item,
        children: usize,
        cx: &mut Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();
        let (muted, ring) = (theme.muted_foreground, theme.ring);
        let origin = self.origin_for(item);
        let editing = origin == PointerOrigin::InlineEditor;
        let dragging = self.coordinator.session().is_some_and(|session| match session {
            DragSession::Item(drag) => drag.item_id == item.id,
            DragSession::Bin(_) => false,
        }) && cx.has_active_drag();
        let label = SharedString::from(
            item.text()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} · {}", item.kind, item.id)),
        );
        let height = if key.is_child() {
            CHILD_ROW_HEIGHT
        } else {
            ROW_HEIGHT
        };

        let state_entity = cx.entity();
        let drag_value = BoardDrag {
            board_id: cx.entity_id(),
            request: DragRequest::Item {
                bin: bin_id.clone(),
                row: key,
                origin,
            },
            label: label.clone(),
            children,
        };
        let edit_id = item.id.clone();
        let press_bin = bin_id.clone();
        let drop_bin = bin_id.clone();

        h_flex()
            .id(SharedString::from(format!("item-{bin_id}-{key}")))
            .h(px(height))
            .w_full()
            .px_2()
            .gap_x_2()
            .items_center()
            .justify_between()
            .when(key.is_child(), |this| this.pl(px(28.)).text_sm())
            .when(dragging, |this| this.opacity(0.4))
            .when(editing, |this| this.border_1().border_color(ring))
            .child(div().flex_1().truncate().child(label))
            .child(
                div()
                    .id(SharedString::from(format!("item-edit-{bin_id}-{key}")))
                    .px_1()
                    .text_xs()
                    .text_color(muted)
                    .cursor_pointer()
                    .child(if editing { "done" } else { "edit" })
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(move |this, _, _window, cx| {
                            this.press_control(&press_bin, key);
                            cx.stop_propagation();
                        }),
                    )
                    .on_click(cx.listener(move |this, _, window, cx| {
                        this.toggle_editing(&edit_id, window, cx);
                    })),
            )
            .on_drop::<BoardDrag>(cx.listener(move |this, drag: &BoardDrag, window, cx| {
                this.on_drop_on_bin(&drop_bin, drag, window, cx);
            }))
            .when(origin == PointerOrigin::Row, |this| {
                this.cursor(CursorStyle::OpenHand).on_drag(
                    drag_value,
                    move |drag, _offset, window, cx: &mut App| {
                        state_entity.update(cx, |state, cx| state.on_drag_start(drag, window, cx));
                        let mut ghost = DragGhost::new(drag.label.clone());
                        if drag.children > 0 {
                            ghost = ghost.badge(format!("+{}", drag.children));
                        }
                        cx.new(|_| ghost)
                    },
                )
            })
    }

    fn render_trash(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let (border, danger, muted) = (theme.border, theme.danger, theme.muted_foreground);
        div()
            .id("dnd-board-trash")
            .h(px(56.))
            .w_full()
            .flex()
            .items_center()
            .justify_center()
            .rounded(px(10.))
            .border_1()
            .border_dashed()
            .border_color(border)
            .text_sm()
            .text_color(muted)
            .child("Drop here to delete")
            .drag_over::<BoardDrag>(move |style, drag, _window, _cx| {
                if !drag.is_item() {
                    return style;
                }
                style.border_color(danger).text_color(danger)
            })
            .on_drag_move::<BoardDrag>(cx.listener(|this, event: &DragMoveEvent<BoardDrag>, window, cx| {
                this.on_drag_move_over(DropSurface::Delete, event, window, cx);
            }))
            .on_drop::<BoardDrag>(cx.listener(|this, drag: &BoardDrag, window, cx| {
                if drag.is_item() {
                    this.on_drop(DropTarget::Delete, drag, window, cx);
                }
            }))
    }
}

impl Render for DndBoardState {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if !cx.has_active_drag() && self.coordinator.is_dragging() && !self.cancel_scheduled {
            self.schedule_cancel(window, cx);
        }

        let pages = (0..self.board.pages.len())
            .map(|page_ix| self.render_page(page_ix, window, cx).into_any_element())
            .collect::<Vec<_>>();

        v_flex()
            .id("dnd-board-state")
            .size_full()
            .gap_y_3()
            .child(
                v_flex()
                    .id("dnd-board-pages")
                    .flex_1()
                    .min_h(px(0.))
                    .gap_y_3()
                    .overflow_y_scroll()
                    .children(pages),
            )
            .child(self.render_trash(cx))
    }
}

/// A board element rendering every page and bin of a [`DndBoardState`].
#[derive(IntoElement)]
pub struct DndBoard {
    id: ElementId,
    state: Entity<DndBoardState>,
    style: StyleRefinement,
}

impl DndBoard {
    pub fn new(state: &Entity<DndBoardState>) -> Self {
        Self {
            id: ElementId::Name(format!("dnd-board-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
        }
    }
}

impl Styled for DndBoard {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl RenderOnce for DndBoard {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        let state_entity = self.state.clone();

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .on_key_down(move |event, window, cx| {
                let handled = state_entity.update(cx, |state, cx| state.on_key_down(event, cx));
                if handled {
                    window.prevent_default();
                    cx.stop_propagation();
                }
            })
            .size_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_tracks_indicators_per_bin() {
        let mut indicators = HashMap::new();
        let mut host = ViewHost::new(&mut indicators);
        host.show_indicator(&Indicator {
            bin: "x".into(),
            position: DropPosition::at_end(2),
        });
        host.clear_indicator(&"y".into());
        host.save_data();
        let effects = host.finish();
        assert!(effects.save);
        assert!(effects.render);
        assert_eq!(indicators.len(), 1);

        let mut host = ViewHost::new(&mut indicators);
        host.clear_indicator(&"x".into());
        assert!(host.finish().render);
        assert!(indicators.is_empty());
    }
}
