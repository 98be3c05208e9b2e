use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gpui::*;
use gpui_component::ActiveTheme as _;
use gpui_component::{h_flex, v_flex};
use gpui_dnd_board::{BinLoader, DndBoardState, dnd_board};
use twodo_board::{Bin, BinId, Board, BoardConfig, Item, Page};

/// Number of root items in the generated archive bin; large enough to virtualize.
const ARCHIVE_LEN: usize = 400;

pub struct BoardStory {
    board: Entity<DndBoardState>,
    save_path: Option<PathBuf>,
}

impl BoardStory {
    pub fn view(
        board: Board,
        config: BoardConfig,
        save_path: Option<PathBuf>,
        _window: &mut Window,
        cx: &mut App,
    ) -> Entity<Self> {
        let archive = Arc::new(archive_items(&board));
        let loader: BinLoader = Arc::new(move |bin: &BinId| {
            // Simulates a slow backing store.
            std::thread::sleep(Duration::from_millis(250));
            Ok::<_, String>(archive.get(bin).cloned())
        });

        let path = save_path.clone();
        let state = cx.new(|cx| {
            DndBoardState::new(board, cx)
                .config(config)
                .loader(loader)
                .on_change(move |board, _cx| {
                    if let Some(path) = path.as_ref() {
                        save_board(board, path);
                    }
                })
        });
        cx.new(|_| Self {
            board: state,
            save_path,
        })
    }
}

fn save_board(board: &Board, path: &Path) {
    let result = board
        .to_json_pretty()
        .map_err(anyhow::Error::from)
        .and_then(|json| std::fs::write(path, json).map_err(anyhow::Error::from));
    match result {
        Ok(()) => tracing::debug!(path = %path.display(), "board saved"),
        Err(err) => tracing::warn!(path = %path.display(), %err, "failed to save board"),
    }
}

impl Render for BoardStory {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let board = self.board.read(cx).board();
        let totals = board
            .bins()
            .map(|bin| match bin.items() {
                Some(items) => format!("{}: {}", bin.title, items.len()),
                None => format!("{}: –", bin.title),
            })
            .collect::<Vec<_>>()
            .join("  ·  ");
        let saving = match self.save_path.as_ref() {
            Some(path) => format!("Saving to {}", path.display()),
            None => "Changes are kept in memory".to_string(),
        };

        v_flex()
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                v_flex()
                    .gap_y_1()
                    .child(
                        div()
                            .text_xl()
                            .font_weight(FontWeight::BOLD)
                            .child("DnD Board"),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child("Drag items between bins, drop a child anywhere in a bin to un-nest it, drag bin headers onto another page, or drop on the trash to delete."),
                    )
                    .child(
                        h_flex()
                            .gap_x_3()
                            .text_xs()
                            .text_color(theme.muted_foreground)
                            .child(totals)
                            .child(saving),
                    ),
            )
            .child(div().flex_1().min_h(px(0.)).child(dnd_board(&self.board)))
    }
}

/// Items for lazy bins of the demo board, keyed by bin.
fn archive_items(board: &Board) -> HashMap<BinId, Vec<Item>> {
    board
        .bins()
        .filter(|bin| !bin.is_resident())
        .map(|bin| {
            let items = (0..ARCHIVE_LEN)
                .map(|ix| {
                    Item::new(format!("{}-{ix}", bin.id), "note")
                        .field("text", format!("Archived note #{ix}"))
                })
                .collect();
            (bin.id.clone(), items)
        })
        .collect()
}

pub fn demo_board() -> Board {
    let groceries = vec![
        Item::new("milk", "todo").field("text", "Milk"),
        Item::new("baking", "todo")
            .field("text", "Baking")
            .children(["flour", "sugar", "eggs"]),
        Item::new("flour", "todo").parent("baking").field("text", "Flour"),
        Item::new("sugar", "todo").parent("baking").field("text", "Sugar"),
        Item::new("eggs", "todo").parent("baking").field("text", "Eggs"),
        Item::new("coffee", "todo").field("text", "Coffee"),
    ];
    let chores = vec![
        Item::new("laundry", "todo").field("text", "Laundry"),
        Item::new("garden", "todo")
            .field("text", "Garden")
            .children(["mow", "water"]),
        Item::new("mow", "todo").parent("garden").field("text", "Mow the lawn"),
        Item::new("water", "todo").parent("garden").field("text", "Water plants"),
    ];
    let backlog = (0..200)
        .map(|ix| Item::new(format!("idea-{ix}"), "note").field("text", format!("Idea #{ix}")))
        .collect::<Vec<_>>();

    Board::new(vec![
        Page::new("today", "Today")
            .bin(Bin::new("groceries", "Groceries").with_items(groceries))
            .bin(Bin::new("chores", "Chores").with_items(chores)),
        Page::new("later", "Later")
            .bin(Bin::new("backlog", "Backlog").with_items(backlog))
            .bin(Bin::lazy("archive", "Archive")),
    ])
}
