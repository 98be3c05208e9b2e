use std::path::PathBuf;

use anyhow::Context as _;
use gpui::*;
use gpui_component::Root;
use tracing_subscriber::EnvFilter;
use twodo_board::{Board, BoardConfig};

use crate::board_story::{BoardStory, demo_board};

mod board_story;

/// Usage: `twodo-story [BOARD.json] [CONFIG.json]`
///
/// Without a board file the demo board is shown and edits stay in memory.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,twodo_board=debug,gpui_dnd_board=debug")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let save_path = args.next().map(PathBuf::from);
    let board = match save_path.as_ref() {
        Some(path) if path.exists() => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Board::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        _ => demo_board(),
    };
    let config = match args.next() {
        Some(path) => {
            let json =
                std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            BoardConfig::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => BoardConfig::default(),
    };

    let app = Application::new();
    app.run(move |cx| {
        gpui_component::init(cx);
        cx.activate(true);

        cx.spawn(async move |cx| {
            cx.open_window(
                WindowOptions {
                    titlebar: Some(TitlebarOptions {
                        title: Some("Twodo Board".into()),
                        appears_transparent: false,
                        traffic_light_position: None,
                    }),
                    ..Default::default()
                },
                |window, cx| {
                    let view = BoardStory::view(board, config, save_path, window, cx);
                    cx.new(|cx| Root::new(view, window, cx))
                },
            )?;

            Ok::<_, anyhow::Error>(())
        })
        .detach();
    });
    Ok(())
}
