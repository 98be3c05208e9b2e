mod board;
mod common;
mod layout;

pub use board::{BinLoader, DndBoard, DndBoardState, dnd_board};
