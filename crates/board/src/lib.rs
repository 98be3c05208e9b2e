mod config;
mod drag;
mod drop;
mod error;
mod hierarchy;
mod model;
mod ops;
mod viewport;

pub use crate::config::*;
pub use crate::drag::*;
pub use crate::drop::*;
pub use crate::error::*;
pub use crate::hierarchy::*;
pub use crate::model::*;
pub use crate::ops::*;
pub use crate::viewport::*;
