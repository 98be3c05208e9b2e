//! Error types for board mutations and drag/drop handling.

use crate::model::{BinId, PageId};

/// Result type alias for board operations.
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors produced by the board core.
///
/// None of these are fatal: the drag coordinator turns every one of them into a
/// no-op drop, and only [`BoardError::LoadFailed`] is meant to reach the user.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The drag transfer data could not be parsed.
    #[error("malformed drag payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    /// Board JSON could not be read or written.
    #[error("invalid board data: {0}")]
    Data(#[from] serde_json::Error),

    /// A row index string was neither `"<ix>"` nor `"<parent>-<child>"`.
    #[error("invalid row key '{0}'")]
    InvalidRowKey(String),

    #[error("unknown bin '{0}'")]
    UnknownBin(BinId),

    #[error("unknown page '{0}'")]
    UnknownPage(PageId),

    /// The bin's items are not resident yet (lazy loading in progress or failed).
    #[error("bin '{0}' is not loaded")]
    NotResident(BinId),

    /// An index or id recorded at drag start no longer matches the data.
    #[error("stale reference to '{item}' in bin '{bin}'")]
    StaleReference { bin: BinId, item: String },

    /// Moving the item would duplicate an id inside the destination bin.
    #[error("item '{item}' already exists in bin '{bin}'")]
    DuplicateItem { bin: BinId, item: String },

    #[error("no drag session is active")]
    NoSession,

    /// The drop target does not accept the dragged entity.
    #[error("drop target does not accept this drag")]
    Unsupported,

    #[error("failed to load bin '{bin}': {message}")]
    LoadFailed { bin: BinId, message: String },
}

impl BoardError {
    pub fn stale(bin: &BinId, item: impl Into<String>) -> Self {
        Self::StaleReference {
            bin: bin.clone(),
            item: item.into(),
        }
    }

    /// Whether this failure should be surfaced to the user as a notice.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::LoadFailed { .. })
    }
}
