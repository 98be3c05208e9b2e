use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_VIRTUALIZE_THRESHOLD: usize = 50;
const DEFAULT_ROW_HEIGHT: f32 = 48.0;
const DEFAULT_OVERSCAN: usize = 8;
const DEFAULT_POINTER_MOVE_THRESHOLD: f32 = 4.0;
const DEFAULT_CANCEL_GRACE_MS: u64 = 120;

/// Tuning knobs for virtualization and drag handling.
///
/// Every field is optional when deserializing; missing or nonsensical values fall
/// back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    /// Bins with fewer root items than this are rendered in full.
    pub virtualize_threshold: usize,
    /// Height estimate for rows that have not been measured yet.
    pub default_row_height: f32,
    /// Extra rows mounted before and after the visible range.
    pub overscan: usize,
    /// Minimum vertical pointer travel before a drag-over recomputes the drop position.
    pub pointer_move_threshold: f32,
    /// Delay before a cancelled transfer clears the drag session.
    pub cancel_grace_ms: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            virtualize_threshold: DEFAULT_VIRTUALIZE_THRESHOLD,
            default_row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
            pointer_move_threshold: DEFAULT_POINTER_MOVE_THRESHOLD,
            cancel_grace_ms: DEFAULT_CANCEL_GRACE_MS,
        }
    }
}

impl BoardConfig {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.with_defaults())
    }

    pub fn with_defaults(mut self) -> Self {
        if self.virtualize_threshold == 0 {
            self.virtualize_threshold = DEFAULT_VIRTUALIZE_THRESHOLD;
        }
        if !self.default_row_height.is_finite() || self.default_row_height <= 0.0 {
            self.default_row_height = DEFAULT_ROW_HEIGHT;
        }
        if !self.pointer_move_threshold.is_finite() || self.pointer_move_threshold < 0.0 {
            self.pointer_move_threshold = DEFAULT_POINTER_MOVE_THRESHOLD;
        }
        self
    }

    pub fn virtualize_threshold(mut self, threshold: usize) -> Self {
        self.virtualize_threshold = threshold;
        self
    }

    pub fn default_row_height(mut self, height: f32) -> Self {
        self.default_row_height = height;
        self
    }

    pub fn overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }
}
