//! Shared enhancement parameters with atomic snapshot semantics

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Tile grid used by local-contrast enhancement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileGrid {
    Grid4,
    Grid8,
    Grid16,
}

impl TileGrid {
    pub fn dims(self) -> (usize, usize) {
        match self {
            TileGrid::Grid4 => (4, 4),
            TileGrid::Grid8 => (8, 8),
            TileGrid::Grid16 => (16, 16),
        }
    }
}

/// Tunable enhancement parameters
///
/// Written by the operator UI, read by the capture loop and the auto-capture
/// scheduler. Always passed around as a whole value; see [`ParamStore`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceParams {
    /// Global contrast factor applied to the luma channel
    pub contrast_gain: f64,
    /// Global brightness offset applied to the luma channel
    pub brightness_offset: i32,
    /// Local-contrast clip limit
    pub clip_limit: f64,
    /// Local-contrast tile grid
    pub tile_grid: TileGrid,
    /// Gamma correction factor; `<= 0` disables correction
    pub gamma: f64,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            contrast_gain: 1.5,
            brightness_offset: -5,
            clip_limit: 2.0,
            tile_grid: TileGrid::Grid8,
            gamma: 1.2,
        }
    }
}

impl EnhanceParams {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.contrast_gain.is_finite() && self.contrast_gain > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "contrast_gain must be a positive number, got {}",
                self.contrast_gain
            )));
        }
        if !(-255..=255).contains(&self.brightness_offset) {
            return Err(Error::InvalidConfig(format!(
                "brightness_offset must be in [-255, 255], got {}",
                self.brightness_offset
            )));
        }
        if !(self.clip_limit.is_finite() && self.clip_limit > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "clip_limit must be a positive number, got {}",
                self.clip_limit
            )));
        }
        if !self.gamma.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "gamma must be finite, got {}",
                self.gamma
            )));
        }
        Ok(())
    }
}

/// Single-writer/multi-reader store for [`EnhanceParams`]
///
/// `set` publishes a whole new immutable value; `snapshot` hands out an `Arc`
/// to a fully-written one. A reader can never observe a mix of old and new
/// fields, and must take its snapshot once per enhancement call rather than
/// holding a live reference across it.
pub struct ParamStore {
    current: ArcSwap<EnhanceParams>,
}

impl ParamStore {
    pub fn new(initial: EnhanceParams) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Replace the parameters; out-of-range values are rejected and the
    /// prior configuration stays active
    pub fn set(&self, params: EnhanceParams) -> Result<(), Error> {
        params.validate()?;
        self.current.store(Arc::new(params));
        Ok(())
    }

    pub fn snapshot(&self) -> Arc<EnhanceParams> {
        self.current.load_full()
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new(EnhanceParams::default())
    }
}
