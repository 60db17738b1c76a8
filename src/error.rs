//! Error taxonomy for the acquisition/enhancement core
//!
//! Transient read failures are not errors: `FrameSource::read_frame` reports
//! them as `Ok(None)` and the capture loop skips the iteration.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Camera open failure; fatal to session start and surfaced to the operator
    #[error("camera device {index} unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },

    /// Disk write failure; swallowed by the auto-capture scheduler, surfaced
    /// for manual captures
    #[error("failed to write capture to {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    /// Rejected at the boundary; the prior valid configuration is retained
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Manual capture requested before any frame arrived
    #[error("no frame captured yet")]
    NoFrame,
}
