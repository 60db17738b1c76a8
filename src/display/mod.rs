//! Display sink seam
//!
//! The core publishes enhanced frames through [`DisplaySink`]; whatever owns
//! the presentation surface consumes them on its own context. Published
//! frames are frozen behind `Arc` and never written again, so cross-context
//! reads are safe.

use std::sync::Arc;

use metrics::counter;
use tracing::trace;

use crate::capture::frame::Frame;

pub trait DisplaySink: Send + Sync {
    /// Hand a frozen frame to the presentation side; must not block
    fn publish(&self, frame: Arc<Frame>);
}

/// Channel-backed sink that marshals frames to the consumer's context
///
/// The channel is bounded; when the consumer lags, new frames are dropped
/// rather than stalling acquisition.
pub struct ChannelSink {
    tx: flume::Sender<Arc<Frame>>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, flume::Receiver<Arc<Frame>>) {
        let (tx, rx) = flume::bounded(capacity);
        (Self { tx }, rx)
    }
}

impl DisplaySink for ChannelSink {
    fn publish(&self, frame: Arc<Frame>) {
        if self.tx.try_send(frame).is_err() {
            counter!("display_frames_dropped_total").increment(1);
            trace!("Display consumer lagging, frame dropped");
        }
    }
}
