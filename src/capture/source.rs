//! Camera abstraction used by the capture loop

use crate::capture::frame::Frame;
use crate::error::Error;

/// A device that produces raw frames on demand
///
/// `Ok(None)` signals a transient read failure; the caller skips the
/// iteration and retries after its poll interval. Opening a device is the
/// implementor's constructor and is where `Error::DeviceUnavailable`
/// originates; releasing the device is `Drop`.
///
/// Reads are expected to return within one capture interval; the loop relies
/// on that rather than imposing its own timeout.
pub trait FrameSource: Send {
    fn read_frame(&mut self) -> Result<Option<Frame>, Error>;
}
