//! V4L2 frame source with memory-mapped streaming

use std::time::Instant;

use tracing::{info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags as CapFlags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::MmapStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::capture::decoder;
use crate::capture::frame::{Frame, PixelFormat};
use crate::capture::source::FrameSource;
use crate::error::Error;
use crate::CaptureConfig;

const BUFFER_COUNT: u32 = 4;

/// Camera handle backed by V4L2 memory-mapped streaming
///
/// Dropping the source stops the stream and releases the device, in that
/// order (field order is load-bearing).
pub struct V4l2Source {
    stream: Option<MmapStream<'static>>,
    device: Box<Device>,
    format: PixelFormat,
    width: u32,
    height: u32,
    sequence: u64,
}

impl V4l2Source {
    /// Open `/dev/video{index}` and start streaming
    ///
    /// Open failure is fatal to session start and is not retried here.
    pub fn open(index: u32, config: &CaptureConfig) -> Result<Self, Error> {
        info!(index, "Opening V4L2 capture device");

        let device = Device::new(index as usize).map_err(|e| Error::DeviceUnavailable {
            index,
            reason: e.to_string(),
        })?;

        let caps = device.query_caps().map_err(|e| Error::DeviceUnavailable {
            index,
            reason: e.to_string(),
        })?;
        info!("Device: {} ({})", caps.card, caps.driver);

        if !caps.capabilities.contains(CapFlags::VIDEO_CAPTURE) {
            return Err(Error::DeviceUnavailable {
                index,
                reason: "device does not support video capture".into(),
            });
        }

        // Negotiate format; the driver may adjust dimensions
        let mut fmt = device.format().map_err(|e| Error::DeviceUnavailable {
            index,
            reason: e.to_string(),
        })?;
        fmt.width = config.width;
        fmt.height = config.height;
        fmt.fourcc = match config.format {
            PixelFormat::Mjpeg => FourCC::new(b"MJPG"),
            PixelFormat::Yuyv => FourCC::new(b"YUYV"),
            PixelFormat::Rgb24 => FourCC::new(b"RGB3"),
            PixelFormat::Bgr24 => FourCC::new(b"BGR3"),
        };
        let actual = device
            .set_format(&fmt)
            .map_err(|e| Error::DeviceUnavailable {
                index,
                reason: e.to_string(),
            })?;
        info!(
            width = actual.width,
            height = actual.height,
            fourcc = %actual.fourcc,
            "Capture format negotiated"
        );

        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT).map_err(
            |e| Error::DeviceUnavailable {
                index,
                reason: format!("failed to start stream: {e}"),
            },
        )?;

        Ok(Self {
            stream: Some(stream),
            device: Box::new(device),
            format: config.format,
            width: actual.width,
            height: actual.height,
            sequence: 0,
        })
    }
}

impl FrameSource for V4l2Source {
    fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        let stream = match self.stream.as_mut() {
            Some(s) => s,
            None => return Ok(None),
        };

        let (buf, meta) = match stream.next() {
            Ok(next) => next,
            Err(e) => {
                // Transient dequeue failure: skip this iteration
                warn!("Frame dequeue failed: {e}");
                return Ok(None);
            }
        };

        let used = meta.bytesused as usize;
        let data = if used > 0 && used <= buf.len() {
            &buf[..used]
        } else {
            &buf[..]
        };

        let timestamp = Instant::now();
        match decoder::decode_to_bgr(data, self.width, self.height, self.format) {
            Ok(bgr) => {
                self.sequence += 1;
                let mut frame = Frame::from_bgr(bgr, self.width, self.height, self.sequence);
                frame.timestamp = timestamp;
                Ok(Some(frame))
            }
            Err(e) => {
                warn!("Frame decode failed: {e}");
                Ok(None)
            }
        }
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        self.stream = None; // stop streaming before the device handle goes away
        info!("V4L2 capture device released");
    }
}
