use serde::{Deserialize, Serialize};
use tracing::info;
use v4l::{capability::Flags, video::Capture, Device, FourCC};

use crate::capture::frame::PixelFormat;

// Detected capture device info
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FoundDevice {
    pub index: u32,
    pub format: PixelFormat,
}

/// Auto-detect the best capture device
pub fn auto_detect_device() -> Option<FoundDevice> {
    info!("Auto-detecting capture devices...");

    for index in 0..10u32 {
        let Ok(dev) = Device::new(index as usize) else {
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            continue;
        };
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            continue;
        }
        let Ok(formats) = dev.enum_formats() else {
            continue;
        };
        // Prefer devices with MJPEG support
        for fmt in formats {
            if fmt.fourcc == FourCC::new(b"MJPG") {
                info!("Found MJPEG device: /dev/video{} - {}", index, caps.card);
                return Some(FoundDevice {
                    index,
                    format: PixelFormat::Mjpeg,
                });
            } else if fmt.fourcc == FourCC::new(b"YUYV") {
                info!("Found YUYV device: /dev/video{} - {}", index, caps.card);
                return Some(FoundDevice {
                    index,
                    format: PixelFormat::Yuyv,
                });
            }
        }
    }

    None
}
