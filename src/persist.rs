//! PNG persistence for auto and manual captures

use std::path::{Path, PathBuf};

use chrono::Local;
use image::{ImageFormat, RgbImage};
use tracing::debug;

use crate::capture::frame::Frame;
use crate::error::Error;

/// Write a frame as `{prefix}_{YYYYmmdd_HHMMSS}.png` under `dir`
///
/// The directory must exist and be writable; callers decide whether a
/// failure is surfaced (manual capture) or logged and swallowed (scheduler).
pub fn save_png(frame: &Frame, dir: &Path, prefix: &str) -> Result<PathBuf, Error> {
    let filename = format!("{prefix}_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);

    let w = frame.width as usize;
    let h = frame.height as usize;
    let mut rgb = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        for px in frame.row(row).chunks_exact(3) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
    }

    let img = RgbImage::from_raw(frame.width, frame.height, rgb).ok_or_else(|| {
        Error::Persistence {
            path: path.clone(),
            reason: "frame buffer does not match its dimensions".into(),
        }
    })?;
    img.save_with_format(&path, ImageFormat::Png)
        .map_err(|e| Error::Persistence {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    debug!(path = %path.display(), "Capture written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("organoscope_{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_named_png() {
        let dir = test_dir("persist");
        let frame = Frame::from_bgr(vec![128; 4 * 4 * 3], 4, 4, 1);
        let path = save_png(&frame, &dir, "auto").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("auto_"));
        assert!(name.ends_with(".png"));
        // auto_ + YYYYmmdd_HHMMSS + .png
        assert_eq!(name.len(), 5 + 15 + 4);
        assert!(path.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_is_a_persistence_error() {
        let dir = std::env::temp_dir().join("organoscope_definitely_missing");
        let _ = std::fs::remove_dir_all(&dir);
        let frame = Frame::from_bgr(vec![0; 3], 1, 1, 1);
        match save_png(&frame, &dir, "auto") {
            Err(Error::Persistence { .. }) => {}
            other => panic!("expected persistence error, got {other:?}"),
        }
    }
}
