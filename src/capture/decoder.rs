use jpeg_decoder::Decoder;

use super::frame::PixelFormat;

/// Decode a raw device buffer into tightly packed BGR24
///
/// Failures here are transient (a truncated MJPEG frame, a short read) and
/// reported as `Err(String)`; the source maps them to an empty read.
pub fn decode_to_bgr(
    data: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>, String> {
    let expected = (width * height * 3) as usize;
    match format {
        PixelFormat::Mjpeg => {
            let mut decoder = Decoder::new(data);
            let mut pixels = decoder
                .decode()
                .map_err(|e| format!("jpeg decode failed: {e}"))?;
            if pixels.len() != expected {
                return Err(format!(
                    "jpeg decoded {} bytes, expected {expected}",
                    pixels.len()
                ));
            }
            // jpeg-decoder yields RGB; swizzle in place
            for px in pixels.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            Ok(pixels)
        }
        PixelFormat::Yuyv => {
            if data.len() < (width * height * 2) as usize {
                return Err(format!("short YUYV buffer: {} bytes", data.len()));
            }
            let mut bgr = Vec::with_capacity(expected);
            // Y0 U Y1 V per pixel pair, ITU-R BT.601 video range
            for quad in data[..(width * height * 2) as usize].chunks_exact(4) {
                let u = quad[1] as i32 - 128;
                let v = quad[3] as i32 - 128;
                for &y in &[quad[0], quad[2]] {
                    let c = 298 * (y as i32 - 16);
                    let b = (c + 516 * u + 128) >> 8;
                    let g = (c - 100 * u - 208 * v + 128) >> 8;
                    let r = (c + 409 * v + 128) >> 8;
                    bgr.push(b.clamp(0, 255) as u8);
                    bgr.push(g.clamp(0, 255) as u8);
                    bgr.push(r.clamp(0, 255) as u8);
                }
            }
            Ok(bgr)
        }
        PixelFormat::Rgb24 => {
            if data.len() < expected {
                return Err(format!("short RGB buffer: {} bytes", data.len()));
            }
            let mut bgr = data[..expected].to_vec();
            for px in bgr.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            Ok(bgr)
        }
        PixelFormat::Bgr24 => {
            if data.len() < expected {
                return Err(format!("short BGR buffer: {} bytes", data.len()));
            }
            Ok(data[..expected].to_vec())
        }
    }
}
