//! Six-stage frame enhancement
//!
//! Brightness and contrast edits operate on the luma channel of a
//! luma/chroma representation so they never shift hue; local contrast is a
//! clip-limited tile equalization; gamma is a 256-entry lookup applied last.

use crate::capture::frame::Frame;
use crate::enhance::params::EnhanceParams;

/// Enhance a frame, leaving the input untouched
///
/// Empty input is returned unchanged. All intermediate planes are owned
/// buffers that drop on every exit path.
pub fn enhance(frame: &Frame, params: &EnhanceParams) -> Frame {
    if frame.is_empty() {
        return frame.clone();
    }

    let w = frame.width as usize;
    let h = frame.height as usize;

    // 1-2. BGR -> YCrCb, split into planes
    let mut y_plane = vec![0u8; w * h];
    let mut cr_plane = vec![0u8; w * h];
    let mut cb_plane = vec![0u8; w * h];
    for row in 0..h {
        let src = frame.row(row);
        let dst = row * w;
        for col in 0..w {
            let px = &src[col * 3..col * 3 + 3];
            let (y, cr, cb) = bgr_to_ycrcb(px[0], px[1], px[2]);
            y_plane[dst + col] = y;
            cr_plane[dst + col] = cr;
            cb_plane[dst + col] = cb;
        }
    }

    // 3. Affine intensity transform on luma only
    let gain = params.contrast_gain;
    let offset = params.brightness_offset as f64;
    for y in y_plane.iter_mut() {
        *y = ((*y as f64).mul_add(gain, offset)).round().clamp(0.0, 255.0) as u8;
    }

    // 4. Clip-limited tile equalization on the adjusted luma
    let (grid_x, grid_y) = params.tile_grid.dims();
    let y_plane = clip_limited_equalize(&y_plane, w, h, params.clip_limit, grid_x, grid_y);

    // 5. Merge with untouched chroma, convert back to BGR
    let mut out = vec![0u8; w * h * 3];
    for (i, px) in out.chunks_exact_mut(3).enumerate() {
        let (b, g, r) = ycrcb_to_bgr(y_plane[i], cr_plane[i], cb_plane[i]);
        px[0] = b;
        px[1] = g;
        px[2] = r;
    }

    // 6. Gamma correction; `gamma <= 0` keeps the pre-gamma result
    if params.gamma > 0.0 {
        let lut = gamma_lut(params.gamma);
        for b in out.iter_mut() {
            *b = lut[*b as usize];
        }
    }

    Frame {
        data: out,
        width: frame.width,
        height: frame.height,
        stride: frame.width * 3,
        sequence: frame.sequence,
        timestamp: frame.timestamp,
    }
}

/// Full-range BT.601, the luma/chroma split of the rig's original pipeline
fn bgr_to_ycrcb(b: u8, g: u8, r: u8) -> (u8, u8, u8) {
    let (bf, gf, rf) = (b as f32, g as f32, r as f32);
    let y = 0.299 * rf + 0.587 * gf + 0.114 * bf;
    let cr = (rf - y) * 0.713 + 128.0;
    let cb = (bf - y) * 0.564 + 128.0;
    (quantize(y), quantize(cr), quantize(cb))
}

fn ycrcb_to_bgr(y: u8, cr: u8, cb: u8) -> (u8, u8, u8) {
    let yf = y as f32;
    let crf = cr as f32 - 128.0;
    let cbf = cb as f32 - 128.0;
    let r = yf + 1.403 * crf;
    let g = yf - 0.714 * crf - 0.344 * cbf;
    let b = yf + 1.773 * cbf;
    (quantize(b), quantize(g), quantize(r))
}

fn quantize(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// 256-entry gamma table: `lut[i] = clamp(round((i/255)^(1/gamma) * 255))`
fn gamma_lut(gamma: f64) -> [u8; 256] {
    let inv = 1.0 / gamma;
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        let v = (i as f64 / 255.0).powf(inv) * 255.0;
        *slot = v.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Clip-limited tile histogram equalization with bilinear tile blending
///
/// The plane is partitioned into a `grid_x` by `grid_y` grid. Each tile gets
/// a 256-bin histogram clipped at `max(1, clip_limit * tile_area / 256)` with
/// the excess redistributed evenly, then a CDF lookup table scaled to 0..255.
/// Per pixel, the four surrounding tile tables are blended by distance to
/// the tile centers, which hides tile seams.
fn clip_limited_equalize(
    src: &[u8],
    w: usize,
    h: usize,
    clip_limit: f64,
    grid_x: usize,
    grid_y: usize,
) -> Vec<u8> {
    let mut luts = vec![[0u8; 256]; grid_x * grid_y];

    for ty in 0..grid_y {
        for tx in 0..grid_x {
            let x0 = tx * w / grid_x;
            let x1 = (tx + 1) * w / grid_x;
            let y0 = ty * h / grid_y;
            let y1 = (ty + 1) * h / grid_y;
            let area = (x1 - x0) * (y1 - y0);
            let lut = &mut luts[ty * grid_x + tx];

            if area == 0 {
                // Degenerate tile on a frame smaller than the grid
                for (i, slot) in lut.iter_mut().enumerate() {
                    *slot = i as u8;
                }
                continue;
            }

            let mut hist = [0u64; 256];
            for row in y0..y1 {
                for &v in &src[row * w + x0..row * w + x1] {
                    hist[v as usize] += 1;
                }
            }

            // Clip and redistribute the excess evenly across all bins
            let clip = ((clip_limit * area as f64 / 256.0).max(1.0)) as u64;
            let mut excess = 0u64;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let bonus = excess / 256;
            let mut residual = (excess % 256) as usize;
            for bin in hist.iter_mut() {
                *bin += bonus;
                if residual > 0 {
                    *bin += 1;
                    residual -= 1;
                }
            }

            let scale = 255.0 / area as f64;
            let mut cdf = 0u64;
            for (i, slot) in lut.iter_mut().enumerate() {
                cdf += hist[i];
                *slot = (cdf as f64 * scale).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    // Bilinear blend of the four surrounding tile mappings
    let tile_w = w as f32 / grid_x as f32;
    let tile_h = h as f32 / grid_y as f32;
    let mut out = vec![0u8; w * h];
    for row in 0..h {
        let fy = (row as f32 + 0.5) / tile_h - 0.5;
        let ty = fy.floor();
        let wy = fy - ty;
        let ty0 = (ty as isize).clamp(0, grid_y as isize - 1) as usize;
        let ty1 = (ty as isize + 1).clamp(0, grid_y as isize - 1) as usize;
        for col in 0..w {
            let fx = (col as f32 + 0.5) / tile_w - 0.5;
            let tx = fx.floor();
            let wx = fx - tx;
            let tx0 = (tx as isize).clamp(0, grid_x as isize - 1) as usize;
            let tx1 = (tx as isize + 1).clamp(0, grid_x as isize - 1) as usize;

            let v = src[row * w + col] as usize;
            let top = (1.0 - wx) * luts[ty0 * grid_x + tx0][v] as f32
                + wx * luts[ty0 * grid_x + tx1][v] as f32;
            let bottom = (1.0 - wx) * luts[ty1 * grid_x + tx0][v] as f32
                + wx * luts[ty1 * grid_x + tx1][v] as f32;
            out[row * w + col] = quantize((1.0 - wy) * top + wy * bottom);
        }
    }
    out
}
