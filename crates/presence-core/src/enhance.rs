//! Brightness/contrast normalization for low-light capture.
//!
//! Frames are converted to YCbCr, the luma plane is run through
//! contrast-limited adaptive histogram equalization (8×8 tile grid, clip
//! limit 3.0), the chroma planes are carried over unchanged, and the
//! recombined image gets a γ=1.6 correction to lift shadow detail.
//!
//! `enhance` is total: it never fails on a valid [`Frame`]. If any internal
//! step cannot produce a result the input is returned unchanged and a
//! warning is logged.

use crate::frame::Frame;

const TILE_GRID: usize = 8;
const CLIP_LIMIT: f32 = 3.0;
const GAMMA: f32 = 1.6;

/// Minimum tile edge length. Tiles smaller than this push the scaled clip
/// limit down to its floor of one count per bin, which turns the tile LUT
/// into a full-range rank map that re-stretches residual noise on every
/// application instead of converging.
const MIN_TILE_DIM: usize = 16;

/// Auto brightness/contrast correction. Returns a new frame; the input is
/// never mutated.
pub fn enhance(frame: &Frame) -> Frame {
    match try_enhance(frame) {
        Some(out) => out,
        None => {
            tracing::warn!(
                width = frame.width(),
                height = frame.height(),
                "enhancement failed, passing frame through unchanged"
            );
            frame.clone()
        }
    }
}

fn try_enhance(frame: &Frame) -> Option<Frame> {
    let (width, height) = (frame.width(), frame.height());
    let n = width * height;

    let mut luma = vec![0u8; n];
    let mut cb = vec![0f32; n];
    let mut cr = vec![0f32; n];
    for (i, px) in frame.data().chunks_exact(3).enumerate() {
        let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
        let y = 0.299 * r + 0.587 * g + 0.114 * b;
        luma[i] = y.round().clamp(0.0, 255.0) as u8;
        cb[i] = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
        cr[i] = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    }

    let equalized = clahe(&luma, width, height)?;
    let gamma = gamma_lut(GAMMA);

    let mut out = Vec::with_capacity(n * 3);
    for i in 0..n {
        let y = equalized[i];
        let (dcb, dcr) = (cb[i] - 128.0, cr[i] - 128.0);
        let r = clamp_u8(y + 1.402 * dcr);
        let g = clamp_u8(y - 0.344_136 * dcb - 0.714_136 * dcr);
        let b = clamp_u8(y + 1.772 * dcb);
        out.push(gamma[r as usize]);
        out.push(gamma[g as usize]);
        out.push(gamma[b as usize]);
    }

    Frame::from_rgb(width, height, out).ok()
}

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// γ-correction lookup table: p → 255·(p/255)^(1/γ).
fn gamma_lut(gamma: f32) -> [u8; 256] {
    let inv = 1.0 / gamma;
    let mut table = [0u8; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = (255.0 * (i as f32 / 255.0).powf(inv)).round().clamp(0.0, 255.0) as u8;
    }
    table
}

/// Contrast-limited adaptive histogram equalization over the luma plane.
///
/// The plane is partitioned into an (up to) 8×8 grid of tiles; each tile gets
/// a clipped-histogram equalization LUT, and per-pixel output is bilinearly
/// interpolated between the LUTs of the four nearest tile centres.
fn clahe(luma: &[u8], width: usize, height: usize) -> Option<Vec<f32>> {
    if width == 0 || height == 0 || luma.len() != width * height {
        return None;
    }
    // Merge tiles on small planes so every tile keeps at least
    // MIN_TILE_DIM² pixels and the clip limit stays meaningful.
    let grid_x = (width / MIN_TILE_DIM).clamp(1, TILE_GRID);
    let grid_y = (height / MIN_TILE_DIM).clamp(1, TILE_GRID);

    // Tile boundaries partition the plane exactly; every tile is non-empty
    // because the grid never exceeds the dimension.
    let xb: Vec<usize> = (0..=grid_x).map(|t| t * width / grid_x).collect();
    let yb: Vec<usize> = (0..=grid_y).map(|t| t * height / grid_y).collect();

    let mut luts = vec![[0f32; 256]; grid_x * grid_y];
    for ty in 0..grid_y {
        for tx in 0..grid_x {
            let (x0, x1, y0, y1) = (xb[tx], xb[tx + 1], yb[ty], yb[ty + 1]);
            let area = (x1 - x0) * (y1 - y0);
            if area == 0 {
                return None;
            }

            let mut hist = [0u32; 256];
            for row in y0..y1 {
                for col in x0..x1 {
                    hist[luma[row * width + col] as usize] += 1;
                }
            }

            // Clip and redistribute the excess evenly across all bins; the
            // integer remainder is spread at a fixed stride so no mass is
            // lost even for tiny tiles.
            let limit = ((CLIP_LIMIT * area as f32 / 256.0) as u32).max(1);
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > limit {
                    excess += *bin - limit;
                    *bin = limit;
                }
            }
            let bonus = excess / 256;
            for bin in hist.iter_mut() {
                *bin += bonus;
            }
            let mut residual = (excess % 256) as usize;
            if residual > 0 {
                let step = (256 / residual).max(1);
                let mut i = 0;
                while residual > 0 && i < 256 {
                    hist[i] += 1;
                    residual -= 1;
                    i += step;
                }
            }

            let scale = 255.0 / area as f32;
            let lut = &mut luts[ty * grid_x + tx];
            let mut cum = 0u32;
            for (i, &count) in hist.iter().enumerate() {
                cum += count;
                lut[i] = (cum as f32 * scale).min(255.0);
            }
        }
    }

    let centers_x: Vec<f32> = (0..grid_x).map(|t| (xb[t] + xb[t + 1]) as f32 / 2.0).collect();
    let centers_y: Vec<f32> = (0..grid_y).map(|t| (yb[t] + yb[t + 1]) as f32 / 2.0).collect();
    let x_coords = interp_coords(width, &centers_x);
    let y_coords = interp_coords(height, &centers_y);

    let mut out = vec![0f32; width * height];
    for row in 0..height {
        let (jy, fy) = y_coords[row];
        let jy2 = (jy + 1).min(grid_y - 1);
        for col in 0..width {
            let (jx, fx) = x_coords[col];
            let jx2 = (jx + 1).min(grid_x - 1);
            let v = luma[row * width + col] as usize;

            let top = luts[jy * grid_x + jx][v] * (1.0 - fx) + luts[jy * grid_x + jx2][v] * fx;
            let bottom = luts[jy2 * grid_x + jx][v] * (1.0 - fx) + luts[jy2 * grid_x + jx2][v] * fx;
            out[row * width + col] = top * (1.0 - fy) + bottom * fy;
        }
    }

    Some(out)
}

/// For each pixel coordinate, the index of the tile-centre segment it falls
/// in and the interpolation fraction within that segment. Coordinates before
/// the first centre or past the last clamp to the edge LUT.
fn interp_coords(dim: usize, centers: &[f32]) -> Vec<(usize, f32)> {
    let n = centers.len();
    (0..dim)
        .map(|p| {
            let pf = p as f32;
            if n == 1 || pf <= centers[0] {
                return (0, 0.0);
            }
            if pf >= centers[n - 1] {
                return (n - 1, 0.0);
            }
            let mut i = 0;
            while i + 2 < n && pf >= centers[i + 1] {
                i += 1;
            }
            let frac = (pf - centers[i]) / (centers[i + 1] - centers[i]);
            (i, frac)
        })
        .collect()
}
