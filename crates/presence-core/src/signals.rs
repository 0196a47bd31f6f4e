//! Scalar spoof-detection signals computed from camera frames.
//!
//! Each signal is a cheap proxy for one physical property of the presented
//! subject: motion and brightness delta catch still reproductions, Laplacian
//! variance catches flat/blurred surfaces, HSV saturation catches digital
//! colour profiles, the near-white pixel ratio catches specular screen glare,
//! and Sobel gradient magnitude catches the missing 3-D relief of a flat
//! photo.

use serde::Serialize;
use thiserror::Error;

use crate::frame::{Frame, Gray};

/// Near-white cutoff for the face glare signal.
pub const FACE_GLARE_CUTOFF: f32 = 230.0;
/// Near-white cutoff for the ID-card glare signal. Card stock is matte and
/// framed closer, so the cutoff sits higher than for faces.
pub const CARD_GLARE_CUTOFF: f32 = 240.0;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("frame dimensions differ: {0}x{1} vs {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),
}

/// The six liveness signals for a frame pair. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalVector {
    /// Mean absolute grayscale difference between the two frames.
    pub motion_score: f32,
    /// Absolute difference of the mean grayscale intensities.
    pub brightness_delta: f32,
    /// Variance of the 3×3 Laplacian over the first frame.
    pub sharpness: f32,
    /// Mean HSV saturation of the first frame.
    pub saturation: f32,
    /// Percentage of near-white pixels in the first frame.
    pub reflection_ratio: f32,
    /// Mean Sobel gradient magnitude √(Gx²+Gy²) over the first frame.
    pub depth_variation: f32,
}

/// The still-frame subset of signals used for ID-card authenticity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardSignals {
    pub sharpness: f32,
    pub saturation: f32,
    pub reflection_ratio: f32,
}

/// Compute the full signal vector for a face frame pair.
///
/// The first frame is the reference for all single-frame signals; the second
/// only contributes to motion and brightness delta.
pub fn extract(frame0: &Frame, frame1: &Frame) -> Result<SignalVector, SignalError> {
    if frame0.width() != frame1.width() || frame0.height() != frame1.height() {
        return Err(SignalError::DimensionMismatch(
            frame0.width(),
            frame0.height(),
            frame1.width(),
            frame1.height(),
        ));
    }

    let gray0 = frame0.to_gray();
    let gray1 = frame1.to_gray();

    let signals = SignalVector {
        motion_score: mean_abs_diff(&gray0, &gray1),
        brightness_delta: (gray0.mean() - gray1.mean()).abs(),
        sharpness: laplacian_variance(&gray0),
        saturation: saturation_mean(frame0),
        reflection_ratio: bright_ratio(&gray0, FACE_GLARE_CUTOFF),
        depth_variation: sobel_mean_magnitude(&gray0),
    };

    tracing::debug!(
        motion = signals.motion_score,
        brightness_delta = signals.brightness_delta,
        sharpness = signals.sharpness,
        saturation = signals.saturation,
        reflection = signals.reflection_ratio,
        depth = signals.depth_variation,
        "liveness signals"
    );

    Ok(signals)
}

/// Compute the still-frame signals for an ID card.
pub fn extract_single(frame: &Frame) -> Result<CardSignals, SignalError> {
    let gray = frame.to_gray();

    let signals = CardSignals {
        sharpness: laplacian_variance(&gray),
        saturation: saturation_mean(frame),
        reflection_ratio: bright_ratio(&gray, CARD_GLARE_CUTOFF),
    };

    tracing::debug!(
        sharpness = signals.sharpness,
        saturation = signals.saturation,
        reflection = signals.reflection_ratio,
        "card signals"
    );

    Ok(signals)
}

fn mean_abs_diff(a: &Gray, b: &Gray) -> f32 {
    debug_assert_eq!(a.data.len(), b.data.len());
    if a.data.is_empty() {
        return 0.0;
    }
    let sum: f32 = a
        .data
        .iter()
        .zip(b.data.iter())
        .map(|(x, y)| (x - y).abs())
        .sum();
    sum / a.data.len() as f32
}

/// Variance of the 3×3 Laplacian response over interior pixels. Flat or
/// defocused surfaces score near zero. Frames too small for a 3×3 stencil
/// score exactly zero.
fn laplacian_variance(gray: &Gray) -> f32 {
    let (w, h) = (gray.width, gray.height);
    if w < 3 || h < 3 {
        return 0.0;
    }

    let count = ((w - 2) * (h - 2)) as f32;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let lap = (gray.at(x, y - 1) + gray.at(x, y + 1) + gray.at(x - 1, y)
                + gray.at(x + 1, y)
                - 4.0 * gray.at(x, y)) as f64;
            sum += lap;
            sum_sq += lap * lap;
        }
    }
    let mean = sum / count as f64;
    (sum_sq / count as f64 - mean * mean).max(0.0) as f32
}

/// Mean Sobel gradient magnitude over interior pixels.
fn sobel_mean_magnitude(gray: &Gray) -> f32 {
    let (w, h) = (gray.width, gray.height);
    if w < 3 || h < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = (gray.at(x + 1, y - 1) + 2.0 * gray.at(x + 1, y) + gray.at(x + 1, y + 1))
                - (gray.at(x - 1, y - 1) + 2.0 * gray.at(x - 1, y) + gray.at(x - 1, y + 1));
            let gy = (gray.at(x - 1, y + 1) + 2.0 * gray.at(x, y + 1) + gray.at(x + 1, y + 1))
                - (gray.at(x - 1, y - 1) + 2.0 * gray.at(x, y - 1) + gray.at(x + 1, y - 1));
            sum += ((gx * gx + gy * gy) as f64).sqrt();
        }
    }
    (sum / ((w - 2) * (h - 2)) as f64) as f32
}

/// Mean saturation using the OpenCV HSV convention:
/// S = 255·(max−min)/max, 0 for black pixels.
fn saturation_mean(frame: &Frame) -> f32 {
    let mut sum = 0.0f64;
    let n = frame.width() * frame.height();
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            let (r, g, b) = frame.rgb_at(x, y);
            let max = r.max(g).max(b) as f32;
            let min = r.min(g).min(b) as f32;
            let s = if max > 0.0 { 255.0 * (max - min) / max } else { 0.0 };
            sum += s as f64;
        }
    }
    (sum / n as f64) as f32
}

/// Percentage of pixels brighter than `cutoff`.
fn bright_ratio(gray: &Gray, cutoff: f32) -> f32 {
    if gray.data.is_empty() {
        return 0.0;
    }
    let bright = gray.data.iter().filter(|&&v| v > cutoff).count();
    bright as f32 / gray.data.len() as f32 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn gray_frame(width: usize, height: usize, values: &[u8]) -> Frame {
        assert_eq!(values.len(), width * height);
        let mut data = Vec::with_capacity(values.len() * 3);
        for &v in values {
            data.extend_from_slice(&[v, v, v]);
        }
        Frame::from_rgb(width, height, data).unwrap()
    }

    fn uniform_frame(width: usize, height: usize, v: u8) -> Frame {
        gray_frame(width, height, &vec![v; width * height])
    }

    /// Rotate a frame 90° clockwise.
    fn rotate90(frame: &Frame) -> Frame {
        let (w, h) = (frame.width(), frame.height());
        let mut data = vec![0u8; w * h * 3];
        for y in 0..h {
            for x in 0..w {
                let (r, g, b) = frame.rgb_at(x, y);
                // (x, y) -> (h - 1 - y, x) in the rotated (h × w) raster
                let i = (x * h + (h - 1 - y)) * 3;
                data[i] = r;
                data[i + 1] = g;
                data[i + 2] = b;
            }
        }
        Frame::from_rgb(h, w, data).unwrap()
    }

    #[test]
    fn identical_frames_have_zero_motion() {
        let frame = uniform_frame(16, 16, 90);
        let s = extract(&frame, &frame).unwrap();
        assert_eq!(s.motion_score, 0.0);
        assert_eq!(s.brightness_delta, 0.0);
    }

    #[test]
    fn motion_reflects_mean_pixel_difference() {
        let a = uniform_frame(8, 8, 100);
        let b = uniform_frame(8, 8, 110);
        let s = extract(&a, &b).unwrap();
        assert!((s.motion_score - 10.0).abs() < 0.1);
        assert!((s.brightness_delta - 10.0).abs() < 0.1);
    }

    #[test]
    fn mismatched_dimensions_are_an_error() {
        let a = uniform_frame(8, 8, 100);
        let b = uniform_frame(8, 4, 100);
        let err = extract(&a, &b).unwrap_err();
        assert!(matches!(err, SignalError::DimensionMismatch(8, 8, 8, 4)));
    }

    #[test]
    fn flat_frame_has_zero_sharpness_and_depth() {
        let s = extract_single(&uniform_frame(16, 16, 128)).unwrap();
        assert_eq!(s.sharpness, 0.0);
        let pair = extract(&uniform_frame(16, 16, 128), &uniform_frame(16, 16, 128)).unwrap();
        assert_eq!(pair.depth_variation, 0.0);
    }

    #[test]
    fn step_edge_is_sharp_with_depth() {
        // Hard vertical edge down the middle of the frame
        let values: Vec<u8> = (0..16 * 16)
            .map(|i| if (i % 16) < 8 { 0 } else { 255 })
            .collect();
        let frame = gray_frame(16, 16, &values);
        let s = extract(&frame, &frame).unwrap();
        assert!(s.sharpness > 1000.0);
        assert!(s.depth_variation > 50.0);
    }

    #[test]
    fn saturation_of_gray_is_zero_and_of_red_is_full() {
        let gray = uniform_frame(4, 4, 77);
        assert_eq!(extract_single(&gray).unwrap().saturation, 0.0);

        let red = Frame::from_rgb(4, 4, [255u8, 0, 0].repeat(16)).unwrap();
        assert!((extract_single(&red).unwrap().saturation - 255.0).abs() < 0.1);
    }

    #[test]
    fn reflection_counts_near_white_pixels() {
        // Half the pixels above the face cutoff
        let mut values = vec![100u8; 32];
        for v in values.iter_mut().take(16) {
            *v = 250;
        }
        let frame = gray_frame(8, 4, &values);
        let s = extract(&frame, &frame).unwrap();
        assert!((s.reflection_ratio - 50.0).abs() < 0.1);

        // 250 > 240 too, so the card cutoff agrees here
        let card = extract_single(&frame).unwrap();
        assert!((card.reflection_ratio - 50.0).abs() < 0.1);
    }

    #[test]
    fn card_cutoff_is_stricter_than_face_cutoff() {
        // 235 is glare for a face (>230) but not for a card (<=240)
        let frame = uniform_frame(8, 8, 235);
        let s = extract(&frame, &frame).unwrap();
        assert!((s.reflection_ratio - 100.0).abs() < 0.1);
        let card = extract_single(&frame).unwrap();
        assert_eq!(card.reflection_ratio, 0.0);
    }

    #[test]
    fn reflection_and_saturation_invariant_under_rotation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut data = Vec::with_capacity(24 * 16 * 3);
        for _ in 0..24 * 16 {
            data.push(rng.gen::<u8>());
            data.push(rng.gen::<u8>());
            data.push(rng.gen::<u8>());
        }
        let frame = Frame::from_rgb(24, 16, data).unwrap();
        let rotated = rotate90(&frame);

        let s = extract_single(&frame).unwrap();
        let r = extract_single(&rotated).unwrap();
        assert!((s.saturation - r.saturation).abs() < 1e-3);
        assert!((s.reflection_ratio - r.reflection_ratio).abs() < 1e-3);
    }

    #[test]
    fn noise_monotonically_increases_sharpness() {
        // Increasing noise injected into a flat image strictly increases the
        // Laplacian variance, up to saturation.
        let mut rng = StdRng::seed_from_u64(42);
        let noise: Vec<f32> = (0..32 * 32).map(|_| rng.gen_range(-1.0f32..1.0)).collect();

        let mut previous = 0.0f32;
        for amplitude in [0u8, 5, 15, 30, 60] {
            let values: Vec<u8> = noise
                .iter()
                .map(|n| (128.0 + n * amplitude as f32).round().clamp(0.0, 255.0) as u8)
                .collect();
            let frame = gray_frame(32, 32, &values);
            let sharpness = extract_single(&frame).unwrap().sharpness;
            assert!(
                sharpness >= previous,
                "sharpness dropped at amplitude {amplitude}: {previous} -> {sharpness}"
            );
            previous = sharpness;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn tiny_frames_do_not_panic() {
        let frame = uniform_frame(1, 1, 50);
        let s = extract(&frame, &frame).unwrap();
        assert_eq!(s.sharpness, 0.0);
        assert_eq!(s.depth_variation, 0.0);
    }
}
