//! Face/eye detector seam.
//!
//! Detection itself is an external collaborator (a cascade classifier or
//! equivalent); the core only needs rectangles back. Callers without a
//! detector can use [`NoopDetector`] — the liveness cascade then relies on
//! motion/depth corroboration instead of the eye confirmation rule.

use serde::Serialize;

use crate::frame::Gray;

/// A detected rectangular region in a grayscale raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Cascade-classifier tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectorParams {
    /// Image pyramid scale step between detection passes.
    pub scale_factor: f32,
    /// Minimum overlapping neighbour windows to accept a detection.
    pub min_neighbors: u32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        // Tuned for frontal faces at webcam distance.
        Self {
            scale_factor: 1.3,
            min_neighbors: 5,
        }
    }
}

/// External face/eye detection collaborator.
pub trait FaceEyeDetector {
    /// Detect frontal faces in a full grayscale raster.
    fn detect_faces(&self, gray: &Gray, params: DetectorParams) -> Vec<Region>;

    /// Detect eyes within a face sub-region of the raster.
    fn detect_eyes(&self, gray: &Gray, face: Region) -> Vec<Region>;
}

/// Detector that never finds anything. Liveness decisions degrade to the
/// motion + depth corroboration rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDetector;

impl FaceEyeDetector for NoopDetector {
    fn detect_faces(&self, _gray: &Gray, _params: DetectorParams) -> Vec<Region> {
        Vec::new()
    }

    fn detect_eyes(&self, _gray: &Gray, _face: Region) -> Vec<Region> {
        Vec::new()
    }
}

/// Run the face pass and the per-face eye pass; true if any detected face
/// contains at least one eye. Zero faces is a neutral outcome, not an error.
pub fn eyes_confirmed<D: FaceEyeDetector + ?Sized>(
    detector: &D,
    gray: &Gray,
    params: DetectorParams,
) -> bool {
    let faces = detector.detect_faces(gray, params);
    if faces.is_empty() {
        tracing::debug!("no face region detected, skipping eye confirmation");
        return false;
    }

    for face in &faces {
        let eyes = detector.detect_eyes(gray, *face);
        if !eyes.is_empty() {
            tracing::debug!(
                face_x = face.x,
                face_y = face.y,
                eyes = eyes.len(),
                "eye detection confirmed inside face region"
            );
            return true;
        }
    }
    false
}
