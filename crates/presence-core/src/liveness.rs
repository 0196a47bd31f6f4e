//! Face liveness decision engine.
//!
//! A fail-closed cascade over the six spoof signals: each rule targets one
//! spoof vector (flat print, screen glare, digital colour profile, still
//! image, 2-D surface) before the two positive-corroboration rules. The rules
//! are evaluated strictly in order and the first match wins; unless a rule
//! explicitly proves liveness the verdict is spoof. The ordering is
//! load-bearing — later rules can override the low-light waiver in rule 1 —
//! so the cascade is kept as an explicit ordered table, not independent
//! votes.

use serde::Serialize;

use crate::detect::{eyes_confirmed, DetectorParams, FaceEyeDetector, NoopDetector};
use crate::enhance::enhance;
use crate::frame::Frame;
use crate::signals::{self, SignalVector};

/// Terminal output of a decision engine: accepted (live/real) or rejected
/// (spoof/fake), with a reason string for the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub accepted: bool,
    pub reason: &'static str,
}

impl Verdict {
    pub(crate) fn accept(reason: &'static str) -> Self {
        Self {
            accepted: true,
            reason,
        }
    }

    pub(crate) fn reject(reason: &'static str) -> Self {
        Self {
            accepted: false,
            reason,
        }
    }
}

/// Empirically tuned cut-offs for the liveness cascade. Defaults carry the
/// production values; every field is overridable by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LivenessThresholds {
    /// Laplacian variance below which a surface counts as flat/blurred.
    pub min_sharpness: f32,
    /// Motion required to waive the low-texture rejection (natural low light
    /// is tolerated when the subject still moves).
    pub low_light_min_motion: f32,
    /// Reflection ratio above which glare rejects outright.
    pub max_reflection: f32,
    /// Reflection ratio above which glare is logged but tolerated.
    pub mild_reflection: f32,
    /// Mean saturation above which colours look like a screen.
    pub max_saturation: f32,
    /// Minimum motion for the still-image rule.
    pub min_motion: f32,
    /// Minimum brightness delta for the still-image rule.
    pub min_brightness_delta: f32,
    /// Minimum depth variation; below this the surface is flat.
    pub min_depth: f32,
    /// Motion needed for positive corroboration without eye detection.
    pub corroborating_motion: f32,
    /// Depth needed for positive corroboration without eye detection.
    pub corroborating_depth: f32,
}

impl Default for LivenessThresholds {
    fn default() -> Self {
        Self {
            min_sharpness: 15.0,
            low_light_min_motion: 0.5,
            max_reflection: 8.0,
            mild_reflection: 4.0,
            max_saturation: 130.0,
            min_motion: 0.3,
            min_brightness_delta: 0.3,
            min_depth: 5.0,
            corroborating_motion: 2.0,
            corroborating_depth: 8.0,
        }
    }
}

/// One row of the decision table: if `applies` holds, the cascade stops with
/// this verdict.
struct Rule {
    accepted: bool,
    reason: &'static str,
    applies: fn(&SignalVector, bool, &LivenessThresholds) -> bool,
}

fn low_texture_low_motion(s: &SignalVector, _eyes: bool, t: &LivenessThresholds) -> bool {
    s.sharpness < t.min_sharpness && s.motion_score < t.low_light_min_motion
}

fn excessive_glare(s: &SignalVector, _eyes: bool, t: &LivenessThresholds) -> bool {
    s.reflection_ratio > t.max_reflection
}

fn oversaturated(s: &SignalVector, _eyes: bool, t: &LivenessThresholds) -> bool {
    s.saturation > t.max_saturation
}

fn insufficient_movement(s: &SignalVector, _eyes: bool, t: &LivenessThresholds) -> bool {
    s.motion_score < t.min_motion && s.brightness_delta < t.min_brightness_delta
}

fn flat_surface(s: &SignalVector, _eyes: bool, t: &LivenessThresholds) -> bool {
    s.depth_variation < t.min_depth
}

fn eyes_detected(_s: &SignalVector, eyes: bool, _t: &LivenessThresholds) -> bool {
    eyes
}

fn motion_and_depth(s: &SignalVector, _eyes: bool, t: &LivenessThresholds) -> bool {
    s.motion_score > t.corroborating_motion && s.depth_variation > t.corroborating_depth
}

const RULES: &[Rule] = &[
    Rule {
        accepted: false,
        reason: "low texture, low motion",
        applies: low_texture_low_motion,
    },
    Rule {
        accepted: false,
        reason: "excessive glare",
        applies: excessive_glare,
    },
    Rule {
        accepted: false,
        reason: "oversaturated, likely screen",
        applies: oversaturated,
    },
    Rule {
        accepted: false,
        reason: "insufficient movement",
        applies: insufficient_movement,
    },
    Rule {
        accepted: false,
        reason: "flat surface, no 3-D relief",
        applies: flat_surface,
    },
    Rule {
        accepted: true,
        reason: "eyes confirmed",
        applies: eyes_detected,
    },
    Rule {
        accepted: true,
        reason: "motion + depth corroboration",
        applies: motion_and_depth,
    },
];

/// Whether the audit log should note tolerated mild glare: reflection sits
/// in the tolerated band and the low-texture rule has not already rejected
/// the frame pair, so the reflection check is actually reached.
fn mild_glare_tolerated(s: &SignalVector, t: &LivenessThresholds) -> bool {
    !low_texture_low_motion(s, false, t)
        && s.reflection_ratio > t.mild_reflection
        && s.reflection_ratio <= t.max_reflection
}

/// Run the liveness cascade over an already-extracted signal vector.
/// Stateless; first matching rule wins, default is spoof.
pub fn decide(
    signals: &SignalVector,
    eyes_detected: bool,
    thresholds: &LivenessThresholds,
) -> Verdict {
    for rule in RULES {
        if (rule.applies)(signals, eyes_detected, thresholds) {
            return Verdict {
                accepted: rule.accepted,
                reason: rule.reason,
            };
        }
    }
    Verdict::reject("no corroborating signal")
}

/// The full face-pair liveness pipeline: enhance both frames, extract the
/// signal vector, run the eye pass, then the decision cascade.
pub struct LivenessEngine<D = NoopDetector> {
    thresholds: LivenessThresholds,
    detector_params: DetectorParams,
    detector: D,
}

impl Default for LivenessEngine<NoopDetector> {
    fn default() -> Self {
        Self::new(
            LivenessThresholds::default(),
            DetectorParams::default(),
            NoopDetector,
        )
    }
}

impl<D: FaceEyeDetector> LivenessEngine<D> {
    pub fn new(
        thresholds: LivenessThresholds,
        detector_params: DetectorParams,
        detector: D,
    ) -> Self {
        Self {
            thresholds,
            detector_params,
            detector,
        }
    }

    pub fn thresholds(&self) -> &LivenessThresholds {
        &self.thresholds
    }

    /// Decide whether the frame pair shows a live subject.
    ///
    /// Never returns an error: signal extraction failures (such as mismatched
    /// frame dimensions) are logged and converted to a spoof verdict. A
    /// rejection here is definitive for this frame pair — the caller retries
    /// with a fresh capture, not by re-running the decision.
    pub fn check_liveness(&self, frame0: &Frame, frame1: &Frame) -> Verdict {
        let enhanced0 = enhance(frame0);
        let enhanced1 = enhance(frame1);

        let signals = match signals::extract(&enhanced0, &enhanced1) {
            Ok(signals) => signals,
            Err(err) => {
                tracing::error!(error = %err, "signal extraction failed, failing closed");
                return Verdict::reject("signal extraction failed");
            }
        };

        if mild_glare_tolerated(&signals, &self.thresholds) {
            tracing::warn!(
                reflection = signals.reflection_ratio,
                "mild glare tolerated as natural reflection"
            );
        }

        let eyes = eyes_confirmed(&self.detector, &enhanced0.to_gray(), self.detector_params);
        let verdict = decide(&signals, eyes, &self.thresholds);

        tracing::info!(
            accepted = verdict.accepted,
            reason = verdict.reason,
            eyes,
            "liveness verdict"
        );
        verdict
    }
}
