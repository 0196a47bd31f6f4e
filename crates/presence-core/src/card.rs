//! ID-card authenticity engine.
//!
//! Decides whether a presented ID card is a physical object or a reproduction
//! (photo of a card, card on a phone screen). Same fail-closed cascade shape
//! as the face engine, over the still-frame signal subset. The cut-offs
//! deliberately differ from the face engine — card stock and framing differ
//! from live-face capture — and are empirical, not derived.

use serde::Serialize;

use crate::frame::Frame;
use crate::liveness::Verdict;
use crate::signals::{self, CardSignals};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardThresholds {
    /// Laplacian variance below which the card reads as a flat print.
    pub min_sharpness: f32,
    /// Reflection ratio above which glare indicates a screen.
    pub max_reflection: f32,
    /// Mean saturation above which colours look like a mobile screen.
    pub max_saturation: f32,
}

impl Default for CardThresholds {
    fn default() -> Self {
        Self {
            min_sharpness: 15.0,
            max_reflection: 8.0,
            max_saturation: 140.0,
        }
    }
}

struct CardRule {
    reason: &'static str,
    applies: fn(&CardSignals, &CardThresholds) -> bool,
}

fn flat_print(s: &CardSignals, t: &CardThresholds) -> bool {
    s.sharpness < t.min_sharpness
}

fn screen_glare(s: &CardSignals, t: &CardThresholds) -> bool {
    s.reflection_ratio > t.max_reflection
}

fn screen_saturation(s: &CardSignals, t: &CardThresholds) -> bool {
    s.saturation > t.max_saturation
}

// Rejection rules in priority order; surviving all of them means real.
const CARD_RULES: &[CardRule] = &[
    CardRule {
        reason: "flat surface, possible print",
        applies: flat_print,
    },
    CardRule {
        reason: "glare, digital or phone screen",
        applies: screen_glare,
    },
    CardRule {
        reason: "oversaturated, mobile screen",
        applies: screen_saturation,
    },
];

/// Run the authenticity cascade over extracted card signals. First matching
/// rejection wins; a card that survives every filter is real.
pub fn decide_card(signals: &CardSignals, thresholds: &CardThresholds) -> Verdict {
    for rule in CARD_RULES {
        if (rule.applies)(signals, thresholds) {
            return Verdict::reject(rule.reason);
        }
    }
    Verdict::accept("physical card confirmed")
}

/// Still-frame card authenticity pipeline.
#[derive(Debug, Clone, Default)]
pub struct CardEngine {
    thresholds: CardThresholds,
}

impl CardEngine {
    pub fn new(thresholds: CardThresholds) -> Self {
        Self { thresholds }
    }

    /// Decide whether the frame shows a physical ID card. Never returns an
    /// error; extraction failures are logged and fail closed.
    pub fn check_card_authenticity(&self, frame: &Frame) -> Verdict {
        let signals = match signals::extract_single(frame) {
            Ok(signals) => signals,
            Err(err) => {
                tracing::error!(error = %err, "card signal extraction failed, failing closed");
                return Verdict::reject("signal extraction failed");
            }
        };

        let verdict = decide_card(&signals, &self.thresholds);
        tracing::info!(
            accepted = verdict.accepted,
            reason = verdict.reason,
            "card authenticity verdict"
        );
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_signals() -> CardSignals {
        CardSignals {
            sharpness: 120.0,
            saturation: 90.0,
            reflection_ratio: 2.0,
        }
    }

    #[test]
    fn clean_card_is_real() {
        let v = decide_card(&real_signals(), &CardThresholds::default());
        assert!(v.accepted);
        assert_eq!(v.reason, "physical card confirmed");
    }

    #[test]
    fn blurred_card_is_fake() {
        let s = CardSignals {
            sharpness: 10.0,
            ..real_signals()
        };
        let v = decide_card(&s, &CardThresholds::default());
        assert!(!v.accepted);
        assert_eq!(v.reason, "flat surface, possible print");
    }

    #[test]
    fn glare_card_is_fake() {
        let s = CardSignals {
            reflection_ratio: 12.0,
            ..real_signals()
        };
        assert_eq!(
            decide_card(&s, &CardThresholds::default()).reason,
            "glare, digital or phone screen"
        );
    }

    #[test]
    fn oversaturated_card_is_fake() {
        let s = CardSignals {
            saturation: 150.0,
            ..real_signals()
        };
        assert_eq!(
            decide_card(&s, &CardThresholds::default()).reason,
            "oversaturated, mobile screen"
        );
    }

    #[test]
    fn rule_order_flat_surface_fires_first() {
        // All three filters would match; the flat-surface rule has priority.
        let s = CardSignals {
            sharpness: 10.0,
            reflection_ratio: 20.0,
            saturation: 150.0,
        };
        let v = decide_card(&s, &CardThresholds::default());
        assert!(!v.accepted);
        assert_eq!(v.reason, "flat surface, possible print");
    }

    #[test]
    fn saturation_threshold_is_looser_than_face() {
        // 135 rejects a face (>130) but passes a card (<=140)
        let s = CardSignals {
            saturation: 135.0,
            ..real_signals()
        };
        assert!(decide_card(&s, &CardThresholds::default()).accepted);
    }

    #[test]
    fn engine_rejects_flat_uniform_frame() {
        let frame =
            crate::frame::Frame::from_rgb(16, 16, vec![128u8; 16 * 16 * 3]).unwrap();
        let v = CardEngine::default().check_card_authenticity(&frame);
        assert!(!v.accepted);
        assert_eq!(v.reason, "flat surface, possible print");
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let t = CardThresholds {
            max_saturation: 80.0,
            ..CardThresholds::default()
        };
        let s = real_signals();
        assert_eq!(decide_card(&s, &t).reason, "oversaturated, mobile screen");
    }
}
