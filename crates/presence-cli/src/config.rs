use presence_core::{CardThresholds, DetectorParams, LivenessThresholds};

/// CLI configuration: core defaults overridden by `PRESENCE_*` environment
/// variables. Every empirical threshold is tunable without a rebuild.
pub struct Config {
    pub liveness: LivenessThresholds,
    pub card: CardThresholds,
    pub detector: DetectorParams,
}

impl Config {
    pub fn from_env() -> Self {
        let liveness_defaults = LivenessThresholds::default();
        let card_defaults = CardThresholds::default();
        let detector_defaults = DetectorParams::default();

        Self {
            liveness: LivenessThresholds {
                min_sharpness: env_f32("PRESENCE_MIN_SHARPNESS", liveness_defaults.min_sharpness),
                low_light_min_motion: env_f32(
                    "PRESENCE_LOW_LIGHT_MIN_MOTION",
                    liveness_defaults.low_light_min_motion,
                ),
                max_reflection: env_f32(
                    "PRESENCE_MAX_REFLECTION",
                    liveness_defaults.max_reflection,
                ),
                mild_reflection: env_f32(
                    "PRESENCE_MILD_REFLECTION",
                    liveness_defaults.mild_reflection,
                ),
                max_saturation: env_f32(
                    "PRESENCE_MAX_SATURATION",
                    liveness_defaults.max_saturation,
                ),
                min_motion: env_f32("PRESENCE_MIN_MOTION", liveness_defaults.min_motion),
                min_brightness_delta: env_f32(
                    "PRESENCE_MIN_BRIGHTNESS_DELTA",
                    liveness_defaults.min_brightness_delta,
                ),
                min_depth: env_f32("PRESENCE_MIN_DEPTH", liveness_defaults.min_depth),
                corroborating_motion: env_f32(
                    "PRESENCE_CORROBORATING_MOTION",
                    liveness_defaults.corroborating_motion,
                ),
                corroborating_depth: env_f32(
                    "PRESENCE_CORROBORATING_DEPTH",
                    liveness_defaults.corroborating_depth,
                ),
            },
            card: CardThresholds {
                min_sharpness: env_f32(
                    "PRESENCE_CARD_MIN_SHARPNESS",
                    card_defaults.min_sharpness,
                ),
                max_reflection: env_f32(
                    "PRESENCE_CARD_MAX_REFLECTION",
                    card_defaults.max_reflection,
                ),
                max_saturation: env_f32(
                    "PRESENCE_CARD_MAX_SATURATION",
                    card_defaults.max_saturation,
                ),
            },
            detector: DetectorParams {
                scale_factor: env_f32(
                    "PRESENCE_DETECTOR_SCALE_FACTOR",
                    detector_defaults.scale_factor,
                ),
                min_neighbors: env_u32(
                    "PRESENCE_DETECTOR_MIN_NEIGHBORS",
                    detector_defaults.min_neighbors,
                ),
            },
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
