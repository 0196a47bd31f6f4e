//! Presence decision core: face liveness, ID-card authenticity, and
//! identity matching for an attendance-verification service.
//!
//! Everything here is a stateless, synchronous, request-scoped decision:
//! frames go in, a verdict comes out, and every ambiguous or failing path
//! resolves to rejection. Persistence, transport, and the external
//! embedding/OCR engines are collaborators of this crate, not part of it.

pub mod card;
pub mod detect;
pub mod enhance;
pub mod frame;
pub mod liveness;
pub mod matcher;
pub mod signals;
pub mod textmatch;

pub use card::{decide_card, CardEngine, CardThresholds};
pub use detect::{DetectorParams, FaceEyeDetector, NoopDetector, Region};
pub use enhance::enhance;
pub use frame::{Frame, FrameError, Gray};
pub use liveness::{decide, LivenessEngine, LivenessThresholds, Verdict};
pub use matcher::{cosine_similarity, CosineMatcher, Embedding, EnrolledFace, MatchResult, Matcher};
pub use signals::{extract, extract_single, CardSignals, SignalError, SignalVector};
pub use textmatch::{
    match_by_text, normalize_text, CardIdentity, MatchRule, TextMatch, TextMatchConfig,
};
