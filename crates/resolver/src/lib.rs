//! Resolves the "current subtitle line" from a noisy, mutating surface.
//!
//! A debounced change notification triggers one scan pass over a ranked
//! fallback chain: weighted structural scan, media-track cues,
//! accessibility live regions, and finally cooldown-gated optical
//! recognition of a captured frame. Emission is deduplicated against the
//! last resolved line.

mod optical;
mod resolver;
mod scanner;
mod score;
mod selectors;
#[cfg(test)]
mod testutil;

pub use optical::{
    OpticalEngine, OpticalError, OpticalGate, Recognition, FORCED_COOLDOWN,
    OPTICAL_CONFIDENCE_THRESHOLD, RELAXED_COOLDOWN,
};
pub use resolver::{
    ObservationCallback, ResolverHandle, SubtitleResolver, DEBOUNCE_WINDOW, OPTICAL_MISS_THRESHOLD,
};
pub use scanner::{CandidateScanner, ScoredCandidate, StructuralScan};
pub use score::{score_candidate, CandidateScore, MIN_EMIT_SCORE};
pub use selectors::{host_prefers_optical, SelectorRegistry, SelectorSpec};
