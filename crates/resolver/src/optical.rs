//! Cooldown-gated optical recognition fallback.
//!
//! The recognition engine is an opaque capability: frame in, text and
//! confidence out. The gate bounds its cost with a cooldown flag; an
//! invocation requested during cooldown is dropped, not queued.

use std::time::{Duration, Instant};
use sublens_surface::{FrameImage, SurfaceProvider};

/// Recognition results below this confidence are discarded.
pub const OPTICAL_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Cooldown after a forced invocation (persistent structural misses).
pub const FORCED_COOLDOWN: Duration = Duration::from_secs(4);

/// Cooldown after an opportunistic invocation.
pub const RELAXED_COOLDOWN: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum OpticalError {
    #[error("recognition failed: {0}")]
    RecognitionFailed(String),
    #[error("recognition engine unavailable")]
    Unavailable,
}

/// Recognized text with the engine's confidence in it.
#[derive(Debug, Clone)]
pub struct Recognition {
    pub text: String,
    pub confidence: f32,
}

/// Opaque recognition capability: given an image region, return
/// recognized text and a confidence score.
pub trait OpticalEngine: Send + Sync {
    fn recognize(&self, frame: &FrameImage) -> Result<Recognition, OpticalError>;
}

/// Cooldown gate around the recognition engine.
pub struct OpticalGate {
    cooling_until: Option<Instant>,
}

impl OpticalGate {
    pub fn new() -> Self {
        Self {
            cooling_until: None,
        }
    }

    /// Whether an invocation right now would be dropped.
    pub fn is_cooling(&self) -> bool {
        matches!(self.cooling_until, Some(until) if Instant::now() < until)
    }

    /// Capture a frame and run recognition, if the gate is open.
    ///
    /// Every failure mode is a tier miss: cooldown active, capture failed,
    /// engine errored, or confidence below threshold. `forced` marks an
    /// invocation driven by persistent misses and shortens the cooldown.
    pub fn try_recognize(
        &mut self,
        provider: &dyn SurfaceProvider,
        engine: &dyn OpticalEngine,
        forced: bool,
    ) -> Option<String> {
        if self.is_cooling() {
            tracing::debug!("optical fallback in cooldown, dropping invocation");
            return None;
        }

        let cooldown = if forced { FORCED_COOLDOWN } else { RELAXED_COOLDOWN };
        self.cooling_until = Some(Instant::now() + cooldown);

        let frame = match provider.capture_frame() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::debug!(error = %err, "frame capture failed");
                return None;
            }
        };

        match engine.recognize(&frame) {
            Ok(recognition) => {
                let text = recognition.text.trim();
                if recognition.confidence < OPTICAL_CONFIDENCE_THRESHOLD || text.is_empty() {
                    tracing::debug!(
                        confidence = recognition.confidence,
                        "optical result below confidence threshold"
                    );
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "optical recognition failed");
                None
            }
        }
    }
}

impl Default for OpticalGate {
    fn default() -> Self {
        Self::new()
    }
}
