//! Shared event contracts between the observing side, the orchestration
//! side, and the external rendering collaborator.
//!
//! Using shared DTOs prevents runtime deserialization errors from
//! mismatched field names. Also provides the [`EventBus`] trait for
//! decoupled notification emission.

mod bus;

pub use bus::{emit_event, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus};

use serde::{Deserialize, Serialize};
use sublens_explain::{DeepExplanation, DeepPatch, ExplainMode, QuickExplanation};
use sublens_surface::Rect;
use uuid::Uuid;

/// One resolved "current subtitle line".
///
/// Producers: subtitle resolver
/// Consumers: orchestrator, frontend overlay
///
/// Ephemeral: superseded whenever a new distinct `text` is emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleObservation {
    pub text: String,
    /// Neighboring on-screen lines, when the scan saw any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surrounding_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_rect: Option<Rect>,
}

/// Quick gloss is ready (from cache or the network).
///
/// Producers: orchestrator
/// Consumers: frontend overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickExplainReadyEvent {
    pub payload: QuickExplanation,
    #[serde(default)]
    pub cached: bool,
}

/// Partial deep payload accumulated so far for a still-streaming request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepExplainProgressEvent {
    pub request_id: Uuid,
    pub partial: DeepPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepExplainReadyEvent {
    pub payload: DeepExplanation,
    #[serde(default)]
    pub cached: bool,
}

/// Terminal failure for one request id. Carries a short human-readable
/// reason; retry is the consumer's decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFailedEvent {
    pub request_id: Uuid,
    pub mode: ExplainMode,
    pub reason: String,
}

/// Event names as constants to prevent topic typos.
pub mod event_names {
    /// Resolved subtitle line changed.
    pub const SUBTITLE_OBSERVED: &str = "subtitle:observed";
    /// Quick gloss ready.
    pub const QUICK_EXPLAIN_READY: &str = "explain:quick_ready";
    /// Deep stream progress.
    pub const DEEP_EXPLAIN_PROGRESS: &str = "explain:deep_progress";
    /// Deep explanation complete.
    pub const DEEP_EXPLAIN_READY: &str = "explain:deep_ready";
    /// Request failed terminally.
    pub const REQUEST_FAILED: &str = "explain:request_failed";
}
