//! Domain types for subtitle explanation.
//!
//! Request/response payloads, saved profiles, cache policy, and the
//! repository traits the persistence layer implements. Pure data, no I/O.

mod history;
mod key;
mod payload;
mod policy;
mod profile;
mod repository;
mod request;

pub use history::{HistoryEntry, HISTORY_LIMIT};
pub use key::cache_key;
pub use payload::{
    Confidence, ConfidenceLevel, CrossCultureInsight, DeepBackground, DeepExplanation, DeepPatch,
    QuickExplanation, SourceReference,
};
pub use policy::{
    CachePolicy, Credentials, DEFAULT_MAX_ENTRIES, DEFAULT_QUICK_TTL_MINUTES, MAX_CACHE_ENTRIES,
    MIN_CACHE_ENTRIES, QUICK_TTL_MAX_MINUTES, QUICK_TTL_MIN_MINUTES,
};
pub use profile::{ProfileDemographics, ProfileTemplate, MAX_PROFILES};
pub use repository::{
    ExplanationCache, HistoryRepository, ProfileRepository, SettingsRepository,
};
pub use request::{ExplainMode, ExplainRequest, LanguagePair};

/// Current time as epoch milliseconds, the timestamp unit used on every
/// boundary payload.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
