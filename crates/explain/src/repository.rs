//! Repository traits implemented by the persistence layer.
//! Keeping them here lets the orchestrator stay decoupled from SQLite.

use crate::history::HistoryEntry;
use crate::payload::{DeepExplanation, QuickExplanation};
use crate::policy::{CachePolicy, Credentials};
use crate::profile::ProfileTemplate;

/// Two-tier explanation cache: quick and deep payloads share one record
/// per key so a single eviction pass bounds total storage.
pub trait ExplanationCache: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a quick payload; `None` if absent or its `expires_at` has
    /// passed (expiry is checked lazily here, not swept in the background).
    fn read_quick(&self, key: &str) -> Result<Option<QuickExplanation>, Self::Error>;

    /// Write a quick payload, clamping its `expires_at` to the configured
    /// policy TTL even if the payload requested a longer lifetime.
    fn write_quick(
        &self,
        key: &str,
        profile_id: Option<&str>,
        payload: &QuickExplanation,
    ) -> Result<(), Self::Error>;

    fn read_deep(&self, key: &str) -> Result<Option<DeepExplanation>, Self::Error>;

    fn write_deep(
        &self,
        key: &str,
        profile_id: Option<&str>,
        payload: &DeepExplanation,
    ) -> Result<(), Self::Error>;
}

pub trait ProfileRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn list_profiles(&self) -> Result<Vec<ProfileTemplate>, Self::Error>;
    /// Insert or update; rejects a new id once the profile cap is reached.
    fn upsert_profile(&self, profile: &ProfileTemplate) -> Result<ProfileTemplate, Self::Error>;
    fn delete_profile(&self, id: &str) -> Result<(), Self::Error>;
}

pub trait SettingsRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn cache_policy(&self) -> Result<CachePolicy, Self::Error>;
    /// Persist a policy; implementations clamp before writing.
    fn set_cache_policy(&self, policy: CachePolicy) -> Result<CachePolicy, Self::Error>;
    fn credentials(&self) -> Result<Option<Credentials>, Self::Error>;
    fn set_credentials(&self, credentials: &Credentials) -> Result<(), Self::Error>;
}

pub trait HistoryRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Newest first.
    fn list_history(&self) -> Result<Vec<HistoryEntry>, Self::Error>;
    /// Insert (replacing any entry with the same id) and drop entries
    /// beyond the retention bound.
    fn save_history(&self, entry: &HistoryEntry) -> Result<(), Self::Error>;
    fn delete_history(&self, id: &str) -> Result<(), Self::Error>;
    fn clear_history(&self) -> Result<(), Self::Error>;
}
