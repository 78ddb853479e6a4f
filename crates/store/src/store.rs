use crate::{Database, Result, StorageError};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use sublens_explain::{
    CachePolicy, Credentials, DeepExplanation, ExplanationCache, HistoryEntry, HistoryRepository,
    ProfileRepository, ProfileTemplate, QuickExplanation, SettingsRepository,
};

/// Persistent store with transparent primary→fallback degradation.
///
/// Domain-level failures (not-found, profile cap) pass straight through;
/// only infrastructure failures on the primary database switch the store
/// onto the secondary. Once switched, the store stays on the fallback for
/// its lifetime.
pub struct Store {
    primary: Database,
    fallback_path: Option<PathBuf>,
    fallback: OnceLock<Database>,
    degraded: Mutex<bool>,
}

impl Store {
    /// Open the primary database, remembering `fallback_path` for later
    /// degradation. A primary that cannot even be opened degrades
    /// immediately.
    pub fn open(primary_path: &Path, fallback_path: &Path) -> Result<Self> {
        match Database::open(primary_path) {
            Ok(primary) => Ok(Self {
                primary,
                fallback_path: Some(fallback_path.to_path_buf()),
                fallback: OnceLock::new(),
                degraded: Mutex::new(false),
            }),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %primary_path.display(),
                    "primary store unavailable, opening fallback"
                );
                let store = Self {
                    primary: Database::open_in_memory()?,
                    fallback_path: Some(fallback_path.to_path_buf()),
                    fallback: OnceLock::new(),
                    degraded: Mutex::new(true),
                };
                store.fallback_db()?;
                Ok(store)
            }
        }
    }

    /// In-memory store with no fallback; test support.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            primary: Database::open_in_memory()?,
            fallback_path: None,
            fallback: OnceLock::new(),
            degraded: Mutex::new(false),
        })
    }

    fn fallback_db(&self) -> Result<&Database> {
        if let Some(db) = self.fallback.get() {
            return Ok(db);
        }
        let path = self.fallback_path.as_ref().ok_or_else(|| {
            StorageError::Unavailable("no fallback store configured".to_string())
        })?;
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let db = Database::open(path)
            .map_err(|err| StorageError::Unavailable(format!("fallback store: {err}")))?;
        Ok(self.fallback.get_or_init(|| db))
    }

    /// Run `op` against the active database, degrading to the fallback on
    /// an infrastructure failure.
    fn with_db<T>(&self, op: impl Fn(&Database) -> Result<T>) -> Result<T> {
        let degraded = *self.degraded.lock().expect("store mutex poisoned");
        if degraded {
            return op(self.fallback_db()?);
        }

        match op(&self.primary) {
            Err(StorageError::DatabaseError(err)) => {
                tracing::warn!(error = %err, "primary store failed, degrading to fallback");
                *self.degraded.lock().expect("store mutex poisoned") = true;
                op(self.fallback_db()?)
            }
            other => other,
        }
    }

    /// Whether the store has switched to the fallback database.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.lock().expect("store mutex poisoned")
    }

    pub fn record_count(&self) -> Result<usize> {
        self.with_db(|db| db.record_count())
    }

    pub fn record_keys(&self) -> Result<Vec<String>> {
        self.with_db(|db| db.record_keys())
    }

    pub fn trim(&self, max_entries: usize) -> Result<()> {
        self.with_db(|db| db.trim(max_entries))
    }
}

impl ExplanationCache for Store {
    type Error = StorageError;

    fn read_quick(&self, key: &str) -> Result<Option<QuickExplanation>> {
        self.with_db(|db| db.read_quick(key))
    }

    fn write_quick(
        &self,
        key: &str,
        profile_id: Option<&str>,
        payload: &QuickExplanation,
    ) -> Result<()> {
        self.with_db(|db| db.write_quick(key, profile_id, payload))
    }

    fn read_deep(&self, key: &str) -> Result<Option<DeepExplanation>> {
        self.with_db(|db| db.read_deep(key))
    }

    fn write_deep(
        &self,
        key: &str,
        profile_id: Option<&str>,
        payload: &DeepExplanation,
    ) -> Result<()> {
        self.with_db(|db| db.write_deep(key, profile_id, payload))
    }
}

impl ProfileRepository for Store {
    type Error = StorageError;

    fn list_profiles(&self) -> Result<Vec<ProfileTemplate>> {
        self.with_db(|db| db.list_profiles())
    }

    fn upsert_profile(&self, profile: &ProfileTemplate) -> Result<ProfileTemplate> {
        self.with_db(|db| db.upsert_profile(profile))
    }

    fn delete_profile(&self, id: &str) -> Result<()> {
        self.with_db(|db| db.delete_profile(id))
    }
}

impl SettingsRepository for Store {
    type Error = StorageError;

    fn cache_policy(&self) -> Result<CachePolicy> {
        self.with_db(|db| db.cache_policy())
    }

    fn set_cache_policy(&self, policy: CachePolicy) -> Result<CachePolicy> {
        self.with_db(|db| db.set_cache_policy(policy))
    }

    fn credentials(&self) -> Result<Option<Credentials>> {
        self.with_db(|db| db.credentials())
    }

    fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        self.with_db(|db| db.set_credentials(credentials))
    }
}

impl HistoryRepository for Store {
    type Error = StorageError;

    fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        self.with_db(|db| db.list_history())
    }

    fn save_history(&self, entry: &HistoryEntry) -> Result<()> {
        self.with_db(|db| db.save_history(entry))
    }

    fn delete_history(&self, id: &str) -> Result<()> {
        self.with_db(|db| db.delete_history(id))
    }

    fn clear_history(&self) -> Result<()> {
        self.with_db(|db| db.clear_history())
    }
}
