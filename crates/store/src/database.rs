use crate::{Result, StorageError};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use sublens_explain::{
    CachePolicy, Credentials, DeepExplanation, HistoryEntry, ProfileTemplate, QuickExplanation,
    HISTORY_LIMIT, MAX_PROFILES,
};

const SETTINGS_CACHE_POLICY: &str = "cache_policy";
const SETTINGS_CREDENTIALS: &str = "credentials";

/// One SQLite handle holding every persisted namespace.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS explanations (
                key TEXT PRIMARY KEY,
                profile_id TEXT,
                quick_json TEXT,
                deep_json TEXT,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                profile_json TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS history (
                id TEXT PRIMARY KEY,
                entry_json TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_explanations_updated_at ON explanations(updated_at);
            CREATE INDEX IF NOT EXISTS idx_history_created_at ON history(created_at DESC);
            "#,
        )?;
        Ok(())
    }

    // --- Explanation records ---

    /// Quick payload for `key`; a payload whose `expires_at` has passed is
    /// a miss. Expiry is checked lazily here, never swept in the
    /// background, and the stale row stays until overwritten or evicted.
    pub fn read_quick(&self, key: &str) -> Result<Option<QuickExplanation>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let json: Option<String> = conn
            .query_row(
                "SELECT quick_json FROM explanations WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let Some(json) = json else { return Ok(None) };
        let payload: QuickExplanation = serde_json::from_str(&json)?;
        if payload.expires_at <= sublens_explain::now_ms() {
            tracing::debug!(key, "quick record expired, treating as miss");
            return Ok(None);
        }
        Ok(Some(payload))
    }

    /// Write a quick payload, clamping `expires_at` to the configured
    /// policy TTL, then trim to the record budget.
    pub fn write_quick(
        &self,
        key: &str,
        profile_id: Option<&str>,
        payload: &QuickExplanation,
    ) -> Result<()> {
        let policy = self.cache_policy()?;
        let ceiling = sublens_explain::now_ms() + policy.quick_ttl_ms();

        let mut clamped = payload.clone();
        clamped.expires_at = clamped.expires_at.min(ceiling);
        let json = serde_json::to_string(&clamped)?;

        {
            let conn = self.conn.lock().expect("database mutex poisoned");
            conn.execute(
                "INSERT INTO explanations (key, profile_id, quick_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                     profile_id = excluded.profile_id,
                     quick_json = excluded.quick_json,
                     updated_at = excluded.updated_at",
                (key, profile_id, json, sublens_explain::now_ms()),
            )?;
        }
        self.trim(policy.max_entries)
    }

    pub fn read_deep(&self, key: &str) -> Result<Option<DeepExplanation>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let json: Option<String> = conn
            .query_row(
                "SELECT deep_json FROM explanations WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn write_deep(
        &self,
        key: &str,
        profile_id: Option<&str>,
        payload: &DeepExplanation,
    ) -> Result<()> {
        let policy = self.cache_policy()?;
        let json = serde_json::to_string(payload)?;
        {
            let conn = self.conn.lock().expect("database mutex poisoned");
            conn.execute(
                "INSERT INTO explanations (key, profile_id, deep_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                     profile_id = excluded.profile_id,
                     deep_json = excluded.deep_json,
                     updated_at = excluded.updated_at",
                (key, profile_id, json, sublens_explain::now_ms()),
            )?;
        }
        self.trim(policy.max_entries)
    }

    /// Delete least-recently-updated records until the count is within
    /// `max_entries`, strictly by `updated_at` ascending.
    pub fn trim(&self, max_entries: usize) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM explanations", [], |row| row.get(0))?;
        let excess = count - max_entries as i64;
        if excess <= 0 {
            return Ok(());
        }

        let deleted = conn.execute(
            "DELETE FROM explanations WHERE key IN (
                 SELECT key FROM explanations ORDER BY updated_at ASC, key ASC LIMIT ?1
             )",
            [excess],
        )?;
        tracing::debug!(deleted, max_entries, "evicted least-recently-updated records");
        Ok(())
    }

    pub fn record_count(&self) -> Result<usize> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM explanations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Keys currently held, most recently updated first. Test support.
    pub fn record_keys(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let mut stmt =
            conn.prepare("SELECT key FROM explanations ORDER BY updated_at DESC, key DESC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    // --- Profiles ---

    pub fn list_profiles(&self) -> Result<Vec<ProfileTemplate>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let mut stmt =
            conn.prepare("SELECT profile_json FROM profiles ORDER BY created_at ASC, id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut profiles = Vec::new();
        for row in rows {
            let json = row?;
            profiles.push(serde_json::from_str(&json)?);
        }
        Ok(profiles)
    }

    /// Insert or update a profile. A new id is rejected once the cap is
    /// reached; updates to existing ids always pass.
    pub fn upsert_profile(&self, profile: &ProfileTemplate) -> Result<ProfileTemplate> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM profiles WHERE id = ?1",
                [&profile.id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if !exists {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
            if count as usize >= MAX_PROFILES {
                return Err(StorageError::ProfileLimit(MAX_PROFILES));
            }
        }

        let mut saved = profile.clone();
        saved.updated_at = sublens_explain::now_ms();
        let json = serde_json::to_string(&saved)?;
        conn.execute(
            "INSERT OR REPLACE INTO profiles (id, profile_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            (&saved.id, json, saved.created_at, saved.updated_at),
        )?;
        Ok(saved)
    }

    pub fn delete_profile(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let affected = conn.execute("DELETE FROM profiles WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("profile {id}")));
        }
        Ok(())
    }

    // --- Settings ---

    pub fn cache_policy(&self) -> Result<CachePolicy> {
        match self.read_setting(SETTINGS_CACHE_POLICY)? {
            Some(json) => Ok(serde_json::from_str::<CachePolicy>(&json)?.clamped()),
            None => Ok(CachePolicy::default()),
        }
    }

    pub fn set_cache_policy(&self, policy: CachePolicy) -> Result<CachePolicy> {
        let clamped = policy.clamped();
        self.write_setting(SETTINGS_CACHE_POLICY, &serde_json::to_string(&clamped)?)?;
        Ok(clamped)
    }

    pub fn credentials(&self) -> Result<Option<Credentials>> {
        match self.read_setting(SETTINGS_CREDENTIALS)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        self.write_setting(SETTINGS_CREDENTIALS, &serde_json::to_string(credentials)?)
    }

    fn read_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        Ok(conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn write_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }

    // --- History ---

    pub fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let mut stmt =
            conn.prepare("SELECT entry_json FROM history ORDER BY created_at DESC, id DESC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut entries = Vec::new();
        for row in rows {
            let json = row?;
            entries.push(serde_json::from_str(&json)?);
        }
        Ok(entries)
    }

    /// Save an entry (replacing any same-id entry) and drop everything
    /// beyond the retention bound, oldest first.
    pub fn save_history(&self, entry: &HistoryEntry) -> Result<()> {
        let json = serde_json::to_string(entry)?;
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO history (id, entry_json, created_at)
             VALUES (?1, ?2, ?3)",
            (&entry.id, json, entry.created_at),
        )?;
        conn.execute(
            "DELETE FROM history WHERE id IN (
                 SELECT id FROM history ORDER BY created_at DESC, id DESC LIMIT -1 OFFSET ?1
             )",
            [HISTORY_LIMIT as i64],
        )?;
        Ok(())
    }

    pub fn delete_history(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let affected = conn.execute("DELETE FROM history WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("history entry {id}")));
        }
        Ok(())
    }

    pub fn clear_history(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute("DELETE FROM history", [])?;
        Ok(())
    }
}
