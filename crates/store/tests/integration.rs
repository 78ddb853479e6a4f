//! Integration tests for the store crate.
//!
//! Uses in-memory SQLite for fast, isolated tests.

use sublens_explain::{
    cache_key, now_ms, CachePolicy, Confidence, ConfidenceLevel, Credentials, DeepBackground,
    DeepExplanation, ExplanationCache, HistoryEntry, HistoryRepository, LanguagePair,
    ProfileDemographics, ProfileRepository, ProfileTemplate, QuickExplanation, SettingsRepository,
    HISTORY_LIMIT, MAX_PROFILES,
};
use sublens_store::{Database, StorageError, Store};
use uuid::Uuid;

fn create_test_store() -> Store {
    Store::open_in_memory().expect("Failed to create in-memory store")
}

fn quick_payload(expires_at: i64) -> QuickExplanation {
    QuickExplanation {
        request_id: Uuid::new_v4(),
        literal: "that's fake".to_string(),
        context: "dismissive".to_string(),
        languages: LanguagePair::new("en"),
        detected_at: now_ms(),
        expires_at,
    }
}

fn deep_payload() -> DeepExplanation {
    DeepExplanation {
        request_id: Uuid::new_v4(),
        background: DeepBackground {
            summary: "slang for lying".to_string(),
            detail: None,
            highlights: vec!["hip-hop origin".to_string()],
        },
        cross_culture: Vec::new(),
        sources: Vec::new(),
        confidence: Confidence {
            level: ConfidenceLevel::Medium,
            notes: None,
        },
        reasoning_notes: None,
        profile_id: None,
        generated_at: now_ms(),
        language: Some("en".to_string()),
    }
}

fn test_profile(id: &str) -> ProfileTemplate {
    ProfileTemplate {
        id: id.to_string(),
        name: id.to_uppercase(),
        description: "test profile".to_string(),
        primary_language: "en".to_string(),
        cultures: vec!["US".to_string()],
        demographics: ProfileDemographics::default(),
        personal_preference: None,
        tone: "Neutral explanatory tone.".to_string(),
        goals: None,
        created_at: now_ms(),
        updated_at: now_ms(),
    }
}

fn history_entry(id: &str, created_at: i64) -> HistoryEntry {
    HistoryEntry {
        id: id.to_string(),
        query: format!("line {id}"),
        result_summary: None,
        profile_id: None,
        profile_name: None,
        deep_response: None,
        created_at,
    }
}

// =============================================================================
// Database Initialization
// =============================================================================

mod initialization {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        assert!(Database::open_in_memory().is_ok());
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let db = Database::open(&db_path);
        assert!(db.is_ok(), "Should create file-based database");
        assert!(db_path.exists(), "Database file should exist");
    }

    #[test]
    fn test_reopen_preserves_records() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let key = cache_key("see you later", None);

        {
            let db = Database::open(&db_path).unwrap();
            db.write_deep(&key, None, &deep_payload()).unwrap();
        }

        {
            let db = Database::open(&db_path).unwrap();
            assert!(db.read_deep(&key).unwrap().is_some());
        }
    }

    #[test]
    fn test_invalid_primary_path_degrades_to_fallback() {
        let dir = tempdir().unwrap();
        let store = Store::open(
            &PathBuf::from("/nonexistent/path/db.sqlite"),
            &dir.path().join("fallback.db"),
        )
        .unwrap();
        assert!(store.is_degraded());

        // The fallback must be fully usable.
        let key = cache_key("hello", None);
        store.write_deep(&key, None, &deep_payload()).unwrap();
        assert!(store.read_deep(&key).unwrap().is_some());
    }
}

// =============================================================================
// Explanation Cache
// =============================================================================

mod cache {
    use super::*;

    #[test]
    fn test_quick_round_trip() {
        let store = create_test_store();
        let key = cache_key("that's cap", None);
        let payload = quick_payload(now_ms() + 60_000);

        store.write_quick(&key, None, &payload).unwrap();

        let read = store.read_quick(&key).unwrap().unwrap();
        assert_eq!(read.literal, "that's fake");
        assert_eq!(read.context, "dismissive");
    }

    #[test]
    fn test_missing_key_is_miss() {
        let store = create_test_store();
        assert!(store.read_quick("default::nothing").unwrap().is_none());
        assert!(store.read_deep("default::nothing").unwrap().is_none());
    }

    #[test]
    fn test_expired_quick_is_miss_but_row_survives() {
        let store = create_test_store();
        let key = cache_key("old news", None);

        store
            .write_quick(&key, None, &quick_payload(now_ms() - 1))
            .unwrap();

        assert!(store.read_quick(&key).unwrap().is_none());
        // Lazy expiry: the record is not deleted, only treated as a miss.
        assert_eq!(store.record_count().unwrap(), 1);
    }

    #[test]
    fn test_future_expiry_is_hit() {
        let store = create_test_store();
        let key = cache_key("fresh", None);

        store
            .write_quick(&key, None, &quick_payload(now_ms() + 60_000))
            .unwrap();

        assert!(store.read_quick(&key).unwrap().is_some());
    }

    #[test]
    fn test_write_clamps_expiry_to_policy_ttl() {
        let store = create_test_store();
        let key = cache_key("greedy ttl", None);

        // Payload asks for a week; policy allows 30 minutes by default.
        let one_week = now_ms() + 7 * 24 * 60 * 60 * 1000;
        store.write_quick(&key, None, &quick_payload(one_week)).unwrap();

        let read = store.read_quick(&key).unwrap().unwrap();
        let ceiling = now_ms() + CachePolicy::default().quick_ttl_ms();
        assert!(read.expires_at <= ceiling);
    }

    #[test]
    fn test_quick_and_deep_share_one_record() {
        let store = create_test_store();
        let key = cache_key("shared", Some("p1"));

        store
            .write_quick(&key, Some("p1"), &quick_payload(now_ms() + 60_000))
            .unwrap();
        store.write_deep(&key, Some("p1"), &deep_payload()).unwrap();

        assert_eq!(store.record_count().unwrap(), 1);
        assert!(store.read_quick(&key).unwrap().is_some());
        assert!(store.read_deep(&key).unwrap().is_some());
    }

    #[test]
    fn test_deep_write_preserves_quick_payload() {
        let store = create_test_store();
        let key = cache_key("both tiers", None);

        store
            .write_quick(&key, None, &quick_payload(now_ms() + 60_000))
            .unwrap();
        store.write_deep(&key, None, &deep_payload()).unwrap();

        let quick = store.read_quick(&key).unwrap();
        assert!(quick.is_some(), "deep write must not clobber the quick tier");
    }
}

// =============================================================================
// Eviction
// =============================================================================

mod eviction {
    use super::*;

    #[test]
    fn test_count_never_exceeds_budget() {
        let store = create_test_store();
        store
            .set_cache_policy(CachePolicy {
                quick_ttl_minutes: 30,
                max_entries: 50,
            })
            .unwrap();

        for i in 0..60 {
            let key = cache_key(&format!("line {i}"), None);
            store.write_deep(&key, None, &deep_payload()).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        assert_eq!(store.record_count().unwrap(), 50);
    }

    #[test]
    fn test_retained_records_are_most_recently_updated() {
        let store = create_test_store();
        store
            .set_cache_policy(CachePolicy {
                quick_ttl_minutes: 30,
                max_entries: 50,
            })
            .unwrap();

        for i in 0..55 {
            let key = cache_key(&format!("line {i}"), None);
            store.write_deep(&key, None, &deep_payload()).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let keys = store.record_keys().unwrap();
        assert_eq!(keys.len(), 50);
        // The first five writes were evicted.
        for i in 0..5 {
            assert!(!keys.contains(&cache_key(&format!("line {i}"), None)));
        }
        for i in 5..55 {
            assert!(keys.contains(&cache_key(&format!("line {i}"), None)));
        }
    }

    #[test]
    fn test_manual_trim() {
        let store = create_test_store();
        for i in 0..10 {
            let key = cache_key(&format!("line {i}"), None);
            store.write_deep(&key, None, &deep_payload()).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        store.trim(4).unwrap();
        assert_eq!(store.record_count().unwrap(), 4);
        let keys = store.record_keys().unwrap();
        assert!(keys.contains(&cache_key("line 9", None)));
        assert!(!keys.contains(&cache_key("line 0", None)));
    }

    #[test]
    fn test_rewrite_rescues_record_from_eviction() {
        let store = create_test_store();
        store
            .set_cache_policy(CachePolicy {
                quick_ttl_minutes: 30,
                max_entries: 50,
            })
            .unwrap();

        let oldest = cache_key("line 0", None);
        for i in 0..50 {
            let key = cache_key(&format!("line {i}"), None);
            store.write_deep(&key, None, &deep_payload()).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        // Touch the oldest record, then overflow by one.
        store.write_deep(&oldest, None, &deep_payload()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        store
            .write_deep(&cache_key("line 50", None), None, &deep_payload())
            .unwrap();

        let keys = store.record_keys().unwrap();
        assert!(keys.contains(&oldest), "refreshed record must survive");
        assert!(!keys.contains(&cache_key("line 1", None)));
    }
}

// =============================================================================
// Profiles
// =============================================================================

mod profiles {
    use super::*;

    #[test]
    fn test_upsert_and_list() {
        let store = create_test_store();
        store.upsert_profile(&test_profile("a")).unwrap();
        store.upsert_profile(&test_profile("b")).unwrap();

        let ids: Vec<String> = store
            .list_profiles()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_delete_profile() {
        let store = create_test_store();
        store.upsert_profile(&test_profile("a")).unwrap();
        store.upsert_profile(&test_profile("b")).unwrap();

        store.delete_profile("a").unwrap();
        let ids: Vec<String> = store
            .list_profiles()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_delete_nonexistent_profile() {
        let store = create_test_store();
        assert!(matches!(
            store.delete_profile("ghost"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_profile_cap_rejects_new_id() {
        let store = create_test_store();
        for i in 0..MAX_PROFILES {
            store.upsert_profile(&test_profile(&format!("id-{i}"))).unwrap();
        }

        let result = store.upsert_profile(&test_profile("overflow"));
        assert!(matches!(result, Err(StorageError::ProfileLimit(_))));
    }

    #[test]
    fn test_profile_cap_allows_update_of_existing() {
        let store = create_test_store();
        for i in 0..MAX_PROFILES {
            store.upsert_profile(&test_profile(&format!("id-{i}"))).unwrap();
        }

        let mut updated = test_profile("id-0");
        updated.name = "Renamed".to_string();
        let saved = store.upsert_profile(&updated).unwrap();
        assert_eq!(saved.name, "Renamed");
        assert_eq!(store.list_profiles().unwrap().len(), MAX_PROFILES);
    }
}

// =============================================================================
// Settings
// =============================================================================

mod settings {
    use super::*;

    #[test]
    fn test_default_policy_when_unset() {
        let store = create_test_store();
        assert_eq!(store.cache_policy().unwrap(), CachePolicy::default());
    }

    #[test]
    fn test_set_policy_clamps() {
        let store = create_test_store();
        let saved = store
            .set_cache_policy(CachePolicy {
                quick_ttl_minutes: 999,
                max_entries: 10,
            })
            .unwrap();

        assert_eq!(saved.quick_ttl_minutes, 180);
        assert_eq!(saved.max_entries, 50);
        assert_eq!(store.cache_policy().unwrap(), saved);
    }

    #[test]
    fn test_credentials_round_trip() {
        let store = create_test_store();
        assert!(store.credentials().unwrap().is_none());

        let creds = Credentials {
            api_key: "sk-test".to_string(),
            base_url: Some("http://localhost:8000".to_string()),
        };
        store.set_credentials(&creds).unwrap();
        assert_eq!(store.credentials().unwrap(), Some(creds));
    }
}

// =============================================================================
// History
// =============================================================================

mod history {
    use super::*;

    #[test]
    fn test_history_newest_first() {
        let store = create_test_store();
        store.save_history(&history_entry("a", 1000)).unwrap();
        store.save_history(&history_entry("b", 3000)).unwrap();
        store.save_history(&history_entry("c", 2000)).unwrap();

        let ids: Vec<String> = store
            .list_history()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_same_id_replaces() {
        let store = create_test_store();
        store.save_history(&history_entry("a", 1000)).unwrap();

        let mut replacement = history_entry("a", 2000);
        replacement.query = "updated".to_string();
        store.save_history(&replacement).unwrap();

        let entries = store.list_history().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].query, "updated");
    }

    #[test]
    fn test_history_bounded() {
        let store = create_test_store();
        for i in 0..(HISTORY_LIMIT + 5) {
            store
                .save_history(&history_entry(&format!("e{i}"), i as i64))
                .unwrap();
        }

        let entries = store.list_history().unwrap();
        assert_eq!(entries.len(), HISTORY_LIMIT);
        // The oldest five entries were dropped.
        assert!(entries.iter().all(|e| e.created_at >= 5));
    }

    #[test]
    fn test_delete_and_clear() {
        let store = create_test_store();
        store.save_history(&history_entry("a", 1)).unwrap();
        store.save_history(&history_entry("b", 2)).unwrap();

        store.delete_history("a").unwrap();
        assert_eq!(store.list_history().unwrap().len(), 1);

        store.clear_history().unwrap();
        assert!(store.list_history().unwrap().is_empty());
    }
}
