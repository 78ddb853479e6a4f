//! Inbound command contract from the rendering collaborator.
//!
//! One request/response pair per message.

use serde::{Deserialize, Serialize};
use sublens_explain::{
    CachePolicy, ExplainMode, HistoryEntry, LanguagePair, ProfileTemplate,
};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "EXPLAIN_REQUEST", rename_all = "camelCase")]
    Explain {
        request_id: Uuid,
        mode: ExplainMode,
        subtitle_text: String,
        #[serde(default)]
        surrounding: Option<String>,
        #[serde(default)]
        profile_id: Option<String>,
        languages: LanguagePair,
    },

    #[serde(rename = "STORE_CREDENTIALS", rename_all = "camelCase")]
    StoreCredentials {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },

    #[serde(rename = "FETCH_PROFILES")]
    FetchProfiles,

    #[serde(rename = "UPSERT_PROFILE")]
    UpsertProfile { profile: ProfileTemplate },

    #[serde(rename = "DELETE_PROFILE")]
    DeleteProfile { id: String },

    #[serde(rename = "FETCH_SETTINGS")]
    FetchSettings,

    #[serde(rename = "UPDATE_SETTINGS", rename_all = "camelCase")]
    UpdateSettings {
        #[serde(default)]
        quick_ttl_minutes: Option<u64>,
        #[serde(default)]
        max_entries: Option<usize>,
    },

    #[serde(rename = "FETCH_HISTORY")]
    FetchHistory,

    #[serde(rename = "DELETE_HISTORY_ENTRY")]
    DeleteHistoryEntry { id: String },

    #[serde(rename = "CLEAR_HISTORY")]
    ClearHistory,
}

/// Terminal result of one explain command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainOutcome {
    pub ok: bool,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExplainOutcome {
    pub fn success(response: serde_json::Value, cached: bool) -> Self {
        Self {
            ok: true,
            cached,
            response: Some(response),
            error: None,
        }
    }

    pub fn failure(reason: String) -> Self {
        Self {
            ok: false,
            cached: false,
            response: None,
            error: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommandResponse {
    Explain(ExplainOutcome),
    Ack { ok: bool },
    Error { ok: bool, error: String },
    Profiles { profiles: Vec<ProfileTemplate> },
    Profile(Box<ProfileTemplate>),
    Settings(CachePolicy),
    History { items: Vec<HistoryEntry> },
}
