use crate::payload::DeepExplanation;
use serde::{Deserialize, Serialize};

/// Upper bound on retained history entries; older entries are dropped
/// newest-first when the log overflows.
pub const HISTORY_LIMIT: usize = 300;

/// One completed explanation recorded for later browsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    /// The subtitle line that was explained.
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_response: Option<DeepExplanation>,
    pub created_at: i64,
}

impl HistoryEntry {
    /// Build an entry from a completed deep explanation.
    pub fn from_deep(query: impl Into<String>, deep: &DeepExplanation) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            query: query.into(),
            result_summary: Some(deep.background.summary.clone()),
            profile_id: deep.profile_id.clone(),
            profile_name: deep
                .cross_culture
                .first()
                .map(|insight| insight.profile_name.clone()),
            deep_response: Some(deep.clone()),
            created_at: crate::now_ms(),
        }
    }
}
