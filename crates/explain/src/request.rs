use crate::profile::ProfileTemplate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary/secondary language preference carried on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    /// User's primary language code.
    pub primary: String,
    /// Optional fallback language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl LanguagePair {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainMode {
    Quick,
    Deep,
}

impl std::fmt::Display for ExplainMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplainMode::Quick => write!(f, "quick"),
            ExplainMode::Deep => write!(f, "deep"),
        }
    }
}

/// One user-triggered explanation request.
///
/// `request_id` is the correlation key for every later async event: cache
/// hit, network completion, stream progress. A request is superseded, not
/// cancelled, when a newer id becomes current.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub request_id: Uuid,
    pub mode: ExplainMode,
    pub subtitle_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surrounding: Option<String>,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Active profile, resolved from `profile_id` before dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileTemplate>,
    /// Additional saved profiles for cross-culture variant pre-computation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<ProfileTemplate>>,
    pub languages: LanguagePair,
}

impl ExplainRequest {
    pub fn new(mode: ExplainMode, subtitle_text: impl Into<String>, languages: LanguagePair) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            mode,
            subtitle_text: subtitle_text.into(),
            surrounding: None,
            timestamp: crate::now_ms(),
            profile_id: None,
            profile: None,
            profiles: None,
            languages,
        }
    }
}
