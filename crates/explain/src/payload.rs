use crate::request::LanguagePair;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Three-level confidence grade used for sources and overall verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub level: ConfidenceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Low-latency literal + context gloss of one subtitle line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickExplanation {
    pub request_id: Uuid,
    pub literal: String,
    pub context: String,
    pub languages: LanguagePair,
    pub detected_at: i64,
    /// Epoch ms after which this payload is treated as a cache miss.
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepBackground {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Culturally-adapted analogy targeted at one saved profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossCultureInsight {
    pub profile_id: String,
    pub profile_name: String,
    pub analogy: String,
    pub confidence: ConfidenceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReference {
    pub title: String,
    pub url: String,
    pub credibility: ConfidenceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

/// Rich streamed explanation: background, per-profile analogies, cited
/// sources, and an overall confidence verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepExplanation {
    pub request_id: Uuid,
    pub background: DeepBackground,
    #[serde(default)]
    pub cross_culture: Vec<CrossCultureInsight>,
    #[serde(default)]
    pub sources: Vec<SourceReference>,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    pub generated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// All-optional mirror of [`DeepExplanation`] accumulated from stream
/// progress events. Merging is shallow: a field present in the incoming
/// patch replaces the accumulated one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<DeepBackground>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_culture: Option<Vec<CrossCultureInsight>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl DeepPatch {
    /// Fold `incoming` into `self`, newest fields winning.
    pub fn merge(&mut self, incoming: DeepPatch) {
        if incoming.request_id.is_some() {
            self.request_id = incoming.request_id;
        }
        if incoming.background.is_some() {
            self.background = incoming.background;
        }
        if incoming.cross_culture.is_some() {
            self.cross_culture = incoming.cross_culture;
        }
        if incoming.sources.is_some() {
            self.sources = incoming.sources;
        }
        if incoming.confidence.is_some() {
            self.confidence = incoming.confidence;
        }
        if incoming.reasoning_notes.is_some() {
            self.reasoning_notes = incoming.reasoning_notes;
        }
        if incoming.profile_id.is_some() {
            self.profile_id = incoming.profile_id;
        }
        if incoming.generated_at.is_some() {
            self.generated_at = incoming.generated_at;
        }
        if incoming.language.is_some() {
            self.language = incoming.language;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn background(summary: &str) -> DeepBackground {
        DeepBackground {
            summary: summary.to_string(),
            detail: None,
            highlights: Vec::new(),
        }
    }

    #[test]
    fn test_patch_merge_replaces_present_fields() {
        let mut acc = DeepPatch {
            background: Some(background("first")),
            reasoning_notes: Some("old".into()),
            ..Default::default()
        };
        acc.merge(DeepPatch {
            background: Some(background("second")),
            ..Default::default()
        });
        assert_eq!(acc.background.unwrap().summary, "second");
        // Absent fields survive the merge untouched.
        assert_eq!(acc.reasoning_notes.as_deref(), Some("old"));
    }

    #[test]
    fn test_deep_explanation_parses_wire_shape() {
        let json = r#"{
            "requestId": "6f7e4a9c-90f5-4f6e-8f4f-6a1c2b3d4e5f",
            "background": {"summary": "slang origin", "highlights": ["h1"]},
            "crossCulture": [{
                "profileId": "p1", "profileName": "P1",
                "analogy": "like saying X", "confidence": "high"
            }],
            "sources": [{"title": "t", "url": "https://example.com", "credibility": "medium"}],
            "confidence": {"level": "medium"},
            "generatedAt": 1700000000000
        }"#;
        let deep: DeepExplanation = serde_json::from_str(json).unwrap();
        assert_eq!(deep.cross_culture.len(), 1);
        assert_eq!(deep.cross_culture[0].confidence, ConfidenceLevel::High);
        assert_eq!(deep.sources[0].credibility, ConfidenceLevel::Medium);
    }
}
