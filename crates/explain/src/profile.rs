use serde::{Deserialize, Serialize};

/// Maximum number of saved profiles. Deep requests fan cross-culture
/// variants across every saved profile, so the cap also bounds prompt and
/// cache growth.
pub const MAX_PROFILES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDemographics {
    pub age_range: String,
    pub region: String,
    pub occupation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl Default for ProfileDemographics {
    fn default() -> Self {
        Self {
            age_range: "unspecified".to_string(),
            region: "unspecified".to_string(),
            occupation: "unspecified".to_string(),
            gender: None,
        }
    }
}

/// Saved demographic/tone template used to personalize deep explanations.
/// Owned by the profile store; read-only everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub primary_language: String,
    pub cultures: Vec<String>,
    #[serde(default)]
    pub demographics: ProfileDemographics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_preference: Option<String>,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_tone() -> String {
    "Neutral explanatory tone.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults_applied_on_deserialize() {
        let json = r#"{
            "id": "p1", "name": "Student", "description": "desc",
            "primaryLanguage": "en", "cultures": ["US"],
            "createdAt": 1, "updatedAt": 1
        }"#;
        let profile: ProfileTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(profile.tone, "Neutral explanatory tone.");
        assert_eq!(profile.demographics.age_range, "unspecified");
        assert!(profile.demographics.gender.is_none());
    }
}
