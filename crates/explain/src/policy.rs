use serde::{Deserialize, Serialize};

/// Shortest quick-cache lifetime a caller may configure (minutes).
pub const QUICK_TTL_MIN_MINUTES: u64 = 5;
/// Longest quick-cache lifetime a caller may configure (minutes).
pub const QUICK_TTL_MAX_MINUTES: u64 = 180;
pub const DEFAULT_QUICK_TTL_MINUTES: u64 = 30;

/// Record-count eviction bounds.
pub const MIN_CACHE_ENTRIES: usize = 50;
pub const MAX_CACHE_ENTRIES: usize = 2000;
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Locally-configured cache limits. Values are clamped on write so a
/// persisted policy is always within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePolicy {
    pub quick_ttl_minutes: u64,
    pub max_entries: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            quick_ttl_minutes: DEFAULT_QUICK_TTL_MINUTES,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CachePolicy {
    /// Clamp both fields into their configured bounds.
    pub fn clamped(self) -> Self {
        Self {
            quick_ttl_minutes: self
                .quick_ttl_minutes
                .clamp(QUICK_TTL_MIN_MINUTES, QUICK_TTL_MAX_MINUTES),
            max_entries: self.max_entries.clamp(MIN_CACHE_ENTRIES, MAX_CACHE_ENTRIES),
        }
    }

    pub fn quick_ttl_ms(&self) -> i64 {
        self.quick_ttl_minutes as i64 * 60 * 1000
    }
}

/// Credentials for the external explanation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_clamps_high_ttl() {
        let policy = CachePolicy {
            quick_ttl_minutes: 999,
            max_entries: 500,
        }
        .clamped();
        assert_eq!(policy.quick_ttl_minutes, QUICK_TTL_MAX_MINUTES);
    }

    #[test]
    fn test_policy_clamps_low_bounds() {
        let policy = CachePolicy {
            quick_ttl_minutes: 1,
            max_entries: 3,
        }
        .clamped();
        assert_eq!(policy.quick_ttl_minutes, QUICK_TTL_MIN_MINUTES);
        assert_eq!(policy.max_entries, MIN_CACHE_ENTRIES);
    }

    #[test]
    fn test_default_policy_is_within_bounds() {
        let policy = CachePolicy::default();
        assert_eq!(policy, policy.clamped());
    }
}
