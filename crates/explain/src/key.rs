//! Cache key derivation.
//!
//! A key is a pure function of (profile, normalized text): two
//! observations with identical normalized text and profile always collide.
//! That collision is the dedup and cache-hit mechanism.

/// Derive the cache slot for a subtitle line under a profile.
pub fn cache_key(text: &str, profile_id: Option<&str>) -> String {
    format!(
        "{}::{}",
        profile_id.unwrap_or("default"),
        text.trim().to_lowercase()
    )
}
