//! Weighted selector registry.
//!
//! Host-specific selectors are tried at weight 2 ahead of generic
//! structural selectors at weight 1. Pure data, no surface access.

/// Weight applied to selectors registered for a specific host.
pub const HOST_SELECTOR_WEIGHT: f32 = 2.0;
/// Weight applied to generic structural selectors.
pub const GENERIC_SELECTOR_WEIGHT: f32 = 1.0;

/// Generic caption selectors that work across most players.
const GENERIC_SELECTORS: &[&str] = &[
    ".caption-window",
    ".captions-text",
    ".subtitle",
    ".subtitles",
    "[class*='caption']",
    "[class*='subtitle']",
    ".vjs-text-track-cue",
];

/// Per-host caption selectors, matched by domain suffix.
const HOST_SELECTORS: &[(&str, &[&str])] = &[
    ("youtube.com", &[".ytp-caption-segment", ".caption-visual-line"]),
    (
        "netflix.com",
        &[".player-timedtext-text-container", ".player-timedtext"],
    ),
    ("hulu.com", &[".CaptionBox", ".caption-text-box"]),
    ("primevideo.com", &[".atvwebplayersdk-captions-text"]),
    ("disneyplus.com", &[".dss-subtitle-renderer-line"]),
    ("vimeo.com", &[".vp-captions-line", ".vp-captions"]),
];

/// Hosts where captions are drawn into a canvas and the structural scan
/// rarely sees them; optical recognition is preferred there.
const OPTICAL_PREFERRED_HOSTS: &[&str] = &["netflix.com", "disneyplus.com"];

/// Whether `host` is on the optical-preferred allowlist.
pub fn host_prefers_optical(host: Option<&str>) -> bool {
    match host {
        Some(host) => OPTICAL_PREFERRED_HOSTS
            .iter()
            .any(|preferred| host_matches(host, preferred)),
        None => false,
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// One selector with its scan weight.
#[derive(Debug, Clone)]
pub struct SelectorSpec {
    pub selector: String,
    pub weight: f32,
}

/// Prioritized selector list for one host.
#[derive(Debug, Clone)]
pub struct SelectorRegistry {
    specs: Vec<SelectorSpec>,
}

impl SelectorRegistry {
    /// Build the registry: host-specific selectors first, generic ones
    /// after.
    pub fn for_host(host: Option<&str>) -> Self {
        let mut specs = Vec::new();

        if let Some(host) = host {
            for (domain, selectors) in HOST_SELECTORS {
                if host_matches(host, domain) {
                    for selector in *selectors {
                        specs.push(SelectorSpec {
                            selector: selector.to_string(),
                            weight: HOST_SELECTOR_WEIGHT,
                        });
                    }
                }
            }
        }

        for selector in GENERIC_SELECTORS {
            specs.push(SelectorSpec {
                selector: selector.to_string(),
                weight: GENERIC_SELECTOR_WEIGHT,
            });
        }

        Self { specs }
    }

    pub fn specs(&self) -> &[SelectorSpec] {
        &self.specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_host_gets_weighted_selectors_first() {
        let registry = SelectorRegistry::for_host(Some("www.youtube.com"));
        let first = &registry.specs()[0];
        assert_eq!(first.weight, HOST_SELECTOR_WEIGHT);
        assert!(first.selector.contains("ytp-caption"));
    }

    #[test]
    fn test_unknown_host_gets_generic_only() {
        let registry = SelectorRegistry::for_host(Some("example.org"));
        assert!(registry
            .specs()
            .iter()
            .all(|spec| spec.weight == GENERIC_SELECTOR_WEIGHT));
    }

    #[test]
    fn test_no_host_gets_generic_only() {
        let registry = SelectorRegistry::for_host(None);
        assert!(!registry.specs().is_empty());
        assert!(registry
            .specs()
            .iter()
            .all(|spec| spec.weight == GENERIC_SELECTOR_WEIGHT));
    }

    #[test]
    fn test_optical_allowlist_matches_subdomains() {
        assert!(host_prefers_optical(Some("www.netflix.com")));
        assert!(host_prefers_optical(Some("netflix.com")));
        assert!(!host_prefers_optical(Some("youtube.com")));
        assert!(!host_prefers_optical(None));
    }

    #[test]
    fn test_host_match_requires_domain_boundary() {
        assert!(!host_prefers_optical(Some("notnetflix.com")));
    }
}
