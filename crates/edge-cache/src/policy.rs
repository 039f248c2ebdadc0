//! Cache directives attached to outbound fetches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::key::CacheKey;

/// Edge cache TTL for normalized EDM responses (one day).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Caching preference sent with an outbound fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "ttl", rename_all = "snake_case")]
pub enum CacheMode {
    /// Whatever the platform and origin headers decide.
    #[default]
    Default,
    /// Accept a cached copy up to this age. Rendered as a request
    /// `cache-control: max-age`, which bounds staleness for this fetch only;
    /// how long the edge stores the response is still up to the platform.
    Ttl(Duration),
    /// Bypass cached copies.
    NoCache,
}

impl CacheMode {
    /// Cache-Control value to put on the outbound request, if any.
    pub fn cache_control_header(&self) -> Option<String> {
        match self {
            Self::Default => None,
            Self::Ttl(ttl) => Some(format!("public, max-age={}", ttl.as_secs())),
            Self::NoCache => Some("no-cache".to_string()),
        }
    }
}

/// A normalized URL paired with the maximum age accepted for its cached copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirective {
    /// The cache key URL to fetch.
    pub key: CacheKey,
    /// Time-to-live.
    pub ttl: Duration,
}

impl CacheDirective {
    /// Create a new directive.
    pub fn new(key: CacheKey, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    /// The URL to fetch.
    pub fn url(&self) -> &Url {
        self.key.url()
    }

    /// Cache mode for the outbound fetch.
    pub fn mode(&self) -> CacheMode {
        CacheMode::Ttl(self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_control_header() {
        assert_eq!(CacheMode::Default.cache_control_header(), None);
        assert_eq!(
            CacheMode::Ttl(DEFAULT_CACHE_TTL).cache_control_header().as_deref(),
            Some("public, max-age=86400")
        );
        assert_eq!(
            CacheMode::NoCache.cache_control_header().as_deref(),
            Some("no-cache")
        );
    }

    #[test]
    fn test_directive_mode_uses_ttl() {
        let key = CacheKey::new(Url::parse("https://example.com/landing").unwrap());
        let directive = CacheDirective::new(key, DEFAULT_CACHE_TTL);
        assert_eq!(directive.mode(), CacheMode::Ttl(Duration::from_secs(86400)));
        assert_eq!(directive.url().path(), "/landing");
    }
}
