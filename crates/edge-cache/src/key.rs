//! Cache key normalization.

use serde::{Deserialize, Serialize};
use url::Url;

/// A cache key uniquely identifying a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    url: Url,
}

impl CacheKey {
    /// Create a cache key from a URL.
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Get the key URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// A URL with its tracking query removed and at most one trailing slash
/// stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    url: Url,
    slash_stripped: bool,
}

impl NormalizedUrl {
    /// The normalized URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether a trailing slash was removed from the path.
    pub fn slash_stripped(&self) -> bool {
        self.slash_stripped
    }

    /// Redirect target when the path was rewritten.
    ///
    /// The original raw query is re-appended so campaign data still reaches
    /// the origin on the follow-up request. Returns `None` when no redirect is
    /// needed.
    pub fn redirect_location(&self, original: &Url) -> Option<String> {
        if !self.slash_stripped {
            return None;
        }
        Some(match original.query().filter(|q| !q.is_empty()) {
            Some(query) => format!("{}?{}", self.url, query),
            None => self.url.to_string(),
        })
    }

    /// The cache key for this URL.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.url.clone())
    }

    /// Consume into the cache key.
    pub fn into_cache_key(self) -> CacheKey {
        CacheKey::new(self.url)
    }
}

/// Normalize a URL for cache-key purposes.
///
/// Clears the query string and fragment. If the path is not `/` and ends in a
/// slash, exactly one trailing slash is removed.
pub fn normalize(original: &Url) -> NormalizedUrl {
    let mut url = original.clone();
    url.set_query(None);
    url.set_fragment(None);

    let path = url.path();
    let slash_stripped = path != "/" && path.ends_with('/');
    if slash_stripped {
        let trimmed = path[..path.len() - 1].to_string();
        url.set_path(&trimmed);
    }

    NormalizedUrl {
        url,
        slash_stripped,
    }
}
