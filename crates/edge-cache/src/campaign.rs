//! Marketing campaign (EDM) request classification.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::policy::DEFAULT_CACHE_TTL;

/// Query keys that every EDM link carries.
pub const DEFAULT_EDM_PARAMS: [&str; 6] = [
    "ahe",
    "acid",
    "utm_campaign",
    "utm_medium",
    "utm_source",
    "lr_hash",
];

/// Ordered set of query parameter names that must all be present for a
/// request to count as EDM traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParameterSet(Vec<String>);

impl QueryParameterSet {
    /// Create a parameter set. Duplicate names are collapsed, keeping the first.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| seen.insert(name.clone()))
            .collect();
        Self(names)
    }

    /// Parameter names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Check that every required name appears in `keys`.
    ///
    /// Values and extra keys are ignored. An empty key set never satisfies a
    /// non-empty parameter set.
    pub fn is_satisfied_by<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        let present: HashSet<&str> = keys.into_iter().collect();
        self.names().all(|name| present.contains(name))
    }
}

impl Default for QueryParameterSet {
    fn default() -> Self {
        Self::new(DEFAULT_EDM_PARAMS)
    }
}

/// How a bodiless request is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestClass {
    /// Trackable marketing request, eligible for normalization.
    Edm,
    /// Everything else; forwarded unchanged.
    Passthrough,
}

impl RequestClass {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Edm => "edm",
            Self::Passthrough => "passthrough",
        }
    }
}

/// Campaign caching policy: which requests are EDM and how long their
/// normalized responses stay cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignPolicy {
    /// Query keys that mark a request as EDM.
    #[serde(default)]
    pub required_params: QueryParameterSet,
    /// Edge cache TTL applied to normalized EDM fetches.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: Duration,
}

fn default_cache_ttl() -> Duration {
    DEFAULT_CACHE_TTL
}

impl Default for CampaignPolicy {
    fn default() -> Self {
        Self {
            required_params: QueryParameterSet::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl CampaignPolicy {
    /// Build the classifier for this policy.
    pub fn classifier(&self) -> RequestClassifier {
        RequestClassifier::new(self.required_params.clone())
    }
}

/// Decides whether a request is EDM traffic. Pure; performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct RequestClassifier {
    params: QueryParameterSet,
}

impl RequestClassifier {
    /// Create a classifier for a parameter set.
    pub fn new(params: QueryParameterSet) -> Self {
        Self { params }
    }

    /// True iff every required name is present as a decoded query key.
    pub fn is_trackable(&self, url: &Url) -> bool {
        if url.query().map_or(true, str::is_empty) {
            return false;
        }
        let keys: Vec<_> = url.query_pairs().map(|(k, _)| k).collect();
        self.params.is_satisfied_by(keys.iter().map(|k| &**k))
    }

    /// Classify a URL.
    pub fn classify(&self, url: &Url) -> RequestClass {
        if self.is_trackable(url) {
            RequestClass::Edm
        } else {
            RequestClass::Passthrough
        }
    }
}
