//! Cache purge endpoint client.

use edge_cache::CacheMode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::{FetchError, FetchRequest, Transport};
use crate::origin::OriginConfig;

/// Location of the purge endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeConfig {
    /// Host serving the endpoint. `None` uses the purged URL's own host, routed
    /// to the origin when one is configured.
    #[serde(default)]
    pub host: Option<String>,
    /// URL scheme of the endpoint.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Endpoint path.
    #[serde(default = "default_path")]
    pub path: String,
    /// Query parameter carrying the URL to purge.
    #[serde(default = "default_param")]
    pub param: String,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_path() -> String {
    "/api/purgeCloudflareCache".to_string()
}

fn default_param() -> String {
    "paths".to_string()
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            host: None,
            scheme: default_scheme(),
            path: default_path(),
            param: default_param(),
        }
    }
}

impl PurgeConfig {
    /// Send purges to a fixed host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Purge endpoint URL for `target`.
    pub fn endpoint_for(&self, target: &Url) -> Result<Url, FetchError> {
        let authority = match &self.host {
            Some(host) => host.clone(),
            None => {
                let host = target
                    .host_str()
                    .ok_or_else(|| FetchError::InvalidUrl(format!("{} has no host", target)))?;
                match target.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                }
            }
        };

        let raw = format!("{}://{}{}", self.scheme, authority, self.path);
        let mut endpoint =
            Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;
        endpoint
            .query_pairs_mut()
            .append_pair(&self.param, target.as_str());
        Ok(endpoint)
    }
}

/// Result of a purge call. Purges never fail the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// The endpoint answered.
    Completed { status: u16, body_preview: String },
    /// No answer was obtained.
    Failed { reason: String },
}

impl PurgeOutcome {
    /// Whether the endpoint answered with a 2xx status.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { status, .. } if (200..300).contains(status))
    }
}

/// Fire-and-forget client for the purge endpoint.
pub struct PurgeClient<'a, T: ?Sized> {
    transport: &'a T,
    config: &'a PurgeConfig,
    origin: Option<&'a OriginConfig>,
    preview_len: usize,
}

impl<'a, T: Transport + ?Sized> PurgeClient<'a, T> {
    /// Create a purge client.
    pub fn new(transport: &'a T, config: &'a PurgeConfig, preview_len: usize) -> Self {
        Self {
            transport,
            config,
            origin: None,
            preview_len,
        }
    }

    /// Route the endpoint through `origin` unless a purge host is pinned.
    pub fn with_origin(mut self, origin: &'a OriginConfig) -> Self {
        self.origin = Some(origin);
        self
    }

    fn endpoint(&self, target: &Url) -> Result<Url, FetchError> {
        let endpoint = self.config.endpoint_for(target)?;
        match (self.origin, &self.config.host) {
            (Some(origin), None) => origin.route(&endpoint),
            _ => Ok(endpoint),
        }
    }

    /// Ask the endpoint to purge `target`, bypassing cached copies of the
    /// endpoint response. The body is read only for diagnostics.
    pub async fn purge(&self, target: &Url) -> PurgeOutcome {
        let endpoint = match self.endpoint(target) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                return PurgeOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let request = FetchRequest::get(endpoint).with_cache(CacheMode::NoCache);
        match self.transport.send(request).await {
            Ok(response) => PurgeOutcome::Completed {
                status: response.status,
                body_preview: response.body_preview(self.preview_len),
            },
            Err(e) => PurgeOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}
