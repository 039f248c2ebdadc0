//! Routing of public request URLs to the origin server.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::FetchError;

/// Where origin fetches are sent.
///
/// Only the scheme, host and port of `base_url` are used; path and query
/// always come from the request being forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Origin server. `None` fetches the public URL as is.
    #[serde(default)]
    pub base_url: Option<Url>,
}

impl OriginConfig {
    /// Send origin fetches to `base_url`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Map a public URL onto the origin, keeping its path and query.
    pub fn route(&self, public: &Url) -> Result<Url, FetchError> {
        let Some(base) = &self.base_url else {
            return Ok(public.clone());
        };
        let invalid = |what: &str| {
            FetchError::InvalidUrl(format!("cannot route {} to origin {}: {}", public, base, what))
        };

        let mut routed = public.clone();
        routed
            .set_scheme(base.scheme())
            .map_err(|_| invalid("scheme"))?;
        routed
            .set_host(base.host_str())
            .map_err(|e| invalid(&e.to_string()))?;
        routed.set_port(base.port()).map_err(|_| invalid("port"))?;
        Ok(routed)
    }
}
