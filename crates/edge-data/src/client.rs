//! Outbound request model and the transport seam.

use async_trait::async_trait;
use edge_cache::CacheMode;
use edge_core::{EdgeRequest, EdgeResponse, Headers, Method};
use url::Url;

/// Error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Connection-level headers that belong to the inbound hop only. The
/// outbound HTTP host refuses requests carrying any of them.
pub const HOP_BY_HOP_HEADERS: [&str; 10] = [
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "transfer-encoding",
    "upgrade",
    "http2-settings",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// An outbound request to the origin or the purge endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute target URL.
    pub url: Url,
    /// Request headers, excluding the cache directive.
    pub headers: Headers,
    /// Request body.
    pub body: Vec<u8>,
    /// Cache behavior requested from the edge.
    pub cache: CacheMode,
}

impl FetchRequest {
    /// Create a bodiless GET request.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: Vec::new(),
            body: Vec::new(),
            cache: CacheMode::Default,
        }
    }

    /// Forward an inbound request as received, minus its hop-by-hop headers.
    pub fn forward(request: &EdgeRequest) -> Self {
        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request
                .headers
                .iter()
                .filter(|(name, _)| !is_hop_by_hop(name))
                .cloned()
                .collect(),
            body: request.body.clone(),
            cache: CacheMode::Default,
        }
    }

    /// Set the cache mode.
    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    /// Headers to put on the wire.
    ///
    /// When the cache mode carries a directive it replaces any inbound
    /// `cache-control` header.
    pub fn wire_headers(&self) -> Headers {
        match self.cache.cache_control_header() {
            None => self.headers.clone(),
            Some(value) => {
                let mut headers: Headers = self
                    .headers
                    .iter()
                    .filter(|(k, _)| !k.eq_ignore_ascii_case("cache-control"))
                    .cloned()
                    .collect();
                headers.push(("cache-control".to_string(), value));
                headers
            }
        }
    }
}

/// Outbound HTTP primitive provided by the platform.
///
/// Implementations return whatever the far end answered; status codes are
/// never turned into errors here. `Err` means no response was obtained.
#[async_trait(?Send)]
pub trait Transport {
    /// Send a request and buffer its response.
    async fn send(&self, request: FetchRequest) -> Result<EdgeResponse, FetchError>;
}
