//! Cache-aware origin fetches.

use edge_cache::{CacheDirective, CacheMode};
use edge_core::{EdgeRequest, EdgeResponse};
use url::Url;

use crate::client::{FetchError, FetchRequest, Transport};
use crate::origin::OriginConfig;

/// Issues origin fetches. Status and body are passed back uninterpreted.
///
/// URLs are given in their public form and routed to the origin on send.
pub struct CacheFetcher<'a, T: ?Sized> {
    transport: &'a T,
    origin: Option<&'a OriginConfig>,
}

impl<'a, T: Transport + ?Sized> CacheFetcher<'a, T> {
    /// Create a fetcher that sends to public URLs unchanged.
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            origin: None,
        }
    }

    /// Route every fetch through `origin`.
    pub fn with_origin(mut self, origin: &'a OriginConfig) -> Self {
        self.origin = Some(origin);
        self
    }

    /// GET the directive's cache key URL with its TTL attached.
    pub async fn fetch_cached(&self, directive: &CacheDirective) -> Result<EdgeResponse, FetchError> {
        self.fetch_url(directive.url().clone(), directive.mode()).await
    }

    /// Forward the inbound request with default caching. Only the target is
    /// rewritten onto the origin.
    pub async fn fetch_passthrough(&self, request: &EdgeRequest) -> Result<EdgeResponse, FetchError> {
        let mut outbound = FetchRequest::forward(request);
        outbound.url = self.route(&outbound.url)?;
        self.transport.send(outbound).await
    }

    /// GET an arbitrary URL with the given cache mode.
    pub async fn fetch_url(&self, url: Url, cache: CacheMode) -> Result<EdgeResponse, FetchError> {
        let url = self.route(&url)?;
        self.transport.send(FetchRequest::get(url).with_cache(cache)).await
    }

    fn route(&self, url: &Url) -> Result<Url, FetchError> {
        match self.origin {
            Some(origin) => origin.route(url),
            None => Ok(url.clone()),
        }
    }
}
