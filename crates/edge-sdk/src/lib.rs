//! Public SDK for the EDM edge handler.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use edge_sdk::prelude::*;
//!
//! let classifier = RequestClassifier::default();
//! let fetcher = CacheFetcher::new(&transport);
//! let response = if classifier.is_trackable(&req.url) {
//!     let key = normalize(&req.url).into_cache_key();
//!     fetcher.fetch_cached(&CacheDirective::new(key, DEFAULT_CACHE_TTL)).await?
//! } else {
//!     fetcher.fetch_passthrough(&req).await?
//! };
//! ```

pub use edge_cache;
pub use edge_core;
pub use edge_data;
pub use edge_observability;

/// Prelude for convenient imports.
pub mod prelude {
    pub use edge_cache::*;
    pub use edge_core::*;
    pub use edge_data::*;
    pub use edge_observability::*;
}
