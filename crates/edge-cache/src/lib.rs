//! Campaign URL classification and cache-key normalization.
//!
//! This crate provides:
//! - `RequestClassifier` - Detects trackable marketing (EDM) requests
//! - `QueryParameterSet` - The query keys that mark a request as EDM
//! - `normalize` / `NormalizedUrl` - Strips tracking query and trailing slash
//! - `CacheKey` - The URL the edge cache stores a response under
//! - `CacheDirective` / `CacheMode` - Cache behavior attached to outbound fetches
//!
//! # Example
//!
//! ```ignore
//! use edge_cache::{normalize, CacheDirective, RequestClassifier, DEFAULT_CACHE_TTL};
//!
//! let classifier = RequestClassifier::default();
//! if classifier.is_trackable(&url) {
//!     let normalized = normalize(&url);
//!     if let Some(location) = normalized.redirect_location(&url) {
//!         // 301 to `location`
//!     }
//!     let directive = CacheDirective::new(normalized.cache_key(), DEFAULT_CACHE_TTL);
//! }
//! ```

mod campaign;
mod key;
mod policy;

pub use campaign::*;
pub use key::*;
pub use policy::*;
