//! EDM cache workload - campaign URL normalization with origin error recovery.
//!
//! This workload demonstrates:
//! - Collapsing marketing-campaign URLs onto one edge cache entry
//! - 301 redirects that drop a trailing slash but keep campaign data
//! - Bounded retry with cache purge for transient origin errors
//! - Untouched forwarding of body-bearing requests

mod config;
mod handler;
mod inbound;

#[cfg(target_arch = "wasm32")]
mod component;

pub use config::*;
pub use handler::*;
pub use inbound::*;
