//! Origin access layer with bounded error recovery.
//!
//! This crate provides:
//! - `Transport` - The outbound HTTP seam (`SpinTransport` on wasm32)
//! - `OriginConfig` - Routing of public URLs to the origin server
//! - `CacheFetcher` - Cache-aware and pass-through origin fetches
//! - `PurgeClient` - Fire-and-forget calls to the cache purge endpoint
//! - `RetryPolicy` - Attempt bound, backoff and retryable statuses
//! - `ErrorRecoveryCoordinator` - Retry-with-purge state machine

mod client;
mod delay;
mod fetcher;
mod origin;
mod purge;
mod recovery;
mod retry;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(target_arch = "wasm32")]
mod spin;

pub use client::*;
pub use delay::*;
pub use fetcher::*;
pub use origin::*;
pub use purge::*;
pub use recovery::*;
pub use retry::*;

#[cfg(target_arch = "wasm32")]
pub use spin::SpinTransport;
