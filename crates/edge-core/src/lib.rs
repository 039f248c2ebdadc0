//! Core abstractions for the EDM edge handler.
//!
//! This crate provides the fundamental types shared by every layer:
//! - `EdgeRequest` - The inbound request as observed by the handler
//! - `EdgeResponse` - The response handed back to the platform
//! - `RequestId` - Per-request correlation identifier
//! - `TimingContext` / `LifecyclePhase` - Request lifecycle tracking

mod context;
mod lifecycle;

pub use context::*;
pub use lifecycle::*;
