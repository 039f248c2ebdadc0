//! Observability infrastructure for the EDM edge handler.
//!
//! This crate provides:
//! - `StructuredLogger` - Structured logging with request context
//! - `LogBuilder` - Fluent structured fields
//! - `LogSink` - Where log lines go (stderr, or memory for tests)

mod logging;

pub use logging::*;

// Re-export RequestId and TimingContext from edge-core for convenience
pub use edge_core::{RequestId, TimingContext};
