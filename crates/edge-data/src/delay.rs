//! Backoff delay seam.

use std::time::Duration;

use async_trait::async_trait;

/// Suspends the current request for a backoff period.
///
/// Implementations may block the calling thread. [`BlockingDelay`] does, which
/// is only safe where each request owns its thread, as in a Spin component
/// instance. Callers on a shared async executor should supply a timer-backed
/// implementation instead.
#[async_trait(?Send)]
pub trait Delay {
    /// Wait for `duration`.
    async fn wait(&self, duration: Duration);
}

/// Delay that parks the calling thread with `std::thread::sleep`.
///
/// A Spin component serves a single request per instance, so blocking the
/// instance is equivalent to suspending the request. Do not use it on an
/// executor that multiplexes tasks over a thread: every task on that thread
/// stalls for the full duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingDelay;

#[async_trait(?Send)]
impl Delay for BlockingDelay {
    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
