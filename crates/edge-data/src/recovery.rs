//! Bounded retry-with-purge recovery for transient origin errors.
//!
//! The coordinator holds one response at a time. While that response carries
//! a retryable status and the attempt budget is not spent it:
//!
//! 1. previews and drains the failing body,
//! 2. waits the backoff delay,
//! 3. asks the purge endpoint to drop the original URL,
//! 4. re-fetches the original URL with a cache-busting query marker.
//!
//! Whatever the last fetch returned is handed back, even if it still failed.

use edge_cache::CacheMode;
use edge_core::{EdgeRequest, EdgeResponse, LifecyclePhase, TimingContext};
use edge_observability::StructuredLogger;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::{FetchError, Transport};
use crate::delay::Delay;
use crate::fetcher::CacheFetcher;
use crate::origin::OriginConfig;
use crate::purge::{PurgeClient, PurgeConfig, PurgeOutcome};
use crate::retry::RetryPolicy;

/// Characters of a body kept for diagnostics.
pub const BODY_PREVIEW_CHARS: usize = 100;

/// Query pair appended to retry URLs to force a cache miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBuster {
    /// Parameter name.
    pub name: String,
    /// Parameter value.
    pub value: String,
}

impl CacheBuster {
    /// Create a marker.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Copy of `url` with the marker appended to its query.
    pub fn apply(&self, url: &Url) -> Url {
        let mut busted = url.clone();
        busted.query_pairs_mut().append_pair(&self.name, &self.value);
        busted
    }
}

impl Default for CacheBuster {
    fn default() -> Self {
        Self::new("c", "1")
    }
}

/// Everything the coordinator needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Attempt bound, backoff and retryable statuses.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Purge endpoint location.
    #[serde(default)]
    pub purge: PurgeConfig,
    /// Cache-busting marker for retry URLs.
    #[serde(default)]
    pub cache_buster: CacheBuster,
    /// Characters of each body kept for diagnostics.
    #[serde(default = "default_preview_len")]
    pub preview_len: usize,
}

fn default_preview_len() -> usize {
    BODY_PREVIEW_CHARS
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            purge: PurgeConfig::default(),
            cache_buster: CacheBuster::default(),
            preview_len: BODY_PREVIEW_CHARS,
        }
    }
}

/// Mutable state of one recovery loop.
#[derive(Debug)]
pub struct RetryState {
    attempt: u32,
    response: EdgeResponse,
}

impl RetryState {
    /// Start a loop holding the first response.
    pub fn new(response: EdgeResponse) -> Self {
        Self {
            attempt: 0,
            response,
        }
    }

    /// Retries performed so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Response under consideration.
    pub fn response(&self) -> &EdgeResponse {
        &self.response
    }

    /// Release the held response's body ahead of a re-fetch.
    fn drain_body(&mut self) {
        self.response.body = Vec::new();
    }

    fn advance(&mut self, response: EdgeResponse) {
        self.response = response;
        self.attempt += 1;
    }

    fn finish(self) -> Recovery {
        Recovery {
            response: self.response,
            attempts: self.attempt,
        }
    }
}

/// Final result of a recovery loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    /// Response to return to the client.
    pub response: EdgeResponse,
    /// Retries performed.
    pub attempts: u32,
}

/// Drives the retry-with-purge loop for one request.
pub struct ErrorRecoveryCoordinator<'a, T: ?Sized, D: ?Sized> {
    transport: &'a T,
    delay: &'a D,
    config: &'a RecoveryConfig,
    origin: Option<&'a OriginConfig>,
    logger: &'a StructuredLogger,
}

impl<'a, T, D> ErrorRecoveryCoordinator<'a, T, D>
where
    T: Transport + ?Sized,
    D: Delay + ?Sized,
{
    /// Create a coordinator.
    pub fn new(
        transport: &'a T,
        delay: &'a D,
        config: &'a RecoveryConfig,
        logger: &'a StructuredLogger,
    ) -> Self {
        Self {
            transport,
            delay,
            config,
            origin: None,
            logger,
        }
    }

    /// Send purges and re-fetches through `origin`.
    pub fn with_origin(mut self, origin: &'a OriginConfig) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Run the loop for `original`, starting from its first `response`.
    ///
    /// Purge failures are logged and ignored. A transport error on the
    /// re-fetch ends the loop with that error.
    pub async fn recover(
        &self,
        original: &EdgeRequest,
        response: EdgeResponse,
        timing: &mut TimingContext,
    ) -> Result<Recovery, FetchError> {
        let policy = &self.config.retry;
        let mut fetcher = CacheFetcher::new(self.transport);
        let mut purger = PurgeClient::new(self.transport, &self.config.purge, self.config.preview_len);
        if let Some(origin) = self.origin {
            fetcher = fetcher.with_origin(origin);
            purger = purger.with_origin(origin);
        }
        let mut state = RetryState::new(response);

        while policy.should_retry_status(state.response().status, state.attempt()) {
            let phase = LifecyclePhase::Retrying(state.attempt() + 1);
            timing.mark_phase(&phase);

            self.logger
                .error_builder("origin error hit")
                .field_i64("status", i64::from(state.response().status))
                .field_i64("attempt", i64::from(state.attempt() + 1))
                .field("body", state.response().body_preview(self.config.preview_len))
                .emit();
            state.drain_body();

            let backoff = policy.backoff.delay_for_attempt(state.attempt());
            self.delay.wait(backoff).await;

            let retry_url = self.config.cache_buster.apply(&original.url);
            self.logger
                .info_builder("retrying origin")
                .field("retry_url", retry_url.as_str())
                .duration_ms("backoff_ms", backoff)
                .emit();

            timing.mark("purge");
            let outcome = purger.purge(&original.url).await;
            let succeeded = outcome.is_success();
            match outcome {
                PurgeOutcome::Completed {
                    status,
                    body_preview,
                } => {
                    let entry = if succeeded {
                        self.logger.info_builder("purge completed")
                    } else {
                        self.logger.warn_builder("purge rejected")
                    };
                    entry
                        .field_i64("status", i64::from(status))
                        .field("body", body_preview)
                        .emit()
                }
                PurgeOutcome::Failed { reason } => self
                    .logger
                    .warn_builder("purge failed")
                    .field("error", reason)
                    .emit(),
            }

            timing.mark("refetch");
            let refetched = fetcher.fetch_url(retry_url, CacheMode::Default).await?;
            self.logger
                .info_builder("origin refetched")
                .field_i64("status", i64::from(refetched.status))
                .field("body", refetched.body_preview(self.config.preview_len))
                .emit();

            state.advance(refetched);
        }

        if state.attempt() > 0 && policy.is_retryable(state.response().status) {
            self.logger
                .warn_builder("retry budget exhausted")
                .field_i64("status", i64::from(state.response().status))
                .field_i64("attempts", i64::from(state.attempt()))
                .emit();
        }

        Ok(state.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::mock::{MockTransport, RecordingDelay};
    use crate::retry::{BackoffStrategy, RetryCondition};
    use edge_core::{Method, RequestId};
    use edge_observability::{LogLevel, LogSink};
    use futures::executor::block_on;

    const PURGE_PATH: &str = "/api/purgeCloudflareCache";

    fn request() -> EdgeRequest {
        EdgeRequest::new(Method::Get, "https://example.com/story?id=7").unwrap()
    }

    fn response(status: u16, body: &str) -> EdgeResponse {
        EdgeResponse::new(status, Vec::new(), body.as_bytes().to_vec())
    }

    fn run(
        transport: &MockTransport,
        delay: &RecordingDelay,
        config: &RecoveryConfig,
        first: EdgeResponse,
    ) -> (Result<Recovery, FetchError>, LogSink) {
        run_with_origin(transport, delay, config, &OriginConfig::default(), first)
    }

    fn run_with_origin(
        transport: &MockTransport,
        delay: &RecordingDelay,
        config: &RecoveryConfig,
        origin: &OriginConfig,
        first: EdgeResponse,
    ) -> (Result<Recovery, FetchError>, LogSink) {
        let sink = LogSink::memory();
        let logger =
            StructuredLogger::new(RequestId::from_string("test")).with_sink(sink.clone());
        let coordinator =
            ErrorRecoveryCoordinator::new(transport, delay, config, &logger).with_origin(origin);
        let mut timing = TimingContext::new();
        let result = block_on(coordinator.recover(&request(), first, &mut timing));
        (result, sink)
    }

    #[test]
    fn test_success_needs_no_recovery() {
        let transport = MockTransport::new();
        let delay = RecordingDelay::new();
        let config = RecoveryConfig::default();

        let (result, sink) = run(&transport, &delay, &config, response(200, "ok"));

        let recovery = result.unwrap();
        assert_eq!(recovery.attempts, 0);
        assert_eq!(recovery.response, response(200, "ok"));
        assert!(transport.requests().is_empty());
        assert!(delay.waits().is_empty());
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_other_errors_pass_through() {
        let transport = MockTransport::new();
        let delay = RecordingDelay::new();
        let config = RecoveryConfig::default();

        for status in [404, 502, 503] {
            let (result, _) = run(&transport, &delay, &config, response(status, "err"));
            assert_eq!(result.unwrap().response.status, status);
        }
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_500_then_200_retries_once() {
        let transport = MockTransport::new()
            .respond_to(PURGE_PATH, 200, "purged")
            .respond(200, "fresh page");
        let delay = RecordingDelay::new();
        let config = RecoveryConfig::default();

        let (result, _) = run(&transport, &delay, &config, response(500, "boom"));

        let recovery = result.unwrap();
        assert_eq!(recovery.attempts, 1);
        assert_eq!(recovery.response, response(200, "fresh page"));
        assert_eq!(delay.waits(), vec![Duration::from_secs(3)]);
        assert_eq!(transport.requests_to(PURGE_PATH).len(), 1);

        let refetches = transport.requests_except(PURGE_PATH);
        assert_eq!(refetches.len(), 1);
        assert_eq!(refetches[0].url.as_str(), "https://example.com/story?id=7&c=1");
        assert_eq!(refetches[0].method, Method::Get);
        assert_eq!(refetches[0].cache, CacheMode::Default);
    }

    #[test]
    fn test_purge_precedes_refetch() {
        let transport = MockTransport::new()
            .respond_to(PURGE_PATH, 200, "purged")
            .respond(200, "fresh");
        let delay = RecordingDelay::new();
        let config = RecoveryConfig::default();

        run(&transport, &delay, &config, response(522, ""));

        let paths: Vec<String> = transport
            .requests()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(paths, vec![PURGE_PATH.to_string(), "/story".to_string()]);

        let purge = &transport.requests_to(PURGE_PATH)[0];
        let target = purge.url.query_pairs().find(|(k, _)| k == "paths").unwrap().1;
        assert_eq!(target, "https://example.com/story?id=7");
    }

    #[test]
    fn test_two_522s_exhaust_budget() {
        let transport = MockTransport::new()
            .respond_to(PURGE_PATH, 200, "purged")
            .respond(522, "still down");
        let delay = RecordingDelay::new();
        let config = RecoveryConfig::default();

        let (result, sink) = run(&transport, &delay, &config, response(522, "down"));

        let recovery = result.unwrap();
        assert_eq!(recovery.attempts, 1);
        assert_eq!(recovery.response, response(522, "still down"));
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(delay.waits().len(), 1);

        let last = sink.entries().pop().unwrap();
        assert_eq!(last.message, "retry budget exhausted");
        assert_eq!(last.level, LogLevel::Warn);
    }

    #[test]
    fn test_purge_failure_does_not_block_retry() {
        let transport = MockTransport::new()
            .fail_to(PURGE_PATH, "connection reset")
            .respond(200, "fresh");
        let delay = RecordingDelay::new();
        let config = RecoveryConfig::default();

        let (result, sink) = run(&transport, &delay, &config, response(500, ""));

        assert_eq!(result.unwrap().response.status, 200);
        let warned = sink
            .entries()
            .into_iter()
            .any(|e| e.message == "purge failed" && e.level == LogLevel::Warn);
        assert!(warned);
    }

    #[test]
    fn test_purge_error_status_is_logged_as_warning() {
        let transport = MockTransport::new()
            .respond_to(PURGE_PATH, 403, "forbidden")
            .respond(200, "fresh");
        let delay = RecordingDelay::new();
        let config = RecoveryConfig::default();

        let (result, sink) = run(&transport, &delay, &config, response(500, ""));

        assert_eq!(result.unwrap().response.status, 200);
        let rejected = sink
            .entries()
            .into_iter()
            .find(|e| e.message == "purge rejected")
            .unwrap();
        assert_eq!(rejected.level, LogLevel::Warn);
        assert_eq!(rejected.field("status"), Some(&serde_json::json!(403)));
    }

    #[test]
    fn test_origin_receives_purge_and_refetch() {
        let transport = MockTransport::new()
            .respond_to(PURGE_PATH, 200, "purged")
            .respond(200, "fresh");
        let delay = RecordingDelay::new();
        let config = RecoveryConfig::default();
        let origin = OriginConfig::default()
            .with_base_url(Url::parse("http://origin.internal:8080").unwrap());

        run_with_origin(&transport, &delay, &config, &origin, response(500, ""));

        let purge = &transport.requests_to(PURGE_PATH)[0];
        assert_eq!(purge.url.host_str(), Some("origin.internal"));
        let target = purge.url.query_pairs().find(|(k, _)| k == "paths").unwrap().1;
        assert_eq!(target, "https://example.com/story?id=7");

        let refetch = &transport.requests_except(PURGE_PATH)[0];
        assert_eq!(refetch.url.as_str(), "http://origin.internal:8080/story?id=7&c=1");
    }

    #[test]
    fn test_refetch_transport_error_propagates() {
        let transport = MockTransport::new()
            .respond_to(PURGE_PATH, 200, "purged")
            .fail("origin unreachable");
        let delay = RecordingDelay::new();
        let config = RecoveryConfig::default();

        let (result, _) = run(&transport, &delay, &config, response(500, ""));

        assert!(matches!(result, Err(FetchError::Transport { .. })));
    }

    #[test]
    fn test_configured_budget_and_statuses() {
        let transport = MockTransport::new()
            .respond_to(PURGE_PATH, 200, "purged")
            .respond_to(PURGE_PATH, 200, "purged")
            .respond(503, "again")
            .respond(503, "still");
        let delay = RecordingDelay::new();
        let config = RecoveryConfig {
            retry: RetryPolicy::new(2)
                .with_conditions(vec![RetryCondition::StatusCode(503)])
                .with_backoff(BackoffStrategy::None),
            cache_buster: CacheBuster::new("bust", "x"),
            ..RecoveryConfig::default()
        };

        let (result, _) = run(&transport, &delay, &config, response(503, ""));

        let recovery = result.unwrap();
        assert_eq!(recovery.attempts, 2);
        assert_eq!(recovery.response, response(503, "still"));
        assert_eq!(delay.waits(), vec![Duration::ZERO, Duration::ZERO]);
        for refetch in transport.requests_except(PURGE_PATH) {
            assert_eq!(refetch.url.as_str(), "https://example.com/story?id=7&bust=x");
        }
    }

    #[test]
    fn test_error_body_is_logged_as_preview() {
        let transport = MockTransport::new()
            .respond_to(PURGE_PATH, 200, "purged")
            .respond(200, "fresh");
        let delay = RecordingDelay::new();
        let config = RecoveryConfig {
            preview_len: 4,
            ..RecoveryConfig::default()
        };

        let (_, sink) = run(&transport, &delay, &config, response(500, "stack trace here"));

        let hit = &sink.entries()[0];
        assert_eq!(hit.message, "origin error hit");
        assert_eq!(hit.field("body"), Some(&serde_json::json!("stac")));
        assert_eq!(hit.field("status"), Some(&serde_json::json!(500)));
    }

    #[test]
    fn test_cache_buster_appends_to_existing_query() {
        let buster = CacheBuster::default();
        let plain = Url::parse("https://example.com/a").unwrap();
        assert_eq!(buster.apply(&plain).as_str(), "https://example.com/a?c=1");

        let with_query = Url::parse("https://example.com/a?x=1").unwrap();
        assert_eq!(buster.apply(&with_query).as_str(), "https://example.com/a?x=1&c=1");
        assert_eq!(with_query.as_str(), "https://example.com/a?x=1");
    }
}
