//! Per-request composition of classification, normalization, fetch and
//! error recovery.

use edge_sdk::prelude::*;

use crate::config::{EdgeConfig, WORKLOAD_NAME};

/// Timed spans reported on completion: field name, opening mark, closing mark.
const PHASE_SPANS: [(&str, &str, &str); 3] = [
    ("origin_fetch_ms", "origin_fetch", "fetched"),
    ("purge_ms", "purge", "refetch"),
    ("refetch_ms", "refetch", "completion"),
];

/// Entry point for one inbound request.
///
/// Holds only immutable configuration and its collaborators, so concurrent
/// invocations share nothing mutable.
pub struct EdgeHandler<T, D> {
    config: EdgeConfig,
    classifier: RequestClassifier,
    transport: T,
    delay: D,
    sink: LogSink,
}

impl<T: Transport, D: Delay> EdgeHandler<T, D> {
    /// Create a handler.
    pub fn new(config: EdgeConfig, transport: T, delay: D) -> Self {
        let classifier = config.campaign.classifier();
        Self {
            config,
            classifier,
            transport,
            delay,
            sink: LogSink::default(),
        }
    }

    /// Route log output to `sink`.
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.sink = sink;
        self
    }

    /// The transport in use.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The delay in use.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Handle one request and produce exactly one response.
    pub async fn handle(&self, request: &EdgeRequest) -> Result<EdgeResponse, FetchError> {
        let logger = StructuredLogger::new(request.request_id.clone())
            .with_workload(WORKLOAD_NAME)
            .with_url(request.url.as_str())
            .with_min_level(self.config.log_level)
            .with_sink(self.sink.clone());
        let mut timing = TimingContext::new();
        timing.mark_phase(&LifecyclePhase::Start);
        let fetcher = CacheFetcher::new(&self.transport).with_origin(&self.config.origin);

        // Bodies cannot be replayed, so these get a single untouched fetch.
        if request.has_body() {
            logger
                .info_builder("forwarding body-bearing request")
                .field("method", request.method.as_str())
                .emit();
            timing.mark("origin_fetch");
            return fetcher.fetch_passthrough(request).await;
        }

        let class = self.classifier.classify(&request.url);
        timing.mark_phase(&LifecyclePhase::Classified);
        logger
            .info_builder("request classified")
            .field("class", class.name())
            .emit();

        let response = match class {
            RequestClass::Edm => {
                let normalized = normalize(&request.url);
                if let Some(location) = normalized.redirect_location(&request.url) {
                    timing.mark_phase(&LifecyclePhase::Redirected);
                    logger
                        .info_builder("redirecting to slashless url")
                        .field("location", location.as_str())
                        .emit();
                    return Ok(EdgeResponse::moved_permanently(location));
                }

                let directive =
                    CacheDirective::new(normalized.into_cache_key(), self.config.campaign.cache_ttl);
                logger
                    .debug_builder("fetching normalized url")
                    .field("cache_key", directive.key.as_str())
                    .field_i64("ttl_secs", directive.ttl.as_secs() as i64)
                    .emit();
                timing.mark("origin_fetch");
                fetcher.fetch_cached(&directive).await?
            }
            RequestClass::Passthrough => {
                timing.mark("origin_fetch");
                fetcher.fetch_passthrough(request).await?
            }
        };
        timing.mark_phase(&LifecyclePhase::Fetched);

        let coordinator = ErrorRecoveryCoordinator::new(
            &self.transport,
            &self.delay,
            &self.config.recovery,
            &logger,
        )
        .with_origin(&self.config.origin);
        let recovery = coordinator.recover(request, response, &mut timing).await?;
        timing.mark_phase(&LifecyclePhase::Completion);

        let mut entry = logger
            .info_builder("request completed")
            .field_i64("status", i64::from(recovery.response.status))
            .field_i64("retries", i64::from(recovery.attempts))
            .duration_ms("elapsed_ms", timing.elapsed());
        for (field, from, to) in PHASE_SPANS {
            if let Some(span) = timing.between(from, to) {
                entry = entry.duration_ms(field, span);
            }
        }
        entry.emit();

        Ok(recovery.response)
    }
}
