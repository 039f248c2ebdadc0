//! Workload configuration.

use edge_sdk::edge_cache::CampaignPolicy;
use edge_sdk::edge_data::{OriginConfig, RecoveryConfig};
use edge_sdk::edge_observability::LogLevel;
use serde::{Deserialize, Serialize};
use url::Url;

/// Workload name attached to every log entry.
pub const WORKLOAD_NAME: &str = "edm-cache";

/// Complete handler configuration.
///
/// `EdgeConfig::default()` holds the compiled-in constants. The deployed
/// component only adds the origin server address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// EDM detection and cache TTL.
    #[serde(default)]
    pub campaign: CampaignPolicy,
    /// Retry, purge and cache-busting settings.
    #[serde(default)]
    pub recovery: RecoveryConfig,
    /// Origin server that fetches and purges are routed to.
    #[serde(default)]
    pub origin: OriginConfig,
    /// Least severe level written to the log.
    #[serde(default)]
    pub log_level: LogLevel,
}

impl EdgeConfig {
    /// Route origin traffic to `origin_url`.
    pub fn with_origin_url(mut self, origin_url: &str) -> Result<Self, url::ParseError> {
        self.origin = self.origin.with_base_url(Url::parse(origin_url)?);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use edge_sdk::edge_cache::DEFAULT_EDM_PARAMS;
    use edge_sdk::edge_data::{BackoffStrategy, RetryCondition};

    #[test]
    fn test_defaults_match_deployed_constants() {
        let config = EdgeConfig::default();

        assert_eq!(
            config.campaign.required_params.names().collect::<Vec<_>>(),
            DEFAULT_EDM_PARAMS
        );
        assert_eq!(config.campaign.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.recovery.retry.max_attempts, 1);
        assert_eq!(
            config.recovery.retry.backoff,
            BackoffStrategy::Fixed {
                delay: Duration::from_secs(3)
            }
        );
        assert_eq!(
            config.recovery.retry.retry_on,
            vec![RetryCondition::StatusCode(500), RetryCondition::StatusCode(522)]
        );
        assert_eq!(config.recovery.cache_buster.name, "c");
        assert_eq!(config.recovery.cache_buster.value, "1");
        assert_eq!(config.recovery.purge.path, "/api/purgeCloudflareCache");
        assert_eq!(config.recovery.preview_len, 100);
        assert_eq!(config.origin.base_url, None);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_with_origin_url() {
        let config = EdgeConfig::default()
            .with_origin_url("http://origin.internal:8080")
            .unwrap();
        assert_eq!(
            config.origin.base_url.map(|u| u.to_string()).as_deref(),
            Some("http://origin.internal:8080/")
        );

        assert!(EdgeConfig::default().with_origin_url("origin.internal").is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "recovery": { "purge": { "host": "purge.example.net" } },
            "origin": { "base_url": "https://origin.example.net" }
        }"#;
        let config: EdgeConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.recovery.purge.host.as_deref(), Some("purge.example.net"));
        assert_eq!(config.recovery.purge.param, "paths");
        assert_eq!(
            config.origin.base_url.as_ref().and_then(|u| u.host_str()),
            Some("origin.example.net")
        );
        assert_eq!(config.campaign, EdgeConfig::default().campaign);
        assert_eq!(config.recovery.retry, EdgeConfig::default().recovery.retry);
    }
}
