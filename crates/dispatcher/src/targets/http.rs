//! HttpTarget - POSTs the shaped payload as JSON

use std::collections::HashMap;
use std::time::Duration;

use contracts::{DeliveryTarget, RelayError};
use serde_json::Value;
use tracing::{debug, instrument};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for HttpTarget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTargetConfig {
    pub url: String,
    /// Per-request timeout, covers connect and body
    pub timeout: Duration,
}

impl HttpTargetConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let url = params
            .get("url")
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| "missing 'url' parameter".to_string())?
            .clone();

        let timeout_ms = match params.get("timeout_ms") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| format!("invalid timeout_ms '{}': {}", raw, e))?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            url,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Target that invokes a downstream HTTP endpoint
pub struct HttpTarget {
    name: String,
    config: HttpTargetConfig,
    client: reqwest::Client,
}

impl HttpTarget {
    pub fn new(name: impl Into<String>, config: HttpTargetConfig) -> Result<Self, RelayError> {
        let name = name.into();
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::target_connection(&name, e.to_string()))?;

        debug!(target_name = %name, url = %config.url, "HttpTarget ready");
        Ok(Self {
            name,
            config,
            client,
        })
    }

    /// Create from params map
    pub fn from_params(name: &str, params: &HashMap<String, String>) -> Result<Self, RelayError> {
        let config = HttpTargetConfig::from_params(params)
            .map_err(|e| RelayError::config_validation(format!("targets[{name}].params"), e))?;
        Self::new(name, config)
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

impl DeliveryTarget for HttpTarget {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_target_deliver",
        skip(self, payload),
        fields(target_name = %self.name, url = %self.config.url)
    )]
    async fn deliver(&self, payload: &Value) -> Result<(), RelayError> {
        let response = self
            .client
            .post(&self.config.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RelayError::target_connection(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::target_delivery(
                &self.name,
                format!("downstream answered {status}"),
            ));
        }

        debug!(target_name = %self.name, %status, "Downstream accepted payload");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params(url: &str) -> HashMap<String, String> {
        HashMap::from([("url".to_string(), url.to_string())])
    }

    #[test]
    fn test_config_defaults() {
        let config = HttpTargetConfig::from_params(&params("http://localhost:1/x")).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_config_requires_url() {
        let err = HttpTargetConfig::from_params(&HashMap::new()).unwrap_err();
        assert!(err.contains("url"));
    }

    #[test]
    fn test_config_rejects_bad_timeout() {
        let mut p = params("http://localhost:1/x");
        p.insert("timeout_ms".into(), "fast".into());
        assert!(HttpTargetConfig::from_params(&p).is_err());
    }

    #[tokio::test]
    async fn test_deliver_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/invoke"))
            .and(body_json(json!({ "body": { "wo": 42 } })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let target =
            HttpTarget::from_params("acumatica", &params(&format!("{}/invoke", server.uri())))
                .unwrap();
        target
            .deliver(&json!({ "body": { "wo": 42 } }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let target = HttpTarget::from_params("netsuite", &params(&server.uri())).unwrap();
        let err = target.deliver(&json!({})).await.unwrap_err();
        assert!(matches!(err, RelayError::TargetDelivery { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let mut p = params(&server.uri());
        p.insert("timeout_ms".into(), "50".into());
        let target = HttpTarget::from_params("slow", &p).unwrap();
        assert!(target.deliver(&json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_is_connection_failure() {
        let target = HttpTarget::from_params("gone", &params("http://127.0.0.1:9/")).unwrap();
        let err = target.deliver(&json!({})).await.unwrap_err();
        assert!(matches!(err, RelayError::TargetConnection { .. }));
    }
}
