// src/gateway/transport.rs — Live HTTP transport for the gateway

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Service, ServiceRequest, ServiceTransport};
use crate::infra::config::GatewayConfig;
use crate::infra::errors::AtelierError;

/// Plain request/response JSON contract against the compliance and
/// optimizer services. Per-call timeouts are enforced by the gateway.
pub struct HttpServiceTransport {
    client: reqwest::Client,
    compliance_url: String,
    optimizer_url: String,
}

impl HttpServiceTransport {
    pub fn new(compliance_url: impl Into<String>, optimizer_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            compliance_url: compliance_url.into(),
            optimizer_url: optimizer_url.into(),
        }
    }

    /// Build from config; None when either URL is missing, in which case
    /// the gateway runs mock-only.
    pub fn from_config(config: &GatewayConfig) -> Option<Self> {
        match (&config.compliance_url, &config.optimizer_url) {
            (Some(c), Some(o)) => Some(Self::new(c, o)),
            _ => None,
        }
    }

    fn url_for(&self, service: Service) -> &str {
        match service {
            Service::ComplianceCheck => &self.compliance_url,
            Service::Optimize => &self.optimizer_url,
        }
    }
}

#[async_trait]
impl ServiceTransport for HttpServiceTransport {
    async fn call(
        &self,
        service: Service,
        request: &ServiceRequest,
    ) -> Result<Value, AtelierError> {
        let unavailable = |message: String| AtelierError::ServiceUnavailable {
            service: service.as_str().to_string(),
            message,
        };

        let response = self
            .client
            .post(self.url_for(service))
            .json(&json!({
                "city": request.city,
                "params": request.params,
            }))
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status.as_u16())));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| unavailable(format!("malformed response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_both_urls() {
        let mut config = GatewayConfig::default();
        assert!(HttpServiceTransport::from_config(&config).is_none());

        config.compliance_url = Some("http://localhost:9001/check".into());
        assert!(HttpServiceTransport::from_config(&config).is_none());

        config.optimizer_url = Some("http://localhost:9002/optimize".into());
        assert!(HttpServiceTransport::from_config(&config).is_some());
    }

    #[tokio::test]
    async fn test_unreachable_service_errors() {
        let transport = HttpServiceTransport::new("http://127.0.0.1:1", "http://127.0.0.1:1");
        let err = transport
            .call(
                Service::ComplianceCheck,
                &ServiceRequest {
                    city: None,
                    params: json!({}),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AtelierError::ServiceUnavailable { .. }));
    }
}
