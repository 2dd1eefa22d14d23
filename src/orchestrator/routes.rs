use crate::{
    error::{AvatarError, Result},
    minimax::ImageClient,
    models::{GenerationRequest, ProxyGenerateRequest},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Proxy,
    Direct,
}

/// One way of carrying a [`GenerationRequest`] to the image model.
#[async_trait]
pub trait GenerationRoute: Send + Sync {
    fn kind(&self) -> RouteKind;

    /// Returns a normalized image reference (data URL or hosted URL).
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Posts to a relay server's `/api/generate`.
pub struct ProxyRoute {
    client: Client,
    endpoint: String,
}

impl ProxyRoute {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationRoute for ProxyRoute {
    fn kind(&self) -> RouteKind {
        RouteKind::Proxy
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        log::debug!("Relaying generation request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ProxyGenerateRequest::from(request))
            .send()
            .await?;

        let status = response.status().as_u16();
        let raw = response.text().await?;
        let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

        interpret_relay_response(status, &body)
    }
}

pub fn interpret_relay_response(status: u16, body: &Value) -> Result<String> {
    if (200..300).contains(&status) {
        return body
            .get("imageDataUrl")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                AvatarError::MalformedResponse("No image returned from local generation API.".into())
            });
    }

    let message = body
        .get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .filter(|msg| !msg.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {}", status));

    Err(match status {
        404 => AvatarError::NotFound(message),
        400 => AvatarError::Validation(message),
        413 => AvatarError::PayloadTooLarge(message),
        _ => match body.get("retryable").and_then(Value::as_bool) {
            Some(retryable) => AvatarError::Relay {
                status,
                message,
                retryable,
            },
            None => AvatarError::upstream(status, message),
        },
    })
}

/// Calls the upstream API straight from the caller, with the caller's own
/// credentials.
pub struct DirectRoute {
    images: ImageClient,
}

impl DirectRoute {
    pub fn new(images: ImageClient) -> Self {
        Self { images }
    }
}

#[async_trait]
impl GenerationRoute for DirectRoute {
    fn kind(&self) -> RouteKind {
        RouteKind::Direct
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.images.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relay_success() {
        let body = json!({"imageDataUrl": "data:image/png;base64,AAA"});
        assert_eq!(
            interpret_relay_response(200, &body).unwrap(),
            "data:image/png;base64,AAA"
        );
        assert!(matches!(
            interpret_relay_response(200, &json!({"imageDataUrl": ""})),
            Err(AvatarError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_relay_not_found_triggers_fallback() {
        let err = interpret_relay_response(404, &Value::Null).unwrap_err();
        assert!(err.is_endpoint_unavailable());
        assert_eq!(err.to_string(), "Not found: HTTP 404");
    }

    #[test]
    fn test_relay_validation_is_final() {
        let err = interpret_relay_response(400, &json!({"error": "Missing required fields."})).unwrap_err();
        assert!(!err.is_transient());
        assert!(!err.is_endpoint_unavailable());
        assert_eq!(err.to_string(), "Missing required fields.");
    }

    #[test]
    fn test_relay_retryable_flag_wins_over_status() {
        let err = interpret_relay_response(
            502,
            &json!({"error": "MiniMax response missing image output", "retryable": false}),
        )
        .unwrap_err();
        assert!(!err.is_transient());

        let err = interpret_relay_response(502, &json!({"error": "rate limit", "retryable": true})).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_foreign_relay_falls_back_to_status_class() {
        assert!(interpret_relay_response(503, &Value::Null).unwrap_err().is_transient());
        assert!(!interpret_relay_response(401, &Value::Null).unwrap_err().is_transient());
    }

    #[test]
    fn test_proxy_endpoint() {
        let route = ProxyRoute::new(Client::new(), "http://127.0.0.1:5000/");
        assert_eq!(route.endpoint(), "http://127.0.0.1:5000/api/generate");
        assert_eq!(route.kind(), RouteKind::Proxy);
    }
}
