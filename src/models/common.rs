use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "professional-avatar-creator";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub app: String,
    pub server_key_configured: bool,
}

impl HealthResponse {
    pub fn new(server_key_configured: bool) -> Self {
        Self {
            ok: true,
            app: APP_NAME.to_string(),
            server_key_configured,
        }
    }
}

/// JSON error body returned by every `/api` route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}
