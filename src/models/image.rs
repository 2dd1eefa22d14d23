use crate::config::Credentials;
use crate::error::{AvatarError, Result};
use serde::{Deserialize, Serialize};

pub const IMAGE_MODEL: &str = "image-01";
pub const ASPECT_RATIO: &str = "1:1";
pub const RESPONSE_FORMAT: &str = "base64";
pub const SUBJECT_TYPE: &str = "character";

/// One logical generation call, independent of which route carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image_reference: String,
    pub credentials: Credentials,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        image_reference: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            image_reference: image_reference.into(),
            credentials,
        }
    }

    /// Returns `(api_key, api_base)` once every required field is present.
    pub fn require_complete(&self) -> Result<(&str, &str)> {
        match (
            self.credentials.api_key.as_deref(),
            self.credentials.api_base.as_deref(),
        ) {
            (Some(key), Some(base))
                if !self.prompt.trim().is_empty() && !self.image_reference.trim().is_empty() =>
            {
                Ok((key, base))
            }
            _ => Err(AvatarError::Validation(
                "Missing required fields. Provide prompt/image reference, plus API base and key (or set MINIMAX_API_KEY/MINIMAX_API_BASE on server).".into(),
            )),
        }
    }
}

/// Body of `POST {apiBase}/image_generation`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationPayload {
    pub model: &'static str,
    pub prompt: String,
    pub aspect_ratio: &'static str,
    pub response_format: &'static str,
    pub subject_reference: Vec<SubjectReference>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectReference {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub image_file: String,
}

/// Outcome of one style in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationResult {
    Succeeded { image: String },
    Failed { reason: String },
}

impl GenerationResult {
    pub fn image(&self) -> Option<&str> {
        match self {
            GenerationResult::Succeeded { image } => Some(image),
            GenerationResult::Failed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Succeeded { .. })
    }
}

/// Wire shape the relay endpoint accepts; mirrors the browser client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyGenerateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub image_reference: Option<String>,
}

impl From<&GenerationRequest> for ProxyGenerateRequest {
    fn from(request: &GenerationRequest) -> Self {
        ProxyGenerateRequest {
            api_key: request.credentials.api_key.clone(),
            api_base: request.credentials.api_base.clone(),
            prompt: Some(request.prompt.clone()),
            image_reference: Some(request.image_reference.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyGenerateResponse {
    pub image_data_url: String,
}
