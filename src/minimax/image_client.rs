use crate::{
    error::{AvatarError, Result},
    media::png_data_url,
    models::{
        GenerationRequest, ImageGenerationPayload, SubjectReference, ASPECT_RATIO, IMAGE_MODEL,
        RESPONSE_FORMAT, SUBJECT_TYPE,
    },
};
use reqwest::Client;
use serde_json::Value;

pub const MISSING_IMAGE_MESSAGE: &str = "MiniMax response missing image output";

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
}

impl ImageClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn endpoint(api_base: &str) -> String {
        format!("{}/image_generation", api_base.trim_end_matches('/'))
    }

    /// The single place the upstream body is assembled; the relay handler and
    /// the direct fallback both go through here.
    pub fn build_payload(prompt: &str, image_reference: &str) -> ImageGenerationPayload {
        ImageGenerationPayload {
            model: IMAGE_MODEL,
            prompt: prompt.to_string(),
            aspect_ratio: ASPECT_RATIO,
            response_format: RESPONSE_FORMAT,
            subject_reference: vec![SubjectReference {
                kind: SUBJECT_TYPE,
                image_file: image_reference.to_string(),
            }],
        }
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let (api_key, api_base) = request.require_complete()?;
        let endpoint = Self::endpoint(api_base);
        let payload = Self::build_payload(&request.prompt, &request.image_reference);

        log::info!("Generating image with model {} via {}", IMAGE_MODEL, endpoint);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let raw = response.text().await?;
        let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

        interpret_response(status, &body)
    }
}

/// Maps a finished upstream exchange to an image reference or a typed failure.
pub fn interpret_response(status: u16, body: &Value) -> Result<String> {
    if !(200..300).contains(&status) {
        let err = upstream_failure(status, body);
        log::warn!("Upstream returned HTTP {}: {}", status, err);
        return Err(err);
    }

    match normalize_response(body) {
        Ok(image) => Ok(image),
        Err(err) => match api_status_code(body) {
            Some(code) if code != 0 => {
                let message = status_message(body).unwrap_or_else(|| format!("API error {}", code));
                log::warn!("Upstream reported API error {}: {}", code, message);
                Err(AvatarError::Upstream {
                    status,
                    api_code: Some(code),
                    message,
                })
            }
            _ => Err(err),
        },
    }
}

/// Picks the image out of `data`, in order: base64 array, base64 string,
/// hosted URL array, hosted URL.
pub fn normalize_response(body: &Value) -> Result<String> {
    let data = body
        .get("data")
        .filter(|data| data.is_object())
        .ok_or_else(|| AvatarError::MalformedResponse(MISSING_IMAGE_MESSAGE.into()))?;

    if let Some(b64) = first_string(data.get("image_base64")) {
        return Ok(png_data_url(b64));
    }
    if let Some(url) = first_string(data.get("image_urls")) {
        return Ok(url.to_string());
    }
    if let Some(url) = first_string(data.get("image_url")) {
        return Ok(url.to_string());
    }

    Err(AvatarError::MalformedResponse(MISSING_IMAGE_MESSAGE.into()))
}

fn first_string(value: Option<&Value>) -> Option<&str> {
    let s = match value? {
        Value::Array(items) => items.first()?.as_str()?,
        Value::String(s) => s.as_str(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn status_message(body: &Value) -> Option<String> {
    body.pointer("/base_resp/status_msg")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .filter(|msg| !msg.is_empty())
        .map(String::from)
}

fn api_status_code(body: &Value) -> Option<i64> {
    body.pointer("/base_resp/status_code").and_then(Value::as_i64)
}

pub fn upstream_failure(status: u16, body: &Value) -> AvatarError {
    AvatarError::Upstream {
        status,
        api_code: api_status_code(body).filter(|code| *code != 0),
        message: status_message(body).unwrap_or_else(|| format!("HTTP {}", status)),
    }
}
