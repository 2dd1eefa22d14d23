use crate::{error::AvatarError, minimax::image_client::MISSING_IMAGE_MESSAGE, models::ErrorBody};
use actix_web::{
    error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError,
};

impl AvatarError {
    /// The message a browser sees; upstream text is passed through verbatim.
    fn public_message(&self) -> String {
        match self {
            AvatarError::MalformedResponse(_) => MISSING_IMAGE_MESSAGE.to_string(),
            AvatarError::Config(_) | AvatarError::Serialization(_) | AvatarError::Io(_) => {
                "Unexpected server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AvatarError {
    fn status_code(&self) -> StatusCode {
        match self {
            AvatarError::Validation(_) => StatusCode::BAD_REQUEST,
            AvatarError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AvatarError::Upstream { .. }
            | AvatarError::Relay { .. }
            | AvatarError::MalformedResponse(_)
            | AvatarError::Network(_) => StatusCode::BAD_GATEWAY,
            AvatarError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AvatarError::NotFound(_) => StatusCode::NOT_FOUND,
            AvatarError::Forbidden(_) => StatusCode::FORBIDDEN,
            AvatarError::Config(_) | AvatarError::Serialization(_) | AvatarError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.public_message(),
            retryable: Some(self.is_transient()),
        })
    }
}

/// Turns extractor failures on `/api/generate` into the same JSON error shape.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let mapped = match &err {
        JsonPayloadError::OverflowKnownLength { length, limit } => AvatarError::PayloadTooLarge(
            format!("Request body too large ({} bytes, limit {})", length, limit),
        ),
        JsonPayloadError::Overflow { limit } => {
            AvatarError::PayloadTooLarge(format!("Request body too large (limit {} bytes)", limit))
        }
        _ => AvatarError::Validation("Invalid JSON body".to_string()),
    };
    log::warn!("Rejected {} {}: {}", req.method(), req.path(), err);
    mapped.into()
}
