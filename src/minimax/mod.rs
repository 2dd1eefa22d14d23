pub mod image_client;

use crate::error::{AvatarError, Result};
use reqwest::Client;
use std::time::Duration;

pub use image_client::{interpret_response, normalize_response, ImageClient};

/// Builds the outbound HTTP client with an explicit request timeout.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AvatarError::Config(format!("Failed to build HTTP client: {}", e)))
}
