use crate::{
    config::Credentials,
    error::{AvatarError, Result},
    media::{encode_data_url, mime_for_path, MAX_UPLOAD_BYTES},
    models::{GenerationResult, StyleDescriptor},
    orchestrator::routes::RouteKind,
};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

/// Where the identity photo for a batch comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    RemoteUrl(String),
    Upload { bytes: Vec<u8>, mime: String },
}

impl ImageSource {
    pub fn remote(url: impl Into<String>) -> Result<Self> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(AvatarError::Validation("Reference image URL is empty".into()));
        }
        Ok(ImageSource::RemoteUrl(url))
    }

    pub fn upload(bytes: Vec<u8>, mime: impl Into<String>) -> Result<Self> {
        let mime = mime.into();
        if !mime.starts_with("image/") {
            return Err(AvatarError::Validation("Please upload an image file.".into()));
        }
        check_upload_size(bytes.len() as u64)?;
        Ok(ImageSource::Upload { bytes, mime })
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        check_upload_size(metadata.len())?;
        let bytes = tokio::fs::read(path).await?;
        Self::upload(bytes, mime_for_path(path))
    }

    /// The value sent as `subject_reference[0].image_file`.
    pub fn to_reference(&self) -> String {
        match self {
            ImageSource::RemoteUrl(url) => url.clone(),
            ImageSource::Upload { bytes, mime } => encode_data_url(mime, bytes),
        }
    }
}

fn check_upload_size(len: u64) -> Result<()> {
    if len > MAX_UPLOAD_BYTES as u64 {
        return Err(AvatarError::PayloadTooLarge(
            "Image is too large. Please use a file under 12 MB.".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleOutcome {
    pub style: &'static StyleDescriptor,
    pub result: GenerationResult,
    pub route: RouteKind,
    pub attempts: u32,
}

/// Everything one batch run owns: the resolved reference, the caller's
/// credentials, and the progress shown to the user.
#[derive(Debug)]
pub struct BatchSession {
    id: Uuid,
    image_reference: String,
    credentials: Credentials,
    status: String,
    total: usize,
    outcomes: Vec<StyleOutcome>,
}

impl BatchSession {
    pub fn new(image_reference: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_reference: image_reference.into(),
            credentials,
            status: "Preparing...".to_string(),
            total: 0,
            outcomes: Vec::new(),
        }
    }

    /// Resolves the source once; every style reuses the same reference.
    pub fn from_source(source: &ImageSource, credentials: Credentials) -> Self {
        Self::new(source.to_reference(), credentials)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn image_reference(&self) -> &str {
        &self.image_reference
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn outcomes(&self) -> &[StyleOutcome] {
        &self.outcomes
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.outcomes.len() as f64 / self.total as f64) * 100.0).round() as u8
    }

    pub(crate) fn begin(&mut self, total: usize) {
        self.total = total;
        self.outcomes.clear();
        self.set_status("Starting AI generation...");
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        log::info!("[batch {}] {}", short_id(&self.id), self.status);
    }

    pub(crate) fn record(&mut self, outcome: StyleOutcome) {
        let label = outcome.style.label;
        self.outcomes.push(outcome);
        let pct = self.percent();
        self.set_status(format!("{} done ({}%)", label, pct));
    }

    pub fn report(&self, elapsed_ms: u64) -> BatchReport {
        BatchReport {
            batch_id: self.id,
            outcomes: self.outcomes.clone(),
            elapsed_ms,
        }
    }
}

fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub outcomes: Vec<StyleOutcome>,
    pub elapsed_ms: u64,
}

impl BatchReport {
    /// `"<Label>: <reason>"` for every failed style, in catalog order.
    pub fn failures(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                GenerationResult::Failed { reason } => {
                    Some(format!("{}: {}", outcome.style.label, reason))
                }
                GenerationResult::Succeeded { .. } => None,
            })
            .collect()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&'static StyleDescriptor, &str)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.image().map(|image| (outcome.style, image)))
    }

    pub fn all_failed(&self) -> bool {
        self.outcomes.iter().all(|outcome| !outcome.result.is_success())
    }

    pub fn status_line(&self) -> String {
        match self.failures().len() {
            0 => "Done. Compare and download your AI avatars.".to_string(),
            n => format!("Completed with {} failed style(s).", n),
        }
    }

    pub fn failure_notice(&self) -> Option<String> {
        let failures = self.failures();
        if failures.is_empty() {
            return None;
        }
        Some(format!("Some styles failed:\n- {}", failures.join("\n- ")))
    }
}
