//! Four professional headshots from one photo.
//!
//! [`minimax::ImageClient`] talks to the MiniMax `image-01` endpoint,
//! [`server`] is the relay that pins server-side credentials, and
//! [`orchestrator::Orchestrator`] walks the style catalog with per-style
//! retries and a relay-to-direct fallback.

pub mod config;
pub mod error;
pub mod logger;
pub mod media;
pub mod minimax;
pub mod models;
pub mod orchestrator;
#[cfg(feature = "server")]
pub mod server;

pub use config::{ApiRegion, Config, Credentials, RetryPolicy};
pub use error::{AvatarError, Result};
pub use minimax::ImageClient;
pub use models::{GenerationRequest, GenerationResult, StyleDescriptor, STYLE_CATALOG};
pub use orchestrator::{
    BatchReport, BatchSession, DirectRoute, GenerationRoute, ImageSource, Orchestrator,
    ProxyRoute, RouteKind,
};
