use crate::{
    config::Credentials,
    error::AvatarError,
    media::is_data_url,
    models::{GenerationRequest, HealthResponse, ProxyGenerateRequest, ProxyGenerateResponse},
    server::AppState,
};
use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

#[get("/healthz")]
pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("ok")
}

#[get("/api/health")]
pub async fn api_health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::new(state.config.credentials.has_key()))
}

pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    match &state.index_html {
        Some(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html.clone()),
        None => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body("ok"),
    }
}

/// Relays one generation request upstream, pinning server credentials when
/// the deployment has them.
#[post("/api/generate")]
pub async fn generate(
    state: web::Data<AppState>,
    body: web::Json<ProxyGenerateRequest>,
) -> Result<HttpResponse, AvatarError> {
    let request_id = Uuid::new_v4();
    let body = body.into_inner();

    let client_credentials = Credentials {
        api_key: body.api_key,
        api_base: body.api_base,
    };
    let request = GenerationRequest::new(
        body.prompt.unwrap_or_default(),
        body.image_reference.unwrap_or_default(),
        state.config.credentials.overlay(&client_credentials),
    );

    if let Err(e) = request.require_complete() {
        log::warn!("[req:{}] rejected: missing required fields", request_id);
        return Err(e);
    }

    log::info!(
        "[req:{}] relaying generation (server key: {}, reference: {})",
        request_id,
        state.config.credentials.has_key(),
        if is_data_url(&request.image_reference) { "inline" } else { "url" }
    );

    match state.images.generate(&request).await {
        Ok(image_data_url) => {
            log::info!("[req:{}] generation succeeded", request_id);
            Ok(HttpResponse::Ok().json(ProxyGenerateResponse { image_data_url }))
        }
        Err(e) => {
            log::error!("[req:{}] generation failed: {}", request_id, e);
            Err(e)
        }
    }
}
