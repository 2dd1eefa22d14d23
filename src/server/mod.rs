pub mod handlers;
pub mod response;
pub mod static_files;

use crate::{config::Config, error::Result, minimax::{http_client, ImageClient}};
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware, web, App, HttpServer,
};

/// Shared, read-only state for every worker.
pub struct AppState {
    pub config: Config,
    pub images: ImageClient,
    pub index_html: Option<Vec<u8>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let images = ImageClient::new(http_client(config.request_timeout)?);
        Ok(Self::with_client(config, images))
    }

    pub fn with_client(config: Config, images: ImageClient) -> Self {
        // A missing index must not keep the health checks from coming up.
        let index_html = std::fs::read(config.public_dir.join("index.html")).ok();
        if index_html.is_none() {
            log::warn!(
                "No index.html in {}, serving a plain 'ok' at /",
                config.public_dir.display()
            );
        }
        Self {
            config,
            images,
            index_html,
        }
    }
}

pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let json_config = web::JsonConfig::default()
        .limit(state.config.max_body_bytes)
        .error_handler(response::json_error_handler);

    App::new()
        .app_data(state)
        .app_data(json_config)
        .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
        .service(handlers::healthz)
        .service(handlers::api_health)
        .service(handlers::generate)
        .route("/", web::get().to(handlers::index))
        .route("/{filename:.*}", web::get().to(static_files::serve))
        .default_service(web::to(static_files::fallback))
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let bind = (config.host.clone(), config.port);
    let state = web::Data::new(
        AppState::new(config).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?,
    );

    HttpServer::new(move || build_app(state.clone()))
        .bind(bind)?
        .run()
        .await
}
