use proavatar::{config::Config, logger};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env();
    logger::init_with_config(logger::LoggerConfig::for_server(&config))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using process environment");
    }

    logger::log_startup_info("Professional Avatar Creator", env!("CARGO_PKG_VERSION"), &config);
    logger::log_config_info(&config);

    if let Err(e) = proavatar::server::run(config).await {
        log::error!("❌ Server stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
