use clap::Parser;
use log::LevelFilter;
use proavatar::{
    logger,
    media::{decode_data_url, is_data_url},
    minimax::http_client,
    ApiRegion, AvatarError, BatchSession, Credentials, DirectRoute, ImageClient, ImageSource,
    Orchestrator, ProxyRoute,
};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Generate four professional headshots from one photo.
#[derive(Parser, Debug)]
#[command(name = "avatar-batch", version)]
struct Args {
    /// Local photo to use as the identity reference.
    #[arg(long, required_unless_present = "reference_url")]
    photo: Option<PathBuf>,

    /// Publicly reachable image URL; preferred over --photo when both are given.
    #[arg(long)]
    reference_url: Option<String>,

    /// Base URL of a running proavatar-server relay.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    proxy: String,

    /// Skip the relay and call MiniMax directly.
    #[arg(long)]
    no_proxy: bool,

    #[arg(long, env = "MINIMAX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "MINIMAX_API_BASE")]
    api_base: Option<String>,

    /// Used when no explicit API base is given.
    #[arg(long, default_value = "global")]
    region: ApiRegion,

    /// Directory the avatar-<style>.png files are written to.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    logger::init_with_config(logger::LoggerConfig::new().with_level(level))?;

    let source = match (&args.reference_url, &args.photo) {
        (Some(url), _) if !url.trim().is_empty() => ImageSource::remote(url.as_str())?,
        (_, Some(photo)) => ImageSource::from_path(photo).await?,
        _ => {
            return Err(AvatarError::Validation(
                "Provide --photo or a non-empty --reference-url".into(),
            )
            .into())
        }
    };

    let mut credentials = Credentials::new().with_region(args.region);
    if let Some(base) = &args.api_base {
        credentials = credentials.with_api_base(base.as_str());
    }
    if let Some(key) = &args.api_key {
        credentials = credentials.with_api_key(key.as_str());
    }

    let client = http_client(Duration::from_secs(args.timeout_secs))?;
    let mut orchestrator = Orchestrator::new(Arc::new(DirectRoute::new(ImageClient::new(
        client.clone(),
    ))));
    if !args.no_proxy {
        orchestrator = orchestrator.with_proxy(Arc::new(ProxyRoute::new(client.clone(), &args.proxy)));
    }

    let mut session = BatchSession::from_source(&source, credentials);
    let report = orchestrator.run_batch(&mut session).await;

    tokio::fs::create_dir_all(&args.out).await?;
    for (style, image) in report.succeeded() {
        let target = args.out.join(style.download_name());
        match save_image(&client, image, &target).await {
            Ok(()) => log::info!("💾 {} saved to {}", style.label, target.display()),
            Err(e) => log::error!("Could not save {}: {}", style.label, e),
        }
    }

    if let Some(notice) = report.failure_notice() {
        eprintln!("{}", notice);
    }
    println!("{}", report.status_line());

    if report.all_failed() {
        return Err(AvatarError::Validation("Every style failed; no avatars were produced".into()).into());
    }
    Ok(())
}

async fn save_image(client: &Client, image: &str, target: &Path) -> proavatar::Result<()> {
    let bytes = if is_data_url(image) {
        decode_data_url(image)?.1
    } else {
        let response = client.get(image).send().await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    tokio::fs::write(target, bytes).await?;
    Ok(())
}
