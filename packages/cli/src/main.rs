// ABOUTME: Scenebox server entry point - settings, provider wiring, axum serve
// ABOUTME: Loads .env, initializes tracing, and exposes the preview API over HTTP

use anyhow::Context;
use clap::Parser;
use scenebox_api::{create_router, AppState};
use scenebox_config::Settings;
use scenebox_preview::{LocalPusher, PreviewConfig, PreviewFlow};
use scenebox_sandbox::{AllocatorConfig, E2bProvider, ReuseCache, SandboxAllocator};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "scenebox", about = "Preview orchestration server for generated scenes")]
struct Cli {
    /// Bind address override
    #[arg(long)]
    host: Option<String>,

    /// Bind port override
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    if settings.e2b_api_key.is_none() {
        warn!("E2B_API_KEY is not set; sandbox allocation will fail until it is provided");
    }

    let provider = Arc::new(E2bProvider::new(
        settings.e2b_api_key.clone(),
        settings.e2b_api_url.clone(),
        settings.e2b_domain.clone(),
    )?);

    let allocator = Arc::new(SandboxAllocator::new(
        provider,
        AllocatorConfig {
            template_id: settings.template_id.clone(),
            template_name: settings.template_name.clone(),
            studio_port: settings.studio_port,
        },
        ReuseCache::new(),
    ));

    let flow = Arc::new(PreviewFlow::new(
        Arc::clone(&allocator),
        PreviewConfig::from_settings(&settings),
    ));

    let pusher = Arc::new(LocalPusher::new(
        settings.local_project_dir.clone(),
        settings.base_project_dir.clone(),
    ));

    let app = create_router(AppState {
        allocator,
        flow,
        pusher,
    })
    .layer(CorsLayer::very_permissive())
    .layer(TraceLayer::new_for_http());

    let host = cli.host.unwrap_or_else(|| settings.host.clone());
    let port = cli.port.unwrap_or(settings.port);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;

    info!(%host, port, template = %settings.template_name, "scenebox listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
