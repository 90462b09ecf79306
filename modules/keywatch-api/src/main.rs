use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keywatch_common::{Config, ConfigStore};
use keywatch_monitor::{run_cycle, LiveConnector, MonitorService, PlatformConnector};

mod auth;
mod rest;

pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub monitor: Arc<MonitorService>,
    pub admin_username: String,
    pub admin_password: String,
}

#[derive(Parser)]
#[command(name = "keywatch", about = "Keyword monitor for VK and Telegram sources")]
struct Cli {
    /// Path to the monitoring config JSON (overrides KEYWATCH_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the monitor and the admin API (default)
    Serve,
    /// Run the monitor only, until Ctrl-C
    Monitor,
    /// Run one cycle without sending notifications and print the matches as JSON
    Once,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("keywatch=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut config = Config::from_env()?;
    if let Some(path) = cli.config {
        config.config_path = path;
    }
    config.log_redacted();

    let store = Arc::new(
        ConfigStore::open(&config.config_path)
            .with_context(|| format!("Failed to open {}", config.config_path.display()))?,
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, store).await,
        Command::Monitor => monitor(store).await,
        Command::Once => once(store).await,
    }
}

async fn serve(config: Config, store: Arc<ConfigStore>) -> Result<()> {
    let admin_password = config.require_admin_password()?.to_string();
    let monitor = Arc::new(MonitorService::new(store.clone(), Arc::new(LiveConnector)));

    let state = Arc::new(AppState {
        store,
        monitor: monitor.clone(),
        admin_username: config.admin_username.clone(),
        admin_password,
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .merge(rest::api_router(state))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method + path + status + latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    monitor.start();

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Keywatch admin API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.shutdown().await;
    info!("Shut down");
    Ok(())
}

async fn monitor(store: Arc<ConfigStore>) -> Result<()> {
    let monitor = MonitorService::new(store, Arc::new(LiveConnector));
    monitor.start();
    info!("Monitoring, press Ctrl+C to stop");

    shutdown_signal().await;
    monitor.shutdown().await;
    info!("Shut down");
    Ok(())
}

/// Dry run: matches are collected but never delivered.
async fn once(store: Arc<ConfigStore>) -> Result<()> {
    let config = store.snapshot();
    let mut connections = LiveConnector.connect(&config).await;
    connections.notifier = None;

    let report = run_cycle(&config, &mut connections, &CancellationToken::new()).await;
    info!("Cycle complete: {}", report.stats);

    let matches: Vec<_> = report
        .matches
        .iter()
        .map(|(m, enrichment)| serde_json::json!({ "match": m, "enrichment": enrichment }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
