//! Resonance Scraper - chord and tab library server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resonance_scraper::{
    config::{absolute_dir, normalize_addr},
    create_router,
    songs::Songify,
    tasks::{spawn_cache_sweep, spawn_visitor_sweep},
    upstream::{UltimateGuitarClient, UltimateGuitarConfig},
    AppState, BackgroundTasks, Config, Pipeline, SongService,
};

#[derive(Parser)]
#[command(name = "resonance_scraper")]
#[command(about = "Chord and tab library API server", long_about = None)]
struct Cli {
    /// HTTP listen address, overrides ADDR
    #[arg(long)]
    addr: Option<String>,

    /// Song library directory, overrides SONGS_DIR
    #[arg(long)]
    songs: Option<PathBuf>,
}

/// Main entry point for the song library server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from the environment and flags
/// 3. Open the song library and tab site client
/// 4. Start the cache and rate limit sweeps
/// 5. Serve the API until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resonance_scraper=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(addr) = cli.addr {
        config.addr = normalize_addr(&addr);
    }
    if let Some(songs) = cli.songs {
        config.songs_dir = songs;
    }
    config.songs_dir = absolute_dir(&config.songs_dir).context("resolving songs directory")?;
    info!(
        "Configuration loaded: addr={}, songs_dir={}, cache_ttl={}s, rate_limit={}/{}s, timeout={}s ({})",
        config.addr,
        config.songs_dir.display(),
        config.cache_ttl,
        config.rate_limit,
        config.rate_window,
        config.request_timeout,
        config.timeout_policy
    );

    let client = UltimateGuitarClient::new(UltimateGuitarConfig::default())
        .context("building tab site client")?;
    let songify = Songify::discover(&config.songs_dir, config.songify_script.as_deref());
    match &songify {
        Some(songify) => info!("song.json generation via {}", songify.script().display()),
        None => warn!("songify script not found, song.json generation disabled"),
    }
    let service = SongService::open(&config.songs_dir, Arc::new(client))
        .await
        .context("opening song library")?
        .with_songify(songify);

    let state = AppState::new(Arc::new(service), config.cache_ttl());
    let pipeline = Pipeline::from_config(&config);

    let mut tasks = BackgroundTasks::new();
    tasks.push(spawn_cache_sweep(state.cache.clone(), config.cache_ttl()));
    tasks.push(spawn_visitor_sweep(pipeline.rate_limiter.clone()));
    info!("Started {} background sweeps", tasks.len());

    let app = create_router(state, pipeline);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    info!("Server listening on http://{}", config.addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(tasks))
    .await
    .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweeps.
async fn shutdown_signal(tasks: BackgroundTasks) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    tasks.shutdown().await;
    warn!("Background sweeps stopped");
}
