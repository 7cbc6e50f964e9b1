mod analysis;
mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::matcher::SkillMatcher;
use crate::analysis::taxonomy::SkillTaxonomy;
use crate::config::Config;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Skillgap API v{}", env!("CARGO_PKG_VERSION"));

    // Load the skill taxonomy and compile the matcher once
    let taxonomy = match &config.skill_taxonomy_path {
        Some(path) => SkillTaxonomy::from_path(path)
            .with_context(|| format!("failed to load taxonomy from {}", path.display()))?,
        None => SkillTaxonomy::embedded().context("embedded taxonomy is invalid")?,
    };
    let matcher = Arc::new(SkillMatcher::new(&taxonomy)?);
    info!("Skill matcher ready ({} canonical skills)", matcher.len());

    // Text generation is optional; without a key every analysis runs offline
    let generator: Option<Arc<dyn TextGenerator>> = match &config.llm_api_key {
        Some(key) => {
            let client: Arc<dyn TextGenerator> = Arc::new(LlmClient::new(
                key.clone(),
                config.llm_api_url.clone(),
                Duration::from_secs(config.llm_timeout_secs),
            )?);
            info!(
                "LLM client initialized ({}, timeout {}s)",
                config.llm_api_url, config.llm_timeout_secs
            );
            Some(client)
        }
        None => {
            warn!("No GROQ_API_KEY or LLAMA_API_KEY set; semantic matching and plan generation disabled");
            None
        }
    };
    info!(
        "Enhanced matching {}",
        if config.enable_enhanced_matching { "enabled" } else { "disabled" }
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        matcher,
        generator,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the UI host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
