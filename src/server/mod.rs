//! HTTP service that turns submitted plotting code into chart artifacts.
//!
//! ## Endpoints
//!
//! - `POST /api/visualize` - run `{code, language}` and return the artifact URL
//! - `GET /visualizations/{id}/{file}` - serve a rendered artifact
//! - `GET /api/health` - liveness check

mod routes;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::{
    config::Config,
    execution::{Runner, RunnerSettings},
};

pub use routes::detect_kind;

/// Shared state for the service handlers.
pub struct ServerState {
    /// Root holding one directory per visualization id.
    pub visualizations_dir: PathBuf,
    pub runner: Runner,
}

impl ServerState {
    /// Create the visualizations directory and install the interpreter wrappers.
    pub async fn prepare(visualizations_dir: PathBuf, runner: Runner) -> Result<Arc<Self>> {
        tokio::fs::create_dir_all(&visualizations_dir)
            .await
            .with_context(|| {
                format!("creating visualizations directory {}", visualizations_dir.display())
            })?;
        runner.install_wrappers().await?;
        Ok(Arc::new(Self { visualizations_dir, runner }))
    }

    pub async fn from_config(cfg: &Config) -> Result<Arc<Self>> {
        let runner = Runner::new(RunnerSettings::from_config(cfg));
        Self::prepare(cfg.visualizations_path(), runner).await
    }
}

/// Create the service router.
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health_handler))
        .route("/api/visualize", post(routes::visualize_handler))
        .route("/visualizations/{id}/{file}", get(routes::artifact_handler))
        // Request tracing (enable with RUST_LOG=tower_http=info or higher)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C. `bind` overrides `BIND_ADDRESS`.
pub async fn serve(cfg: &Config, bind: Option<&str>) -> Result<()> {
    let addr = bind.map(str::to_string).unwrap_or_else(|| cfg.bind_address());
    let state = ServerState::from_config(cfg).await?;
    let dir = state.visualizations_dir.clone();
    let router = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(addr = %listener.local_addr()?, visualizations = %dir.display(), "visualization service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("visualization service failed")?;
    info!("visualization service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
