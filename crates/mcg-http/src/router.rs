use std::{sync::Arc, time::Instant};

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::signal;
use tower_http::{
    cors::{AllowHeaders, Any, CorsLayer},
    trace::TraceLayer,
};

use mcg_core::{chat::ChatService, config::Config};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub chat: Arc<ChatService>,
    pub started: Instant,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, chat: Arc<ChatService>) -> Self {
        Self {
            cfg,
            chat,
            started: Instant::now(),
        }
    }
}

/// All routes plus CORS and (optionally) request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cfg);
    let log_requests = state.cfg.log_requests;

    let mut router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/morse", post(handlers::encode_morse))
        .route("/api/chat", post(handlers::chat))
        .with_state(state)
        .layer(cors);

    if log_requests {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn cors_layer(cfg: &Config) -> CorsLayer {
    let mut allowed_headers = vec![header::CONTENT_TYPE];
    if let Ok(name) = HeaderName::from_bytes(cfg.session_header.as_bytes()) {
        allowed_headers.push(name);
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::list(allowed_headers));

    if cfg.cors_allowed_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(
            cfg.cors_allowed_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
    }
}

/// Bind and serve until Ctrl-C / SIGTERM.
pub async fn serve(cfg: Arc<Config>, chat: Arc<ChatService>) -> anyhow::Result<()> {
    let addr = cfg.bind_addr;
    let app = build_router(Arc::new(AppState::new(cfg, chat)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Morse chat gateway started on http://{addr}");
    tracing::info!("API endpoint: http://{addr}/api/chat");
    tracing::info!("Morse code conversion: http://{addr}/api/morse");
    tracing::info!("Health check: http://{addr}/health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
