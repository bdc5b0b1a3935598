pub mod error;
pub mod events;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Turns
        .route("/api/turns", post(routes::turns::handle_turn))
        // Orchestration records
        .route(
            "/api/orchestrations/{participant}",
            get(routes::orchestrations::get_active),
        )
        .route(
            "/api/orchestrations/{participant}/history",
            get(routes::orchestrations::get_history),
        )
        .route(
            "/api/orchestrations/{participant}/end",
            post(routes::orchestrations::end_orchestration),
        )
        // Session flags
        .route(
            "/api/flags/{participant}/{flag}",
            get(routes::flags::get_flag)
                .put(routes::flags::put_flag)
                .delete(routes::flags::delete_flag),
        )
        // Secondary-bot side
        .route(
            "/api/secondary/{participant}/stamp",
            post(routes::secondary::stamp_actions),
        )
        .route(
            "/api/secondary/{participant}/floor",
            put(routes::secondary::put_floor),
        )
        // Config
        .route("/api/config", get(routes::config::get_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the handover server for the project at `root`.
pub async fn serve(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener).await
}

/// Start the handover server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app_state = AppState::new(root)?;
    for warning in app_state.config.validate() {
        tracing::warn!(level = ?warning.level, "config: {}", warning.message);
    }
    let app = build_router(app_state);

    tracing::info!("handover server listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
