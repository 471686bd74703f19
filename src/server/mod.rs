//! HTTP server module
//!
//! The boundary around the registry: routes inbound HTTP to the catcher,
//! upgrades viewers to WebSockets, and serves the frontend and status page.

pub mod config;
pub mod extract;
pub mod listener;
pub mod routes;
pub mod state;
pub mod ws;

use axum::routing::{any, get};
use axum::{middleware, Router};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use listener::CatcherServer;
pub use state::AppState;

/// Path viewers open their WebSocket on.
pub const INIT_CLIENT_PATH: &str = "/init-client";

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    let favicon = ServeFile::new(&state.config.favicon);
    let assets = routes::assets(&state.config.frontend_dir);

    Router::new()
        .route("/", any(routes::index))
        .route(INIT_CLIENT_PATH, any(ws::init_client))
        .route("/statusz", get(routes::status))
        .route_service("/favicon.ico", favicon)
        .nest_service("/assets", assets)
        .fallback(routes::catch_requests)
        .layer(middleware::from_fn(routes::strip_www))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
