//! HTTP route handlers
//!
//! Everything that is not a reserved route is handed to the catcher.

use std::path::Path;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Router;
use chrono::{TimeDelta, Utc};
use tower_http::services::ServeDir;

use crate::catcher::CatchOutcome;
use crate::registry::Hostname;

use super::extract::{raw_request, request_host};
use super::state::AppState;

/// Cache lifetime for static assets (one year)
const ASSET_MAX_AGE_SECS: i64 = 31_536_000;

/// Catch-all handler
///
/// The body of a request to an unwatched host is never read.
pub async fn catch_requests(State(state): State<AppState>, req: Request) -> Response {
    let host = request_host(req.headers(), req.uri());
    if !state.catcher.is_watched(&host).await {
        return ignored(&state);
    }

    let raw = raw_request(req, state.config.max_body_size).await;

    match state.catcher.catch(raw).await {
        CatchOutcome::Caught => {
            state.stats.record_caught();
            "request caught".into_response()
        }
        CatchOutcome::Ignored => ignored(&state),
    }
}

fn ignored(state: &AppState) -> Response {
    state.stats.record_ignored();
    match &state.config.redirect_dest {
        Some(dest) => Redirect::to(dest).into_response(),
        None => "request ignored".into_response(),
    }
}

/// `/`: landing page on the root host, viewer page (and a catch) elsewhere
///
/// Requests to a subdomain's index are caught too, since people often
/// point a webhook at the bare subdomain.
pub async fn index(State(state): State<AppState>, req: Request) -> Response {
    let host = request_host(req.headers(), req.uri());
    let frontend_dir = &state.config.frontend_dir;

    if Hostname::new(&host) == Hostname::new(&state.config.root_host) {
        return serve_page(&frontend_dir.join("root.html")).await;
    }

    if state.catcher.is_watched(&host).await {
        let raw = raw_request(req, state.config.max_body_size).await;
        state.catcher.catch(raw).await;
    }
    state.stats.record_index();

    serve_page(&frontend_dir.join("index.html")).await
}

/// `/statusz`: plain-text counters
pub async fn status(State(state): State<AppState>) -> String {
    let hosts = state.catcher.registry().host_count().await;
    state.stats.snapshot(hosts).to_string()
}

/// Redirect `www.` hosts to the bare host
pub async fn strip_www(req: Request, next: Next) -> Response {
    let host = request_host(req.headers(), req.uri());

    if let Some(bare) = host.strip_prefix("www.") {
        let path = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let location = format!("//{bare}{path}");

        return (
            [(header::CONNECTION, "close")],
            Redirect::temporary(&location),
        )
            .into_response();
    }

    next.run(req).await
}

/// Static files under `dir`, served with long-lived cache headers
pub fn assets(dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(middleware::map_response(with_cache_headers))
}

async fn with_cache_headers(mut response: Response) -> Response {
    if !response.status().is_success() {
        return response;
    }

    let expires = Utc::now() + TimeDelta::seconds(ASSET_MAX_AGE_SECS);
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={ASSET_MAX_AGE_SECS}")) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string()) {
        headers.insert(header::EXPIRES, value);
    }

    response
}

async fn serve_page(path: &Path) -> Response {
    match tokio::fs::read_to_string(path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read page");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
