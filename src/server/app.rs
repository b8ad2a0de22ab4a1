use axum::body::Body;
use axum::extract::{FromRef, Request};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use prometheus::{Encoder, TextEncoder};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::errors::ApiError;
use super::routes::{category_router, questions_router, quizzes_router};

const METRICS_PATH: &str = "/metrics";

#[derive(FromRef, Clone)]
pub struct AppState {
    pub pool: SqlitePool,
}

pub fn build_router(pool: SqlitePool) -> Router {
    let state = AppState { pool };

    Router::new()
        .merge(category_router(state.clone()))
        .merge(questions_router(state.clone()))
        .merge(quizzes_router(state))
        .route(METRICS_PATH, get(metrics))
        .method_not_allowed_fallback(|| async { ApiError::MethodNotAllowed })
        .fallback(|| async {
            tracing::info!("Fallback");
            ApiError::NotFound
        })
        .layer(middleware::from_fn(require_json_accept))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn run_server(pool: SqlitePool, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(pool);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Serving on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

// scrapers ask for the prometheus text format, everything else must take JSON
async fn require_json_accept(request: Request, next: Next) -> Response {
    if request.uri().path() != METRICS_PATH && !accepts_json(request.headers()) {
        tracing::debug!(accept = ?request.headers().get(header::ACCEPT), "Client does not accept JSON");
        return ApiError::BadRequest.into_response();
    }
    next.run(request).await
}

/// Whether the `Accept` header admits `application/json`. No header means no.
fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|range| {
            let mut parts = range.split(';').map(str::trim);
            let media = parts.next().unwrap_or_default().to_ascii_lowercase();
            let rejected = parts
                .filter_map(|param| param.strip_prefix("q="))
                .any(|q| q.parse::<f32>().map_or(false, |q| q <= 0.0));
            !rejected && matches!(media.as_str(), "application/json" | "application/*" | "*/*")
        })
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = vec![];
    if let Err(e) = encoder.encode(&metrics, &mut buf) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        [(header::CONTENT_TYPE, encoder.format_type().to_owned())],
        Body::from(buf),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_accept(values: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(header::ACCEPT, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn json_and_wildcards_are_accepted() {
        assert!(accepts_json(&with_accept(&["application/json"])));
        assert!(accepts_json(&with_accept(&["text/html, application/json;q=0.9"])));
        assert!(accepts_json(&with_accept(&["*/*"])));
        assert!(accepts_json(&with_accept(&["application/*"])));
        assert!(accepts_json(&with_accept(&["text/html", "Application/JSON"])));
    }

    #[test]
    fn other_types_and_missing_header_are_refused() {
        assert!(!accepts_json(&HeaderMap::new()));
        assert!(!accepts_json(&with_accept(&["text/html"])));
        assert!(!accepts_json(&with_accept(&["application/xml, text/*"])));
        assert!(!accepts_json(&with_accept(&["application/json;q=0"])));
    }
}
