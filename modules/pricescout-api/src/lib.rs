use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use pricescout_scout::PriceScout;

pub mod error;
pub mod history;
pub mod reasoner;
pub mod rest;

pub use error::ApiError;
pub use history::{LogSearchHistory, PgSearchHistory, SearchHistory};
pub use reasoner::{GeminiReasoners, ReasonerProvider};

pub struct AppState {
    pub scout: PriceScout,
    pub reasoners: Arc<dyn ReasonerProvider>,
    pub history: Arc<dyn SearchHistory>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route("/analyze", post(rest::analyze::api_analyze))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Results are per-request and priced live
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path only (no query params, no headers)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }),
        )
}
