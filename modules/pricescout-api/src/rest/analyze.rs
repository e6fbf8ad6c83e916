use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use pricescout_common::{PriceScoutError, SearchRequest};

use crate::{ApiError, AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// The credential from `X-API-KEY`, if present and non-blank.
fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

pub async fn api_analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    // The credential is checked before the body, and before any fetch or reasoning work.
    let Some(key) = api_key(&headers) else {
        return ApiError(PriceScoutError::CredentialMissing).into_response();
    };
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection.into_response(),
    };

    let history = state.history.clone();
    let record = request.clone();
    tokio::spawn(async move {
        if let Err(e) = history.record(&record).await {
            warn!(error = %e, "Failed to record search history");
        }
    });

    let reasoner = state.reasoners.for_key(key);
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", %request_id, product = %request.product_name);

    async {
        info!(
            sites = request.websites.len(),
            brands = request.brands.len(),
            "Analysis requested"
        );
        match state.scout.analyze(&request, reasoner.as_ref()).await {
            Ok(result) => Json(result).into_response(),
            Err(e) => {
                warn!(error = %e, status = e.status_code(), "Analysis request failed");
                ApiError(e).into_response()
            }
        }
    }
    .instrument(span)
    .await
}
