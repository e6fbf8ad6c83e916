use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use pricescout_common::PriceScoutError;

/// `PriceScoutError` rendered as `{"detail": "..."}` with its mapped status.
#[derive(Debug)]
pub struct ApiError(pub PriceScoutError);

impl From<PriceScoutError> for ApiError {
    fn from(err: PriceScoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({"detail": self.0.to_string()}))).into_response()
    }
}
