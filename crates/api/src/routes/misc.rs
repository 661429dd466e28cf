use axum::http::StatusCode;
use axum::{routing::get, Router};
use serde_json::json;

use gambit_common::get_current_timestamp_ms;

use crate::response::{AppError, AppSuccess};
use crate::GlobalState;

pub fn misc_routes() -> Router<GlobalState> {
    Router::new()
        .route("/health",
            get(health)
        )
}

async fn health() -> Result<AppSuccess, AppError> {
    Ok(AppSuccess::new(
        StatusCode::OK,
        "ok",
        json!({
            "status": "ok",
            "timestamp": get_current_timestamp_ms(),
        }),
    ))
}
