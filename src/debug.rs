use axum::{Json, debug_handler, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::db;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn health(State(db_pool): State<SqlitePool>) -> impl IntoResponse {
    match db::status_check(&db_pool).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "status": "db not ready" })))
        }
    }
}
