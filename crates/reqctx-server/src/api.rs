//! HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reqctx_context::Context;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors returned by handlers once a context has been obtained.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Response body for `GET /health/db`.
#[derive(Debug, Serialize)]
pub struct DbHealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// Handler for `GET /health`.
///
/// Does not touch the database, so it stays green even when the client
/// failed to construct.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Handler for `GET /health/db`.
///
/// Runs `SELECT 1` through the context's client. A client that failed to
/// construct is rejected by the extractor with `503 Service Unavailable`.
pub async fn db_health(ctx: Context) -> Result<Json<DbHealthResponse>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let conn = ctx
            .client
            .connection()
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| ApiError::InternalServerError(format!("database query failed: {}", e)))
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(DbHealthResponse {
        status: "ok",
        database: "reachable",
    }))
}
