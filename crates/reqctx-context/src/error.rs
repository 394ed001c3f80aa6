use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reqctx_db::ClientError;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned when a context cannot be produced.
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    /// The shared client failed to construct at startup. The original
    /// construction error is carried unchanged.
    #[error(transparent)]
    ClientUnavailable(Arc<ClientError>),

    /// No `ContextFactory` extension was installed on the router.
    #[error("context factory is not installed on this router")]
    FactoryNotInstalled,
}

impl IntoResponse for ContextError {
    fn into_response(self) -> Response {
        let status = match self {
            ContextError::ClientUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ContextError::FactoryNotInstalled => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
