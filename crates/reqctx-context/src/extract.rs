//! Axum extractor for [`Context`].

use crate::{Context, ContextError, ContextFactory};
use axum::{extract::FromRequestParts, http::request::Parts};

impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = ContextError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let factory = parts
            .extensions
            .get::<ContextFactory>()
            .cloned()
            .ok_or(ContextError::FactoryNotInstalled)?;

        factory.create_context().await
    }
}
