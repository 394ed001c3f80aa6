//! Request contexts backed by the shared database client.
//!
//! The composition root builds one [`ContextFactory`] at startup and installs
//! it as an axum `Extension`. Handlers then take a [`Context`] argument, which
//! carries a reference to the same [`reqctx_db::DbClient`] on every request.
//!
//! ```ignore
//! let factory = ContextFactory::initialize(|| DbClient::from_env(settings));
//! let app = Router::new()
//!     .route("/items", get(list_items))
//!     .layer(Extension(factory));
//!
//! async fn list_items(ctx: Context) -> Result<Json<Value>, ApiError> { ... }
//! ```

mod context;
mod error;
mod extract;

pub use context::{ClientContext, Context, ContextFactory, RuntimeHandle};
pub use error::ContextError;

// Handler code gets the client types from this crate alone.
pub use reqctx_db::{
    ClientError, DbClient, DbConnection, DbPool, DbRuntimeSettings, DATABASE_URL_ENV,
};
