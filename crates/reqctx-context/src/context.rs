//! The context record and the factory that hands it out.

use crate::ContextError;
use reqctx_db::{ClientError, DbClient};
use std::sync::Arc;

/// Anything handed to a request handler as its context must expose the
/// shared database client.
pub trait ClientContext {
    /// The shared client.
    fn client(&self) -> &Arc<DbClient>;
}

/// Request-scoped record holding a reference to the shared client.
///
/// A context never owns the client; dropping it only releases its `Arc`.
#[derive(Debug, Clone)]
pub struct Context {
    /// The process-wide database client.
    pub client: Arc<DbClient>,

    /// The runtime handle the caller passed in, if any.
    pub runtime: Option<RuntimeHandle>,
}

impl ClientContext for Context {
    fn client(&self) -> &Arc<DbClient> {
        &self.client
    }
}

/// Handle passed in by serverless runtimes that keep the invocation alive
/// until their event loop drains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeHandle {
    /// Whether the runtime waits for an empty event loop before returning
    /// the response.
    pub wait_for_empty_event_loop: bool,
}

impl Default for RuntimeHandle {
    fn default() -> Self {
        Self {
            wait_for_empty_event_loop: true,
        }
    }
}

/// Produces [`Context`] values that all share one client.
///
/// Construct it once at startup with [`ContextFactory::new`] or
/// [`ContextFactory::initialize`] and clone it into request handling. Clones
/// share the same client and the same construction outcome.
#[derive(Debug, Clone)]
pub struct ContextFactory {
    client: Result<Arc<DbClient>, Arc<ClientError>>,
}

impl ContextFactory {
    /// Wraps a client that is already constructed.
    pub fn new(client: DbClient) -> Self {
        Self {
            client: Ok(Arc::new(client)),
        }
    }

    /// Runs client construction exactly once and records the outcome.
    ///
    /// A construction failure does not abort here. It is logged and then
    /// returned from every subsequent [`create_context`](Self::create_context)
    /// call, so no caller ever receives a context without a client.
    pub fn initialize<F>(construct: F) -> Self
    where
        F: FnOnce() -> Result<DbClient, ClientError>,
    {
        match construct() {
            Ok(client) => Self::new(client),
            Err(e) => {
                tracing::error!(error = %e, "database client unavailable, contexts will fail");
                Self {
                    client: Err(Arc::new(e)),
                }
            }
        }
    }

    /// Returns the shared client, or the construction error.
    pub fn client(&self) -> Result<&Arc<DbClient>, ContextError> {
        self.client
            .as_ref()
            .map_err(|e| ContextError::ClientUnavailable(Arc::clone(e)))
    }

    /// Whether the client constructed successfully.
    pub fn is_ready(&self) -> bool {
        self.client.is_ok()
    }

    /// Produces a context for one request.
    ///
    /// Performs no I/O and never constructs a client, so it resolves on
    /// first poll and may be called concurrently without coordination.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::ClientUnavailable`] if client construction
    /// failed at startup.
    pub async fn create_context(&self) -> Result<Context, ContextError> {
        let client = Arc::clone(self.client()?);
        tracing::trace!("context created");
        Ok(Context {
            client,
            runtime: None,
        })
    }

    /// Produces a context for runtimes that still pass a [`RuntimeHandle`].
    ///
    /// Clears `wait_for_empty_event_loop` so the pooled connections kept by
    /// the client do not hold the invocation open, then merges the handle
    /// into the returned context next to the shared client.
    pub async fn create_context_with_runtime(
        &self,
        mut runtime: RuntimeHandle,
    ) -> Result<Context, ContextError> {
        runtime.wait_for_empty_event_loop = false;
        let mut context = self.create_context().await?;
        context.runtime = Some(runtime);
        Ok(context)
    }
}

impl From<DbClient> for ContextFactory {
    fn from(client: DbClient) -> Self {
        Self::new(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqctx_db::DbRuntimeSettings;

    fn memory_client() -> DbClient {
        DbClient::connect(":memory:", DbRuntimeSettings::default()).expect("client should construct")
    }

    #[tokio::test]
    async fn create_context_returns_shared_client() {
        let factory = ContextFactory::new(memory_client());
        let expected = Arc::clone(factory.client().expect("client should be ready"));

        let ctx = factory.create_context().await.expect("context should be created");
        assert!(Arc::ptr_eq(&ctx.client, &expected));
        assert!(Arc::ptr_eq(ClientContext::client(&ctx), &expected));
    }

    #[tokio::test]
    async fn sequential_calls_share_one_client() {
        let factory = ContextFactory::new(memory_client());

        let first = factory.create_context().await.expect("first context");
        let second = factory.create_context().await.expect("second context");
        assert!(Arc::ptr_eq(&first.client, &second.client));
    }

    #[tokio::test]
    async fn cloned_factories_share_one_client() {
        let factory = ContextFactory::new(memory_client());
        let clone = factory.clone();

        let a = factory.create_context().await.expect("context from original");
        let b = clone.create_context().await.expect("context from clone");
        assert!(Arc::ptr_eq(&a.client, &b.client));
    }

    #[tokio::test]
    async fn construction_failure_is_returned_on_every_call() {
        let factory =
            ContextFactory::initialize(|| Err(ClientError::MissingDatabaseUrl("DATABASE_URL")));
        assert!(!factory.is_ready());

        for _ in 0..3 {
            let err = factory
                .create_context()
                .await
                .expect_err("context must not be created without a client");
            match err {
                ContextError::ClientUnavailable(source) => {
                    assert!(matches!(*source, ClientError::MissingDatabaseUrl(_)))
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn construction_error_message_is_unchanged() {
        let original = ClientError::MissingDatabaseUrl("DATABASE_URL").to_string();
        let factory =
            ContextFactory::initialize(|| Err(ClientError::MissingDatabaseUrl("DATABASE_URL")));

        let err = factory.create_context().await.expect_err("should fail");
        assert_eq!(err.to_string(), original);
    }

    #[test]
    fn initialize_runs_construction_once() {
        let mut calls = 0;
        let factory = ContextFactory::initialize(|| {
            calls += 1;
            Ok(memory_client())
        });
        let _clone = factory.clone();
        assert_eq!(calls, 1);
        assert!(factory.is_ready());
    }

    #[tokio::test]
    async fn runtime_handle_is_merged_into_context() {
        let factory = ContextFactory::new(memory_client());
        let runtime = RuntimeHandle::default();
        assert!(runtime.wait_for_empty_event_loop);

        let with_runtime = factory
            .create_context_with_runtime(runtime)
            .await
            .expect("context should be created");
        assert_eq!(
            with_runtime.runtime,
            Some(RuntimeHandle {
                wait_for_empty_event_loop: false
            })
        );

        let plain = factory.create_context().await.expect("context should be created");
        assert!(plain.runtime.is_none());
        assert!(Arc::ptr_eq(&with_runtime.client, &plain.client));
    }

    #[tokio::test]
    async fn runtime_handle_does_not_mask_construction_failure() {
        let factory =
            ContextFactory::initialize(|| Err(ClientError::MissingDatabaseUrl("DATABASE_URL")));

        let err = factory
            .create_context_with_runtime(RuntimeHandle::default())
            .await
            .expect_err("should fail without a client");
        assert!(matches!(err, ContextError::ClientUnavailable(_)));
    }
}
