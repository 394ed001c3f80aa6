use reqctx_context::{ClientError, ContextError, ContextFactory, DbClient, DbRuntimeSettings};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_contexts_share_one_client() {
    let client = DbClient::connect(":memory:", DbRuntimeSettings::default()).unwrap();
    let factory = ContextFactory::new(client);
    let expected = Arc::clone(factory.client().unwrap());

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let factory = factory.clone();
            tokio::spawn(async move { factory.create_context().await })
        })
        .collect();

    for handle in handles {
        let ctx = handle.await.unwrap().expect("context should be created");
        assert!(Arc::ptr_eq(&ctx.client, &expected));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_all_see_construction_failure() {
    let factory =
        ContextFactory::initialize(|| Err(ClientError::MissingDatabaseUrl("DATABASE_URL")));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let factory = factory.clone();
            tokio::spawn(async move { factory.create_context().await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(ContextError::ClientUnavailable(_))));
    }
}

#[tokio::test]
async fn file_backed_failure_surfaces_construction_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent").join("app.db");
    let path = path.to_str().unwrap().to_string();
    let settings = DbRuntimeSettings {
        connect_timeout_ms: 250,
        ..DbRuntimeSettings::default()
    };

    let factory = ContextFactory::initialize(|| DbClient::connect(&path, settings));

    let err = factory.create_context().await.unwrap_err();
    match err {
        ContextError::ClientUnavailable(source) => {
            assert!(matches!(*source, ClientError::Construction(_)))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn in_memory_data_is_shared_across_contexts() {
    let client = DbClient::connect(":memory:", DbRuntimeSettings::default()).unwrap();
    let factory = ContextFactory::new(client);

    let first = factory.create_context().await.unwrap();
    let second = factory.create_context().await.unwrap();

    let writer = first.client.connection().unwrap();
    writer
        .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t VALUES (1);")
        .unwrap();

    // Keep the writer checked out so the reader gets another pooled connection.
    let reader = second.client.connection().unwrap();
    let rows: i64 = reader
        .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}
