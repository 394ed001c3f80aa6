//! Client construction and connection checkout.

use crate::ClientError;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Environment variable read by [`DbClient::from_env`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

const MEMORY_URL: &str = ":memory:";

static MEMORY_DB_SEQ: AtomicU64 = AtomicU64::new(0);

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out of the pool.
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,

    /// How long pool construction and checkout wait for a connection, in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
            connect_timeout_ms: 5_000,
        }
    }
}

/// Handle to the process-wide database client.
///
/// Cloning is cheap and every clone refers to the same pool.
#[derive(Debug, Clone)]
pub struct DbClient {
    pool: DbPool,
    database_url: String,
}

impl DbClient {
    /// Builds the client for `database_url`.
    ///
    /// `database_url` may be a filesystem path, `:memory:`, or a SQLite
    /// `file:` URI. Every pooled connection runs in WAL mode with foreign
    /// keys enabled and the configured busy timeout.
    ///
    /// `:memory:` opens one named shared-cache database per client, so all
    /// pooled connections see the same data. Its connections are never
    /// recycled; the database lives as long as the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Construction`] if the pool cannot open its
    /// connections within `settings.connect_timeout_ms`.
    pub fn connect(database_url: &str, settings: DbRuntimeSettings) -> Result<Self, ClientError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

        let in_memory = database_url == MEMORY_URL;
        let target = if in_memory {
            format!(
                "file:reqctx-mem-{}?mode=memory&cache=shared",
                MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed)
            )
        } else {
            database_url.to_string()
        };

        let manager = SqliteConnectionManager::file(&target)
            .with_flags(flags)
            .with_init(move |conn| {
                // In-memory databases report "memory", which is acceptable.
                let journal_mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
                if journal_mode != "wal" && journal_mode != "memory" {
                    return Err(rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                        Some(format!(
                            "failed to set WAL journal mode, got: {}",
                            journal_mode
                        )),
                    ));
                }
                conn.execute_batch(&format!(
                    "PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = {};",
                    settings.busy_timeout_ms
                ))
            });

        let mut builder = Pool::builder()
            .max_size(settings.pool_max_size)
            .connection_timeout(Duration::from_millis(settings.connect_timeout_ms));
        if in_memory {
            // A shared-cache memory database is dropped with its last connection.
            builder = builder.idle_timeout(None).max_lifetime(None);
        }

        let pool = builder
            .build(manager)
            .map_err(|e| {
                tracing::error!(database_url, error = %e, "database client construction failed");
                ClientError::Construction(e)
            })?;

        tracing::info!(
            database_url,
            pool_max_size = settings.pool_max_size,
            "database client constructed"
        );

        Ok(Self {
            pool,
            database_url: database_url.to_string(),
        })
    }

    /// Builds the client from the `DATABASE_URL` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingDatabaseUrl`] if the variable is unset
    /// or blank, otherwise whatever [`DbClient::connect`] returns.
    pub fn from_env(settings: DbRuntimeSettings) -> Result<Self, ClientError> {
        Self::from_url_var(std::env::var(DATABASE_URL_ENV).ok(), settings)
    }

    fn from_url_var(value: Option<String>, settings: DbRuntimeSettings) -> Result<Self, ClientError> {
        match value {
            Some(url) if !url.trim().is_empty() => Self::connect(url.trim(), settings),
            _ => Err(ClientError::MissingDatabaseUrl(DATABASE_URL_ENV)),
        }
    }

    /// Checks out a pooled connection.
    ///
    /// Blocks for up to the configured connect timeout; call it from a
    /// blocking task when running on an async executor.
    pub fn connection(&self) -> Result<DbConnection, ClientError> {
        self.pool.get().map_err(ClientError::Connection)
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// The datasource URL this client was built from.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}
