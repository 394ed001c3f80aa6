use thiserror::Error;

/// Errors raised by the database client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to build the connection pool.
    #[error("failed to construct database client: {0}")]
    Construction(#[source] r2d2::Error),

    /// Failed to check a connection out of the pool.
    #[error("failed to get database connection: {0}")]
    Connection(#[source] r2d2::Error),

    /// No datasource URL was configured.
    #[error("environment variable {0} is not set")]
    MissingDatabaseUrl(&'static str),
}
