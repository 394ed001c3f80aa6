//! Database client shared by every request context.
//!
//! The client is an `r2d2` pool of SQLite connections. It is built once by
//! the composition root and then shared by reference for the lifetime of the
//! process. Pooling, connection setup, and statement execution all live
//! behind [`DbClient`]; nothing outside this crate manages connections.
//!
//! # Design decisions
//!
//! - **Eager pool construction**: the pool opens its connections up front, so
//!   a bad path or unreachable database fails at startup rather than on the
//!   first request.
//! - **WAL mode**: concurrent readers with a single writer, which matches a
//!   server handling many short requests.

mod client;
mod error;

pub use client::{DbClient, DbConnection, DbPool, DbRuntimeSettings, DATABASE_URL_ENV};
pub use error::ClientError;
