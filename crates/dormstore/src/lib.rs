//! Persistence layer for the Dormshare application
//!
//! Users own items, items can be shared with deadlines and tagged, and every
//! user carries a "virtue" point balance whose changes are recorded in an
//! append-only log.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod repository;

pub use pool::{LibsqlManager, LibsqlPool};
pub use repository::{Store, StoreImpl};

use anyhow::Result;

/// Open (or create) the local database file, run pending migrations and
/// return a connection pool for it.
pub async fn open_database(path: &str) -> Result<LibsqlPool> {
    let database = libsql::Builder::new_local(path).build().await?;
    let pool: LibsqlPool = deadpool::managed::Pool::builder(LibsqlManager::new(database)).build()?;

    let conn = pool.get().await?;
    migrations::run_migrations(&conn).await?;

    Ok(pool)
}
