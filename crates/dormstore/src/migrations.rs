use anyhow::Result;
use libsql::Connection;

use crate::models::timestamp_to_i64;

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Run database migrations
///
/// This is the single source of truth for the database schema.
pub async fn run_migrations(conn: &Connection) -> Result<()> {
    // Create schema_migrations table first (tracks applied migrations)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
        (),
    )
    .await?;

    let current_version = get_current_version(conn).await?;

    if current_version >= SCHEMA_VERSION {
        tracing::info!("Database schema is up to date (version {})", current_version);
        return Ok(());
    }

    tracing::info!("Running migrations from version {} to {}", current_version, SCHEMA_VERSION);

    if current_version < 1 {
        run_migration_v1(conn).await?;
        record_migration(conn, 1, "Initial schema").await?;
    }

    tracing::info!("Database migrations completed successfully (now at version {})", SCHEMA_VERSION);
    Ok(())
}

/// Get current schema version from database
async fn get_current_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn.query("SELECT MAX(version) FROM schema_migrations", ()).await?;

    if let Some(row) = rows.next().await? {
        let version: Option<i32> = row.get(0)?;
        Ok(version.unwrap_or(0))
    } else {
        Ok(0)
    }
}

/// Record that a migration was applied
async fn record_migration(conn: &Connection, version: i32, description: &str) -> Result<()> {
    let now = timestamp_to_i64(std::time::SystemTime::now());

    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
        libsql::params![version, now, description],
    )
    .await?;

    tracing::info!("Applied migration v{}: {}", version, description);
    Ok(())
}

/// Migration v1: Initial schema
/// Creates the users, virtue, items, own, share, tags and virlog tables
async fn run_migration_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            uid INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            dorm TEXT NOT NULL,
            email TEXT NOT NULL
        )",
        (),
    )
    .await?;

    // Exactly one virtue row per user, created together with the user
    conn.execute(
        "CREATE TABLE IF NOT EXISTS virtue (
            uid INTEGER PRIMARY KEY,
            balance INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS items (
            iid INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            brand TEXT NOT NULL,
            description TEXT NOT NULL,
            qty INTEGER NOT NULL DEFAULT 1,
            consumable INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS own (
            oid INTEGER PRIMARY KEY AUTOINCREMENT,
            uid INTEGER NOT NULL,
            iid INTEGER NOT NULL,
            FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE,
            FOREIGN KEY (iid) REFERENCES items(iid) ON DELETE CASCADE
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS share (
            sid INTEGER PRIMARY KEY AUTOINCREMENT,
            uid INTEGER NOT NULL,
            iid INTEGER NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            deadline INTEGER NOT NULL,
            FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE,
            FOREIGN KEY (iid) REFERENCES items(iid) ON DELETE CASCADE
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tags (
            tid INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            iid INTEGER NOT NULL,
            FOREIGN KEY (iid) REFERENCES items(iid) ON DELETE CASCADE
        )",
        (),
    )
    .await?;

    // Append-only; rows are never updated or deleted
    conn.execute(
        "CREATE TABLE IF NOT EXISTS virlog (
            vid INTEGER PRIMARY KEY AUTOINCREMENT,
            uid INTEGER NOT NULL,
            entry TEXT NOT NULL,
            logged_at INTEGER NOT NULL,
            FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE
        )",
        (),
    )
    .await?;

    // Create indexes
    conn.execute("CREATE INDEX IF NOT EXISTS idx_users_name ON users(name)", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_items_name ON items(name)", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_own_uid ON own(uid)", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_own_iid ON own(iid)", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_share_iid ON share(iid)", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_share_deadline ON share(deadline)", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_tags_name ON tags(name)", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_tags_iid ON tags(iid)", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_virlog_uid ON virlog(uid)", ()).await?;

    Ok(())
}
