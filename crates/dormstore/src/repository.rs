use anyhow::{Result, bail};
use async_trait::async_trait;
use libsql::{Connection, params};
use tracing::debug;

use crate::models::{
    Item, NameMatch, NewItem, NewShare, NewUser, Ownership, Share, Tag, User, VirtueLogEntry,
    i64_to_timestamp, timestamp_to_i64,
};
use crate::pool::{LibsqlManager, LibsqlPool};

/// Store trait abstracting the persistence operations
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user together with their zeroed virtue balance, returning the new uid
    async fn insert_user(&self, user: &NewUser) -> Result<i64>;

    /// Insert an item, returning the new iid
    async fn insert_item(&self, item: &NewItem) -> Result<i64>;

    /// Record that a user owns an item
    async fn insert_own(&self, uid: i64, iid: i64) -> Result<i64>;

    /// Record that an item is shared out until a deadline
    async fn insert_share(&self, share: &NewShare) -> Result<i64>;

    /// Attach a tag to an item
    async fn insert_tag(&self, name: &str, iid: i64) -> Result<i64>;

    /// Append an entry to a user's virtue log
    async fn insert_virtue_log(&self, uid: i64, entry: &str) -> Result<i64>;

    /// Insert an item with its ownership row and tags in one transaction
    async fn register_item(&self, item: &NewItem, owner_uid: i64, tags: &[String]) -> Result<i64>;

    /// Get a user by uid
    async fn get_user_by_id(&self, uid: i64) -> Result<Option<User>>;

    /// Get a user by email address
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get an item by iid
    async fn get_item_by_id(&self, iid: i64) -> Result<Option<Item>>;

    /// Get the first ownership row for an item
    async fn get_owner_by_item(&self, iid: i64) -> Result<Option<Ownership>>;

    /// Get the first share row for an item
    async fn get_share_by_item(&self, iid: i64) -> Result<Option<Share>>;

    /// Get the names of all tags attached to an item
    async fn get_tags_by_item(&self, iid: i64) -> Result<Vec<String>>;

    /// Get a user's current virtue balance
    async fn get_virtue_balance(&self, uid: i64) -> Result<Option<i64>>;

    /// Get a user's virtue log, newest first
    async fn get_virtue_log(&self, uid: i64) -> Result<Vec<VirtueLogEntry>>;

    /// Apply a signed delta to a user's virtue balance, returning the new balance.
    /// Fails if the user has no virtue row.
    async fn update_virtue(&self, uid: i64, delta: i64) -> Result<i64>;

    /// Look up rows by name in one of the users, items or tags tables.
    /// Any other table name yields no result.
    async fn find_by_name(&self, table: &str, name: &str) -> Result<Vec<NameMatch>>;
}

/// LibSQL store implementation
pub struct StoreImpl {
    pool: LibsqlPool,
}

impl StoreImpl {
    /// Create a new store instance from a pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

// Row-level inserts take a plain connection so they can also run inside a
// caller-held transaction (a Transaction derefs to a Connection).

async fn insert_item_row(conn: &Connection, item: &NewItem) -> Result<i64> {
    conn.execute(
        "INSERT INTO items (name, brand, description, qty, consumable) VALUES (?, ?, ?, ?, ?)",
        params![
            item.name.clone(),
            item.brand.clone(),
            item.description.clone(),
            item.qty,
            if item.consumable { 1 } else { 0 }
        ],
    )
    .await?;
    Ok(conn.last_insert_rowid())
}

async fn insert_own_row(conn: &Connection, uid: i64, iid: i64) -> Result<i64> {
    conn.execute("INSERT INTO own (uid, iid) VALUES (?, ?)", params![uid, iid]).await?;
    Ok(conn.last_insert_rowid())
}

async fn insert_tag_row(conn: &Connection, name: &str, iid: i64) -> Result<i64> {
    conn.execute("INSERT INTO tags (name, iid) VALUES (?, ?)", params![name, iid]).await?;
    Ok(conn.last_insert_rowid())
}

fn user_from_row(row: &libsql::Row) -> Result<User> {
    Ok(User { uid: row.get(0)?, name: row.get(1)?, dorm: row.get(2)?, email: row.get(3)? })
}

fn item_from_row(row: &libsql::Row) -> Result<Item> {
    Ok(Item {
        iid: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        description: row.get(3)?,
        qty: row.get(4)?,
        consumable: row.get::<i64>(5)? != 0,
    })
}

fn tag_from_row(row: &libsql::Row) -> Result<Tag> {
    Ok(Tag { tid: row.get(0)?, name: row.get(1)?, iid: row.get(2)? })
}

#[async_trait]
impl Store for StoreImpl {
    async fn insert_user(&self, user: &NewUser) -> Result<i64> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        tx.execute(
            "INSERT INTO users (name, dorm, email) VALUES (?, ?, ?)",
            params![user.name.clone(), user.dorm.clone(), user.email.clone()],
        )
        .await?;
        let uid = tx.last_insert_rowid();

        // Every member starts with an empty balance
        tx.execute("INSERT INTO virtue (uid, balance) VALUES (?, 0)", params![uid]).await?;
        tx.commit().await?;

        debug!("inserted user <{uid}>");
        Ok(uid)
    }

    async fn insert_item(&self, item: &NewItem) -> Result<i64> {
        let conn = self.get_conn().await?;
        let iid = insert_item_row(&conn, item).await?;
        debug!("inserted item <{iid}>");
        Ok(iid)
    }

    async fn insert_own(&self, uid: i64, iid: i64) -> Result<i64> {
        let conn = self.get_conn().await?;
        let oid = insert_own_row(&conn, uid, iid).await?;
        debug!("inserted ownership <{oid}>");
        Ok(oid)
    }

    async fn insert_share(&self, share: &NewShare) -> Result<i64> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO share (uid, iid, note, deadline) VALUES (?, ?, ?, ?)",
            params![share.uid, share.iid, share.note.clone(), timestamp_to_i64(share.deadline)],
        )
        .await?;
        let sid = conn.last_insert_rowid();
        debug!("inserted share <{sid}>");
        Ok(sid)
    }

    async fn insert_tag(&self, name: &str, iid: i64) -> Result<i64> {
        let conn = self.get_conn().await?;
        let tid = insert_tag_row(&conn, name, iid).await?;
        debug!("inserted tag <{tid}>");
        Ok(tid)
    }

    async fn insert_virtue_log(&self, uid: i64, entry: &str) -> Result<i64> {
        let conn = self.get_conn().await?;
        let logged_at = timestamp_to_i64(std::time::SystemTime::now());
        conn.execute(
            "INSERT INTO virlog (uid, entry, logged_at) VALUES (?, ?, ?)",
            params![uid, entry, logged_at],
        )
        .await?;
        let vid = conn.last_insert_rowid();
        debug!("appended virtue log entry <{vid}> for user <{uid}>");
        Ok(vid)
    }

    async fn register_item(&self, item: &NewItem, owner_uid: i64, tags: &[String]) -> Result<i64> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let iid = insert_item_row(&tx, item).await?;
        insert_own_row(&tx, owner_uid, iid).await?;
        for tag in tags {
            insert_tag_row(&tx, tag, iid).await?;
        }
        tx.commit().await?;

        debug!("registered item <{iid}> owned by user <{owner_uid}>");
        Ok(iid)
    }

    async fn get_user_by_id(&self, uid: i64) -> Result<Option<User>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query("SELECT uid, name, dorm, email FROM users WHERE uid = ?", params![uid])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query("SELECT uid, name, dorm, email FROM users WHERE email = ?", params![email])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_item_by_id(&self, iid: i64) -> Result<Option<Item>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                "SELECT iid, name, brand, description, qty, consumable FROM items WHERE iid = ?",
                params![iid],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(item_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_owner_by_item(&self, iid: i64) -> Result<Option<Ownership>> {
        let conn = self.get_conn().await?;
        let mut rows =
            conn.query("SELECT oid, uid, iid FROM own WHERE iid = ?", params![iid]).await?;

        match rows.next().await? {
            Some(row) => {
                Ok(Some(Ownership { oid: row.get(0)?, uid: row.get(1)?, iid: row.get(2)? }))
            }
            None => Ok(None),
        }
    }

    async fn get_share_by_item(&self, iid: i64) -> Result<Option<Share>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query("SELECT sid, uid, iid, note, deadline FROM share WHERE iid = ?", params![iid])
            .await?;

        match rows.next().await? {
            Some(row) => {
                let deadline: i64 = row.get(4)?;
                Ok(Some(Share {
                    sid: row.get(0)?,
                    uid: row.get(1)?,
                    iid: row.get(2)?,
                    note: row.get(3)?,
                    deadline: i64_to_timestamp(deadline),
                }))
            }
            None => Ok(None),
        }
    }

    async fn get_tags_by_item(&self, iid: i64) -> Result<Vec<String>> {
        let conn = self.get_conn().await?;
        let mut rows =
            conn.query("SELECT name FROM tags WHERE iid = ? ORDER BY tid", params![iid]).await?;

        let mut names = Vec::new();
        while let Some(row) = rows.next().await? {
            names.push(row.get(0)?);
        }
        Ok(names)
    }

    async fn get_virtue_balance(&self, uid: i64) -> Result<Option<i64>> {
        let conn = self.get_conn().await?;
        let mut rows =
            conn.query("SELECT balance FROM virtue WHERE uid = ?", params![uid]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    async fn get_virtue_log(&self, uid: i64) -> Result<Vec<VirtueLogEntry>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                "SELECT vid, uid, entry, logged_at FROM virlog WHERE uid = ? ORDER BY vid DESC",
                params![uid],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let logged_at: i64 = row.get(3)?;
            entries.push(VirtueLogEntry {
                vid: row.get(0)?,
                uid: row.get(1)?,
                entry: row.get(2)?,
                logged_at: i64_to_timestamp(logged_at),
            });
        }
        Ok(entries)
    }

    async fn update_virtue(&self, uid: i64, delta: i64) -> Result<i64> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let changed = tx
            .execute("UPDATE virtue SET balance = balance + ? WHERE uid = ?", params![delta, uid])
            .await?;
        if changed == 0 {
            tx.rollback().await?;
            bail!("no virtue balance recorded for user <{uid}>");
        }

        let mut rows =
            tx.query("SELECT balance FROM virtue WHERE uid = ?", params![uid]).await?;
        let balance: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => {
                tx.rollback().await?;
                bail!("virtue row for user <{uid}> disappeared mid-transaction");
            }
        };
        tx.commit().await?;

        debug!("virtue balance for user <{uid}> is now {balance}");
        Ok(balance)
    }

    async fn find_by_name(&self, table: &str, name: &str) -> Result<Vec<NameMatch>> {
        // Table names cannot be bound as parameters; only vetted spellings
        // ever reach the query string.
        let conn = self.get_conn().await?;
        let mut matches = Vec::new();

        match table.to_ascii_lowercase().as_str() {
            "users" => {
                let mut rows = conn
                    .query("SELECT uid, name, dorm, email FROM users WHERE name = ?", params![name])
                    .await?;
                while let Some(row) = rows.next().await? {
                    matches.push(NameMatch::User(user_from_row(&row)?));
                }
            }
            "items" => {
                let mut rows = conn
                    .query(
                        "SELECT iid, name, brand, description, qty, consumable FROM items WHERE name = ?",
                        params![name],
                    )
                    .await?;
                while let Some(row) = rows.next().await? {
                    matches.push(NameMatch::Item(item_from_row(&row)?));
                }
            }
            "tags" => {
                let mut rows = conn
                    .query("SELECT tid, name, iid FROM tags WHERE name = ?", params![name])
                    .await?;
                while let Some(row) = rows.next().await? {
                    matches.push(NameMatch::Tag(tag_from_row(&row)?));
                }
            }
            // Outside the allow-list: no result, and no query
            _ => {}
        }

        Ok(matches)
    }
}
