use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Convert a `SystemTime` to the Unix-seconds form stored in the database
pub fn timestamp_to_i64(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}

/// Convert stored Unix seconds back to a `SystemTime`
pub fn i64_to_timestamp(timestamp: i64) -> SystemTime {
    UNIX_EPOCH + std::time::Duration::from_secs(timestamp as u64)
}

/// A household member before insertion; the uid is assigned by the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub dorm: String,
    pub email: String,
}

/// User model - a household member with a virtue balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub uid: i64,
    pub name: String,
    pub dorm: String,
    pub email: String,
}

/// An item before insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub brand: String,
    pub description: String,
    pub qty: i64,
    pub consumable: bool,
}

/// Item model - something a member owns and may share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub iid: i64,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub qty: i64,
    pub consumable: bool,
}

/// Ownership join row linking a user to an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ownership {
    pub oid: i64,
    pub uid: i64,
    pub iid: i64,
}

/// A share offer before insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShare {
    pub uid: i64,
    pub iid: i64,
    pub note: String,
    pub deadline: SystemTime,
}

/// Share model - an item lent out by a user until a deadline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub sid: i64,
    pub uid: i64,
    pub iid: i64,
    pub note: String,
    pub deadline: SystemTime,
}

/// Tag model - a label attached to an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub tid: i64,
    pub name: String,
    pub iid: i64,
}

/// One append-only record of a virtue balance change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtueLogEntry {
    pub vid: i64,
    pub uid: i64,
    pub entry: String,
    pub logged_at: SystemTime,
}

/// Row returned by the generic name lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NameMatch {
    User(User),
    Item(Item),
    Tag(Tag),
}
