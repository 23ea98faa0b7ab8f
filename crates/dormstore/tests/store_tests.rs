//! Integration tests for the dormstore persistence layer
//!
//! Each test runs against a fresh migrated database in a temp directory.

use std::time::{Duration, UNIX_EPOCH};

use anyhow::Result;
use dormstore::models::{NameMatch, NewItem, NewShare, NewUser};
use dormstore::{Store, StoreImpl, open_database};
use tempfile::TempDir;

/// Helper to create a migrated store backed by a temp directory.
/// The returned guard must outlive the store.
async fn create_test_store() -> Result<(StoreImpl, TempDir)> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("test.db");
    let pool = open_database(db_path.to_string_lossy().as_ref()).await?;
    Ok((StoreImpl::new_from_pool(pool), dir))
}

fn sample_user() -> NewUser {
    NewUser { name: "A".to_string(), dorm: "1".to_string(), email: "a@x.com".to_string() }
}

fn sample_item() -> NewItem {
    NewItem {
        name: "kettle".to_string(),
        brand: "Zojirushi".to_string(),
        description: "1.5L electric kettle".to_string(),
        qty: 1,
        consumable: false,
    }
}

#[tokio::test]
async fn insert_user_creates_zeroed_virtue_row() -> Result<()> {
    let (store, _dir) = create_test_store().await?;

    let uid = store.insert_user(&sample_user()).await?;
    let user = store.get_user_by_id(uid).await?.expect("user row");

    assert_eq!(user.uid, uid);
    assert_eq!(user.name, "A");
    assert_eq!(user.dorm, "1");
    assert_eq!(user.email, "a@x.com");
    assert_eq!(store.get_virtue_balance(uid).await?, Some(0));
    Ok(())
}

#[tokio::test]
async fn virtue_updates_accumulate() -> Result<()> {
    let (store, _dir) = create_test_store().await?;
    let uid = store.insert_user(&sample_user()).await?;

    assert_eq!(store.update_virtue(uid, 5).await?, 5);
    assert_eq!(store.update_virtue(uid, -2).await?, 3);
    assert_eq!(store.get_virtue_balance(uid).await?, Some(3));
    Ok(())
}

#[tokio::test]
async fn virtue_update_requires_existing_balance() -> Result<()> {
    let (store, _dir) = create_test_store().await?;

    assert!(store.update_virtue(999, 5).await.is_err());
    Ok(())
}

#[tokio::test]
async fn reads_of_missing_rows_are_empty() -> Result<()> {
    let (store, _dir) = create_test_store().await?;

    assert!(store.get_user_by_id(42).await?.is_none());
    assert!(store.get_user_by_email("nobody@x.com").await?.is_none());
    assert!(store.get_item_by_id(42).await?.is_none());
    assert!(store.get_owner_by_item(42).await?.is_none());
    assert!(store.get_share_by_item(42).await?.is_none());
    assert!(store.get_tags_by_item(42).await?.is_empty());
    assert!(store.get_virtue_balance(42).await?.is_none());
    assert!(store.get_virtue_log(42).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn name_lookup_rejects_unlisted_tables() -> Result<()> {
    let (store, _dir) = create_test_store().await?;
    store.insert_user(&sample_user()).await?;

    assert!(store.find_by_name("virtue", "A").await?.is_empty());
    assert!(store.find_by_name("share", "A").await?.is_empty());
    assert!(store.find_by_name("users; DROP TABLE users", "A").await?.is_empty());

    // Spelling is case-insensitive for the listed tables
    assert_eq!(store.find_by_name("USERS", "A").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn name_lookup_finds_rows_in_each_listed_table() -> Result<()> {
    let (store, _dir) = create_test_store().await?;
    let uid = store.insert_user(&sample_user()).await?;
    let iid = store.register_item(&sample_item(), uid, &["kitchen".to_string()]).await?;

    match store.find_by_name("users", "A").await?.as_slice() {
        [NameMatch::User(user)] => assert_eq!(user.uid, uid),
        other => panic!("expected one user match, got {other:?}"),
    }
    match store.find_by_name("items", "kettle").await?.as_slice() {
        [NameMatch::Item(item)] => assert_eq!(item.iid, iid),
        other => panic!("expected one item match, got {other:?}"),
    }
    match store.find_by_name("tags", "kitchen").await?.as_slice() {
        [NameMatch::Tag(tag)] => assert_eq!(tag.iid, iid),
        other => panic!("expected one tag match, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn register_item_creates_item_owner_and_tags() -> Result<()> {
    let (store, _dir) = create_test_store().await?;
    let uid = store.insert_user(&sample_user()).await?;

    let tags = vec!["kitchen".to_string(), "appliance".to_string()];
    let iid = store.register_item(&sample_item(), uid, &tags).await?;

    let item = store.get_item_by_id(iid).await?.expect("item row");
    assert_eq!(item.name, "kettle");
    assert_eq!(item.qty, 1);
    assert!(!item.consumable);

    let own = store.get_owner_by_item(iid).await?.expect("ownership row");
    assert_eq!(own.uid, uid);
    assert_eq!(own.iid, iid);

    assert_eq!(store.get_tags_by_item(iid).await?, tags);
    Ok(())
}

#[tokio::test]
async fn share_roundtrip_preserves_deadline() -> Result<()> {
    let (store, _dir) = create_test_store().await?;
    let uid = store.insert_user(&sample_user()).await?;
    let iid = store.insert_item(&sample_item()).await?;
    store.insert_own(uid, iid).await?;

    // Whole seconds so the stored value round-trips exactly
    let deadline = UNIX_EPOCH + Duration::from_secs(1_900_000_000);
    let sid = store
        .insert_share(&NewShare { uid, iid, note: "lent to room 204".to_string(), deadline })
        .await?;
    assert!(sid > 0);

    let share = store.get_share_by_item(iid).await?.expect("share row");
    assert_eq!(share.sid, sid);
    assert_eq!(share.uid, uid);
    assert_eq!(share.iid, iid);
    assert_eq!(share.note, "lent to room 204");
    assert_eq!(share.deadline, deadline);
    Ok(())
}

#[tokio::test]
async fn virtue_log_is_append_only_newest_first() -> Result<()> {
    let (store, _dir) = create_test_store().await?;
    let uid = store.insert_user(&sample_user()).await?;

    let first = store.insert_virtue_log(uid, "helped clean the kitchen").await?;
    let second = store.insert_virtue_log(uid, "returned the mop late").await?;
    assert!(second > first);

    let log = store.get_virtue_log(uid).await?;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].vid, second);
    assert_eq!(log[0].entry, "returned the mop late");
    assert_eq!(log[1].vid, first);
    assert_eq!(log[1].entry, "helped clean the kitchen");
    Ok(())
}

#[tokio::test]
async fn consumable_flag_round_trips() -> Result<()> {
    let (store, _dir) = create_test_store().await?;

    let iid = store
        .insert_item(&NewItem {
            name: "rice".to_string(),
            brand: "generic".to_string(),
            description: "5kg bag".to_string(),
            qty: 2,
            consumable: true,
        })
        .await?;

    let item = store.get_item_by_id(iid).await?.expect("item row");
    assert!(item.consumable);
    assert_eq!(item.qty, 2);
    Ok(())
}
