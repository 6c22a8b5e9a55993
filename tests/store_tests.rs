mod auth_support;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use regex::Regex;
use robinstock::auth::{CredentialStore, CredentialStoreConfig, DeviceToken, FileCredentialStore};
use tempfile::TempDir;

use auth_support::credential;

fn temp_store() -> (TempDir, FileCredentialStore) {
    let dir = TempDir::new().expect("tempdir");
    let store = FileCredentialStore::new(CredentialStoreConfig::new(dir.path().to_path_buf()));
    (dir, store)
}

#[test]
fn save_then_load_round_trips() {
    let (_dir, store) = temp_store();
    let saved = credential("access-1", 86400);
    store.save("alice", &saved).expect("save");
    assert_eq!(store.load("alice"), Some(saved));
}

#[test]
fn identities_are_isolated() {
    let (_dir, store) = temp_store();
    store.save("alice", &credential("a", 86400)).expect("save");
    store.save("bob", &credential("b", 86400)).expect("save");
    store.delete("alice").expect("delete");
    assert!(store.load("alice").is_none());
    assert_eq!(store.load("bob").expect("bob").access_token, "b");
}

#[test]
fn expired_record_is_removed_on_load() {
    let (_dir, store) = temp_store();
    let mut stale = credential("old", 60);
    stale.issued_at = Some(Utc::now() - Duration::minutes(5));
    store.save("alice", &stale).expect("save");
    let path = store.credential_path("alice");
    assert!(path.exists());

    assert!(store.load("alice").is_none());
    assert!(!path.exists());
}

#[test]
fn non_expiring_record_survives() {
    let (_dir, store) = temp_store();
    let mut forever = credential("forever", 0);
    forever.issued_at = Some(Utc::now() - Duration::days(365));
    store.save("alice", &forever).expect("save");
    assert_eq!(store.load("alice").expect("stored").access_token, "forever");
}

#[test]
fn deleting_missing_identity_is_ok() {
    let (_dir, store) = temp_store();
    store.delete("nobody").expect("delete");
}

#[test]
fn device_tokens_are_uuid_shaped() {
    let pattern =
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap();
    for _ in 0..64 {
        let token = DeviceToken::generate().expect("device token");
        assert!(pattern.is_match(token.as_str()), "bad token {token}");
    }
}
