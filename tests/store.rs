//! Integration tests for the on-disk credential store.

use legal_analyzer::{AnalyzerError, CredentialStore};

#[test]
fn registering_twice_leaves_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("users.db");
    let store = CredentialStore::open(&db).unwrap();

    assert!(store.register("jane", "hunter2").is_ok());
    let second = store.register("jane", "hunter2");
    assert!(matches!(second, Err(AnalyzerError::UsernameExists)));
    assert_eq!(store.user_count().unwrap(), 1);
}

#[test]
fn accounts_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("users.db");

    let id = {
        let store = CredentialStore::open(&db).unwrap();
        store.register("jane", "hunter2").unwrap().id
    };

    let store = CredentialStore::open(&db).unwrap();
    let user = store.authenticate("jane", "hunter2").unwrap();
    assert_eq!(user.id, id);
    assert!(matches!(
        store.authenticate("jane", "wrong"),
        Err(AnalyzerError::InvalidCredentials)
    ));
}

#[test]
fn stored_password_is_not_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("users.db");
    let store = CredentialStore::open(&db).unwrap();
    store.register("jane", "hunter2").unwrap();
    drop(store);

    let raw = std::fs::read(&db).unwrap();
    let needle = b"hunter2";
    assert!(!raw.windows(needle.len()).any(|w| w == needle));
}
