use std::io;
use std::sync::Arc;
use std::time::Duration;

use iirs_attendance::client::{DEMO_TOKEN, StaticAuthenticator};
use iirs_attendance::config::Config;
use iirs_attendance::model::{SUPERVISOR_ROLE, Supervisor};
use iirs_attendance::session::{
    AUTH_TOKEN_KEY, AUTH_USER_KEY, FileStorage, KeyValueStore, MemoryStorage, SessionError,
    SessionStore, StorageError,
};
use tokio::sync::RwLock;

/// Reads fine, refuses every write.
struct ReadOnlyStorage;

impl KeyValueStore for ReadOnlyStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

fn store_over(storage: Arc<dyn KeyValueStore>) -> SessionStore {
    SessionStore::new(storage, Arc::new(StaticAuthenticator))
}

#[tokio::test]
async fn valid_login_yields_the_on_file_profile() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_over(storage.clone());
    store.restore_from_storage().await;

    assert!(store.login("test2", "pass2").await.unwrap());
    assert_eq!(
        store.require_supervisor().await.unwrap(),
        Supervisor {
            username: "test2".into(),
            name: "Test Admin 2".into(),
            role: SUPERVISOR_ROLE.into(),
        }
    );
    assert_eq!(store.token_handle().read().await.as_deref(), Some(DEMO_TOKEN));
    assert!(storage.get(AUTH_USER_KEY).unwrap().is_some());
    assert_eq!(storage.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some(DEMO_TOKEN));
}

#[tokio::test]
async fn invalid_login_yields_a_generic_failure() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_over(storage.clone());
    store.restore_from_storage().await;

    assert!(!store.login("test1", "wrong").await.unwrap());
    assert!(!store.login("nobody", "pass").await.unwrap());
    assert!(!store.is_authenticated().await);
    assert!(matches!(
        store.require_supervisor().await,
        Err(SessionError::Unauthenticated)
    ));
    assert!(storage.get(AUTH_USER_KEY).unwrap().is_none());
}

#[tokio::test]
async fn hydration_gate_flips_exactly_once() {
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(store_over(storage));
    assert!(store.is_hydrating());
    assert!(matches!(
        store.require_supervisor().await,
        Err(SessionError::Hydrating)
    ));

    let waiter = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.wait_until_hydrated().await })
    };
    store.restore_from_storage().await;
    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter released")
        .unwrap();
    assert!(!store.is_hydrating());

    // A later restore does not reopen the gate or clobber a fresh login.
    assert!(store.login("test1", "pass").await.unwrap());
    assert_eq!(
        store.restore_from_storage().await.map(|s| s.username),
        Some("test1".to_string())
    );
    assert!(!store.is_hydrating());
}

#[tokio::test]
async fn session_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let first = store_over(Arc::new(FileStorage::new(&path)));
    first.restore_from_storage().await;
    assert!(first.login("test3", "pass3").await.unwrap());

    let second = store_over(Arc::new(FileStorage::new(&path)));
    let restored = second.restore_from_storage().await.unwrap();
    assert_eq!(restored.username, "test3");
    assert_eq!(restored.name, "Test Admin 3");
    assert_eq!(second.token_handle().read().await.as_deref(), Some(DEMO_TOKEN));
}

#[tokio::test]
async fn configured_store_path_is_used_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iirs-session.json");
    let path_str = path.to_string_lossy().into_owned();
    let config = Config::from_lookup(|key| (key == "SESSION_STORE_PATH").then(|| path_str.clone())).unwrap();

    let first = SessionStore::from_config(&config, Arc::new(StaticAuthenticator), Arc::new(RwLock::new(None)));
    first.restore_from_storage().await;
    assert!(first.login("test1", "pass").await.unwrap());
    assert!(path.exists());

    let token = Arc::new(RwLock::new(None));
    let second = SessionStore::from_config(&config, Arc::new(StaticAuthenticator), token.clone());
    let restored = second.restore_from_storage().await.unwrap();
    assert_eq!(restored.username, "test1");
    assert_eq!(token.read().await.as_deref(), Some(DEMO_TOKEN));
}

#[tokio::test]
async fn login_fails_when_the_session_cannot_be_saved() {
    let store = store_over(Arc::new(ReadOnlyStorage));
    store.restore_from_storage().await;

    let result = store.login("test1", "pass").await;
    assert!(matches!(result, Err(SessionError::Storage(StorageError::Io(_)))));
    assert!(!store.is_authenticated().await);
    assert!(store.token_handle().read().await.is_none());
}

#[tokio::test]
async fn malformed_record_is_treated_as_absent() {
    for raw in [
        "not json",
        r#"{"username":"test1"}"#,
        r#"{"version":9,"supervisor":{"username":"test1","name":"x","role":"y"}}"#,
        r#"{"version":1,"supervisor":{"username":"  ","name":"x","role":"y"}}"#,
    ] {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(AUTH_USER_KEY, raw).unwrap();
        storage.set(AUTH_TOKEN_KEY, "stale").unwrap();

        let store = store_over(storage.clone());
        assert_eq!(store.restore_from_storage().await, None, "{raw}");
        assert!(!store.is_hydrating());
        assert!(storage.get(AUTH_USER_KEY).unwrap().is_none());
        assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());
    }
}

#[tokio::test]
async fn corrupt_storage_file_does_not_block_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{{{").unwrap();

    let store = store_over(Arc::new(FileStorage::new(&path)));
    assert_eq!(store.restore_from_storage().await, None);
    assert!(store.login("test1", "pass").await.unwrap());

    let reread = FileStorage::new(&path);
    assert!(reread.get(AUTH_USER_KEY).unwrap().is_some());
}

#[tokio::test]
async fn logout_is_idempotent() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_over(storage.clone());
    store.restore_from_storage().await;
    store.login("test1", "pass").await.unwrap();

    store.logout().await;
    store.logout().await;

    assert!(!store.is_authenticated().await);
    assert!(store.token_handle().read().await.is_none());
    assert!(storage.get(AUTH_USER_KEY).unwrap().is_none());
    assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());
}
