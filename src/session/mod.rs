pub mod storage;
pub mod store;

pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};
pub use store::{AUTH_TOKEN_KEY, AUTH_USER_KEY, SessionError, SessionStore};
