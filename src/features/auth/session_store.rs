//! Durable copy of the signed-in user. The record and its access token live in
//! two storage slots that are always written and cleared as a pair, so a reader
//! never sees one without the other. Anything unreadable is discarded and the
//! slots are wiped.

use super::types::{SessionToken, UserRecord};
use crate::app_lib::{AppError, storage::KeyValueStorage};
use tracing::{debug, error, warn};

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "user_info";

pub struct SessionStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the stored pair if both halves are present and valid. Anything
    /// else clears both slots.
    pub fn load(&self) -> Option<(UserRecord, SessionToken)> {
        match self.read() {
            Ok(Some(pair)) => Some(pair),
            Ok(None) => None,
            Err(err) => {
                warn!("Discarding stored session: {err}");
                self.clear();
                None
            }
        }
    }

    fn read(&self) -> Result<Option<(UserRecord, SessionToken)>, AppError> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;

        let (token, user) = match (token, user) {
            (None, None) => return Ok(None),
            (Some(token), Some(user)) => (token, user),
            _ => return Err(AppError::Corrupt("token and user record out of sync".to_string())),
        };

        let record: UserRecord = serde_json::from_str(&user)?;
        if !record.is_valid() {
            return Err(AppError::Corrupt("user record is missing id or email".to_string()));
        }
        let token = SessionToken::new(token)
            .ok_or_else(|| AppError::Corrupt("empty access token".to_string()))?;

        Ok(Some((record, token)))
    }

    /// Persists the pair. If the second write fails the first is rolled back.
    ///
    /// # Errors
    /// Returns `AppError::Corrupt` for an invalid record, or the storage error
    /// that aborted the write.
    pub fn save(&self, record: &UserRecord, token: &SessionToken) -> Result<(), AppError> {
        if !record.is_valid() {
            return Err(AppError::Corrupt(
                "refusing to store a record without id or email".to_string(),
            ));
        }
        let user = serde_json::to_string(record)
            .map_err(|err| AppError::Storage(format!("Failed to encode user record: {err}")))?;

        self.storage.set(USER_KEY, &user)?;
        if let Err(err) = self.storage.set(TOKEN_KEY, token.as_str()) {
            error!("Failed to store access token, rolling back: {err}");
            self.clear();
            return Err(err);
        }

        debug!(user_id = %record.id, "Stored session");
        Ok(())
    }

    /// Removes both slots. Each removal is attempted even if the other fails.
    pub fn clear(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                error!("Failed to remove {key}: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_lib::storage::MemoryStorage;
    use std::cell::Cell;

    fn alice() -> UserRecord {
        UserRecord {
            id: "u1".to_string(),
            email: "a@b.com".to_string(),
            display_name: "Alice".to_string(),
        }
    }

    fn token() -> SessionToken {
        SessionToken::new("token-1").expect("token")
    }

    #[test]
    fn save_then_load_round_trips() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());

        store.save(&alice(), &token()).expect("save");
        let (record, loaded) = store.load().expect("stored pair");

        assert_eq!(record, alice());
        assert_eq!(loaded, token());
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn empty_store_loads_none() {
        let store = SessionStore::new(MemoryStorage::new());
        assert!(store.load().is_none());
    }

    #[test]
    fn invalid_records_are_discarded() {
        for user in [
            r#"{"id":"","email":"a@b.com","name":"A"}"#,
            r#"{"id":"u1","email":"","name":"A"}"#,
            r#"{"email":"a@b.com"}"#,
            r#"{"id":"u1"}"#,
            "not json",
        ] {
            let storage = MemoryStorage::new();
            storage.set(TOKEN_KEY, "token-1").expect("set");
            storage.set(USER_KEY, user).expect("set");
            let store = SessionStore::new(storage.clone());

            assert!(store.load().is_none(), "{user} should be rejected");
            assert!(storage.is_empty(), "{user} should be cleared");
            assert!(store.load().is_none());
        }
    }

    #[test]
    fn half_pairs_are_discarded() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "token-1").expect("set");
        let store = SessionStore::new(storage.clone());
        assert!(store.load().is_none());
        assert!(storage.is_empty());

        storage
            .set(USER_KEY, r#"{"id":"u1","email":"a@b.com","name":"Alice"}"#)
            .expect("set");
        assert!(store.load().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn blank_stored_token_is_discarded() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, " ").expect("set");
        storage
            .set(USER_KEY, r#"{"id":"u1","email":"a@b.com","name":"Alice"}"#)
            .expect("set");
        let store = SessionStore::new(storage.clone());

        assert!(store.load().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn save_rejects_invalid_record_without_writing() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        let mut record = alice();
        record.id = String::new();

        assert!(matches!(store.save(&record, &token()), Err(AppError::Corrupt(_))));
        assert!(storage.is_empty());
    }

    #[test]
    fn clear_removes_both_slots() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&alice(), &token()).expect("save");

        store.clear();
        assert!(storage.is_empty());
        assert!(store.load().is_none());
    }

    /// Rejects writes to the token slot, like a full quota would.
    struct TokenWriteFails {
        inner: MemoryStorage,
        writes: Cell<usize>,
    }

    impl KeyValueStorage for TokenWriteFails {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
            self.writes.set(self.writes.get() + 1);
            if key == TOKEN_KEY {
                return Err(AppError::Storage("quota exceeded".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), AppError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_token_write_rolls_back_record() {
        let inner = MemoryStorage::new();
        let store = SessionStore::new(TokenWriteFails {
            inner: inner.clone(),
            writes: Cell::new(0),
        });

        let err = store.save(&alice(), &token()).unwrap_err();
        assert_eq!(err, AppError::Storage("quota exceeded".to_string()));
        assert!(inner.is_empty());
        assert!(store.load().is_none());
    }
}
