//! String-keyed durable storage. In the browser this is `window.localStorage`;
//! tests and non-browser builds use the shared in-memory map.

use super::errors::AppError;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// Minimal key/value surface the session store needs.
pub trait KeyValueStorage {
    /// # Errors
    /// Returns `AppError::Storage` if the backing store is unavailable.
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// # Errors
    /// Returns `AppError::Storage` if the write is rejected.
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// # Errors
    /// Returns `AppError::Storage` if the backing store is unavailable.
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        (**self).remove(key)
    }
}

/// In-memory storage. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::LocalStorage;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{AppError, KeyValueStorage};
    use crate::app_lib::errors::js_error_message;

    /// `window.localStorage`, resolved on every call so a storage that becomes
    /// unavailable (private mode, quota) surfaces as an error instead of a panic.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct LocalStorage;

    impl LocalStorage {
        fn storage() -> Result<web_sys::Storage, AppError> {
            web_sys::window()
                .ok_or_else(|| AppError::Storage("Window not found".to_string()))?
                .local_storage()
                .map_err(|err| AppError::Storage(js_error_message(&err)))?
                .ok_or_else(|| AppError::Storage("localStorage is unavailable".to_string()))
        }
    }

    impl KeyValueStorage for LocalStorage {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            Self::storage()?
                .get_item(key)
                .map_err(|err| AppError::Storage(js_error_message(&err)))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
            Self::storage()?
                .set_item(key, value)
                .map_err(|err| AppError::Storage(js_error_message(&err)))
        }

        fn remove(&self, key: &str) -> Result<(), AppError> {
            Self::storage()?
                .remove_item(key)
                .map_err(|err| AppError::Storage(js_error_message(&err)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStorage, MemoryStorage};

    #[test]
    fn clones_share_values() {
        let storage = MemoryStorage::new();
        let view = storage.clone();

        storage.set("auth_token", "abc").expect("set");
        assert_eq!(view.get("auth_token").expect("get"), Some("abc".to_string()));

        view.remove("auth_token").expect("remove");
        assert!(storage.is_empty());
    }
}
