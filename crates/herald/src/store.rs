//! Key/value persistence collaborator.
//!
//! The dispatcher never touches a store. Whatever layer receives a
//! [`RunResult`](crate::RunResult) decides what to persist and goes through
//! the [`KeyValueStore`] interface, so backends can be swapped without the
//! core noticing. [`MemoryStore`] is the in-process implementation.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::Identity;

/// The persisted shape of one greeted entity.
///
/// Attributes other than the key are optional because a key-only
/// [`Projection`] strips them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserRecord {
    pub user_id: Identity,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub first_name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub age: Option<u32>,
}

impl UserRecord {
    pub fn new(user_id: Identity, first_name: impl Into<String>, age: u32) -> Self {
        Self {
            user_id,
            first_name: Some(first_name.into()),
            age: Some(age),
        }
    }

    fn project(&self, projection: Projection) -> Self {
        match projection {
            Projection::All => self.clone(),
            Projection::KeysOnly => Self {
                user_id: self.user_id,
                first_name: None,
                age: None,
            },
        }
    }
}

/// Which attributes a [`KeyValueStore::scan`] returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    KeysOnly,
}

/// Errors reported by a [`KeyValueStore`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The item is missing attributes every stored record must carry.
    #[error("invalid item: {reason}")]
    InvalidItem { reason: String },

    /// The backend could not complete the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Abstract get/put/scan storage for [`UserRecord`]s.
pub trait KeyValueStore: Send + Sync {
    /// Inserts or replaces the item stored under `key`.
    fn put(&self, key: Identity, item: UserRecord) -> Result<(), StoreError>;

    /// Returns the item under `key`, or `None` if nothing is stored there.
    fn get(&self, key: Identity) -> Result<Option<UserRecord>, StoreError>;

    /// Returns every stored item, ordered by key, with `projection` applied.
    fn scan(&self, projection: Projection) -> Result<Vec<UserRecord>, StoreError>;
}

/// An in-memory [`KeyValueStore`] guarded by a reader/writer lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<Identity, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn put(&self, key: Identity, item: UserRecord) -> Result<(), StoreError> {
        if item.first_name.as_deref().is_none_or(str::is_empty) || item.age.is_none() {
            return Err(StoreError::InvalidItem {
                reason: "first_name and age are required".into(),
            });
        }
        if item.user_id != key {
            return Err(StoreError::InvalidItem {
                reason: format!("user_id {} does not match key {key}", item.user_id),
            });
        }
        self.items.write().insert(key, item);
        Ok(())
    }

    fn get(&self, key: Identity) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.items.read().get(&key).cloned())
    }

    fn scan(&self, projection: Projection) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self
            .items
            .read()
            .values()
            .map(|item| item.project(projection))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> Identity {
        Identity::new(raw)
    }

    #[test]
    fn put_then_get() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.put(id(1), UserRecord::new(id(1), "John", 30)).unwrap();

        assert_eq!(
            store.get(id(1)).unwrap(),
            Some(UserRecord::new(id(1), "John", 30))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(id(404)).unwrap(), None);
    }

    #[test]
    fn put_replaces_existing_item() {
        let store = MemoryStore::new();
        store.put(id(1), UserRecord::new(id(1), "John", 30)).unwrap();
        store.put(id(1), UserRecord::new(id(1), "John", 31)).unwrap();
        assert_eq!(store.get(id(1)).unwrap().unwrap().age, Some(31));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rejects_incomplete_items() {
        let store = MemoryStore::new();
        let nameless = UserRecord {
            user_id: id(1),
            first_name: None,
            age: Some(3),
        };
        assert_eq!(
            store.put(id(1), nameless),
            Err(StoreError::InvalidItem {
                reason: "first_name and age are required".into()
            })
        );

        let ageless = UserRecord {
            user_id: id(1),
            first_name: Some("Bo".into()),
            age: None,
        };
        assert!(store.put(id(1), ageless).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_mismatched_key() {
        let store = MemoryStore::new();
        let err = store
            .put(id(2), UserRecord::new(id(1), "John", 30))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid item: user_id 1 does not match key 2"
        );
    }

    #[test]
    fn scan_orders_by_key_and_projects() {
        let store = MemoryStore::new();
        store.put(id(2), UserRecord::new(id(2), "Michael", 13)).unwrap();
        store.put(id(1), UserRecord::new(id(1), "John", 30)).unwrap();

        let all = store.scan(Projection::All).unwrap();
        assert_eq!(all[0].first_name.as_deref(), Some("John"));
        assert_eq!(all[1].first_name.as_deref(), Some("Michael"));

        let keys = store.scan(Projection::KeysOnly).unwrap();
        assert_eq!(
            keys,
            vec![
                UserRecord {
                    user_id: id(1),
                    first_name: None,
                    age: None
                },
                UserRecord {
                    user_id: id(2),
                    first_name: None,
                    age: None
                },
            ]
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn key_only_records_serialize_without_attributes() {
        let record = UserRecord::new(id(7), "Mery", 60).project(Projection::KeysOnly);
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"user_id":7}"#);
    }
}
