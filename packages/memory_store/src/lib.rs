//! In-memory entity store
//!
//! Keeps entities by key and maps records in and out through
//! `propmap-mapper`. Useful as a test double for a real document store:
//! incomplete keys get ids on `put`, and `get` surfaces field mismatches
//! exactly as `load` does.
//!
//! # Example
//!
//! ```rust
//! use propmap_core::Key;
//! use propmap_mapper::{Record, Schema};
//! use propmap_memory_store::InMemoryDatastore;
//!
//! #[derive(Default)]
//! struct Task {
//!     title: String,
//!     done: bool,
//! }
//!
//! impl Record for Task {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new()
//!             .field("Title", |t| &t.title, |t| &mut t.title)
//!             .field("Done", |t| &t.done, |t| &mut t.done)
//!     }
//! }
//!
//! let mut store = InMemoryDatastore::new();
//! let key = store
//!     .put(Key::incomplete("Task", None), &Task { title: "write docs".into(), done: false })
//!     .unwrap();
//! assert!(!key.is_incomplete());
//!
//! let mut task = Task::default();
//! store.get(&key, &mut task).unwrap();
//! assert_eq!(task.title, "write docs");
//! ```

use std::collections::BTreeMap;

use propmap_core::{Entity, Key};
use propmap_mapper::Record;

mod error;

pub use error::Error;

/// A keyed entity store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    entities: BTreeMap<Key, Entity>,
    next_id: i64,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Save `src` under `key`, returning the stored (completed) key.
    pub fn put<T: Record>(&mut self, key: Key, src: &T) -> Result<Key, Error> {
        let entity = propmap_mapper::save_entity(src)?;
        self.put_entity(key, entity)
    }

    /// Store a raw entity. The entity's own key is replaced by `key`.
    pub fn put_entity(&mut self, key: Key, entity: Entity) -> Result<Key, Error> {
        let key = self.complete(key)?;
        log::debug!("put {} ({} properties)", key, entity.len());
        self.entities.insert(
            key.clone(),
            Entity {
                key: Some(key.clone()),
                properties: entity.properties,
            },
        );
        Ok(key)
    }

    pub fn get_entity(&self, key: &Key) -> Result<&Entity, Error> {
        self.entities
            .get(key)
            .ok_or_else(|| Error::NoSuchEntity { key: key.clone() })
    }

    /// Load the entity stored under `key` into `dst`.
    ///
    /// A field mismatch error leaves `dst` holding everything that loaded.
    pub fn get<T: Record>(&self, key: &Key, dst: &mut T) -> Result<(), Error> {
        let entity = self.get_entity(key)?.clone();
        propmap_mapper::load(dst, entity)?;
        Ok(())
    }

    /// Load several entities at once, one destination per key.
    ///
    /// Every key is attempted; failures come back together as
    /// [`Error::Multi`], indexed like `keys`.
    pub fn get_multi<T: Record>(&self, keys: &[Key], dsts: &mut [T]) -> Result<(), Error> {
        if keys.len() != dsts.len() {
            return Err(Error::LengthMismatch {
                keys: keys.len(),
                destinations: dsts.len(),
            });
        }

        let errors: Vec<Option<Error>> = keys
            .iter()
            .zip(dsts.iter_mut())
            .map(|(key, dst)| self.get(key, dst).err())
            .collect();
        if errors.iter().any(Option::is_some) {
            return Err(Error::Multi(errors));
        }
        Ok(())
    }

    /// Remove the entity under `key`. Returns whether one was stored.
    pub fn delete(&mut self, key: &Key) -> bool {
        self.entities.remove(key).is_some()
    }

    fn complete(&mut self, key: Key) -> Result<Key, Error> {
        let key = if key.is_incomplete() {
            self.next_id += 1;
            key.completed(self.next_id)
        } else {
            key
        };
        if !key.is_valid() {
            return Err(Error::InvalidKey { key });
        }
        Ok(key)
    }
}
