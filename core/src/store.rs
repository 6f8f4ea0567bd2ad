//! Indexed object tables
//!
//! Each table owns records of one object type keyed by a stable
//! [`ObjectId`] with one unique secondary key (name, symbol, claim id...).
//! Records carry a revision that is bumped on every modify.

use crate::error::{Result, StoreError};
use crate::types::{ObjectId, ObjectType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::ops::Deref;

/// A record type that can live in a [`Table`]
pub trait Object: Clone + Debug + Serialize + DeserializeOwned {
    const OBJECT_TYPE: ObjectType;
    type Key: Ord + Clone + Debug + Serialize + DeserializeOwned;

    fn unique_key(&self) -> Self::Key;
}

/// Stored object plus its id and revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: ObjectId,
    pub revision: u32,
    pub data: T,
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Table<T: Object> {
    next_instance: u64,
    records: BTreeMap<u64, Record<T>>,
    by_key: BTreeMap<T::Key, u64>,
}

impl<T: Object> Table<T> {
    pub fn new() -> Self {
        Self {
            next_instance: 0,
            records: BTreeMap::new(),
            by_key: BTreeMap::new(),
        }
    }

    /// Id the next `create` will assign
    pub fn next_id(&self) -> ObjectId {
        ObjectId::new(T::OBJECT_TYPE, self.next_instance)
    }

    /// Insert a new object built from its future id
    pub fn create<F>(&mut self, init: F) -> Result<&Record<T>>
    where
        F: FnOnce(ObjectId) -> T,
    {
        let id = self.next_id();
        let data = init(id);
        let key = data.unique_key();

        if self.by_key.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                object_type: T::OBJECT_TYPE,
                key: format!("{:?}", key),
            });
        }

        self.next_instance += 1;
        self.by_key.insert(key, id.instance);
        let record = self.records.entry(id.instance).or_insert(Record {
            id,
            revision: 0,
            data,
        });
        Ok(record)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Record<T>> {
        if id.object_type != T::OBJECT_TYPE {
            return None;
        }
        self.records.get(&id.instance)
    }

    /// Look up by unique key
    pub fn find<Q>(&self, key: &Q) -> Option<&Record<T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.by_key
            .get(key)
            .and_then(|instance| self.records.get(instance))
    }

    /// Mutate an object in place. The unique key must not change.
    pub fn modify<F, R>(&mut self, id: ObjectId, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let record = self
            .records
            .get_mut(&id.instance)
            .filter(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let mut data = record.data.clone();
        let out = mutate(&mut data);
        if data.unique_key() != record.data.unique_key() {
            return Err(StoreError::KeyChanged(id));
        }

        record.data = data;
        record.revision += 1;
        Ok(out)
    }

    pub fn remove(&mut self, id: ObjectId) -> Result<T> {
        if id.object_type != T::OBJECT_TYPE {
            return Err(StoreError::NotFound(id));
        }
        let record = self
            .records
            .remove(&id.instance)
            .ok_or(StoreError::NotFound(id))?;
        self.by_key.remove(&record.data.unique_key());
        Ok(record.data)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record<T>> {
        self.records.values()
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.records.values().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Object> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}
