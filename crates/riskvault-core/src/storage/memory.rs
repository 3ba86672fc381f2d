//! # In-Memory Document Store
//!
//! Volatile `DocumentStore` used for tests, the CLI `--backend memory` mode
//! and anywhere persistence is not wanted.
//!
//! Collections are kept in a `BTreeMap` so listing is deterministic. Each
//! call takes the lock once, which makes every single call atomic.

use super::{DocumentStore, Filter, Update, UpdateResult, same_slot};
use crate::{CollectionName, Document, VaultError};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Collections = BTreeMap<CollectionName, Vec<Document>>;

/// A volatile document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, VaultError> {
        self.collections
            .read()
            .map_err(|_| VaultError::Store("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, VaultError> {
        self.collections
            .write()
            .map_err(|_| VaultError::Store("memory store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn find(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<Vec<Document>, VaultError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    fn exists(&self, collection: &CollectionName, filter: &Filter) -> Result<bool, VaultError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .is_some_and(|docs| docs.iter().any(|d| filter.matches(d))))
    }

    fn insert_one(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<(), VaultError> {
        let mut collections = self.write()?;
        collections
            .entry(collection.clone())
            .or_default()
            .push(document);
        Ok(())
    }

    fn insert_unique(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<(), VaultError> {
        let mut collections = self.write()?;
        let docs = collections.entry(collection.clone()).or_default();
        if docs.iter().any(|existing| same_slot(existing, &document)) {
            return Err(VaultError::VersionConflict {
                file_name: document.file_name,
                version_name: document.version_name,
            });
        }
        docs.push(document);
        Ok(())
    }

    fn update_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult, VaultError> {
        let mut collections = self.write()?;
        let target = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)));

        Ok(match target {
            Some(document) => UpdateResult {
                matched: 1,
                modified: u64::from(update.apply(document)),
            },
            None => UpdateResult::default(),
        })
    }

    fn delete_one(&self, collection: &CollectionName, filter: &Filter) -> Result<u64, VaultError> {
        let mut collections = self.write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_many(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<u64, VaultError> {
        let mut collections = self.write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }

    fn create_collection(&self, name: &CollectionName) -> Result<bool, VaultError> {
        let mut collections = self.write()?;
        if collections.contains_key(name) {
            return Ok(false);
        }
        collections.insert(name.clone(), Vec::new());
        Ok(true)
    }

    fn drop_collection(&self, name: &CollectionName) -> Result<bool, VaultError> {
        Ok(self.write()?.remove(name).is_some())
    }

    fn list_collections(&self) -> Result<Vec<CollectionName>, VaultError> {
        Ok(self.read()?.keys().cloned().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
