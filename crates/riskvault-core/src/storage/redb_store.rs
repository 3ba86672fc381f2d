//! # redb-backed Document Store
//!
//! A disk-backed `DocumentStore` using the redb embedded database, providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! ## Layout
//!
//! - `documents`: `(collection, sequence)` -> record bytes (header + postcard)
//! - `collections`: collection name -> sequence number at creation
//! - `metadata`: `next_sequence` counter
//!
//! The sequence is a store-internal document id, so two documents with the
//! same `(fileName, versionName)` can coexist, exactly as with `insert_one`
//! on any schema-less store. `insert_unique` and `update_one` do their read
//! and their write inside one write transaction and are therefore atomic.

use super::{DocumentStore, Filter, Update, UpdateResult, same_slot};
use crate::formats::{document_from_bytes, document_to_bytes};
use crate::{CollectionName, Document, VaultError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use std::path::Path;

/// Table for documents: (collection, sequence) -> serialized record
const DOCUMENTS: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("documents");

/// Table for explicit and implicit collections: name -> sequence at creation
const COLLECTIONS: TableDefinition<&str, u64> = TableDefinition::new("collections");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_SEQUENCE: &str = "next_sequence";

fn store_err(e: impl std::fmt::Display) -> VaultError {
    VaultError::Store(e.to_string())
}

/// A disk-backed document store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a document database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VaultError> {
        let db = Database::create(path.as_ref()).map_err(store_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(store_err)?;
            let _ = write_txn.open_table(DOCUMENTS).map_err(store_err)?;
            let _ = write_txn.open_table(COLLECTIONS).map_err(store_err)?;
            let _ = write_txn.open_table(METADATA).map_err(store_err)?;
            write_txn.commit().map_err(store_err)?;
        }

        tracing::debug!(path = %path.as_ref().display(), "opened redb document store");
        Ok(Self { db })
    }

    /// Collect `(sequence, document)` pairs of one collection matching a filter.
    ///
    /// Stops decoding once `limit` matches are found.
    fn scan(
        table: &impl ReadableTable<(&'static str, u64), &'static [u8]>,
        collection: &CollectionName,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<(u64, Document)>, VaultError> {
        let name = collection.as_str();
        let mut matches = Vec::new();
        for entry in table
            .range((name, 0u64)..=(name, u64::MAX))
            .map_err(store_err)?
        {
            if limit.is_some_and(|limit| matches.len() >= limit) {
                break;
            }
            let (key, value) = entry.map_err(store_err)?;
            let (_collection, sequence) = key.value();
            let document = document_from_bytes(value.value())?;
            if filter.matches(&document) {
                matches.push((sequence, document));
            }
        }
        Ok(matches)
    }

    /// Append a document inside an open write transaction.
    ///
    /// Registers the collection if this is its first document.
    fn append(
        write_txn: &WriteTransaction,
        collection: &CollectionName,
        document: &Document,
    ) -> Result<(), VaultError> {
        let bytes = document_to_bytes(document)?;

        let mut meta_table = write_txn.open_table(METADATA).map_err(store_err)?;
        let sequence = meta_table
            .get(NEXT_SEQUENCE)
            .map_err(store_err)?
            .map(|v| v.value())
            .unwrap_or(0);
        meta_table
            .insert(NEXT_SEQUENCE, sequence.saturating_add(1))
            .map_err(store_err)?;

        let mut collections_table = write_txn.open_table(COLLECTIONS).map_err(store_err)?;
        let known = collections_table
            .get(collection.as_str())
            .map_err(store_err)?
            .is_some();
        if !known {
            collections_table
                .insert(collection.as_str(), sequence)
                .map_err(store_err)?;
        }

        let mut docs_table = write_txn.open_table(DOCUMENTS).map_err(store_err)?;
        docs_table
            .insert((collection.as_str(), sequence), bytes.as_slice())
            .map_err(store_err)?;
        Ok(())
    }

    /// Remove matching documents inside an open write transaction.
    fn remove_matching(
        write_txn: &WriteTransaction,
        collection: &CollectionName,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<u64, VaultError> {
        let mut docs_table = write_txn.open_table(DOCUMENTS).map_err(store_err)?;
        let sequences: Vec<u64> = Self::scan(&docs_table, collection, filter, limit)?
            .into_iter()
            .map(|(sequence, _)| sequence)
            .collect();

        for sequence in &sequences {
            docs_table
                .remove((collection.as_str(), *sequence))
                .map_err(store_err)?;
        }
        Ok(sequences.len() as u64)
    }
}

impl DocumentStore for RedbStore {
    fn find(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<Vec<Document>, VaultError> {
        let read_txn = self.db.begin_read().map_err(store_err)?;
        let docs_table = read_txn.open_table(DOCUMENTS).map_err(store_err)?;

        Ok(Self::scan(&docs_table, collection, filter, None)?
            .into_iter()
            .map(|(_, document)| document)
            .collect())
    }

    fn exists(&self, collection: &CollectionName, filter: &Filter) -> Result<bool, VaultError> {
        let read_txn = self.db.begin_read().map_err(store_err)?;
        let docs_table = read_txn.open_table(DOCUMENTS).map_err(store_err)?;

        Ok(!Self::scan(&docs_table, collection, filter, Some(1))?.is_empty())
    }

    fn insert_one(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<(), VaultError> {
        let write_txn = self.db.begin_write().map_err(store_err)?;
        Self::append(&write_txn, collection, &document)?;
        write_txn.commit().map_err(store_err)
    }

    fn insert_unique(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<(), VaultError> {
        let write_txn = self.db.begin_write().map_err(store_err)?;

        let taken = {
            let docs_table = write_txn.open_table(DOCUMENTS).map_err(store_err)?;
            let slot = Filter::file(&document.file_name).version(document.version_name);
            let existing = Self::scan(&docs_table, collection, &slot, Some(1))?;
            existing.iter().any(|(_, d)| same_slot(d, &document))
        };

        if taken {
            write_txn.abort().map_err(store_err)?;
            return Err(VaultError::VersionConflict {
                file_name: document.file_name,
                version_name: document.version_name,
            });
        }

        Self::append(&write_txn, collection, &document)?;
        write_txn.commit().map_err(store_err)
    }

    fn update_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult, VaultError> {
        let write_txn = self.db.begin_write().map_err(store_err)?;

        let result = {
            let mut docs_table = write_txn.open_table(DOCUMENTS).map_err(store_err)?;
            let first = Self::scan(&docs_table, collection, filter, Some(1))?
                .into_iter()
                .next();
            match first {
                Some((sequence, mut document)) => {
                    let modified = update.apply(&mut document);
                    if modified {
                        let bytes = document_to_bytes(&document)?;
                        docs_table
                            .insert((collection.as_str(), sequence), bytes.as_slice())
                            .map_err(store_err)?;
                    }
                    UpdateResult {
                        matched: 1,
                        modified: u64::from(modified),
                    }
                }
                None => UpdateResult::default(),
            }
        };

        write_txn.commit().map_err(store_err)?;
        Ok(result)
    }

    fn delete_one(&self, collection: &CollectionName, filter: &Filter) -> Result<u64, VaultError> {
        let write_txn = self.db.begin_write().map_err(store_err)?;
        let deleted = Self::remove_matching(&write_txn, collection, filter, Some(1))?;
        write_txn.commit().map_err(store_err)?;
        Ok(deleted)
    }

    fn delete_many(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<u64, VaultError> {
        let write_txn = self.db.begin_write().map_err(store_err)?;
        let deleted = Self::remove_matching(&write_txn, collection, filter, None)?;
        write_txn.commit().map_err(store_err)?;
        Ok(deleted)
    }

    fn create_collection(&self, name: &CollectionName) -> Result<bool, VaultError> {
        let write_txn = self.db.begin_write().map_err(store_err)?;

        let created = {
            let meta_table = write_txn.open_table(METADATA).map_err(store_err)?;
            let sequence = meta_table
                .get(NEXT_SEQUENCE)
                .map_err(store_err)?
                .map(|v| v.value())
                .unwrap_or(0);

            let mut collections_table = write_txn.open_table(COLLECTIONS).map_err(store_err)?;
            let exists = collections_table
                .get(name.as_str())
                .map_err(store_err)?
                .is_some();
            if !exists {
                collections_table
                    .insert(name.as_str(), sequence)
                    .map_err(store_err)?;
            }
            !exists
        };

        write_txn.commit().map_err(store_err)?;
        Ok(created)
    }

    fn drop_collection(&self, name: &CollectionName) -> Result<bool, VaultError> {
        let write_txn = self.db.begin_write().map_err(store_err)?;

        let registered = {
            let mut collections_table = write_txn.open_table(COLLECTIONS).map_err(store_err)?;
            collections_table
                .remove(name.as_str())
                .map_err(store_err)?
                .is_some()
        };
        let deleted = Self::remove_matching(&write_txn, name, &Filter::all(), None)?;

        write_txn.commit().map_err(store_err)?;
        Ok(registered || deleted > 0)
    }

    fn list_collections(&self) -> Result<Vec<CollectionName>, VaultError> {
        let read_txn = self.db.begin_read().map_err(store_err)?;
        let collections_table = read_txn.open_table(COLLECTIONS).map_err(store_err)?;

        let mut names = Vec::new();
        for entry in collections_table.iter().map_err(store_err)? {
            let (key, _) = entry.map_err(store_err)?;
            names.push(CollectionName::new(key.value()));
        }
        Ok(names)
    }
}

// =============================================================================
// TESTS
// =============================================================================
