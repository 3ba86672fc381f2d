//! # Version Resolver
//!
//! Given a file name, finds the document holding the highest version and the
//! number the next version must take.
//!
//! The next number always comes from the stored maximum, never from a count
//! of documents: after an out-of-order deletion a count would hand out a
//! number that is still in use.

use crate::storage::{DocumentStore, Filter};
use crate::{CollectionName, Document, FileName, VaultError, VersionName};

/// Result of resolving the latest version of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The file has no versions in this collection. Not a fault.
    NoHistory,
    /// The document with the maximum version and the number that follows it.
    Latest {
        document: Document,
        next_version: VersionName,
    },
}

/// Stateless resolver over any `DocumentStore`.
pub struct VersionResolver;

impl VersionResolver {
    /// Resolve the latest version of `file_name` in `collection`.
    ///
    /// When several documents share the maximum version (only possible after
    /// a lost race between concurrent writers) any one of them is returned.
    pub fn resolve_latest<S: DocumentStore + ?Sized>(
        store: &S,
        collection: &CollectionName,
        file_name: &FileName,
    ) -> Result<Resolution, VaultError> {
        let versions = store.find(collection, &Filter::file(file_name))?;

        let Some(latest) = versions.into_iter().max_by_key(|d| d.version_name) else {
            return Ok(Resolution::NoHistory);
        };

        let next_version = latest
            .version_name
            .next()
            .ok_or_else(|| VaultError::VersionOverflow(file_name.clone()))?;

        Ok(Resolution::Latest {
            document: latest,
            next_version,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::RiskAssessment;

    fn ns() -> CollectionName {
        CollectionName::new("ns")
    }

    fn put(store: &MemoryStore, name: &str, version: u32) {
        store
            .insert_one(
                &ns(),
                Document::versioned(
                    FileName::new(name),
                    "c",
                    VersionName(version),
                    RiskAssessment::default(),
                ),
            )
            .expect("insert");
    }

    #[test]
    fn unknown_file_has_no_history() {
        let store = MemoryStore::new();
        let resolution =
            VersionResolver::resolve_latest(&store, &ns(), &FileName::new("f1")).expect("resolve");
        assert_eq!(resolution, Resolution::NoHistory);
    }

    #[test]
    fn picks_maximum_regardless_of_insertion_order() {
        let store = MemoryStore::new();
        put(&store, "f1", 2);
        put(&store, "f1", 0);
        put(&store, "f1", 1);
        put(&store, "other", 9);

        let resolution =
            VersionResolver::resolve_latest(&store, &ns(), &FileName::new("f1")).expect("resolve");
        match resolution {
            Resolution::Latest {
                document,
                next_version,
            } => {
                assert_eq!(document.version_name, VersionName(2));
                assert_eq!(next_version, VersionName(3));
            }
            Resolution::NoHistory => unreachable!("history exists"),
        }
    }

    #[test]
    fn next_version_skips_gaps_left_by_deletion() {
        let store = MemoryStore::new();
        put(&store, "f1", 0);
        put(&store, "f1", 4);

        let resolution =
            VersionResolver::resolve_latest(&store, &ns(), &FileName::new("f1")).expect("resolve");
        assert!(matches!(
            resolution,
            Resolution::Latest { next_version, .. } if next_version == VersionName(5)
        ));
    }

    #[test]
    fn exhausted_counter_is_an_error() {
        let store = MemoryStore::new();
        put(&store, "f1", u32::MAX);

        let result = VersionResolver::resolve_latest(&store, &ns(), &FileName::new("f1"));
        assert!(matches!(result, Err(VaultError::VersionOverflow(_))));
    }
}
