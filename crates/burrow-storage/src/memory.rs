use async_trait::async_trait;
use burrow_core::error::Result;
use burrow_core::{NewUrl, Repository, ShortCode, UrlRecord};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory storage entry for a URL mapping.
#[derive(Debug, Clone)]
struct Entry {
    short_url: String,
    original_url: String,
}

/// In-memory implementation of the [`Repository`] trait.
///
/// Writers exclude readers and other writers; readers proceed concurrently.
/// The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    storage: RwLock<HashMap<String, Entry>>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.read().is_empty()
    }

    /// Inserts a mapping without going through the async trait.
    pub(crate) fn put(&self, code: &ShortCode, short_url: String, original_url: String) {
        self.storage.write().insert(
            code.as_str().to_owned(),
            Entry {
                short_url,
                original_url,
            },
        );
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn save(&self, url: &NewUrl) -> Result<()> {
        // Collisions overwrite: the generator is trusted at this cardinality.
        self.put(
            &url.short_code,
            url.short_url.clone(),
            url.original_url.clone(),
        );
        Ok(())
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let storage = self.storage.read();
        let Some(entry) = storage.get(code.as_str()) else {
            return Ok(None);
        };

        Ok(Some(UrlRecord {
            short_code: code.clone(),
            short_url: entry.short_url.clone(),
            original_url: entry.original_url.clone(),
            owner: None,
            deleted: false,
        }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
