use crate::error::Result;
use crate::shortcode::ShortCode;
use crate::user::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A stored URL record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The path segment identifying the record.
    pub short_code: ShortCode,
    /// The fully-qualified shortened URL (base URL + code).
    pub short_url: String,
    /// The original URL that was shortened.
    pub original_url: String,
    /// The user that created the record, if the backend tracks ownership.
    pub owner: Option<UserId>,
    /// Soft-delete flag. Once set it is never cleared.
    pub deleted: bool,
}

/// A mapping about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrl {
    pub short_code: ShortCode,
    pub short_url: String,
    pub original_url: String,
    pub owner: Option<UserId>,
}

impl NewUrl {
    pub fn into_record(self) -> UrlRecord {
        UrlRecord {
            short_code: self.short_code,
            short_url: self.short_url,
            original_url: self.original_url,
            owner: self.owner,
            deleted: false,
        }
    }
}

/// Result of a dedup-aware insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was written.
    Created,
    /// A live record with the same original URL already exists; nothing was
    /// written. The canonical short URL must be re-fetched with
    /// [`DatabaseRepository::find_short_url`].
    Conflict,
}

/// The capability set every storage backend provides.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Stores a new mapping.
    ///
    /// Map-like backends overwrite an existing mapping for the same code.
    async fn save(&self, url: &NewUrl) -> Result<()>;

    /// Retrieves the record for a given short code.
    /// Returns `None` if the code does not exist. Soft-deleted records are
    /// returned with `deleted = true`.
    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Allocation of user identities.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Creates a new user and returns its auto-incremented id.
    async fn create_user(&self) -> Result<UserId>;
}

/// The extended capability set only the relational backend provides:
/// dedup on original URL, ownership, listing and soft deletion.
#[async_trait]
pub trait DatabaseRepository: Repository + UserRepository {
    /// Inserts a record unless a live record with the same original URL
    /// exists. First writer wins.
    ///
    /// A collision on the short code itself is reported as
    /// `Err(StorageError::Conflict)`.
    async fn insert(&self, url: &NewUrl) -> Result<InsertOutcome>;

    /// Returns the short URL of the live record for `original_url`.
    async fn find_short_url(&self, original_url: &str) -> Result<Option<String>>;

    /// Soft-deletes the record with `short_url` if it is owned by `owner`.
    /// Returns `true` if a record changed state.
    async fn mark_deleted(&self, owner: UserId, short_url: &str) -> Result<bool>;

    /// Lists every record created by `owner`, deleted ones included.
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<UrlRecord>>;
}
