use crate::error::Result;
use crate::repository::{DatabaseRepository, Repository, UrlRecord};
use crate::shortcode::ShortCode;
use std::sync::Arc;

/// The storage backend selected at startup.
///
/// Ownership, listing and deletion are only available on the
/// [`StorageBackend::Database`] variant.
#[derive(Clone)]
pub enum StorageBackend {
    /// A map-like backend (in-memory or file).
    Plain(Arc<dyn Repository>),
    /// The relational backend.
    Database(Arc<dyn DatabaseRepository>),
}

impl StorageBackend {
    pub fn plain<R: Repository>(repository: R) -> Self {
        Self::Plain(Arc::new(repository))
    }

    pub fn database<R: DatabaseRepository>(repository: R) -> Self {
        Self::Database(Arc::new(repository))
    }

    /// Returns the database capability, if present.
    pub fn as_database(&self) -> Option<&Arc<dyn DatabaseRepository>> {
        match self {
            StorageBackend::Plain(_) => None,
            StorageBackend::Database(db) => Some(db),
        }
    }

    pub async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        match self {
            StorageBackend::Plain(repo) => repo.get(code).await,
            StorageBackend::Database(db) => db.get(code).await,
        }
    }

    pub async fn ping(&self) -> Result<()> {
        match self {
            StorageBackend::Plain(repo) => repo.ping().await,
            StorageBackend::Database(db) => db.ping().await,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StorageBackend::Plain(_) => "plain",
            StorageBackend::Database(_) => "database",
        }
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StorageBackend").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::repository::{InsertOutcome, NewUrl, UserRepository};
    use crate::user::UserId;
    use async_trait::async_trait;

    /// Answers every lookup with a record pointing at `origin`.
    struct Echo {
        origin: &'static str,
        online: bool,
    }

    impl Echo {
        fn new(origin: &'static str) -> Self {
            Self {
                origin,
                online: true,
            }
        }
    }

    #[async_trait]
    impl Repository for Echo {
        async fn save(&self, _url: &NewUrl) -> Result<()> {
            Ok(())
        }

        async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
            Ok(Some(UrlRecord {
                short_code: code.clone(),
                short_url: format!("http://localhost:8080/{code}"),
                original_url: self.origin.to_string(),
                owner: None,
                deleted: false,
            }))
        }

        async fn ping(&self) -> Result<()> {
            if self.online {
                Ok(())
            } else {
                Err(StorageError::Unavailable(self.origin.to_string()))
            }
        }
    }

    #[async_trait]
    impl UserRepository for Echo {
        async fn create_user(&self) -> Result<UserId> {
            Ok(UserId::new(1))
        }
    }

    #[async_trait]
    impl DatabaseRepository for Echo {
        async fn insert(&self, _url: &NewUrl) -> Result<InsertOutcome> {
            Ok(InsertOutcome::Created)
        }

        async fn find_short_url(&self, _original_url: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn mark_deleted(&self, _owner: UserId, _short_url: &str) -> Result<bool> {
            Ok(false)
        }

        async fn list_by_owner(&self, _owner: UserId) -> Result<Vec<UrlRecord>> {
            Ok(Vec::new())
        }
    }

    fn code() -> ShortCode {
        ShortCode::new_unchecked("abc123")
    }

    #[tokio::test]
    async fn plain_variant_forwards_to_its_repository() {
        let backend = StorageBackend::plain(Echo::new("https://plain.example"));

        let record = backend.get(&code()).await.unwrap().unwrap();
        assert_eq!(record.original_url, "https://plain.example");
        assert!(backend.ping().await.is_ok());
        assert!(backend.as_database().is_none());
        assert_eq!(backend.kind(), "plain");
    }

    #[tokio::test]
    async fn database_variant_forwards_to_its_repository() {
        let backend = StorageBackend::database(Echo::new("https://db.example"));

        let record = backend.get(&code()).await.unwrap().unwrap();
        assert_eq!(record.original_url, "https://db.example");
        assert!(backend.as_database().is_some());
        assert_eq!(backend.kind(), "database");
        assert_eq!(format!("{backend:?}"), "StorageBackend(\"database\")");
    }

    #[tokio::test]
    async fn ping_failures_surface_unchanged() {
        let down = Echo {
            origin: "primary",
            online: false,
        };
        let backend = StorageBackend::database(down);

        match backend.ping().await {
            Err(StorageError::Unavailable(origin)) => assert_eq!(origin, "primary"),
            other => panic!("unexpected ping result: {other:?}"),
        }
    }
}
