use crate::deletion::{
    DeletionPipeline, DeletionQueue, DeletionRequest, DeletionWorker, DEFAULT_QUEUE_CAPACITY,
};
use crate::error::{Result, ShortenerError};
use burrow_core::{
    DatabaseRepository, InsertOutcome, NewUrl, ShortCode, StorageBackend, StorageError, UserId,
};
use burrow_generator::Generator;
use burrow_identity::IdentityService;
use parking_lot::Mutex;
use tracing::{debug, info};
use typed_builder::TypedBuilder;
use url::Url;

/// Attempts made with fresh codes when the database reports a code collision.
const MAX_CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceOptions {
    /// Prefix of every short URL, without a trailing slash.
    #[builder(default = "http://localhost:8080".to_string(), setter(into))]
    pub base_url: String,
    #[builder(default = DEFAULT_QUEUE_CAPACITY)]
    pub deletion_queue_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortenOutcome {
    /// A new mapping was stored.
    Created,
    /// The URL was already shortened; the existing short URL is returned.
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    pub short_url: String,
    pub outcome: ShortenOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub correlation_id: String,
    pub original_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchShortened {
    pub correlation_id: String,
    pub short_url: String,
    pub outcome: ShortenOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUrl {
    pub short_url: String,
    pub original_url: String,
}

/// A result together with the token minted while resolving the caller.
///
/// `issued_token` is set when a new user was created for this request; it
/// has to reach the client as the identity cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identified<T> {
    pub value: T,
    pub issued_token: Option<String>,
}

impl<T> Identified<T> {
    fn anonymous(value: T) -> Self {
        Self {
            value,
            issued_token: None,
        }
    }
}

/// Orchestrates code generation, persistence, identity and deletion.
///
/// With a database backend a [`DeletionPipeline`] is started on
/// construction; call [`ShortenerService::shutdown`] to drain it.
pub struct ShortenerService<G> {
    backend: StorageBackend,
    generator: G,
    identity: IdentityService,
    base_url: String,
    deletions: Option<DeletionQueue>,
    worker: Mutex<Option<DeletionWorker>>,
}

impl<G: Generator> ShortenerService<G> {
    /// Creates the service. Must be called from within a Tokio runtime when
    /// `backend` is a database.
    pub fn new(
        backend: StorageBackend,
        generator: G,
        identity: IdentityService,
        options: ServiceOptions,
    ) -> Self {
        let (deletions, worker) = match backend.as_database() {
            Some(db) => {
                let (queue, worker) =
                    DeletionPipeline::start(db.clone(), options.deletion_queue_capacity);
                (Some(queue), Some(worker))
            }
            None => (None, None),
        };

        Self {
            backend,
            generator,
            identity,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            deletions,
            worker: Mutex::new(worker),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Shortens a single URL.
    ///
    /// On the database path the caller is resolved (or created) and becomes
    /// the owner of the new record.
    pub async fn shorten(&self, url: &str, token: Option<&str>) -> Result<Identified<Shortened>> {
        validate_url(url)?;

        match &self.backend {
            StorageBackend::Plain(_) => Ok(Identified::anonymous(self.store(url, None).await?)),
            StorageBackend::Database(db) => {
                let identity = self.identity.resolve_or_create(token, db.as_ref()).await?;
                let shortened = self.store(url, Some(identity.user_id)).await?;
                Ok(Identified {
                    value: shortened,
                    issued_token: identity.issued_token,
                })
            }
        }
    }

    /// Shortens every entry, preserving input order.
    ///
    /// The whole batch is rejected if it is empty or any URL is invalid.
    pub async fn shorten_batch(
        &self,
        entries: Vec<BatchEntry>,
        token: Option<&str>,
    ) -> Result<Identified<Vec<BatchShortened>>> {
        if entries.is_empty() {
            return Err(ShortenerError::BadRequest("batch is empty".to_string()));
        }
        for entry in &entries {
            validate_url(&entry.original_url)?;
        }

        let (owner, issued_token) = match &self.backend {
            StorageBackend::Plain(_) => (None, None),
            StorageBackend::Database(db) => {
                let identity = self.identity.resolve_or_create(token, db.as_ref()).await?;
                (Some(identity.user_id), identity.issued_token)
            }
        };

        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            let shortened = self.store(&entry.original_url, owner).await?;
            results.push(BatchShortened {
                correlation_id: entry.correlation_id,
                short_url: shortened.short_url,
                outcome: shortened.outcome,
            });
        }

        debug!(count = results.len(), "shortened batch");
        Ok(Identified {
            value: results,
            issued_token,
        })
    }

    /// Returns the original URL behind `code`.
    pub async fn resolve(&self, code: &str) -> Result<String> {
        let code =
            ShortCode::new(code).map_err(|_| ShortenerError::NotFound(code.to_string()))?;

        match self.backend.get(&code).await? {
            None => Err(ShortenerError::NotFound(code.to_string())),
            Some(record) if record.deleted => Err(ShortenerError::Deleted(code.to_string())),
            Some(record) => Ok(record.original_url),
        }
    }

    /// Lists the caller's live URLs. Only available with a database backend.
    pub async fn list_user_urls(&self, token: Option<&str>) -> Result<Identified<Vec<UserUrl>>> {
        let db = self.database()?;
        let identity = self.identity.resolve_or_create(token, db.as_ref()).await?;

        let urls = db
            .list_by_owner(identity.user_id)
            .await?
            .into_iter()
            .filter(|record| !record.deleted)
            .map(|record| UserUrl {
                short_url: record.short_url,
                original_url: record.original_url,
            })
            .collect();

        Ok(Identified {
            value: urls,
            issued_token: identity.issued_token,
        })
    }

    /// Queues soft deletion of the caller's URLs identified by `codes`.
    ///
    /// Requires a database backend and a valid token. Returns once every
    /// request is queued; the deletions are applied in the background.
    pub async fn delete_user_urls(&self, token: Option<&str>, codes: Vec<String>) -> Result<()> {
        self.database()?;
        let queue = self.deletions.as_ref().ok_or(ShortenerError::QueueClosed)?;
        let token = token.ok_or(ShortenerError::Unauthorized)?;
        let user_id = self.identity.verify(token)?;

        for code in codes {
            queue
                .enqueue(DeletionRequest {
                    user_id,
                    short_url: format!("{}/{}", self.base_url, code),
                })
                .await?;
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await?;
        Ok(())
    }

    /// Stops the deletion worker after it has applied every queued request.
    /// Calling it more than once is a no-op.
    pub async fn shutdown(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.shutdown().await;
            info!("deletion worker shut down");
        }
    }

    fn database(&self) -> Result<&std::sync::Arc<dyn DatabaseRepository>> {
        self.backend
            .as_database()
            .ok_or(ShortenerError::Unauthorized)
    }

    fn next_url(&self, original_url: &str, owner: Option<UserId>) -> NewUrl {
        let short_code: ShortCode = self.generator.generate().into();
        NewUrl {
            short_url: short_code.to_url(&self.base_url),
            short_code,
            original_url: original_url.to_string(),
            owner,
        }
    }

    async fn store(&self, original_url: &str, owner: Option<UserId>) -> Result<Shortened> {
        let db = match &self.backend {
            StorageBackend::Plain(repo) => {
                let new_url = self.next_url(original_url, owner);
                repo.save(&new_url).await?;
                debug!(code = %new_url.short_code, "stored url");
                return Ok(Shortened {
                    short_url: new_url.short_url,
                    outcome: ShortenOutcome::Created,
                });
            }
            StorageBackend::Database(db) => db,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let new_url = self.next_url(original_url, owner);

            match db.insert(&new_url).await {
                Ok(InsertOutcome::Created) => {
                    debug!(code = %new_url.short_code, "stored url");
                    return Ok(Shortened {
                        short_url: new_url.short_url,
                        outcome: ShortenOutcome::Created,
                    });
                }
                Ok(InsertOutcome::Conflict) => {
                    if let Some(short_url) = db.find_short_url(original_url).await? {
                        debug!(short_url = %short_url, "url already shortened");
                        return Ok(Shortened {
                            short_url,
                            outcome: ShortenOutcome::Existing,
                        });
                    }
                    // The conflicting record was deleted in the meantime.
                    if attempt >= MAX_CODE_ATTEMPTS {
                        return Err(StorageError::Conflict(original_url.to_string()).into());
                    }
                }
                Err(StorageError::Conflict(code)) if attempt < MAX_CODE_ATTEMPTS => {
                    debug!(code = %code, attempt, "short code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<G> std::fmt::Debug for ShortenerService<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortenerService")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Accepts non-empty `http`/`https` URLs that name a host.
fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ShortenerError::InvalidUrl(
            "URL cannot be empty".to_string(),
        ));
    }

    // The parser silently drops tabs and newlines, so check the raw input.
    // Anything stored here ends up in a Location header.
    if let Some(c) = url.chars().find(|c| !c.is_ascii_graphic()) {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL contains a character that is not printable ASCII: {c:?}"
        )));
    }

    let parsed = Url::parse(url)
        .map_err(|e| ShortenerError::InvalidUrl(format!("invalid URL format: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL scheme must be http or https: {}",
            parsed.scheme()
        )));
    }

    // `http:///path` parses with "path" as host; require the authority as written.
    let authority = url
        .split_once("://")
        .and_then(|(_, rest)| rest.split(['/', '?', '#']).next())
        .unwrap_or_default();
    if authority.is_empty() || parsed.host_str().is_none_or(str::is_empty) {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL must have a valid host: {}",
            url
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_core::UserRepository;
    use burrow_generator::{FixedGenerator, SeqGenerator};
    use burrow_identity::{TokenService, DEFAULT_TOKEN_TTL};
    use burrow_storage::InMemoryRepository;
    use burrow_test_infra::FakeDatabase;
    use std::sync::Arc;

    fn identity() -> IdentityService {
        IdentityService::new(TokenService::new(b"service-secret", DEFAULT_TOKEN_TTL))
    }

    fn memory_service() -> ShortenerService<SeqGenerator> {
        ShortenerService::new(
            StorageBackend::plain(InMemoryRepository::new()),
            SeqGenerator::with_prefix("bw").unwrap(),
            identity(),
            ServiceOptions::builder().build(),
        )
    }

    fn database_service() -> (Arc<FakeDatabase>, ShortenerService<SeqGenerator>) {
        let db = Arc::new(FakeDatabase::new());
        let service = ShortenerService::new(
            StorageBackend::Database(db.clone()),
            SeqGenerator::with_prefix("bw").unwrap(),
            identity(),
            ServiceOptions::builder().build(),
        );
        (db, service)
    }

    #[tokio::test]
    async fn shorten_then_resolve_round_trips() {
        let service = memory_service();

        let shortened = service.shorten("https://example.com", None).await.unwrap();

        assert_eq!(shortened.value.short_url, "http://localhost:8080/bw000000");
        assert_eq!(shortened.value.outcome, ShortenOutcome::Created);
        assert_eq!(shortened.issued_token, None);
        assert_eq!(
            service.resolve("bw000000").await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn fixed_generator_produces_known_short_url() {
        let service = ShortenerService::new(
            StorageBackend::plain(InMemoryRepository::new()),
            FixedGenerator::new("EwHXdJfB").unwrap(),
            identity(),
            ServiceOptions::builder()
                .base_url("http://localhost:8080/")
                .build(),
        );

        let shortened = service.shorten("https://example.com/", None).await.unwrap();

        assert_eq!(shortened.value.short_url, "http://localhost:8080/EwHXdJfB");
    }

    #[tokio::test]
    async fn plain_backend_does_not_dedup() {
        let service = memory_service();

        let first = service.shorten("https://example.com", None).await.unwrap();
        let second = service.shorten("https://example.com", None).await.unwrap();

        assert_ne!(first.value.short_url, second.value.short_url);
        assert_eq!(second.value.outcome, ShortenOutcome::Created);
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected() {
        let service = memory_service();

        for url in [
            "",
            "not-a-valid-url",
            "ftp://example.com",
            "https://",
            "http:///path",
            "https://example.com/a\nb",
            "https://example.com/a\tb",
            "https://example.com/a\r\nSet-Cookie:x=1",
            "https://exa mple.com",
            "https://example.com/\u{7f}",
            "https://example.com/caf\u{e9}",
        ] {
            let err = service.shorten(url, None).await.unwrap_err();
            assert!(
                matches!(err, ShortenerError::InvalidUrl(_)),
                "{url:?} was accepted"
            );
        }
    }

    #[tokio::test]
    async fn rejected_urls_allocate_no_user() {
        let (db, service) = database_service();

        let err = service
            .shorten("https://example.com/a\nb", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));

        let batch = vec![
            BatchEntry {
                correlation_id: "ok".to_string(),
                original_url: "https://a.example".to_string(),
            },
            BatchEntry {
                correlation_id: "bad".to_string(),
                original_url: "ftp://b.example".to_string(),
            },
        ];
        assert!(service.shorten_batch(batch, None).await.is_err());

        assert_eq!(db.create_user().await.unwrap(), UserId::new(1));
        assert!(db.rows().is_empty());
    }

    #[tokio::test]
    async fn database_dedups_and_reports_existing() {
        let (_db, service) = database_service();

        let first = service.shorten("https://example.com", None).await.unwrap();
        let token = first.issued_token.clone().expect("identity issued");
        let second = service
            .shorten("https://example.com", Some(&token))
            .await
            .unwrap();

        assert_eq!(first.value.outcome, ShortenOutcome::Created);
        assert_eq!(second.value.outcome, ShortenOutcome::Existing);
        assert_eq!(second.value.short_url, first.value.short_url);
        assert_eq!(second.issued_token, None);
    }

    #[tokio::test]
    async fn database_retries_on_code_collision() {
        let (db, service) = database_service();
        db.insert(&NewUrl {
            short_code: ShortCode::new_unchecked("bw000000"),
            short_url: "http://localhost:8080/bw000000".to_string(),
            original_url: "https://taken.example".to_string(),
            owner: None,
        })
        .await
        .unwrap();

        let shortened = service.shorten("https://fresh.example", None).await.unwrap();

        assert_eq!(shortened.value.short_url, "http://localhost:8080/bw000001");
        assert_eq!(shortened.value.outcome, ShortenOutcome::Created);
    }

    #[tokio::test]
    async fn database_gives_up_after_repeated_collisions() {
        let db = Arc::new(FakeDatabase::new());
        db.insert(&NewUrl {
            short_code: ShortCode::new_unchecked("EwHXdJfB"),
            short_url: "http://localhost:8080/EwHXdJfB".to_string(),
            original_url: "https://taken.example".to_string(),
            owner: None,
        })
        .await
        .unwrap();
        let service = ShortenerService::new(
            StorageBackend::Database(db),
            FixedGenerator::new("EwHXdJfB").unwrap(),
            identity(),
            ServiceOptions::builder().build(),
        );

        let err = service
            .shorten("https://fresh.example", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::Storage(StorageError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn batch_preserves_order_and_flags_existing() {
        let (_db, service) = database_service();
        service.shorten("https://b.example", None).await.unwrap();

        let batch = service
            .shorten_batch(
                vec![
                    BatchEntry {
                        correlation_id: "1".to_string(),
                        original_url: "https://a.example".to_string(),
                    },
                    BatchEntry {
                        correlation_id: "2".to_string(),
                        original_url: "https://b.example".to_string(),
                    },
                ],
                None,
            )
            .await
            .unwrap();

        let ids: Vec<&str> = batch
            .value
            .iter()
            .map(|r| r.correlation_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(batch.value[0].outcome, ShortenOutcome::Created);
        assert_eq!(batch.value[1].outcome, ShortenOutcome::Existing);
        assert_eq!(batch.value[1].short_url, "http://localhost:8080/bw000000");
    }

    #[tokio::test]
    async fn empty_batch_is_bad_request() {
        let service = memory_service();

        let err = service.shorten_batch(Vec::new(), None).await.unwrap_err();
        assert!(matches!(err, ShortenerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn resolve_distinguishes_missing_and_deleted() {
        let (db, service) = database_service();
        let shortened = service.shorten("https://example.com", None).await.unwrap();
        let user_id = db.rows()[0].owner.unwrap();
        db.mark_deleted(user_id, &shortened.value.short_url)
            .await
            .unwrap();

        assert!(matches!(
            service.resolve("bw000000").await,
            Err(ShortenerError::Deleted(_))
        ));
        assert!(matches!(
            service.resolve("unknown").await,
            Err(ShortenerError::NotFound(_))
        ));
        assert!(matches!(
            service.resolve("no").await,
            Err(ShortenerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_requires_database_backend() {
        let service = memory_service();

        assert!(matches!(
            service.list_user_urls(None).await,
            Err(ShortenerError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn list_returns_only_callers_live_urls() {
        let (_db, service) = database_service();
        let first = service.shorten("https://a.example", None).await.unwrap();
        let token = first.issued_token.unwrap();
        service
            .shorten("https://b.example", Some(&token))
            .await
            .unwrap();
        service.shorten("https://other.example", None).await.unwrap();

        service
            .delete_user_urls(Some(&token), vec!["bw000001".to_string()])
            .await
            .unwrap();
        service.shutdown().await;

        let listed = service.list_user_urls(Some(&token)).await.unwrap();
        assert_eq!(listed.issued_token, None);
        assert_eq!(
            listed.value,
            vec![UserUrl {
                short_url: "http://localhost:8080/bw000000".to_string(),
                original_url: "https://a.example".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn list_for_new_caller_is_empty_and_issues_token() {
        let (_db, service) = database_service();

        let listed = service.list_user_urls(None).await.unwrap();

        assert!(listed.value.is_empty());
        assert!(listed.issued_token.is_some());
    }

    #[tokio::test]
    async fn delete_requires_valid_token() {
        let (_db, service) = database_service();

        assert!(matches!(
            service.delete_user_urls(None, vec!["bw000000".into()]).await,
            Err(ShortenerError::Unauthorized)
        ));
        assert!(matches!(
            service
                .delete_user_urls(Some("forged"), vec!["bw000000".into()])
                .await,
            Err(ShortenerError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn delete_requires_database_backend() {
        let service = memory_service();

        assert!(matches!(
            service.delete_user_urls(Some("token"), Vec::new()).await,
            Err(ShortenerError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn deleted_url_resolves_as_deleted_after_drain() {
        let (_db, service) = database_service();
        let shortened = service.shorten("https://example.com", None).await.unwrap();
        let token = shortened.issued_token.unwrap();

        service
            .delete_user_urls(Some(&token), vec!["bw000000".to_string()])
            .await
            .unwrap();
        service.shutdown().await;

        assert!(matches!(
            service.resolve("bw000000").await,
            Err(ShortenerError::Deleted(_))
        ));
    }

    #[tokio::test]
    async fn ping_reports_backend_health() {
        let (db, service) = database_service();
        assert!(service.ping().await.is_ok());

        db.set_offline(true);
        assert!(matches!(
            service.ping().await,
            Err(ShortenerError::Storage(StorageError::Unavailable(_)))
        ));
    }

    #[test]
    fn validate_url_accepts_http_and_https() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("HTTPS://example.com/path?q=1").is_ok());
        assert!(validate_url("https://localhost:8080").is_ok());
    }
}
