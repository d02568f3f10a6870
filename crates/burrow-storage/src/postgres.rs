use async_trait::async_trait;
use burrow_core::error::Result;
use burrow_core::{
    DatabaseRepository, InsertOutcome, NewUrl, Repository, ShortCode, StorageError, UrlRecord,
    UserId, UserRepository,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

const SCHEMA: &str = include_str!("../ddl/postgres/schema.sql");

/// PostgreSQL implementation of the repository contract.
///
/// Soft delete is implemented with `is_deleted`. Reads return deleted rows
/// flagged so callers can tell "gone" from "never existed". The partial
/// unique index on `original_url` only covers live rows, so a URL whose
/// record was deleted can be shortened again.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        info!("postgres schema is up to date");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn record_from_row(row: &PgRow) -> Result<UrlRecord> {
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let short_url: String = row.try_get("short_url").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let user_id: Option<i64> = row.try_get("user_id").map_err(map_sqlx_error)?;
    let deleted: bool = row.try_get("is_deleted").map_err(map_sqlx_error)?;

    Ok(UrlRecord {
        short_code: ShortCode::new_unchecked(short_code),
        short_url,
        original_url,
        owner: user_id.map(UserId::new),
        deleted,
    })
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn save(&self, url: &NewUrl) -> Result<()> {
        self.insert(url).await.map(|_| ())
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT short_code, short_url, original_url, user_id, is_deleted
            FROM shorten_urls
            WHERE short_code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self) -> Result<UserId> {
        let id: i64 = sqlx::query_scalar("INSERT INTO users DEFAULT VALUES RETURNING user_id")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(user_id = id, "created user");
        Ok(UserId::new(id))
    }
}

#[async_trait]
impl DatabaseRepository for PostgresRepository {
    async fn insert(&self, url: &NewUrl) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO shorten_urls (short_code, short_url, original_url, user_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (original_url) WHERE NOT is_deleted DO NOTHING
            RETURNING short_code
            "#,
        )
        .bind(url.short_code.as_str())
        .bind(&url.short_url)
        .bind(&url.original_url)
        .bind(url.owner.map(UserId::get))
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(_)) => Ok(InsertOutcome::Created),
            Ok(None) => Ok(InsertOutcome::Conflict),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(url.short_code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn find_short_url(&self, original_url: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT short_url
            FROM shorten_urls
            WHERE original_url = $1
              AND NOT is_deleted
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn mark_deleted(&self, owner: UserId, short_url: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE shorten_urls
            SET is_deleted = TRUE
            WHERE short_url = $1
              AND user_id = $2
              AND NOT is_deleted
            "#,
        )
        .bind(short_url)
        .bind(owner.get())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<UrlRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT short_code, short_url, original_url, user_id, is_deleted
            FROM shorten_urls
            WHERE user_id = $1
            "#,
        )
        .bind(owner.get())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(record_from_row).collect()
    }
}
