use async_trait::async_trait;
use burrow_core::error::Result;
use burrow_core::{
    DatabaseRepository, InsertOutcome, NewUrl, Repository, ShortCode, StorageError, UrlRecord,
    UserId, UserRepository,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct State {
    rows: Vec<UrlRecord>,
    last_user_id: i64,
}

/// In-process stand-in for the relational backend.
///
/// Mirrors the PostgreSQL semantics the service relies on: primary key on
/// the short code, uniqueness of `original_url` among live rows, owner-scoped
/// soft deletion and auto-incremented user ids. Can be switched offline to
/// exercise failure paths.
#[derive(Debug, Default)]
pub struct FakeDatabase {
    state: Mutex<State>,
    offline: AtomicBool,
    deletion_attempts: AtomicUsize,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StorageError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `mark_deleted` calls received, successful or not.
    pub fn deletion_attempts(&self) -> usize {
        self.deletion_attempts.load(Ordering::SeqCst)
    }

    /// Snapshot of all stored rows.
    pub fn rows(&self) -> Vec<UrlRecord> {
        self.state.lock().rows.clone()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("fake database is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for FakeDatabase {
    async fn save(&self, url: &NewUrl) -> Result<()> {
        self.insert(url).await.map(|_| ())
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        self.check_online()?;
        let state = self.state.lock();
        Ok(state.rows.iter().find(|r| &r.short_code == code).cloned())
    }

    async fn ping(&self) -> Result<()> {
        self.check_online()
    }
}

#[async_trait]
impl UserRepository for FakeDatabase {
    async fn create_user(&self) -> Result<UserId> {
        self.check_online()?;
        let mut state = self.state.lock();
        state.last_user_id += 1;
        Ok(UserId::new(state.last_user_id))
    }
}

#[async_trait]
impl DatabaseRepository for FakeDatabase {
    async fn insert(&self, url: &NewUrl) -> Result<InsertOutcome> {
        self.check_online()?;
        let mut state = self.state.lock();

        if state
            .rows
            .iter()
            .any(|r| !r.deleted && r.original_url == url.original_url)
        {
            return Ok(InsertOutcome::Conflict);
        }
        if state.rows.iter().any(|r| r.short_code == url.short_code) {
            return Err(StorageError::Conflict(url.short_code.to_string()));
        }

        state.rows.push(url.clone().into_record());
        Ok(InsertOutcome::Created)
    }

    async fn find_short_url(&self, original_url: &str) -> Result<Option<String>> {
        self.check_online()?;
        let state = self.state.lock();
        Ok(state
            .rows
            .iter()
            .find(|r| !r.deleted && r.original_url == original_url)
            .map(|r| r.short_url.clone()))
    }

    async fn mark_deleted(&self, owner: UserId, short_url: &str) -> Result<bool> {
        let online = self.check_online();
        self.deletion_attempts.fetch_add(1, Ordering::SeqCst);
        online?;
        let mut state = self.state.lock();

        let mut changed = false;
        for row in state
            .rows
            .iter_mut()
            .filter(|r| !r.deleted && r.short_url == short_url && r.owner == Some(owner))
        {
            row.deleted = true;
            changed = true;
        }
        Ok(changed)
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<UrlRecord>> {
        self.check_online()?;
        let state = self.state.lock();
        Ok(state
            .rows
            .iter()
            .filter(|r| r.owner == Some(owner))
            .cloned()
            .collect())
    }
}
