use crate::memory::InMemoryRepository;
use async_trait::async_trait;
use burrow_core::error::Result;
use burrow_core::{NewUrl, Repository, ShortCode, StorageError, UrlRecord};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One line of the log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LogEntry {
    uuid: u64,
    short_url: String,
    original_url: String,
}

#[derive(Debug)]
struct LogState {
    next_uuid: u64,
}

/// File-backed implementation of the [`Repository`] trait.
///
/// Records live in a newline-delimited JSON log and are mirrored in an
/// in-memory index for lookups. Every save loads the whole log, appends the
/// new entry and rewrites the file; the cycle runs under a single mutex so
/// concurrent saves cannot lose each other's entries. The rewrite goes to a
/// sibling temp file that replaces the log with a rename.
#[derive(Debug)]
pub struct FileRepository {
    path: PathBuf,
    index: InMemoryRepository,
    log: Mutex<LogState>,
}

impl FileRepository {
    /// Opens (or creates) the log at `path` and replays it into the index.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let entries = load_log(&path).await?;
        if entries.is_empty() && fs::metadata(&path).await.is_err() {
            fs::write(&path, "").await?;
        }

        let index = InMemoryRepository::with_capacity(entries.len());
        let mut next_uuid = 1;
        for entry in entries.iter() {
            let code = ShortCode::from_url(&entry.short_url).map_err(|e| {
                StorageError::InvalidData(format!(
                    "log entry {} has no usable short code: {e}",
                    entry.uuid
                ))
            })?;
            index.put(&code, entry.short_url.clone(), entry.original_url.clone());
            next_uuid = next_uuid.max(entry.uuid + 1);
        }

        info!(path = %path.display(), records = entries.len(), "opened file storage");

        Ok(Self {
            path,
            index,
            log: Mutex::new(LogState { next_uuid }),
        })
    }

    /// Returns the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn load_log(path: &Path) -> Result<Vec<LogEntry>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line).map_err(|e| {
                StorageError::InvalidData(format!(
                    "{}:{}: malformed log entry: {e}",
                    path.display(),
                    number + 1
                ))
            })
        })
        .collect()
}

async fn rewrite_log(path: &Path, entries: &[LogEntry]) -> Result<()> {
    let mut buffer = String::new();
    for entry in entries {
        let line = serde_json::to_string(entry)
            .map_err(|e| StorageError::Operation(format!("failed to encode log entry: {e}")))?;
        buffer.push_str(&line);
        buffer.push('\n');
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, buffer).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl Repository for FileRepository {
    async fn save(&self, url: &NewUrl) -> Result<()> {
        let mut state = self.log.lock().await;

        let mut entries = load_log(&self.path).await?;
        let uuid = state.next_uuid;
        entries.push(LogEntry {
            uuid,
            short_url: url.short_url.clone(),
            original_url: url.original_url.clone(),
        });
        rewrite_log(&self.path, &entries).await?;

        state.next_uuid += 1;
        self.index.put(
            &url.short_code,
            url.short_url.clone(),
            url.original_url.clone(),
        );

        debug!(code = %url.short_code, uuid, "appended record to file storage");
        Ok(())
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        self.index.get(code).await
    }

    async fn ping(&self) -> Result<()> {
        fs::metadata(&self.path)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::Unavailable(format!("{}: {e}", self.path.display())))
    }
}
