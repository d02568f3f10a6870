use burrow_shortener::{BatchEntry, BatchShortened, UserUrl};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequestItem {
    pub correlation_id: String,
    pub original_url: String,
}

impl From<BatchRequestItem> for BatchEntry {
    fn from(item: BatchRequestItem) -> Self {
        BatchEntry {
            correlation_id: item.correlation_id,
            original_url: item.original_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponseItem {
    pub correlation_id: String,
    pub short_url: String,
}

impl From<BatchShortened> for BatchResponseItem {
    fn from(item: BatchShortened) -> Self {
        BatchResponseItem {
            correlation_id: item.correlation_id,
            short_url: item.short_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserUrlResponse {
    pub short_url: String,
    pub original_url: String,
}

impl From<UserUrl> for UserUrlResponse {
    fn from(url: UserUrl) -> Self {
        UserUrlResponse {
            short_url: url.short_url,
            original_url: url.original_url,
        }
    }
}
