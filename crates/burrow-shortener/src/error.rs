use burrow_core::StorageError;
use burrow_identity::IdentityError;

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(thiserror::Error, Debug)]
pub enum ShortenerError {
    #[error("short url not found: {0}")]
    NotFound(String),

    #[error("short url was deleted: {0}")]
    Deleted(String),

    #[error("caller is not authorized")]
    Unauthorized,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("identity error: {0}")]
    Identity(String),

    #[error("deletion queue is closed")]
    QueueClosed,
}

impl From<IdentityError> for ShortenerError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidToken => ShortenerError::Unauthorized,
            IdentityError::Storage(e) => ShortenerError::Storage(e),
            IdentityError::Signing(msg) => ShortenerError::Identity(msg),
        }
    }
}
