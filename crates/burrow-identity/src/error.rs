use burrow_core::StorageError;

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(thiserror::Error, Debug)]
pub enum IdentityError {
    /// The token is malformed, expired or signed with another key.
    #[error("invalid token")]
    InvalidToken,

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("failed to allocate user: {0}")]
    Storage(#[from] StorageError),
}
