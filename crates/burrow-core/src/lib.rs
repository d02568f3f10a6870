//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the types shared by the storage backends, the
//! identity service and the shortener service: short codes, user ids,
//! URL records and the repository capability traits.

pub mod backend;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod user;

pub use backend::StorageBackend;
pub use error::{CoreError, StorageError};
pub use repository::{
    DatabaseRepository, InsertOutcome, NewUrl, Repository, UrlRecord, UserRepository,
};
pub use shortcode::ShortCode;
pub use user::UserId;
