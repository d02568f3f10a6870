//! URL shortening orchestration for Burrow.
//!
//! [`ShortenerService`] ties together a [`burrow_generator::Generator`], the
//! [`burrow_core::StorageBackend`] chosen at startup and the
//! [`burrow_identity::IdentityService`]. Deletions are applied in the
//! background by the [`deletion`] pipeline.

pub mod deletion;
pub mod error;
pub mod service;

pub use deletion::{
    DeletionPipeline, DeletionQueue, DeletionRequest, DeletionWorker, DEFAULT_QUEUE_CAPACITY,
};
pub use error::{Result, ShortenerError};
pub use service::{
    BatchEntry, BatchShortened, Identified, ServiceOptions, ShortenOutcome, Shortened,
    ShortenerService, UserUrl,
};
