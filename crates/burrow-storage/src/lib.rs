pub mod file;
pub mod memory;
pub mod postgres;

pub use burrow_core::{
    DatabaseRepository, InsertOutcome, NewUrl, Repository, StorageBackend, StorageError,
    UrlRecord, UserRepository,
};
pub use file::FileRepository;
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
