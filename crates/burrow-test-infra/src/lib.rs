//! Shared fixtures for Burrow tests.

pub mod error;
pub mod fake;
pub mod postgres;

pub use error::{Result, TestInfraError};
pub use fake::FakeDatabase;
