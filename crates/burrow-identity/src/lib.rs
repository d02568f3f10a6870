//! Signed-token identity for Burrow users.
//!
//! A caller is identified by an HS256 token carrying a numeric user id.
//! [`IdentityService::resolve_or_create`] turns an optional token into a
//! user id, allocating a fresh user when the token is absent or invalid.

pub mod error;
pub mod identity;
pub mod token;

pub use error::{IdentityError, Result};
pub use identity::{Identity, IdentityService};
pub use token::{Claims, TokenService, DEFAULT_TOKEN_TTL};
