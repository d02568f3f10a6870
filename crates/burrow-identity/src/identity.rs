use crate::error::Result;
use crate::token::TokenService;
use burrow_core::{UserId, UserRepository};
use tracing::debug;

/// The resolved caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    /// Set when a new user was allocated; must be sent back as a cookie.
    pub issued_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IdentityService {
    tokens: TokenService,
}

impl IdentityService {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    pub fn mint(&self, user_id: UserId) -> Result<String> {
        self.tokens.mint(user_id)
    }

    pub fn verify(&self, token: &str) -> Result<UserId> {
        self.tokens.verify(token)
    }

    /// Resolves the caller from `token`, or allocates a new user and mints a
    /// token for it when the token is absent or does not verify.
    pub async fn resolve_or_create<U>(&self, token: Option<&str>, users: &U) -> Result<Identity>
    where
        U: UserRepository + ?Sized,
    {
        if let Some(user_id) = token.and_then(|t| self.tokens.verify(t).ok()) {
            return Ok(Identity {
                user_id,
                issued_token: None,
            });
        }

        let user_id = users.create_user().await?;
        let token = self.tokens.mint(user_id)?;
        debug!(user_id = %user_id, "issued identity for new user");

        Ok(Identity {
            user_id,
            issued_token: Some(token),
        })
    }
}
