//! Credential to user-id resolution.
//!
//! Token issuance and verification live outside the engine; it only needs
//! a credential turned into a stable [`UserId`].

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::core::error::{GameError, Result};
use crate::core::game_state::UserId;

pub trait AuthBoundary: Send + Sync {
    /// Fails with `GameError::Unauthenticated` for unknown credentials.
    fn resolve_user(&self, credential: &str) -> Result<UserId>;
}

/// A freshly issued login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: UserId,
}

/// Opaque bearer tokens held in memory.
#[derive(Debug, Default)]
pub struct StaticTokens {
    tokens: RwLock<HashMap<String, UserId>>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new user and a token for it.
    pub fn register(&self) -> Credentials {
        let credentials = Credentials {
            token: Uuid::new_v4().simple().to_string(),
            user_id: UserId::generate(),
        };
        self.insert(&credentials.token, credentials.user_id.clone());
        credentials
    }

    /// Bind a known token to an existing user.
    pub fn insert(&self, token: &str, user_id: UserId) {
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.to_string(), user_id);
    }
}

impl AuthBoundary for StaticTokens {
    fn resolve_user(&self, credential: &str) -> Result<UserId> {
        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(credential)
            .cloned()
            .ok_or(GameError::Unauthenticated)
    }
}
