//! Error types shared across the engine, storage and service layers.

use std::io;

use thiserror::Error;

use crate::core::game_state::UserId;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not enough gold: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("Skill {skill} is on cooldown ({remaining} rounds left)")]
    OnCooldown { skill: String, remaining: u32 },

    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    #[error("Item not in inventory: {0}")]
    UnknownItem(String),

    #[error("No progression record for user {0}")]
    NotFound(UserId),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt save: {0}")]
    Corrupt(String),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
