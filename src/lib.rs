//! Idle battle progression engine.
//!
//! Pure game rules (`combat`, `character`, `skills`, `items`) sit under a
//! synchronous state machine (`session`), which the async `service` layer
//! drives on a timer and persists through `storage`.

pub mod character;
pub mod combat;
pub mod core;
pub mod items;
pub mod service;
pub mod session;
pub mod skills;
pub mod storage;
pub mod utils;

pub use crate::core::error::{GameError, Result, StorageError};
pub use crate::core::game_state::{GameSnapshot, UserId};
