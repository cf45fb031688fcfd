//! Async service layer: auth, per-session scheduling and persistence.

pub mod auth;
pub mod game;
pub mod persistence;
pub mod scheduler;

pub use auth::{AuthBoundary, Credentials, StaticTokens};
pub use game::{Action, GameService};
pub use persistence::{RetryPolicy, SaveQueue};
