//! Per-session timer tasks.
//!
//! The battle loop takes the session lock for each tick, so ticks never
//! overlap with each other or with player actions. A tick only fires while
//! the session is active; calling `stop()` under the lock therefore
//! guarantees no further rounds.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error};

use super::persistence::SaveQueue;
use crate::session::battle::BattleSession;

/// Tick the session every `period` until it goes idle.
pub fn spawn_battle_loop(
    session: Arc<Mutex<BattleSession>>,
    saves: SaveQueue,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let mut session = session.lock().await;
            if !session.state().is_active() {
                break;
            }

            if let Err(err) = session.tick() {
                error!(user = %session.user_id(), "tick failed: {}", err);
                session.stop();
            }
            if session.take_dirty() {
                saves.save(session.player().clone());
            }
            if !session.state().is_active() {
                break;
            }
        }
        debug!("battle loop finished");
    })
}

/// Save unconditionally every `period`.
pub fn spawn_autosave(
    session: Arc<Mutex<BattleSession>>,
    saves: SaveQueue,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let mut session = session.lock().await;
            session.take_dirty();
            saves.save(session.player().clone());
        }
    })
}
