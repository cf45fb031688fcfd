//! The front-end facing API: one `BattleSession` per signed-in user, each
//! with its own battle loop, autosave timer and save writer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::auth::AuthBoundary;
use super::persistence::{blocking, RetryPolicy, SaveQueue};
use super::scheduler::{spawn_autosave, spawn_battle_loop};
use crate::character::progression::{BattleRecord, PlayerProgression, UpgradeKind};
use crate::combat::catalog::EnemyCatalog;
use crate::core::config::GameConfig;
use crate::core::error::{GameError, Result};
use crate::core::game_state::{GameSnapshot, UserId};
use crate::core::log::LogEntry;
use crate::session::battle::BattleSession;
use crate::storage::{leaderboard, LeaderboardEntry, ProgressionStore};

/// A player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartBattle,
    StopBattle,
    UseSkill(String),
    PurchaseUpgrade(UpgradeKind),
    UseItem(String),
}

struct SessionHandle {
    session: Arc<Mutex<BattleSession>>,
    saves: SaveQueue,
    writer: JoinHandle<()>,
    autosave: JoinHandle<()>,
    battle_loop: StdMutex<Option<JoinHandle<()>>>,
    tick_interval: Duration,
    /// Set under the session lock once the session is torn down.
    closed: AtomicBool,
}

impl SessionHandle {
    /// Lock the session, failing if it was closed while we waited.
    async fn lock_open(&self) -> Result<MutexGuard<'_, BattleSession>> {
        let session = self.session.lock().await;
        if self.closed.load(Ordering::SeqCst) {
            return Err(GameError::NotFound(session.user_id().clone()));
        }
        Ok(session)
    }

    /// Replace any running battle loop with a fresh one.
    fn restart_loop(&self) {
        let mut slot = self
            .battle_loop
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(old) = slot.take() {
            old.abort();
        }
        *slot = Some(spawn_battle_loop(
            Arc::clone(&self.session),
            self.saves.clone(),
            self.tick_interval,
        ));
    }

    fn cancel_loop(&self) {
        let mut slot = self
            .battle_loop
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

pub struct GameService {
    store: Arc<dyn ProgressionStore>,
    auth: Arc<dyn AuthBoundary>,
    config: Arc<GameConfig>,
    catalog: Arc<EnemyCatalog>,
    sessions: Mutex<HashMap<UserId, Arc<SessionHandle>>>,
}

impl GameService {
    /// Validates the config and builds the shared enemy catalog. Fails
    /// with `GameError::Configuration` on bad input.
    pub fn new(
        store: Arc<dyn ProgressionStore>,
        auth: Arc<dyn AuthBoundary>,
        config: GameConfig,
    ) -> Result<Self> {
        config.validate()?;
        let catalog = EnemyCatalog::with_defaults(config.enemies)?;
        Ok(Self {
            store,
            auth,
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Resolve the credential and attach to (or create) the user's session.
    /// A user without a stored record gets a fresh character.
    pub async fn open_session(&self, credential: &str) -> Result<GameSnapshot> {
        let user = self.auth.resolve_user(credential)?;
        let handle = match self.existing(&user).await {
            Some(handle) => handle,
            None => {
                let progression = self.load_or_create(&user).await?;
                self.attach(user, progression).await?
            }
        };
        let session = handle.lock_open().await?;
        Ok(session.snapshot())
    }

    /// Fails with `GameError::NotFound` unless the session is open.
    pub async fn get_state(&self, credential: &str) -> Result<GameSnapshot> {
        let handle = self.handle(credential).await?;
        let session = handle.lock_open().await?;
        Ok(session.snapshot())
    }

    /// Run one player command. User-facing failures (cooldowns, funds,
    /// unknown names) are also written to the battle log.
    pub async fn apply_action(&self, credential: &str, action: Action) -> Result<GameSnapshot> {
        let handle = self.handle(credential).await?;
        run_action(&handle, action).await
    }

    /// Log entries newer than `cursor`, oldest first.
    pub async fn log_since(&self, credential: &str, cursor: u64) -> Result<Vec<LogEntry>> {
        let handle = self.handle(credential).await?;
        let session = handle.lock_open().await?;
        Ok(session.log_since(cursor))
    }

    /// Recent battles, newest first.
    pub async fn battle_history(&self, credential: &str) -> Result<Vec<BattleRecord>> {
        let handle = self.handle(credential).await?;
        let session = handle.lock_open().await?;
        Ok(session.player().history.iter().cloned().collect())
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        blocking(Arc::clone(&self.store), move |store| leaderboard(store, limit)).await
    }

    /// Stop the battle, write a final save and tear the session down.
    pub async fn close_session(&self, credential: &str) -> Result<()> {
        let user = self.auth.resolve_user(credential)?;
        let handle = self.sessions.lock().await.remove(&user);
        match handle {
            Some(handle) => {
                shutdown_handle(handle).await;
                info!(user = %user, "session closed");
                Ok(())
            }
            None => Err(GameError::NotFound(user)),
        }
    }

    /// Close every open session.
    pub async fn shutdown(&self) {
        let handles: Vec<_> = self.sessions.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            shutdown_handle(handle).await;
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn handle(&self, credential: &str) -> Result<Arc<SessionHandle>> {
        let user = self.auth.resolve_user(credential)?;
        self.existing(&user)
            .await
            .ok_or(GameError::NotFound(user))
    }

    async fn existing(&self, user: &UserId) -> Option<Arc<SessionHandle>> {
        self.sessions.lock().await.get(user).map(Arc::clone)
    }

    /// Runs outside the session map lock.
    async fn load_or_create(&self, user: &UserId) -> Result<PlayerProgression> {
        let user_id = user.clone();
        let loaded = blocking(Arc::clone(&self.store), move |store| store.load(&user_id)).await;
        match loaded {
            Ok(progression) => Ok(progression),
            Err(GameError::NotFound(_)) => {
                info!(user = %user, "creating new character");
                let user_id = user.clone();
                blocking(Arc::clone(&self.store), move |store| {
                    let fresh = PlayerProgression::new();
                    store.save(&user_id, &fresh)?;
                    Ok(fresh)
                })
                .await
            }
            Err(err) => Err(err),
        }
    }

    /// Insert a session for `user`, unless a concurrent open got there first.
    async fn attach(
        &self,
        user: UserId,
        progression: PlayerProgression,
    ) -> Result<Arc<SessionHandle>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(&user) {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(self.start_session(&user, progression)?);
        sessions.insert(user, Arc::clone(&handle));
        Ok(handle)
    }

    fn start_session(&self, user: &UserId, progression: PlayerProgression) -> Result<SessionHandle> {
        let session = BattleSession::new(
            user.clone(),
            progression,
            Arc::clone(&self.catalog),
            Arc::clone(&self.config),
        )?;
        let session = Arc::new(Mutex::new(session));

        let (saves, writer) = SaveQueue::spawn(
            user.clone(),
            Arc::clone(&self.store),
            RetryPolicy::from(&self.config.session),
        );
        let autosave = spawn_autosave(
            Arc::clone(&session),
            saves.clone(),
            self.config.session.autosave_interval(),
        );

        info!(user = %user, "session opened");
        Ok(SessionHandle {
            session,
            saves,
            writer,
            autosave,
            battle_loop: StdMutex::new(None),
            tick_interval: self.config.session.tick_interval(),
            closed: AtomicBool::new(false),
        })
    }
}

async fn run_action(handle: &SessionHandle, action: Action) -> Result<GameSnapshot> {
    let mut session = handle.lock_open().await?;

    let outcome = match action {
        Action::StartBattle => {
            if session.start() {
                handle.restart_loop();
            }
            Ok(())
        }
        Action::StopBattle => {
            if session.stop() {
                handle.cancel_loop();
            }
            Ok(())
        }
        Action::UseSkill(name) => session.use_skill_named(&name).map(|_| ()),
        Action::PurchaseUpgrade(kind) => session.purchase_upgrade(kind),
        Action::UseItem(name) => session.use_item(&name).map(|_| ()),
    };

    if session.take_dirty() {
        handle.saves.save(session.player().clone());
    }
    outcome?;
    Ok(session.snapshot())
}

async fn shutdown_handle(handle: Arc<SessionHandle>) {
    {
        let mut session = handle.session.lock().await;
        handle.closed.store(true, Ordering::SeqCst);
        session.stop();
        handle.cancel_loop();
        handle.autosave.abort();
        session.take_dirty();
        handle.saves.save(session.player().clone());
    }
    if !handle.saves.flush().await {
        warn!("save writer ended before final flush");
    }
    handle.writer.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::auth::StaticTokens;
    use crate::session::battle::BattleState;
    use crate::storage::MemoryStore;

    fn loop_running(handle: &SessionHandle) -> bool {
        handle
            .battle_loop
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn service() -> GameService {
        let auth = Arc::new(StaticTokens::new());
        auth.insert("tok", UserId::new("p1"));
        let config = GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        };
        GameService::new(Arc::new(MemoryStore::new()), auth, config).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_handle_cannot_restart_closed_session() {
        let service = service();
        service.open_session("tok").await.unwrap();
        let stale = service.handle("tok").await.unwrap();

        service.close_session("tok").await.unwrap();

        let err = run_action(&stale, Action::StartBattle).await.unwrap_err();
        assert!(matches!(err, GameError::NotFound(_)));
        assert!(!loop_running(&stale));
        assert_eq!(stale.session.lock().await.state(), BattleState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_after_close_are_not_found() {
        let service = service();
        service.open_session("tok").await.unwrap();
        service.close_session("tok").await.unwrap();

        assert!(matches!(
            service.apply_action("tok", Action::StartBattle).await,
            Err(GameError::NotFound(_))
        ));
        assert!(matches!(
            service.get_state("tok").await,
            Err(GameError::NotFound(_))
        ));
        assert_eq!(service.active_sessions().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_reuses_live_session() {
        let service = service();
        service.open_session("tok").await.unwrap();
        service.apply_action("tok", Action::StartBattle).await.unwrap();

        let again = service.open_session("tok").await.unwrap();
        assert_eq!(again.state, BattleState::Fighting);
        assert_eq!(service.active_sessions().await, 1);
        assert!(loop_running(&service.handle("tok").await.unwrap()));
        service.shutdown().await;
    }
}
