use crate::errors::{ErrorSeverity, IntoErrorResponse};
use crate::events::{EventBus, GameEvent};
use blackjack_engine::achievements::Achievement;
use blackjack_engine::cards::Card;
use blackjack_engine::engine::{Command, RoundEngine, DEFAULT_PLAYER_NAME};
use blackjack_engine::events::{RoundEvent, RoundResult};
use blackjack_engine::game::{AvailableAction, Phase};
use blackjack_engine::player::PlayerStats;
use blackjack_engine::shoe::Shoe;
use blackjack_engine::store::{
    FileStore, KvStatsRepository, MemoryStore, StatsRepository, StoreError,
};
use blackjack_engine::GameError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;
use warp::http::StatusCode;

pub type SessionId = String;

/// Engine type hosted by each session; the repository is chosen per profile.
pub type TableEngine = RoundEngine<Box<dyn StatsRepository + Send>>;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
const MAX_PROFILE_LEN: usize = 64;

/// Owns every open table and routes commands to them.
#[derive(Debug)]
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Arc<TableSession>>>,
    event_bus: Arc<EventBus>,
    data_dir: Option<PathBuf>,
    session_ttl: RwLock<Duration>,
}

impl SessionManager {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self::with_ttl(event_bus, DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(event_bus: Arc<EventBus>, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            event_bus,
            data_dir: None,
            session_ttl: RwLock::new(ttl),
        }
    }

    /// Sessions that name a profile keep its progress in `data_dir/<profile>.json`.
    pub fn with_storage(event_bus: Arc<EventBus>, ttl: Duration, data_dir: PathBuf) -> Self {
        Self {
            data_dir: Some(data_dir),
            ..Self::with_ttl(event_bus, ttl)
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn ttl(&self) -> Duration {
        match self.session_ttl.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set_ttl(&self, ttl: Duration) {
        match self.session_ttl.write() {
            Ok(mut guard) => *guard = ttl,
            Err(poisoned) => *poisoned.into_inner() = ttl,
        }
        tracing::debug!(ttl_secs = ttl.as_secs(), "session ttl changed");
    }

    pub fn create_session(&self, config: TableConfig) -> Result<SessionId, SessionError> {
        let shoe = match config.seed {
            Some(seed) => Shoe::new_with_seed(seed),
            None => Shoe::new(),
        };
        self.create_session_with_shoe(config, shoe)
    }

    /// Opens a table dealing from `shoe`, e.g. a stacked shoe for a replay.
    pub fn create_session_with_shoe(
        &self,
        config: TableConfig,
        shoe: Shoe,
    ) -> Result<SessionId, SessionError> {
        let repository = self.open_repository(config.profile.as_deref())?;
        let id = Uuid::new_v4().to_string();

        tracing::info!(
            session_id = %id,
            profile = config.profile.as_deref().unwrap_or("<memory>"),
            seed = ?config.seed,
            "creating table session"
        );

        let engine = RoundEngine::with_player_name(repository, shoe, config.player_name.clone());
        let chips = engine.player().chips();
        let session = Arc::new(TableSession::new(id.clone(), config, engine));

        {
            let mut guard = self
                .sessions
                .write()
                .map_err(|_| SessionError::StoragePoisoned)?;
            guard.insert(id.clone(), Arc::clone(&session));
        }

        self.event_bus.broadcast(
            &id,
            GameEvent::SessionStarted {
                session_id: id.clone(),
                player_name: session.config.player_name.clone(),
                chips,
            },
        );

        Ok(id)
    }

    pub fn get_session(&self, id: &SessionId) -> Result<Arc<TableSession>, SessionError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| SessionError::StoragePoisoned)?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    pub fn state(&self, session_id: &SessionId) -> Result<TableStateResponse, SessionError> {
        let session = self.live_session(session_id)?;
        let engine = session.lock_engine()?;
        Ok(session.snapshot(&engine))
    }

    pub fn config(&self, session_id: &SessionId) -> Result<TableConfig, SessionError> {
        Ok(self.get_session(session_id)?.config.clone())
    }

    pub fn info(&self, session_id: &SessionId) -> Result<SessionInfo, SessionError> {
        let session = self.live_session(session_id)?;
        let engine = session.lock_engine()?;
        Ok(SessionInfo {
            session_id: session.id.clone(),
            config: session.config.clone(),
            created_at: session.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            state: session.snapshot(&engine),
        })
    }

    /// Applies one table command and fans the resulting events out to subscribers.
    ///
    /// Events are published while the engine lock is held so concurrent
    /// commands on one table reach subscribers in the order they were applied.
    pub fn process_command(
        &self,
        session_id: &SessionId,
        command: Command,
    ) -> Result<CommandResponse, SessionError> {
        let session = self.live_session(session_id)?;
        let mut engine = session.lock_engine()?;

        tracing::debug!(
            session_id = %session_id,
            command = ?command,
            phase = %engine.phase(),
            "processing table command"
        );

        let events = match engine.apply(command) {
            Ok(events) => events,
            Err(err) => {
                self.event_bus.broadcast(
                    session_id,
                    GameEvent::Error {
                        session_id: session_id.clone(),
                        message: err.to_string(),
                    },
                );
                return Err(err.into());
            }
        };
        self.event_bus.publish_round(session_id, &events);

        Ok(CommandResponse {
            state: session.snapshot(&engine),
            events,
        })
    }

    pub fn stats(&self, session_id: &SessionId) -> Result<StatsResponse, SessionError> {
        let session = self.live_session(session_id)?;
        let engine = session.lock_engine()?;
        let last_saved = match engine.repository().last_saved() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "failed to read last save time");
                None
            }
        };
        Ok(StatsResponse {
            stats: engine.stats().clone(),
            chips: engine.player().chips(),
            win_rate: engine.player().win_rate(),
            last_saved,
            persistence_failures: engine.persistence_failures(),
        })
    }

    pub fn achievements(
        &self,
        session_id: &SessionId,
    ) -> Result<AchievementsResponse, SessionError> {
        let session = self.live_session(session_id)?;
        let engine = session.lock_engine()?;
        let tracker = engine.achievement_tracker();
        Ok(AchievementsResponse {
            achievements: tracker.achievements().to_vec(),
            unlocked: tracker.unlocked_count(),
            total: tracker.achievements().len(),
        })
    }

    /// Every event of the round in progress, for clients that join mid-round.
    pub fn round_events(&self, session_id: &SessionId) -> Result<Vec<RoundEvent>, SessionError> {
        let session = self.live_session(session_id)?;
        let engine = session.lock_engine()?;
        Ok(engine.round_events().to_vec())
    }

    pub fn delete_session(&self, session_id: &SessionId) -> Result<(), SessionError> {
        match self.remove_session(session_id, "terminated_by_request")? {
            Some(_) => Ok(()),
            None => Err(SessionError::NotFound(session_id.clone())),
        }
    }

    /// Drops every session idle for longer than the TTL. Returns how many went.
    pub fn cleanup_expired_sessions(&self) -> usize {
        let ttl = self.ttl();
        let mut expired = Vec::new();
        {
            let mut guard = match self.sessions.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.retain(|id, session| {
                if session.is_expired(ttl) {
                    expired.push(id.clone());
                    false
                } else {
                    true
                }
            });
        }

        for id in &expired {
            self.announce_end(id, "expired");
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired idle sessions");
        }
        expired.len()
    }

    pub fn active_sessions(&self) -> Vec<SessionId> {
        match self.sessions.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    fn live_session(&self, session_id: &SessionId) -> Result<Arc<TableSession>, SessionError> {
        let session = self.get_session(session_id)?;
        if session.is_expired(self.ttl()) {
            self.remove_session(session_id, "expired due to inactivity")?;
            return Err(SessionError::Expired(session_id.clone()));
        }
        session.touch();
        Ok(session)
    }

    fn open_repository(
        &self,
        profile: Option<&str>,
    ) -> Result<Box<dyn StatsRepository + Send>, SessionError> {
        let Some(profile) = profile else {
            return Ok(Box::new(KvStatsRepository::new(MemoryStore::new())));
        };
        validate_profile(profile)?;

        match &self.data_dir {
            Some(dir) => {
                let path = dir.join(format!("{profile}.json"));
                let store = FileStore::open(&path)?;
                tracing::debug!(profile, path = %path.display(), "opened profile store");
                Ok(Box::new(KvStatsRepository::new(store)))
            }
            None => {
                tracing::debug!(profile, "no data directory configured, profile kept in memory");
                Ok(Box::new(KvStatsRepository::new(MemoryStore::new())))
            }
        }
    }

    fn remove_session(
        &self,
        session_id: &SessionId,
        reason: &str,
    ) -> Result<Option<Arc<TableSession>>, SessionError> {
        let removed = match self.sessions.write() {
            Ok(mut guard) => guard.remove(session_id),
            Err(_) => return Err(SessionError::StoragePoisoned),
        };
        if removed.is_some() {
            self.announce_end(session_id, reason);
        }
        Ok(removed)
    }

    fn announce_end(&self, session_id: &SessionId, reason: &str) {
        self.event_bus.broadcast(
            session_id,
            GameEvent::SessionEnded {
                session_id: session_id.clone(),
                reason: reason.to_string(),
            },
        );
        self.event_bus.drop_session(session_id);
    }
}

fn validate_profile(profile: &str) -> Result<(), SessionError> {
    let valid = !profile.is_empty()
        && profile.len() <= MAX_PROFILE_LEN
        && profile
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidProfile(profile.to_string()))
    }
}

/// One player's table: an engine plus bookkeeping for expiry.
pub struct TableSession {
    id: SessionId,
    engine: Mutex<TableEngine>,
    config: TableConfig,
    created_at: DateTime<Utc>,
    last_active: Mutex<Instant>,
}

impl std::fmt::Debug for TableSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSession")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl TableSession {
    fn new(id: SessionId, config: TableConfig, engine: TableEngine) -> Self {
        Self {
            id,
            engine: Mutex::new(engine),
            config,
            created_at: Utc::now(),
            last_active: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, TableEngine>, SessionError> {
        self.engine.lock().map_err(|_| SessionError::StoragePoisoned)
    }

    fn touch(&self) {
        if let Ok(mut guard) = self.last_active.lock() {
            *guard = Instant::now();
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        match self.last_active.lock() {
            Ok(last) => last.elapsed() >= ttl,
            Err(_) => false,
        }
    }

    fn snapshot(&self, engine: &TableEngine) -> TableStateResponse {
        let player = engine.player();
        let dealer = engine.dealer();
        TableStateResponse {
            session_id: self.id.clone(),
            player_name: player.name().to_string(),
            phase: engine.phase(),
            chips: player.chips(),
            bet: player.bet(),
            player_hand: HandView {
                cards: player.hand().cards().to_vec(),
                score: player.hand().score(),
                soft: player.hand().is_soft(),
            },
            dealer_hand: DealerView {
                cards: dealer.visible_cards(),
                score: dealer.visible_score(),
                hole_hidden: dealer.is_hole_hidden() && dealer.hand().len() >= 2,
            },
            available_actions: engine.available_actions(),
            last_result: engine.last_result().cloned(),
            shoe_remaining: engine.shoe_remaining(),
        }
    }
}

#[cfg(test)]
impl TableSession {
    fn force_last_active(&self, instant: Instant) {
        if let Ok(mut guard) = self.last_active.lock() {
            *guard = instant;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableConfig {
    pub seed: Option<u64>,
    /// Named profile whose progress is loaded and saved; `None` plays on a
    /// throwaway in-memory profile.
    pub profile: Option<String>,
    pub player_name: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            seed: None,
            profile: None,
            player_name: DEFAULT_PLAYER_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandView {
    pub cards: Vec<Card>,
    pub score: u8,
    pub soft: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DealerView {
    /// `null` in place of the face-down hole card
    pub cards: Vec<Option<Card>>,
    /// Up-card value while the hole card is hidden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    pub hole_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableStateResponse {
    pub session_id: SessionId,
    pub player_name: String,
    pub phase: Phase,
    pub chips: u32,
    pub bet: u32,
    pub player_hand: HandView,
    pub dealer_hand: DealerView,
    pub available_actions: Vec<AvailableAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<RoundResult>,
    pub shoe_remaining: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub config: TableConfig,
    pub created_at: String,
    pub state: TableStateResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse {
    pub events: Vec<RoundEvent>,
    pub state: TableStateResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsResponse {
    pub stats: PlayerStats,
    pub chips: u32,
    /// Percentage of decided games won
    pub win_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<String>,
    pub persistence_failures: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementsResponse {
    pub achievements: Vec<Achievement>,
    pub unlocked: usize,
    pub total: usize,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error("Session expired: {0}")]
    Expired(SessionId),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Invalid profile name `{0}`: use 1-64 letters, digits, '-' or '_'")]
    InvalidProfile(String),
    #[error("Profile storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("Session storage poisoned")]
    StoragePoisoned,
}

impl IntoErrorResponse for SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Expired(_) => StatusCode::GONE,
            SessionError::Game(err) => match err {
                GameError::InvalidBetAmount { .. }
                | GameError::NoBetPlaced
                | GameError::InsufficientChips { .. }
                | GameError::InvalidGrant
                | GameError::ChipLimit { .. } => StatusCode::BAD_REQUEST,
                GameError::InvalidCommand { .. }
                | GameError::CannotDoubleDown
                | GameError::OutOfChips => StatusCode::CONFLICT,
            },
            SessionError::InvalidProfile(_) => StatusCode::BAD_REQUEST,
            SessionError::Storage(_) | SessionError::StoragePoisoned => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "session_not_found",
            SessionError::Expired(_) => "session_expired",
            SessionError::Game(err) => match err {
                GameError::InvalidBetAmount { .. } => "invalid_bet",
                GameError::NoBetPlaced => "no_bet_placed",
                GameError::InsufficientChips { .. } => "insufficient_chips",
                GameError::InvalidGrant => "invalid_grant",
                GameError::ChipLimit { .. } => "chip_limit",
                GameError::InvalidCommand { .. } => "invalid_command",
                GameError::CannotDoubleDown => "cannot_double_down",
                GameError::OutOfChips => "out_of_chips",
            },
            SessionError::InvalidProfile(_) => "invalid_profile",
            SessionError::Storage(_) => "profile_storage_error",
            SessionError::StoragePoisoned => "session_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            SessionError::NotFound(id) => Some(serde_json::json!({ "session_id": id })),
            SessionError::Expired(id) => Some(serde_json::json!({
                "session_id": id,
                "reason": "Session expired due to inactivity"
            })),
            SessionError::Game(GameError::InvalidCommand { command, phase }) => {
                Some(serde_json::json!({ "command": command, "phase": phase }))
            }
            SessionError::Game(
                GameError::InvalidBetAmount { amount, chips }
                | GameError::ChipLimit { amount, chips },
            ) => {
                Some(serde_json::json!({ "amount": amount, "chips": chips }))
            }
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::StoragePoisoned => ErrorSeverity::Critical,
            SessionError::Storage(_) => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }
}
