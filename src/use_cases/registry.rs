// Registry of live matches. Each match is guarded by its own async mutex so a
// submission's check, resolution, persistence and slot clearing happen as one step.

use crate::domain::action::Action;
use crate::domain::board::Board;
use crate::domain::entities::Side;
use crate::domain::errors::MatchError;
use crate::domain::ports::{Clock, MatchStore};
use crate::domain::resolver::{TurnResolution, TurnResolver};
use crate::domain::tuning::{AnimationTuning, RosterTuning};
use crate::use_cases::document::{from_document, to_document};
use crate::use_cases::session::{MatchSession, MatchView, PlayerId, SidePair, SubmitOutcome};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared configuration for newly created matches.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// Capacity for per-match broadcast events.
    pub event_capacity: usize,
    /// Opening roster for both sides.
    pub roster: RosterTuning,
    /// Durations stamped onto animation commands.
    pub animation: AnimationTuning,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            event_capacity: 64,
            roster: RosterTuning::default(),
            animation: AnimationTuning::default(),
        }
    }
}

/// Errors returned by match creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Match already exists and cannot be re-created.
    #[error("match already exists")]
    AlreadyExists,
    #[error("a match needs two distinct players")]
    InvalidParticipants,
    #[error("match id must not be blank")]
    InvalidMatchId,
    #[error("storage failure: {0}")]
    Storage(String),
}

/// State changes pushed to everyone watching a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    TurnResolved { turn: u32 },
    NextTurnReady { turn: u32 },
}

/// Per-match session guard and event channel.
#[derive(Clone)]
pub struct MatchHandle {
    /// Identifier clients use to target this match.
    pub match_id: Arc<str>,
    session: Arc<Mutex<MatchSession>>,
    events_tx: broadcast::Sender<MatchEvent>,
}

impl MatchHandle {
    fn new(session: MatchSession, event_capacity: usize) -> Self {
        let (events_tx, _events_rx) = broadcast::channel::<MatchEvent>(event_capacity.max(1));
        Self {
            match_id: Arc::from(session.match_id.as_str()),
            session: Arc::new(Mutex::new(session)),
            events_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.events_tx.subscribe()
    }

    fn publish(&self, event: MatchEvent) {
        // No receivers simply means nobody is watching.
        let _ = self.events_tx.send(event);
    }
}

/// Result of an accepted submission, seen from the submitter's side.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub side: Side,
    /// Present when this submission completed the turn.
    pub resolution: Option<TurnResolution>,
    pub view: MatchView,
}

/// Thread-safe registry for active matches.
pub struct MatchRegistry {
    settings: MatchSettings,
    resolver: TurnResolver,
    store: Arc<dyn MatchStore>,
    clock: Arc<dyn Clock>,
    /// Map of match id to active handle.
    matches: RwLock<HashMap<String, MatchHandle>>,
}

impl MatchRegistry {
    pub fn new(settings: MatchSettings, store: Arc<dyn MatchStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            resolver: TurnResolver::new(settings.animation),
            settings,
            store,
            clock,
            matches: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a match on the opening board and persists it.
    ///
    /// `player1` takes the attacker side, `player2` the defender side. A missing id is generated.
    pub async fn create_match(
        &self,
        match_id: Option<String>,
        players: SidePair<PlayerId>,
    ) -> Result<MatchHandle, RegistryError> {
        if players.attacker == players.defender {
            return Err(RegistryError::InvalidParticipants);
        }
        let match_id = match match_id {
            Some(id) if id.trim().is_empty() => return Err(RegistryError::InvalidMatchId),
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };

        let mut matches = self.matches.write().await;
        if matches.contains_key(&match_id) {
            return Err(RegistryError::AlreadyExists);
        }
        let stored = self
            .store
            .load(&match_id)
            .await
            .map_err(RegistryError::Storage)?;
        if stored.is_some() {
            return Err(RegistryError::AlreadyExists);
        }

        let session = MatchSession::new(
            match_id.clone(),
            players,
            Board::starting(&self.settings.roster),
            self.clock.now_epoch_seconds(),
        );
        let document = to_document(&session).map_err(|e| RegistryError::Storage(e.to_string()))?;
        self.store
            .save(&match_id, document)
            .await
            .map_err(RegistryError::Storage)?;

        let handle = MatchHandle::new(session, self.settings.event_capacity);
        matches.insert(match_id.clone(), handle.clone());
        info!(
            match_id = %match_id,
            attacker = players.attacker,
            defender = players.defender,
            "match created"
        );
        Ok(handle)
    }

    /// Returns the handle for `match_id`, restoring it from the store on first use.
    pub async fn get_match(&self, match_id: &str) -> Result<MatchHandle, MatchError> {
        if let Some(handle) = self.matches.read().await.get(match_id) {
            return Ok(handle.clone());
        }

        let document = self
            .store
            .load(match_id)
            .await
            .map_err(MatchError::Storage)?
            .ok_or(MatchError::MatchNotFound)?;
        let mut session = from_document(&document)?;
        if session.match_id != match_id {
            warn!(match_id, stored_id = %session.match_id, "stored match id differs; using requested id");
            session.match_id = match_id.to_string();
        }

        let mut matches = self.matches.write().await;
        // Another request may have restored it while the store was read.
        let handle = matches
            .entry(match_id.to_string())
            .or_insert_with(|| MatchHandle::new(session, self.settings.event_capacity))
            .clone();
        info!(match_id, "match restored from store");
        Ok(handle)
    }

    pub async fn submit_action(
        &self,
        match_id: &str,
        player: PlayerId,
        action: Action,
    ) -> Result<SubmitReceipt, MatchError> {
        let handle = self.get_match(match_id).await?;
        let mut session = handle.session.lock().await;
        let side = session.side_of(player)?;

        let before = session.clone();
        let outcome = session.submit(&self.resolver, side, action, self.clock.now_epoch_seconds())?;
        if let Err(err) = self.persist(&session).await {
            *session = before;
            return Err(err);
        }

        let resolution = match outcome {
            SubmitOutcome::Waiting => None,
            SubmitOutcome::Resolved(resolution) => {
                handle.publish(MatchEvent::TurnResolved {
                    turn: session.turn_counter,
                });
                Some(resolution)
            }
        };

        Ok(SubmitReceipt {
            side,
            resolution,
            view: session.view_for(side),
        })
    }

    /// Records that `player` finished replaying the last turn. Returns whether the next turn is open.
    pub async fn confirm_animation(&self, match_id: &str, player: PlayerId) -> Result<bool, MatchError> {
        let handle = self.get_match(match_id).await?;
        let mut session = handle.session.lock().await;
        let side = session.side_of(player)?;

        let before = session.clone();
        let ready = session.confirm_animation(side, self.clock.now_epoch_seconds())?;
        if *session == before {
            return Ok(ready);
        }
        if let Err(err) = self.persist(&session).await {
            *session = before;
            return Err(err);
        }

        if ready && !before.turn_ready {
            handle.publish(MatchEvent::NextTurnReady {
                turn: session.turn_counter,
            });
        }
        Ok(ready)
    }

    /// Filtered match state for `player`.
    pub async fn state_for(&self, match_id: &str, player: PlayerId) -> Result<MatchView, MatchError> {
        let handle = self.get_match(match_id).await?;
        let session = handle.session.lock().await;
        let side = session.side_of(player)?;
        Ok(session.view_for(side))
    }

    /// Event stream for a match `player` takes part in.
    pub async fn subscribe(
        &self,
        match_id: &str,
        player: PlayerId,
    ) -> Result<broadcast::Receiver<MatchEvent>, MatchError> {
        let handle = self.get_match(match_id).await?;
        let session = handle.session.lock().await;
        session.side_of(player)?;
        Ok(handle.subscribe())
    }

    async fn persist(&self, session: &MatchSession) -> Result<(), MatchError> {
        let document = to_document(session).map_err(|e| MatchError::Storage(e.to_string()))?;
        self.store
            .save(&session.match_id, document)
            .await
            .map_err(|err| {
                warn!(match_id = %session.match_id, error = %err, "failed to persist match");
                MatchError::Storage(err)
            })
    }
}
