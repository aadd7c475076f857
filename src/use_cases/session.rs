// Per-match turn bookkeeping: pending actions, single resolution and the
// animation handshake that gates the next turn.

use crate::domain::action::{Action, AnimationCommand};
use crate::domain::board::Board;
use crate::domain::entities::Side;
use crate::domain::errors::MatchError;
use crate::domain::resolver::{Outcome, TurnResolution, TurnResolver};
use crate::domain::visibility::{BoardView, view_for};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Participant identity as issued by the auth service.
pub type PlayerId = u64;

/// A value held once per side, stored as `player1` (attacker) / `player2` (defender).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePair<T> {
    #[serde(rename = "player1")]
    pub attacker: T,
    #[serde(rename = "player2")]
    pub defender: T,
}

impl<T> SidePair<T> {
    pub fn new(attacker: T, defender: T) -> Self {
        Self { attacker, defender }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Attacker => &mut self.attacker,
            Side::Defender => &mut self.defender,
        }
    }
}

/// Both actions of the most recently resolved turn and what they produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastAction {
    pub actions: SidePair<Action>,
    pub commands: Vec<AnimationCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored; the other side has not submitted yet.
    Waiting,
    Resolved(TurnResolution),
}

/// Match state as one participant is allowed to see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub match_id: String,
    pub player_role: Side,
    #[serde(flatten)]
    pub board: BoardView,
    pub turn_counter: u32,
    pub finished: bool,
    pub winner: Option<Outcome>,
    pub turn_ready: bool,
    /// Whether the viewer already has an action queued for the current turn.
    pub action_submitted: bool,
    pub last_action: Option<LastAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSession {
    pub match_id: String,
    pub players: SidePair<PlayerId>,
    pub board: Board,
    pub turn_counter: u32,
    pub outcome: Option<Outcome>,
    pub pending: SidePair<Option<Action>>,
    pub animation_complete: SidePair<bool>,
    pub turn_ready: bool,
    pub last_action: Option<LastAction>,
    pub created_at: u64,
    pub last_updated: u64,
}

impl MatchSession {
    pub fn new(match_id: String, players: SidePair<PlayerId>, board: Board, now: u64) -> Self {
        Self {
            match_id,
            players,
            board,
            turn_counter: 0,
            outcome: None,
            pending: SidePair::default(),
            animation_complete: SidePair::default(),
            turn_ready: true,
            last_action: None,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.board.game_over()
    }

    pub fn side_of(&self, player: PlayerId) -> Result<Side, MatchError> {
        Side::ALL
            .into_iter()
            .find(|side| *self.players.get(*side) == player)
            .ok_or(MatchError::NotParticipant)
    }

    /// Queues `side`'s action and resolves the turn once both are present.
    ///
    /// A rejected submission leaves the session untouched.
    pub fn submit(
        &mut self,
        resolver: &TurnResolver,
        side: Side,
        action: Action,
        now: u64,
    ) -> Result<SubmitOutcome, MatchError> {
        if self.is_finished() {
            return Err(MatchError::MatchFinished);
        }
        if !self.turn_ready {
            return Err(MatchError::TurnLocked);
        }
        if self.pending.get(side).is_some() {
            return Err(MatchError::AlreadySubmitted);
        }

        let piece = self
            .board
            .piece(&action.acting_piece_id)
            .ok_or_else(|| MatchError::UnknownPiece(action.acting_piece_id.clone()))?;
        if piece.side != side {
            return Err(MatchError::NotYourPiece(action.acting_piece_id.clone()));
        }
        if !action.destination.in_bounds() {
            return Err(MatchError::DestinationOutOfBounds(action.destination));
        }

        let mut pending = self.pending.clone();
        *pending.get_mut(side) = Some(action);

        let (Some(attacker_action), Some(defender_action)) = (&pending.attacker, &pending.defender) else {
            debug!(match_id = %self.match_id, %side, "action stored; waiting for opponent");
            self.pending = pending;
            self.last_updated = now;
            return Ok(SubmitOutcome::Waiting);
        };

        let resolution = resolver.resolve(&self.board, Some(attacker_action), Some(defender_action))?;

        self.last_action = Some(LastAction {
            actions: SidePair::new(attacker_action.clone(), defender_action.clone()),
            commands: resolution.commands.clone(),
        });
        self.board = resolution.final_board.clone();
        self.outcome = resolution.outcome;
        self.turn_counter += 1;
        self.pending = SidePair::default();
        self.animation_complete = SidePair::default();
        self.turn_ready = false;
        self.last_updated = now;

        info!(
            match_id = %self.match_id,
            turn = self.turn_counter,
            commands = resolution.commands.len(),
            outcome = ?resolution.outcome,
            "turn resolved"
        );
        Ok(SubmitOutcome::Resolved(resolution))
    }

    /// Records that `side` finished replaying the last turn. Returns whether the
    /// next turn is open.
    pub fn confirm_animation(&mut self, side: Side, now: u64) -> Result<bool, MatchError> {
        if self.is_finished() {
            return Err(MatchError::MatchFinished);
        }
        if self.turn_ready {
            return Ok(true);
        }

        *self.animation_complete.get_mut(side) = true;
        if self.animation_complete.attacker && self.animation_complete.defender {
            self.turn_ready = true;
            self.animation_complete = SidePair::default();
            debug!(match_id = %self.match_id, turn = self.turn_counter, "both sides ready for next turn");
        }
        self.last_updated = now;
        Ok(self.turn_ready)
    }

    pub fn view_for(&self, viewer: Side) -> MatchView {
        MatchView {
            match_id: self.match_id.clone(),
            player_role: viewer,
            board: view_for(&self.board, viewer),
            turn_counter: self.turn_counter,
            finished: self.is_finished(),
            winner: self.outcome,
            turn_ready: self.turn_ready,
            action_submitted: self.pending.get(viewer).is_some(),
            last_action: self.last_action.clone(),
        }
    }
}
