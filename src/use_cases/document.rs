// Stored match record <-> MatchSession.

use crate::domain::action::Action;
use crate::domain::board::Board;
use crate::domain::codec::{decode_board, encode_board};
use crate::domain::entities::Side;
use crate::domain::errors::DecodeError;
use crate::domain::resolver::Outcome;
use crate::use_cases::session::{LastAction, MatchSession, PlayerId, SidePair};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StoredWinner {
    Attacker,
    Defender,
    Draw,
}

impl From<Outcome> for StoredWinner {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Winner(Side::Attacker) => StoredWinner::Attacker,
            Outcome::Winner(Side::Defender) => StoredWinner::Defender,
            Outcome::Draw => StoredWinner::Draw,
        }
    }
}

impl From<StoredWinner> for Outcome {
    fn from(winner: StoredWinner) -> Self {
        match winner {
            StoredWinner::Attacker => Outcome::Winner(Side::Attacker),
            StoredWinner::Defender => Outcome::Winner(Side::Defender),
            StoredWinner::Draw => Outcome::Draw,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchRecord {
    match_id: String,
    player1: PlayerId,
    player2: PlayerId,
    state: Value,
    #[serde(default)]
    turn_counter: u32,
    #[serde(default)]
    finished: bool,
    #[serde(default)]
    winner: Option<StoredWinner>,
    #[serde(default)]
    current_turn_actions: SidePair<Option<Action>>,
    #[serde(default)]
    animation_complete: SidePair<bool>,
    #[serde(default = "turn_ready_default")]
    turn_ready: bool,
    #[serde(default)]
    last_action: Option<LastAction>,
    #[serde(default)]
    created_at: u64,
    #[serde(default)]
    last_updated: u64,
}

fn turn_ready_default() -> bool {
    true
}

pub fn to_document(session: &MatchSession) -> Result<Value, serde_json::Error> {
    let record = MatchRecord {
        match_id: session.match_id.clone(),
        player1: session.players.attacker,
        player2: session.players.defender,
        state: encode_board(&session.board),
        turn_counter: session.turn_counter,
        finished: session.is_finished(),
        winner: session.outcome.map(StoredWinner::from),
        current_turn_actions: session.pending.clone(),
        animation_complete: session.animation_complete,
        turn_ready: session.turn_ready,
        last_action: session.last_action.clone(),
        created_at: session.created_at,
        last_updated: session.last_updated,
    };
    serde_json::to_value(record)
}

pub fn from_document(doc: &Value) -> Result<MatchSession, DecodeError> {
    let record: MatchRecord =
        serde_json::from_value(doc.clone()).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let mut board = decode_board(&record.state)?;
    if record.finished && !board.game_over() {
        warn!(match_id = %record.match_id, "finished match stored with a live board; freezing it");
        board = Board::new(board.pieces().cloned().collect::<Vec<_>>(), board.traps().to_vec(), true);
    }

    Ok(MatchSession {
        match_id: record.match_id,
        players: SidePair::new(record.player1, record.player2),
        board,
        turn_counter: record.turn_counter,
        outcome: record.winner.map(Outcome::from),
        pending: record.current_turn_actions,
        animation_complete: record.animation_complete,
        turn_ready: record.turn_ready,
        last_action: record.last_action,
        created_at: record.created_at,
        last_updated: record.last_updated,
    })
}
