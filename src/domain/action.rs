// Player actions and the animation script produced when they resolve.

use crate::domain::entities::Position;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Move,
    Attack,
    PlaceTrap,
}

/// One side's submission for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub acting_piece_id: String,
    pub kind: ActionKind,
    pub destination: Position,
}

impl Action {
    pub fn new(acting_piece_id: impl Into<String>, kind: ActionKind, destination: Position) -> Self {
        Self {
            acting_piece_id: acting_piece_id.into(),
            kind,
            destination,
        }
    }
}

/// Transport-agnostic instruction for replaying a resolved turn on a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnimationCommand {
    #[serde(rename_all = "camelCase")]
    Move {
        card_id: String,
        destination: Position,
        duration: u32,
    },
    #[serde(rename_all = "camelCase")]
    BlockedMove {
        card_id: String,
        attempted_destination: Position,
        actual_destination: Position,
        duration: u32,
    },
    #[serde(rename_all = "camelCase")]
    Skill {
        source_card_id: String,
        target_card_id: String,
        bullet_duration: u32,
        flash_duration: u32,
    },
    #[serde(rename_all = "camelCase")]
    Trap {
        card_id: String,
        destination: Position,
        duration: u32,
    },
    #[serde(rename_all = "camelCase")]
    TrapTriggered { card_id: String, position: Position },
}
