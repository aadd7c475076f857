// Per-viewer redaction of the authoritative board.

use crate::domain::board::Board;
use crate::domain::entities::{Piece, Position, Side, Trap};
use serde::Serialize;
use std::collections::BTreeMap;

/// A piece as one viewer is allowed to see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceView {
    pub id: String,
    pub side: Side,
    #[serde(flatten)]
    pub position: Position,
    pub concealed: bool,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub attack_range: i32,
    pub speed: i32,
    pub stealth: i32,
    pub stealth_regeneration: i32,
}

impl PieceView {
    fn revealed(piece: &Piece) -> Self {
        Self {
            id: piece.id.clone(),
            side: piece.side,
            position: piece.position,
            concealed: false,
            hp: piece.hp,
            max_hp: piece.max_hp,
            attack: piece.attack,
            attack_range: piece.attack_range,
            speed: piece.speed,
            stealth: piece.stealth,
            stealth_regeneration: piece.stealth_regeneration,
        }
    }

    // Occupancy only: the viewer learns a cell is taken, not by what.
    fn concealed(piece: &Piece) -> Self {
        Self {
            id: piece.id.clone(),
            side: piece.side,
            position: piece.position,
            concealed: true,
            hp: 0,
            max_hp: 0,
            attack: 0,
            attack_range: 0,
            speed: 0,
            stealth: 0,
            stealth_regeneration: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub pieces: BTreeMap<String, PieceView>,
    // Traps are shared with both sides as-is.
    pub traps: Vec<Trap>,
    pub game_over: bool,
}

/// Builds the board as seen by `viewer`. The authoritative board is never touched.
pub fn view_for(board: &Board, viewer: Side) -> BoardView {
    let pieces = board
        .pieces()
        .map(|piece| {
            let view = if piece.is_visible_to(viewer) {
                PieceView::revealed(piece)
            } else {
                PieceView::concealed(piece)
            };
            (piece.id.clone(), view)
        })
        .collect();

    BoardView {
        pieces,
        traps: board.traps().to_vec(),
        game_over: board.game_over(),
    }
}
