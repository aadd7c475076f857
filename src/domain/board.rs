// Authoritative per-match board: pieces, live traps and the game-over latch.

use crate::domain::entities::{Piece, Position, Side, Trap};
use crate::domain::tuning::RosterTuning;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    // Keyed by id; ordered iteration keeps every pass over the board deterministic.
    pieces: BTreeMap<String, Piece>,
    traps: Vec<Trap>,
    game_over: bool,
}

impl Board {
    pub fn new(pieces: impl IntoIterator<Item = Piece>, traps: Vec<Trap>, game_over: bool) -> Self {
        Self {
            pieces: pieces.into_iter().map(|p| (p.id.clone(), p)).collect(),
            traps,
            game_over,
        }
    }

    /// Builds the opening board: each side's roster on its start row, one piece per column.
    pub fn starting(roster: &RosterTuning) -> Self {
        let mut board = Board::default();

        for (side, slots) in [(Side::Defender, &roster.defender), (Side::Attacker, &roster.attacker)] {
            for (slot, stats) in slots.iter().enumerate() {
                let id = format!("{}_{}", side.id_prefix(), slot);
                let position = Position::new(slot as i32, side.start_row());
                if !position.in_bounds() || board.piece_at(position).is_some() {
                    warn!(piece_id = %id, %position, "starting cell unavailable; piece skipped");
                    continue;
                }
                board.pieces.insert(
                    id.clone(),
                    Piece {
                        id,
                        side,
                        position,
                        hp: stats.hp,
                        max_hp: stats.hp,
                        attack: stats.attack,
                        attack_range: stats.attack_range,
                        speed: stats.speed,
                        stealth: stats.stealth,
                        stealth_regeneration: stats.stealth_regeneration,
                    },
                );
            }
        }

        board
    }

    pub fn piece(&self, id: &str) -> Option<&Piece> {
        self.pieces.get(id)
    }

    pub(crate) fn piece_mut(&mut self, id: &str) -> Option<&mut Piece> {
        self.pieces.get_mut(id)
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values()
    }

    pub(crate) fn pieces_mut(&mut self) -> impl Iterator<Item = &mut Piece> {
        self.pieces.values_mut()
    }

    /// Living piece standing on `position`, if any.
    pub fn piece_at(&self, position: Position) -> Option<&Piece> {
        self.pieces
            .values()
            .find(|p| p.is_alive() && p.position == position)
    }

    pub fn traps(&self) -> &[Trap] {
        &self.traps
    }

    pub fn trap_index_at(&self, position: Position) -> Option<usize> {
        self.traps.iter().position(|t| t.position == position)
    }

    pub(crate) fn add_trap(&mut self, position: Position) {
        self.traps.push(Trap { position });
    }

    pub(crate) fn remove_trap(&mut self, index: usize) -> Trap {
        self.traps.remove(index)
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub(crate) fn set_game_over(&mut self) {
        self.game_over = true;
    }

    pub fn living_count(&self, side: Side) -> usize {
        self.pieces
            .values()
            .filter(|p| p.side == side && p.is_alive())
            .count()
    }
}
