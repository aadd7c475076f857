//! Simultaneous turn resolution.
//!
//! Both sides' actions are applied to a copy of the board in speed order. Each
//! action sees the effects of the ones applied before it, so a faster piece can
//! claim a cell that a slower piece then finds blocked. Once both actions are
//! applied, stealth decays for pieces standing in front of enemies and the
//! board is checked for a wiped-out side.
//!
//! Resolution is a pure function of the input board and the two actions; the
//! same inputs always produce the same board and the same command list.

use crate::domain::action::{Action, ActionKind, AnimationCommand};
use crate::domain::board::Board;
use crate::domain::entities::{Position, Side};
use crate::domain::errors::ResolveError;
use crate::domain::tuning::AnimationTuning;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Winner(Side),
    /// Both sides lost their last piece in the same turn.
    Draw,
}

/// Per-piece state after a turn, for state transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSnapshot {
    #[serde(flatten)]
    pub position: Position,
    pub hp: i32,
    pub stealth: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResolution {
    pub commands: Vec<AnimationCommand>,
    pub final_board: Board,
    pub snapshot: BTreeMap<String, PieceSnapshot>,
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, Default)]
pub struct TurnResolver {
    timings: AnimationTuning,
}

impl TurnResolver {
    pub fn new(timings: AnimationTuning) -> Self {
        Self { timings }
    }

    /// Resolves one turn from the attacker's and defender's actions.
    pub fn resolve(
        &self,
        board: &Board,
        attacker_action: Option<&Action>,
        defender_action: Option<&Action>,
    ) -> Result<TurnResolution, ResolveError> {
        let attacker_action = attacker_action.ok_or(ResolveError::MissingAction(Side::Attacker))?;
        let defender_action = defender_action.ok_or(ResolveError::MissingAction(Side::Defender))?;
        if board.game_over() {
            return Err(ResolveError::BoardFrozen);
        }

        let mut board = board.clone();
        let mut commands = Vec::new();

        let ordered = resolution_order(
            &board,
            [(Side::Attacker, attacker_action), (Side::Defender, defender_action)],
        );

        for (side, action) in ordered {
            let Some(actor) = board.piece(&action.acting_piece_id) else {
                debug!(piece_id = %action.acting_piece_id, "acting piece missing; action skipped");
                continue;
            };
            if !actor.is_alive() {
                debug!(piece_id = %actor.id, "acting piece is dead; action skipped");
                continue;
            }
            if actor.side != side {
                debug!(piece_id = %actor.id, %side, "acting piece belongs to the other side; action skipped");
                continue;
            }

            match action.kind {
                ActionKind::Move => self.apply_move(&mut board, action, &mut commands),
                ActionKind::Attack => self.apply_attack(&mut board, action, &mut commands),
                ActionKind::PlaceTrap => self.apply_trap(&mut board, action, &mut commands),
            }
        }

        apply_proximity_decay(&mut board);
        let outcome = detect_outcome(&mut board);

        let snapshot = board
            .pieces()
            .map(|p| {
                (
                    p.id.clone(),
                    PieceSnapshot {
                        position: p.position,
                        hp: p.hp,
                        stealth: p.stealth,
                    },
                )
            })
            .collect();

        Ok(TurnResolution {
            commands,
            final_board: board,
            snapshot,
            outcome,
        })
    }

    fn apply_move(&self, board: &mut Board, action: &Action, commands: &mut Vec<AnimationCommand>) {
        let id = action.acting_piece_id.as_str();
        let Some(origin) = board.piece(id).map(|p| p.position) else {
            return;
        };
        let destination = action.destination;

        // Occupancy is read from the board as it stands after earlier actions,
        // so a cell shared by more than one living piece still blocks.
        let blocker = board
            .pieces()
            .find(|p| p.id != id && p.is_alive() && p.position == destination)
            .map(|p| p.id.clone());

        if let Some(blocker) = blocker {
            debug!(piece_id = id, %destination, blocker = %blocker, "move blocked");
            commands.push(AnimationCommand::BlockedMove {
                card_id: id.to_string(),
                attempted_destination: destination,
                actual_destination: origin,
                duration: self.timings.blocked_move_ms,
            });
            return;
        }

        if let Some(piece) = board.piece_mut(id) {
            piece.position = destination;
        }
        commands.push(AnimationCommand::Move {
            card_id: id.to_string(),
            destination,
            duration: self.timings.move_ms,
        });

        // Traps fire during the mover's own action, not at end of turn.
        trigger_trap(board, id, commands);
    }

    fn apply_attack(&self, board: &mut Board, action: &Action, commands: &mut Vec<AnimationCommand>) {
        let Some(attacker_side) = board.piece(&action.acting_piece_id).map(|p| p.side) else {
            return;
        };
        let target_id = board
            .pieces()
            .find(|p| p.side != attacker_side && p.position == action.destination && p.is_alive())
            .map(|p| p.id.clone());

        // No target, no effect and no command.
        let Some(target_id) = target_id else {
            debug!(piece_id = %action.acting_piece_id, destination = %action.destination, "attack found no target");
            return;
        };

        if let Some(target) = board.piece_mut(&target_id) {
            target.take_hit();
            debug!(source = %action.acting_piece_id, target = %target_id, target_hp = target.hp, "piece hit");
        }
        commands.push(AnimationCommand::Skill {
            source_card_id: action.acting_piece_id.clone(),
            target_card_id: target_id,
            bullet_duration: self.timings.bullet_ms,
            flash_duration: self.timings.flash_ms,
        });
    }

    fn apply_trap(&self, board: &mut Board, action: &Action, commands: &mut Vec<AnimationCommand>) {
        let destination = action.destination;
        // One trap per cell; a second placement is a no-op.
        if board.trap_index_at(destination).is_some() {
            debug!(piece_id = %action.acting_piece_id, %destination, "cell already trapped; placement ignored");
            return;
        }

        board.add_trap(destination);
        commands.push(AnimationCommand::Trap {
            card_id: action.acting_piece_id.clone(),
            destination,
            duration: self.timings.trap_ms,
        });
    }
}

/// Orders the two actions by acting-piece speed, fastest first.
///
/// Missing pieces count as speed 0. Equal speeds resolve the attacker first.
fn resolution_order<'a>(board: &Board, actions: [(Side, &'a Action); 2]) -> Vec<(Side, &'a Action)> {
    let speed = |action: &Action| board.piece(&action.acting_piece_id).map_or(0, |p| p.speed);

    let mut ordered = actions.to_vec();
    ordered.sort_by(|(side_a, a), (side_b, b)| {
        speed(b).cmp(&speed(a)).then_with(|| side_a.cmp(side_b))
    });
    ordered
}

fn trigger_trap(board: &mut Board, piece_id: &str, commands: &mut Vec<AnimationCommand>) {
    let Some(position) = board.piece(piece_id).map(|p| p.position) else {
        return;
    };
    let Some(index) = board.trap_index_at(position) else {
        return;
    };

    if let Some(piece) = board.piece_mut(piece_id) {
        piece.take_hit();
        debug!(piece_id, %position, hp = piece.hp, "trap triggered");
    }
    commands.push(AnimationCommand::TrapTriggered {
        card_id: piece_id.to_string(),
        position,
    });
    board.remove_trap(index);
}

/// Pieces standing in an enemy's front cell lose one stealth per facing enemy.
fn apply_proximity_decay(board: &mut Board) {
    let fronts: Vec<(Side, Position)> = board.pieces().map(|p| (p.side, p.front_cell())).collect();

    for piece in board.pieces_mut() {
        let facing = fronts
            .iter()
            .filter(|(side, front)| *side != piece.side && *front == piece.position)
            .count() as i32;
        if facing > 0 {
            piece.reduce_stealth(facing);
        }
    }
}

fn detect_outcome(board: &mut Board) -> Option<Outcome> {
    let attacker_alive = board.living_count(Side::Attacker);
    let defender_alive = board.living_count(Side::Defender);

    let outcome = match (attacker_alive, defender_alive) {
        (0, 0) => Outcome::Draw,
        (0, _) => Outcome::Winner(Side::Defender),
        (_, 0) => Outcome::Winner(Side::Attacker),
        _ => return None,
    };
    board.set_game_over();
    Some(outcome)
}
