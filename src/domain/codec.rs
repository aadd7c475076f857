// Persisted board document <-> Board.
//
// Decoding is lenient: stored documents written by older clients may carry
// strings for numbers, fractional or out-of-range coordinates, or no owner.
// Each correction is logged and the card is kept. Living cards that land on
// an already occupied cell are moved to the first free cell from their side's
// start row forward.

use crate::domain::board::Board;
use crate::domain::entities::{BOARD_HEIGHT, BOARD_WIDTH, Piece, Position, Side, Trap};
use crate::domain::errors::DecodeError;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use tracing::{debug, warn};

const DEFAULT_ATTACK: i32 = 1;
const DEFAULT_ATTACK_RANGE: i32 = 1;

/// Builds a board from a stored `{cards, traps, gameOver}` document.
pub fn decode_board(doc: &Value) -> Result<Board, DecodeError> {
    let root = doc.as_object().ok_or(DecodeError::NotAnObject)?;

    let mut pieces = Vec::new();
    match root.get("cards") {
        None | Some(Value::Null) => warn!("board document has no cards"),
        Some(Value::Object(cards)) => {
            for (key, card) in cards {
                let fields = card
                    .as_object()
                    .ok_or_else(|| DecodeError::InvalidCard(key.clone()))?;
                pieces.push(decode_piece(key, fields));
            }
        }
        Some(_) => return Err(DecodeError::InvalidField("cards")),
    }
    relocate_overlaps(&mut pieces)?;

    let traps = match root.get("traps") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => decode_traps(entries),
        Some(_) => return Err(DecodeError::InvalidField("traps")),
    };

    let game_over = match root.get("gameOver") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err(DecodeError::InvalidField("gameOver")),
    };

    Ok(Board::new(pieces, traps, game_over))
}

/// Inverse of [`decode_board`]. Every card is written with `isHidden: false`;
/// redaction is applied per viewer at read time, never in storage.
pub fn encode_board(board: &Board) -> Value {
    let cards: Map<String, Value> = board
        .pieces()
        .map(|piece| (piece.id.clone(), encode_piece(piece)))
        .collect();
    let traps: Vec<Value> = board
        .traps()
        .iter()
        .map(|trap| json!({ "col": trap.position.col, "row": trap.position.row }))
        .collect();

    json!({
        "cards": cards,
        "traps": traps,
        "gameOver": board.game_over(),
    })
}

fn encode_piece(piece: &Piece) -> Value {
    json!({
        "id": piece.id,
        "owner": piece.side,
        "row": piece.position.row,
        "col": piece.position.col,
        "hp": piece.hp,
        "maxHp": piece.max_hp,
        "atk": piece.attack,
        "atkRange": piece.attack_range,
        "speed": piece.speed,
        "stealth": piece.stealth,
        "stealthRegeneration": piece.stealth_regeneration,
        "isHidden": false,
    })
}

fn decode_piece(key: &str, fields: &Map<String, Value>) -> Piece {
    let id = match fields.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => key.to_string(),
    };

    let side = match fields.get("owner").and_then(Value::as_str) {
        Some("host") => Side::Attacker,
        Some("guest") => Side::Defender,
        other => {
            let inferred = Side::from_piece_id(&id);
            if let Some(owner) = other {
                warn!(piece_id = %id, owner, side = %inferred, "unknown owner; inferred from id");
            }
            inferred
        }
    };

    let position = decode_position(&id, side, fields);

    let hp = int_field(fields, "hp").unwrap_or_else(|| {
        warn!(piece_id = %id, "missing hp; piece treated as fallen");
        0
    });
    let max_hp = int_field(fields, "maxHp").unwrap_or(hp).max(0);
    let clamped_hp = hp.clamp(0, max_hp);
    if clamped_hp != hp {
        warn!(piece_id = %id, hp, max_hp, "hp clamped to [0, maxHp]");
    }

    let stealth = int_field(fields, "stealth").unwrap_or(0);
    if stealth < 0 {
        warn!(piece_id = %id, stealth, "negative stealth raised to 0");
    }

    Piece {
        position,
        side,
        hp: clamped_hp,
        max_hp,
        attack: int_field(fields, "atk").unwrap_or(DEFAULT_ATTACK),
        attack_range: int_field(fields, "atkRange").unwrap_or(DEFAULT_ATTACK_RANGE),
        speed: int_field(fields, "speed").unwrap_or(0),
        stealth: stealth.max(0),
        stealth_regeneration: int_field(fields, "stealthRegeneration").unwrap_or(0),
        id,
    }
}

fn decode_position(id: &str, side: Side, fields: &Map<String, Value>) -> Position {
    let raw_col = number_field(fields, "col");
    let raw_row = number_field(fields, "row");

    let col = clamp_axis(raw_col.unwrap_or_else(|| f64::from(default_column(id))), BOARD_WIDTH);
    let row = clamp_axis(raw_row.unwrap_or_else(|| f64::from(side.start_row())), BOARD_HEIGHT);
    let position = Position::new(col, row);

    let exact = raw_col == Some(f64::from(col)) && raw_row == Some(f64::from(row));
    if exact {
        debug!(piece_id = %id, %position, "card position decoded");
    } else {
        warn!(
            piece_id = %id,
            col = ?fields.get("col"),
            row = ?fields.get("row"),
            %position,
            "card position corrected"
        );
    }

    position
}

// Column encoded in the id suffix (`host_2` -> 2), when it lands on the board.
fn default_column(id: &str) -> i32 {
    id.split('_')
        .nth(1)
        .and_then(|suffix| suffix.parse::<i32>().ok())
        .filter(|col| (0..BOARD_WIDTH).contains(col))
        .unwrap_or(0)
}

fn clamp_axis(value: f64, len: i32) -> i32 {
    (value.floor() as i32).clamp(0, len - 1)
}

fn relocate_overlaps(pieces: &mut [Piece]) -> Result<(), DecodeError> {
    let mut taken: HashSet<Position> = HashSet::new();
    for piece in pieces.iter_mut().filter(|p| p.is_alive()) {
        if taken.insert(piece.position) {
            continue;
        }
        let free = free_cell(piece.side, &taken).ok_or_else(|| DecodeError::NoFreeCell(piece.id.clone()))?;
        warn!(piece_id = %piece.id, from = %piece.position, to = %free, "cell already occupied; card relocated");
        piece.position = free;
        taken.insert(free);
    }
    Ok(())
}

fn free_cell(side: Side, taken: &HashSet<Position>) -> Option<Position> {
    (0..BOARD_HEIGHT)
        .map(|step| side.start_row() + side.forward() * step)
        .flat_map(|row| (0..BOARD_WIDTH).map(move |col| Position::new(col, row)))
        .find(|cell| !taken.contains(cell))
}

fn decode_traps(entries: &[Value]) -> Vec<Trap> {
    let mut traps: Vec<Trap> = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(fields) = entry.as_object() else {
            warn!(?entry, "trap entry is not an object; skipped");
            continue;
        };
        let (Some(col), Some(row)) = (number_field(fields, "col"), number_field(fields, "row")) else {
            warn!(?entry, "trap entry has no usable coordinates; skipped");
            continue;
        };
        let position = Position::new(col.floor() as i32, row.floor() as i32);
        if !position.in_bounds() {
            warn!(%position, "trap outside the board; skipped");
            continue;
        }
        if traps.iter().any(|t| t.position == position) {
            warn!(%position, "duplicate trap dropped");
            continue;
        }
        traps.push(Trap { position });
    }
    traps
}

// Numbers and numeric strings both count; anything else is treated as absent.
fn number_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

fn int_field(fields: &Map<String, Value>, key: &str) -> Option<i32> {
    number_field(fields, key).map(|v| v.floor() as i32)
}
