// Domain-level pieces, traps and the grid they live on.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_WIDTH: i32 = 3;
pub const BOARD_HEIGHT: i32 = 7;

/// One of the two match participants.
///
/// Wire and storage names follow the original room roles: the attacker hosts, the defender joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "host")]
    Attacker,
    #[serde(rename = "guest")]
    Defender,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Attacker, Side::Defender];

    pub fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }

    /// Row the side's roster spawns on.
    pub fn start_row(self) -> i32 {
        match self {
            Side::Attacker => BOARD_HEIGHT - 1,
            Side::Defender => 0,
        }
    }

    /// Row delta pointing toward the opposing start row.
    pub fn forward(self) -> i32 {
        match self {
            Side::Attacker => -1,
            Side::Defender => 1,
        }
    }

    pub fn id_prefix(self) -> &'static str {
        match self {
            Side::Attacker => "host",
            Side::Defender => "guest",
        }
    }

    /// Infers the owning side from a piece id such as `host_1`.
    pub fn from_piece_id(id: &str) -> Side {
        if id.starts_with(Side::Attacker.id_prefix()) {
            Side::Attacker
        } else {
            Side::Defender
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id_prefix())
    }
}

/// Grid cell as `(col, row)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub col: i32,
    pub row: i32,
}

impl Position {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn in_bounds(self) -> bool {
        (0..BOARD_WIDTH).contains(&self.col) && (0..BOARD_HEIGHT).contains(&self.row)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

/// A card on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub id: String,
    pub side: Side,
    pub position: Position,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub attack_range: i32,
    pub speed: i32,
    pub stealth: i32,
    /// Stored and round-tripped; no rule regenerates stealth yet.
    pub stealth_regeneration: i32,
}

impl Piece {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_visible_to(&self, viewer: Side) -> bool {
        self.side == viewer || self.stealth <= 0
    }

    /// Cell directly ahead of this piece, toward the opposing start row.
    pub fn front_cell(&self) -> Position {
        Position::new(self.position.col, self.position.row + self.side.forward())
    }

    pub fn reduce_stealth(&mut self, amount: i32) {
        self.stealth = (self.stealth - amount).max(0);
    }

    /// One point of damage, which also strips one point of stealth.
    pub fn take_hit(&mut self) {
        self.hp = (self.hp - 1).max(0);
        self.reduce_stealth(1);
    }
}

/// Unowned one-shot marker; fires on the first piece that enters its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trap {
    #[serde(flatten)]
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(side: Side, stealth: i32) -> Piece {
        Piece {
            id: format!("{}_0", side.id_prefix()),
            side,
            position: Position::new(1, 3),
            hp: 3,
            max_hp: 3,
            attack: 1,
            attack_range: 1,
            speed: 2,
            stealth,
            stealth_regeneration: 0,
        }
    }

    #[test]
    fn own_pieces_are_visible_regardless_of_stealth() {
        for stealth in [0, 1, 3, 50] {
            assert!(piece(Side::Attacker, stealth).is_visible_to(Side::Attacker));
            assert!(piece(Side::Defender, stealth).is_visible_to(Side::Defender));
        }
    }

    #[test]
    fn enemy_pieces_are_visible_only_without_stealth() {
        assert!(piece(Side::Attacker, 0).is_visible_to(Side::Defender));
        assert!(!piece(Side::Attacker, 1).is_visible_to(Side::Defender));
        assert!(!piece(Side::Defender, 3).is_visible_to(Side::Attacker));
    }

    #[test]
    fn front_cell_points_toward_the_opposing_start_row() {
        assert_eq!(piece(Side::Attacker, 0).front_cell(), Position::new(1, 2));
        assert_eq!(piece(Side::Defender, 0).front_cell(), Position::new(1, 4));
    }

    #[test]
    fn take_hit_floors_stealth_at_zero() {
        let mut p = piece(Side::Defender, 0);
        p.take_hit();
        assert_eq!(p.hp, 2);
        assert_eq!(p.stealth, 0);
    }

    #[test]
    fn side_is_inferred_from_id_prefix() {
        assert_eq!(Side::from_piece_id("host_2"), Side::Attacker);
        assert_eq!(Side::from_piece_id("guest_0"), Side::Defender);
        assert_eq!(Side::from_piece_id("mystery"), Side::Defender);
    }

    #[test]
    fn bounds_cover_three_columns_and_seven_rows() {
        assert!(Position::new(0, 0).in_bounds());
        assert!(Position::new(2, 6).in_bounds());
        assert!(!Position::new(3, 0).in_bounds());
        assert!(!Position::new(0, 7).in_bounds());
        assert!(!Position::new(-1, 2).in_bounds());
    }
}
