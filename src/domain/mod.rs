pub mod action;
pub mod board;
pub mod codec;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod resolver;
pub mod tuning;
pub mod visibility;

pub use action::{Action, ActionKind, AnimationCommand};
pub use board::Board;
pub use entities::{BOARD_HEIGHT, BOARD_WIDTH, Piece, Position, Side, Trap};
pub use errors::{DecodeError, ErrorKind, MatchError, ResolveError};
pub use resolver::{Outcome, PieceSnapshot, TurnResolution, TurnResolver};
pub use visibility::{BoardView, PieceView, view_for};
