// Domain-level errors and the closed set of kinds exposed to callers.

use crate::domain::entities::{Position, Side};
use serde::Serialize;
use thiserror::Error;

/// Stable, client-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Unauthenticated,
    NotFound,
    PermissionDenied,
    AlreadySubmitted,
    InvalidArgument,
    FailedPrecondition,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::NotFound => "not-found",
            ErrorKind::PermissionDenied => "permission-denied",
            ErrorKind::AlreadySubmitted => "already-submitted",
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::FailedPrecondition => "failed-precondition",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no action submitted for {0}")]
    MissingAction(Side),
    #[error("board is frozen after game over")]
    BoardFrozen,
}

/// Persisted documents that cannot be normalized into a board or match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("document is not an object")]
    NotAnObject,
    #[error("field `{0}` has the wrong shape")]
    InvalidField(&'static str),
    #[error("card `{0}` is not an object")]
    InvalidCard(String),
    #[error("no free cell left for card `{0}`")]
    NoFreeCell(String),
    #[error("malformed match document: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("caller must be authenticated")]
    Unauthenticated,
    #[error("match not found")]
    MatchNotFound,
    #[error("piece `{0}` not found")]
    UnknownPiece(String),
    #[error("user is not a player in this match")]
    NotParticipant,
    #[error("piece `{0}` does not belong to the submitting side")]
    NotYourPiece(String),
    #[error("action already submitted for this turn")]
    AlreadySubmitted,
    #[error("destination {0} is outside the board")]
    DestinationOutOfBounds(Position),
    #[error("match is already finished")]
    MatchFinished,
    #[error("previous turn is still animating")]
    TurnLocked,
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("auth service unavailable")]
    AuthUnavailable,
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::Unauthenticated => ErrorKind::Unauthenticated,
            MatchError::MatchNotFound | MatchError::UnknownPiece(_) => ErrorKind::NotFound,
            MatchError::NotParticipant | MatchError::NotYourPiece(_) => ErrorKind::PermissionDenied,
            MatchError::AlreadySubmitted => ErrorKind::AlreadySubmitted,
            MatchError::DestinationOutOfBounds(_) => ErrorKind::InvalidArgument,
            MatchError::MatchFinished | MatchError::TurnLocked => ErrorKind::FailedPrecondition,
            MatchError::Resolve(_)
            | MatchError::Decode(_)
            | MatchError::Storage(_)
            | MatchError::AuthUnavailable => ErrorKind::Internal,
        }
    }
}
