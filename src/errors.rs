//! Errors used throughout the arena.
//!
//! Engine-level failures are split by how a caller recovers from them:
//!
//! - [`ParseError`]: a position record is malformed. Unrecoverable for that
//!   input; the caller must reject it.
//! - [`IllegalMoveError`]: a submitted move is not legal (or not even well
//!   formed). Recoverable; report the reason to the submitting player.
//! - [`IllegalStateError`]: the match cannot accept the action right now
//!   (finished, not your turn, draw-offer bookkeeping). Recoverable.
//! - [`NotFoundError`]: an unknown match, rating or queued player.
//!
//! [`ArenaError`] unifies them for the service layer. No variant is used for
//! normal control flow, and a lifecycle operation that returns any of them has
//! not written anything.

use std::fmt;

use thiserror::Error;

use crate::clock::time_control::GameType;
use crate::matches::match_record::{MatchId, PlayerId};

/// Malformed position record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The record does not have exactly six space-separated fields.
    #[error("position record must have 6 fields, found {0}")]
    FieldCount(usize),

    /// The piece-placement field is malformed (rank count, file overflow,
    /// unknown piece letter, bad digit).
    #[error("invalid piece placement: {0}")]
    InvalidPlacement(String),

    #[error("invalid side-to-move field: {0}")]
    InvalidSideToMove(String),

    #[error("invalid castling rights character '{0}'")]
    InvalidCastling(char),

    /// The en-passant field is neither `-` nor a target square on the rank
    /// implied by the side to move.
    #[error("invalid en-passant field: {0}")]
    InvalidEnPassant(String),

    #[error("invalid {field}: {value}")]
    InvalidCounter { field: &'static str, value: String },
}

/// Why a move was refused by the position engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IllegalMoveReason {
    /// The origin piece belongs to the side not on move.
    WrongSide,
    /// A square between origin and destination is occupied (sliders, pawn
    /// pushes, castling).
    BlockedPath,
    /// The move would leave the mover's own king attacked.
    LeavesKingInCheck,
    /// A pawn reaches the last rank without a promotion letter.
    MissingPromotion,
    /// A promotion letter was given where none is allowed, or names a kind a
    /// pawn cannot become.
    InvalidPromotionPiece,
    /// The move text does not follow the move-record grammar.
    MalformedMoveText,
    /// The origin square is empty.
    NoPieceAtOrigin,
    /// The destination holds a piece of the mover's color.
    OccupiedByOwnPiece,
    /// The piece cannot move along that geometry.
    InvalidPieceMovement,
    /// The castling right is gone or its rook is missing.
    CastlingNotAllowed,
    /// The king starts on, crosses or lands on an attacked square.
    CastlingThroughCheck,
}

impl IllegalMoveReason {
    /// Stable kebab-case tag reported to clients.
    pub const fn tag(self) -> &'static str {
        match self {
            IllegalMoveReason::WrongSide => "wrong-side",
            IllegalMoveReason::BlockedPath => "blocked-path",
            IllegalMoveReason::LeavesKingInCheck => "leaves-king-in-check",
            IllegalMoveReason::MissingPromotion => "missing-promotion",
            IllegalMoveReason::InvalidPromotionPiece => "invalid-promotion-piece",
            IllegalMoveReason::MalformedMoveText => "malformed-move-text",
            IllegalMoveReason::NoPieceAtOrigin => "no-piece-at-origin",
            IllegalMoveReason::OccupiedByOwnPiece => "occupied-by-own-piece",
            IllegalMoveReason::InvalidPieceMovement => "invalid-piece-movement",
            IllegalMoveReason::CastlingNotAllowed => "castling-not-allowed",
            IllegalMoveReason::CastlingThroughCheck => "castling-through-check",
        }
    }
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A refused move together with the text it was submitted as.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal move '{text}': {reason}")]
pub struct IllegalMoveError {
    pub reason: IllegalMoveReason,
    pub text: String,
}

impl IllegalMoveError {
    pub fn new(reason: IllegalMoveReason, text: impl Into<String>) -> Self {
        Self {
            reason,
            text: text.into(),
        }
    }
}

/// Why a lifecycle operation cannot run against the match as it stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IllegalStateReason {
    NotOngoing,
    TurnViolation,
    DrawOfferConflict,
    SelfAccept,
    NoOfferPending,
    /// The acting player is neither player of the match.
    NotAParticipant,
    /// Both seats of a new match name the same player.
    SelfPairing,
}

impl IllegalStateReason {
    pub const fn tag(self) -> &'static str {
        match self {
            IllegalStateReason::NotOngoing => "not-ongoing",
            IllegalStateReason::TurnViolation => "turn-violation",
            IllegalStateReason::DrawOfferConflict => "draw-offer-conflict",
            IllegalStateReason::SelfAccept => "self-accept",
            IllegalStateReason::NoOfferPending => "no-offer-pending",
            IllegalStateReason::NotAParticipant => "not-a-participant",
            IllegalStateReason::SelfPairing => "self-pairing",
        }
    }
}

impl fmt::Display for IllegalStateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal state: {reason}")]
pub struct IllegalStateError {
    pub reason: IllegalStateReason,
}

impl From<IllegalStateReason> for IllegalStateError {
    fn from(reason: IllegalStateReason) -> Self {
        Self { reason }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("match {0} not found")]
    Match(MatchId),

    #[error("no {game_type} rating recorded for player {player}")]
    Rating { player: PlayerId, game_type: GameType },

    #[error("player {0} is not queued")]
    QueuedPlayer(PlayerId),
}

/// Unified error type for the service layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArenaError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    IllegalMove(#[from] IllegalMoveError),

    #[error(transparent)]
    IllegalState(#[from] IllegalStateError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A storage collaborator failed; nothing was committed.
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A worker thread died before reporting its result.
    #[error("worker failed: {0}")]
    Worker(String),
}

impl From<IllegalStateReason> for ArenaError {
    fn from(reason: IllegalStateReason) -> Self {
        ArenaError::IllegalState(reason.into())
    }
}

impl ArenaError {
    /// The state-error reason, when this is one.
    pub fn state_reason(&self) -> Option<IllegalStateReason> {
        match self {
            ArenaError::IllegalState(err) => Some(err.reason),
            _ => None,
        }
    }

    /// The illegal-move reason, when this is one.
    pub fn move_reason(&self) -> Option<IllegalMoveReason> {
        match self {
            ArenaError::IllegalMove(err) => Some(err.reason),
            _ => None,
        }
    }
}

pub type ArenaResult<T> = Result<T, ArenaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_render_as_kebab_tags() {
        let err = IllegalMoveError::new(IllegalMoveReason::LeavesKingInCheck, "e1e2");
        assert_eq!(err.to_string(), "illegal move 'e1e2': leaves-king-in-check");

        let state: ArenaError = IllegalStateReason::SelfAccept.into();
        assert_eq!(state.to_string(), "illegal state: self-accept");
        assert_eq!(state.state_reason(), Some(IllegalStateReason::SelfAccept));
        assert_eq!(state.move_reason(), None);
    }
}
