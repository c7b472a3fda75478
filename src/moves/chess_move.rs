//! Move value and its textual record (`e2e4`, `e7e8q`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{IllegalMoveError, IllegalMoveReason};
use crate::game_state::chess_types::{PieceKind, Square};
use crate::utils::algebraic::{algebraic_to_square, square_to_algebraic};

/// Origin, destination and optional promotion kind.
///
/// A `ChessMove` says nothing about legality; `legal_move_validate` decides
/// that against a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChessMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl ChessMove {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    #[inline]
    pub const fn with_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Parses the move record: two coordinates plus an optional `q`/`r`/`b`/`n`.
    pub fn parse(text: &str) -> Result<Self, IllegalMoveError> {
        let malformed = || IllegalMoveError::new(IllegalMoveReason::MalformedMoveText, text);

        if !text.is_ascii() || (text.len() != 4 && text.len() != 5) {
            return Err(malformed());
        }

        let from = algebraic_to_square(&text[0..2]).ok_or_else(malformed)?;
        let to = algebraic_to_square(&text[2..4]).ok_or_else(malformed)?;
        let promotion = match text.as_bytes().get(4) {
            None => None,
            Some(b'q') => Some(PieceKind::Queen),
            Some(b'r') => Some(PieceKind::Rook),
            Some(b'b') => Some(PieceKind::Bishop),
            Some(b'n') => Some(PieceKind::Knight),
            Some(_) => return Err(malformed()),
        };

        Ok(Self { from, to, promotion })
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            square_to_algebraic(self.from),
            square_to_algebraic(self.to)
        )?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

impl FromStr for ChessMove {
    type Err = IllegalMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChessMove::parse(s)
    }
}

impl TryFrom<String> for ChessMove {
    type Error = IllegalMoveError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        ChessMove::parse(&text)
    }
}

impl From<ChessMove> for String {
    fn from(mv: ChessMove) -> Self {
        mv.to_string()
    }
}
