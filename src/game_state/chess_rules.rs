//! Canonical chess-rule constants.
//!
//! Static rule literals: the standard starting record, home squares used by
//! castling and castling-right bookkeeping, and draw thresholds.

use crate::game_state::chess_types::*;

/// Standard chess starting position in the six-field position record.
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Halfmove clock value at which the fifty-move rule applies.
pub const FIFTY_MOVE_HALFMOVES: u16 = 100;

pub const WHITE_KING_HOME: Square = 4;
pub const BLACK_KING_HOME: Square = 60;

/// One castling option: which right it needs and which squares it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingSide {
    pub right: CastlingRights,
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    /// Squares strictly between king and rook that must be empty.
    pub must_be_empty: &'static [Square],
    /// Squares the king stands on or crosses; none may be attacked.
    pub king_path: &'static [Square],
}

pub const CASTLING_SIDES: [CastlingSide; 4] = [
    CastlingSide {
        right: CASTLE_WHITE_KINGSIDE,
        king_from: 4,
        king_to: 6,
        rook_from: 7,
        rook_to: 5,
        must_be_empty: &[5, 6],
        king_path: &[4, 5, 6],
    },
    CastlingSide {
        right: CASTLE_WHITE_QUEENSIDE,
        king_from: 4,
        king_to: 2,
        rook_from: 0,
        rook_to: 3,
        must_be_empty: &[1, 2, 3],
        king_path: &[4, 3, 2],
    },
    CastlingSide {
        right: CASTLE_BLACK_KINGSIDE,
        king_from: 60,
        king_to: 62,
        rook_from: 63,
        rook_to: 61,
        must_be_empty: &[61, 62],
        king_path: &[60, 61, 62],
    },
    CastlingSide {
        right: CASTLE_BLACK_QUEENSIDE,
        king_from: 60,
        king_to: 58,
        rook_from: 56,
        rook_to: 59,
        must_be_empty: &[57, 58, 59],
        king_path: &[60, 59, 58],
    },
];

/// Castling option matching a king move, if the move is a castling pattern.
pub fn castling_side_for(color: Color, king_from: Square, king_to: Square) -> Option<&'static CastlingSide> {
    CASTLING_SIDES.iter().find(|side| {
        side.king_from == king_from && side.king_to == king_to && castling_color(side.right) == color
    })
}

/// Castling right revoked when `square` is vacated or captured on.
pub const fn rook_home_right(square: Square) -> Option<CastlingRights> {
    match square {
        0 => Some(CASTLE_WHITE_QUEENSIDE),
        7 => Some(CASTLE_WHITE_KINGSIDE),
        56 => Some(CASTLE_BLACK_QUEENSIDE),
        63 => Some(CASTLE_BLACK_KINGSIDE),
        _ => None,
    }
}

pub const fn castling_rights_of(color: Color) -> CastlingRights {
    match color {
        Color::White => CASTLE_WHITE_KINGSIDE | CASTLE_WHITE_QUEENSIDE,
        Color::Black => CASTLE_BLACK_KINGSIDE | CASTLE_BLACK_QUEENSIDE,
    }
}

const fn castling_color(right: CastlingRights) -> Color {
    if right & (CASTLE_WHITE_KINGSIDE | CASTLE_WHITE_QUEENSIDE) != 0 {
        Color::White
    } else {
        Color::Black
    }
}
