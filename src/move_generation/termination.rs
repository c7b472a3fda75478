//! End-of-game detection for a position.

use serde::{Deserialize, Serialize};

use crate::game_state::chess_rules::FIFTY_MOVE_HALFMOVES;
use crate::game_state::{chess_types::*, position::Position};
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_move_generator::has_any_legal_move;

/// Why a position ends the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The side to move is checkmated.
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
}

/// Side to move is in check and has no legal move.
pub fn is_checkmate(position: &Position) -> bool {
    is_king_in_check(position, position.side_to_move) && !has_any_legal_move(position)
}

/// Side to move is not in check and has no legal move.
pub fn is_stalemate(position: &Position) -> bool {
    !is_king_in_check(position, position.side_to_move) && !has_any_legal_move(position)
}

/// Bare kings, or one side holding a single bishop or knight against a bare
/// king. Anything else (including minor piece against minor piece) counts as
/// sufficient.
pub fn is_insufficient_material(position: &Position) -> bool {
    let mut minors = 0usize;

    for (_, piece) in position.occupied_squares() {
        match piece.kind {
            PieceKind::King => {}
            kind if kind.is_minor() => minors += 1,
            _ => return false,
        }
    }

    minors <= 1
}

pub fn is_fifty_move_rule(position: &Position) -> bool {
    position.halfmove_clock >= FIFTY_MOVE_HALFMOVES
}

/// First terminal condition that holds, checked as checkmate, stalemate,
/// insufficient material, then the fifty-move rule.
pub fn evaluate_termination(position: &Position) -> Option<Termination> {
    let in_check = is_king_in_check(position, position.side_to_move);
    let can_move = has_any_legal_move(position);

    if !can_move {
        return Some(if in_check {
            Termination::Checkmate
        } else {
            Termination::Stalemate
        });
    }
    if is_insufficient_material(position) {
        return Some(Termination::InsufficientMaterial);
    }
    if is_fifty_move_rule(position) {
        return Some(Termination::FiftyMoveRule);
    }
    None
}
