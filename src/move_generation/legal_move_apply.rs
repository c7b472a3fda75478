use crate::errors::{IllegalMoveError, IllegalMoveReason};
use crate::game_state::chess_rules::{castling_rights_of, castling_side_for, rook_home_right};
use crate::game_state::{chess_types::*, position::Position};
use crate::moves::chess_move::ChessMove;

/// Result of applying a move: the new position plus what it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub position: Position,
    pub moved: Piece,
    pub captured: Option<Piece>,
}

/// Applies `mv` to a copy of `position` and returns the copy.
///
/// The move is assumed to have passed validation; only a missing origin piece
/// is reported.
pub fn apply_move(position: &Position, mv: ChessMove) -> Result<Position, IllegalMoveError> {
    apply_move_detailed(position, mv).map(|applied| applied.position)
}

pub fn apply_move_detailed(position: &Position, mv: ChessMove) -> Result<AppliedMove, IllegalMoveError> {
    let moved = position
        .piece_at(mv.from)
        .ok_or_else(|| IllegalMoveError::new(IllegalMoveReason::NoPieceAtOrigin, mv.to_string()))?;
    let mover = moved.color;

    let mut next = position.clone();

    // Remove moved piece from origin and whatever stands on the destination.
    next.clear_square(mv.from);
    let mut captured = next.clear_square(mv.to);

    // En passant: a diagonal pawn step onto an empty square takes the pawn
    // beside the origin.
    if moved.kind == PieceKind::Pawn
        && captured.is_none()
        && square_file(mv.from) != square_file(mv.to)
    {
        captured = next.clear_square(make_square(square_file(mv.to), square_rank(mv.from)));
    }

    // Place moved/promoted piece on destination.
    let placed_kind = match (moved.kind, mv.promotion) {
        (PieceKind::Pawn, Some(promotion)) => promotion,
        (kind, _) => kind,
    };
    next.put_piece(mv.to, Piece::new(mover, placed_kind));

    // Castling rook move.
    if moved.kind == PieceKind::King {
        if let Some(side) = castling_side_for(mover, mv.from, mv.to) {
            if let Some(rook) = next.clear_square(side.rook_from) {
                next.put_piece(side.rook_to, rook);
            }
        }
    }

    update_castling_rights(&mut next, moved, mv, captured.is_some());

    next.en_passant_file = if moved.kind == PieceKind::Pawn && square_rank(mv.from).abs_diff(square_rank(mv.to)) == 2 {
        Some(square_file(mv.from))
    } else {
        None
    };

    if moved.kind == PieceKind::Pawn || captured.is_some() {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
    }
    if mover == Color::Black {
        next.fullmove_number = next.fullmove_number.saturating_add(1);
    }

    next.side_to_move = mover.opposite();

    Ok(AppliedMove {
        position: next,
        moved,
        captured,
    })
}

fn update_castling_rights(position: &mut Position, moved: Piece, mv: ChessMove, is_capture: bool) {
    if moved.kind == PieceKind::King {
        position.castling_rights &= !castling_rights_of(moved.color);
    }

    if moved.kind == PieceKind::Rook {
        if let Some(right) = rook_home_right(mv.from) {
            position.castling_rights &= !right;
        }
    }

    // Capturing a rook on its home square also removes the right.
    if is_capture {
        if let Some(right) = rook_home_right(mv.to) {
            position.castling_rights &= !right;
        }
    }
}
