//! Single-move legality.
//!
//! Validation runs in three stages: ownership (origin piece, side to move,
//! destination not friendly), piece geometry including the promotion gate and
//! castling conditions, and finally a simulation on a cloned position that
//! rejects any move leaving the mover's king attacked.

use crate::errors::{IllegalMoveError, IllegalMoveReason};
use crate::game_state::chess_rules::{castling_side_for, CastlingSide};
use crate::game_state::{chess_types::*, position::Position};
use crate::move_generation::legal_move_apply::apply_move;
use crate::move_generation::legal_move_checks::{is_king_in_check, is_square_attacked};
use crate::moves::attacks::{king_attacks, knight_attacks, pawn_attacks, slider_attacks, slider_rays};
use crate::moves::chess_move::ChessMove;

type Verdict = Result<(), IllegalMoveReason>;

/// Checks `mv` against `position`; `Ok(())` means the move is legal.
pub fn validate_move(position: &Position, mv: ChessMove) -> Result<(), IllegalMoveError> {
    legality(position, mv).map_err(|reason| IllegalMoveError::new(reason, mv.to_string()))
}

/// Same as [`validate_move`] without building an error value.
#[inline]
pub fn is_legal_move(position: &Position, mv: ChessMove) -> bool {
    legality(position, mv).is_ok()
}

fn legality(position: &Position, mv: ChessMove) -> Verdict {
    let side = position.side_to_move;
    let piece = position
        .piece_at(mv.from)
        .ok_or(IllegalMoveReason::NoPieceAtOrigin)?;

    if piece.color != side {
        return Err(IllegalMoveReason::WrongSide);
    }
    if mv.from == mv.to {
        return Err(IllegalMoveReason::InvalidPieceMovement);
    }
    if matches!(position.piece_at(mv.to), Some(target) if target.color == side) {
        return Err(IllegalMoveReason::OccupiedByOwnPiece);
    }

    promotion_gate(piece, mv)?;
    piece_movement(position, piece, mv)?;

    let next = apply_move(position, mv).map_err(|err| err.reason)?;
    if is_king_in_check(&next, side) {
        return Err(IllegalMoveReason::LeavesKingInCheck);
    }

    Ok(())
}

/// A promotion letter is required iff a pawn reaches its last rank.
fn promotion_gate(piece: Piece, mv: ChessMove) -> Verdict {
    let reaches_last_rank =
        piece.kind == PieceKind::Pawn && square_rank(mv.to) == piece.color.promotion_rank();

    match (reaches_last_rank, mv.promotion) {
        (true, None) => Err(IllegalMoveReason::MissingPromotion),
        (true, Some(kind)) if !kind.is_promotion_target() => Err(IllegalMoveReason::InvalidPromotionPiece),
        (false, Some(_)) => Err(IllegalMoveReason::InvalidPromotionPiece),
        _ => Ok(()),
    }
}

fn piece_movement(position: &Position, piece: Piece, mv: ChessMove) -> Verdict {
    let to_mask = 1u64 << mv.to;

    match piece.kind {
        PieceKind::Pawn => pawn_movement(position, piece.color, mv),
        PieceKind::Knight => {
            if knight_attacks(mv.from) & to_mask != 0 {
                Ok(())
            } else {
                Err(IllegalMoveReason::InvalidPieceMovement)
            }
        }
        PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
            if slider_rays(piece.kind, mv.from) & to_mask == 0 {
                Err(IllegalMoveReason::InvalidPieceMovement)
            } else if slider_attacks(piece.kind, mv.from, position.occupancy_all) & to_mask == 0 {
                Err(IllegalMoveReason::BlockedPath)
            } else {
                Ok(())
            }
        }
        PieceKind::King => {
            if king_attacks(mv.from) & to_mask != 0 {
                return Ok(());
            }
            match castling_side_for(piece.color, mv.from, mv.to) {
                Some(side) => castling_conditions(position, piece.color, side),
                None => Err(IllegalMoveReason::InvalidPieceMovement),
            }
        }
    }
}

fn pawn_movement(position: &Position, color: Color, mv: ChessMove) -> Verdict {
    let from_file = square_file(mv.from);
    let from_rank = square_rank(mv.from) as i8;
    let to_file = square_file(mv.to);
    let to_rank = square_rank(mv.to) as i8;
    let forward: i8 = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    let occupied = |square: Square| position.occupancy_all & (1u64 << square) != 0;

    if from_file == to_file {
        let rank_delta = to_rank - from_rank;
        if rank_delta == forward {
            return if occupied(mv.to) {
                Err(IllegalMoveReason::BlockedPath)
            } else {
                Ok(())
            };
        }
        if rank_delta == 2 * forward && from_rank == color.pawn_start_rank() as i8 {
            let skipped = make_square(from_file, (from_rank + forward) as u8);
            return if occupied(skipped) || occupied(mv.to) {
                Err(IllegalMoveReason::BlockedPath)
            } else {
                Ok(())
            };
        }
        return Err(IllegalMoveReason::InvalidPieceMovement);
    }

    if pawn_attacks(color, mv.from) & (1u64 << mv.to) == 0 {
        return Err(IllegalMoveReason::InvalidPieceMovement);
    }

    // Diagonal step: an ordinary capture, or en passant onto the recorded file.
    if occupied(mv.to) {
        return Ok(());
    }
    let passed_pawn = make_square(to_file, from_rank as u8);
    let en_passant = position.en_passant_file == Some(to_file)
        && to_rank == color.en_passant_capture_rank() as i8
        && position.piece_at(passed_pawn) == Some(Piece::new(color.opposite(), PieceKind::Pawn));
    if en_passant {
        Ok(())
    } else {
        Err(IllegalMoveReason::InvalidPieceMovement)
    }
}

fn castling_conditions(position: &Position, color: Color, side: &CastlingSide) -> Verdict {
    if !position.has_castling_right(side.right)
        || position.piece_at(side.rook_from) != Some(Piece::new(color, PieceKind::Rook))
    {
        return Err(IllegalMoveReason::CastlingNotAllowed);
    }

    if side
        .must_be_empty
        .iter()
        .any(|&square| position.occupancy_all & (1u64 << square) != 0)
    {
        return Err(IllegalMoveReason::BlockedPath);
    }

    let enemy = color.opposite();
    if side
        .king_path
        .iter()
        .any(|&square| is_square_attacked(position, square, enemy))
    {
        return Err(IllegalMoveReason::CastlingThroughCheck);
    }

    Ok(())
}
