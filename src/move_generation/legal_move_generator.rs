//! Full legal move generation.
//!
//! Candidate destinations come from the attack tables (plus pawn pushes and
//! castling targets); every candidate then goes through the same validator
//! that judges submitted moves, so generation and validation cannot disagree.

use crate::game_state::chess_rules::CASTLING_SIDES;
use crate::game_state::{chess_types::*, position::Position};
use crate::move_generation::legal_move_apply::{apply_move_detailed, AppliedMove};
use crate::move_generation::legal_move_validate::is_legal_move;
use crate::moves::attacks::{king_attacks, knight_attacks, pawn_attacks, slider_rays};
use crate::moves::chess_move::ChessMove;

/// A legal move together with the position it produces.
#[derive(Debug, Clone)]
pub struct GeneratedMove {
    pub mv: ChessMove,
    pub applied: AppliedMove,
}

/// Every legal move for the side to move, ordered by origin then destination.
pub fn legal_moves(position: &Position) -> Vec<ChessMove> {
    let mut legal = Vec::with_capacity(64);
    for_each_legal_move(position, |mv| {
        legal.push(mv);
        true
    });
    legal
}

/// Legal moves with their resulting positions, used by perft and playouts.
pub fn generate_moves(position: &Position) -> Vec<GeneratedMove> {
    legal_moves(position)
        .into_iter()
        .filter_map(|mv| {
            apply_move_detailed(position, mv)
                .ok()
                .map(|applied| GeneratedMove { mv, applied })
        })
        .collect()
}

/// True iff the side to move has at least one legal move.
pub fn has_any_legal_move(position: &Position) -> bool {
    let mut found = false;
    for_each_legal_move(position, |_| {
        found = true;
        false
    });
    found
}

/// Feeds legal moves to `visit` until it returns false.
fn for_each_legal_move(position: &Position, mut visit: impl FnMut(ChessMove) -> bool) {
    let side = position.side_to_move;
    let mut own = position.occupancy_by_color[side.index()];

    while own != 0 {
        let from = own.trailing_zeros() as Square;
        own &= own - 1;

        let Some(piece) = position.piece_at(from) else {
            continue;
        };

        let mut targets = candidate_targets(piece, from) & !position.occupancy_by_color[side.index()];
        while targets != 0 {
            let to = targets.trailing_zeros() as Square;
            targets &= targets - 1;

            let promotes = piece.kind == PieceKind::Pawn && square_rank(to) == side.promotion_rank();
            if promotes {
                for kind in PieceKind::PROMOTIONS {
                    let mv = ChessMove::with_promotion(from, to, kind);
                    if is_legal_move(position, mv) && !visit(mv) {
                        return;
                    }
                }
            } else {
                let mv = ChessMove::new(from, to);
                if is_legal_move(position, mv) && !visit(mv) {
                    return;
                }
            }
        }
    }
}

/// Superset of the squares `piece` could legally reach from `from`.
fn candidate_targets(piece: Piece, from: Square) -> u64 {
    match piece.kind {
        PieceKind::Pawn => pawn_attacks(piece.color, from) | pawn_pushes(piece.color, from),
        PieceKind::Knight => knight_attacks(from),
        PieceKind::King => CASTLING_SIDES
            .iter()
            .filter(|side| side.king_from == from)
            .fold(king_attacks(from), |acc, side| acc | (1u64 << side.king_to)),
        PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => slider_rays(piece.kind, from),
    }
}

fn pawn_pushes(color: Color, from: Square) -> u64 {
    let file = square_file(from);
    let rank = square_rank(from);
    match color {
        Color::White if rank < 7 => {
            let single = 1u64 << make_square(file, rank + 1);
            if rank == color.pawn_start_rank() {
                single | (1u64 << make_square(file, rank + 2))
            } else {
                single
            }
        }
        Color::Black if rank > 0 => {
            let single = 1u64 << make_square(file, rank - 1);
            if rank == color.pawn_start_rank() {
                single | (1u64 << make_square(file, rank - 2))
            } else {
                single
            }
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::{has_any_legal_move, legal_moves};
    use crate::game_state::position::Position;

    fn texts(record: &str) -> Vec<String> {
        let position = Position::from_fen(record).expect("record parses");
        legal_moves(&position).iter().map(|mv| mv.to_string()).collect()
    }

    #[test]
    fn start_position_has_twenty_moves() {
        let moves = legal_moves(&Position::new_game());
        assert_eq!(moves.len(), 20);
        assert!(moves.iter().any(|mv| mv.to_string() == "g1f3"));
    }

    #[test]
    fn promotions_expand_to_four_kinds() {
        let moves = texts("4k3/P7/8/8/8/8/8/K7 w - - 0 1");
        for text in ["a7a8q", "a7a8r", "a7a8b", "a7a8n"] {
            assert!(moves.iter().any(|mv| mv == text), "{text}");
        }
        assert!(!moves.iter().any(|mv| mv == "a7a8"));
    }

    #[test]
    fn castling_appears_when_available() {
        let moves = texts("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(moves.iter().any(|mv| mv == "e1g1"));
        assert!(moves.iter().any(|mv| mv == "e1c1"));
        assert_eq!(moves.len(), 26);
    }

    #[test]
    fn stalemated_side_has_no_moves() {
        let position = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").expect("record parses");
        assert!(!has_any_legal_move(&position));
        assert!(has_any_legal_move(&Position::new_game()));
    }
}
