use crate::game_state::{chess_types::*, position::Position};
use crate::moves::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};

/// True iff `color`'s king stands on a square attacked by the other color.
///
/// A side without a king is never in check.
#[inline]
pub fn is_king_in_check(position: &Position, color: Color) -> bool {
    let Some(king_sq) = position.king_square(color) else {
        return false;
    };
    is_square_attacked(position, king_sq, color.opposite())
}

/// True iff any piece of `attacker_color` attacks `square`.
///
/// Castling never attacks anything, and pawns attack only diagonally, so this
/// is a pure function of the board regardless of rights or side to move.
pub fn is_square_attacked(position: &Position, square: Square, attacker_color: Color) -> bool {
    let attacker = |kind: PieceKind| position.bitboard(attacker_color, kind);

    // A pawn of the attacking color attacks `square` iff a pawn of the
    // defending color on `square` would attack the pawn's square.
    if pawn_attacks(attacker_color.opposite(), square) & attacker(PieceKind::Pawn) != 0 {
        return true;
    }

    if knight_attacks(square) & attacker(PieceKind::Knight) != 0 {
        return true;
    }

    if king_attacks(square) & attacker(PieceKind::King) != 0 {
        return true;
    }

    let bishops_queens = attacker(PieceKind::Bishop) | attacker(PieceKind::Queen);
    if bishop_attacks(square, position.occupancy_all) & bishops_queens != 0 {
        return true;
    }

    let rooks_queens = attacker(PieceKind::Rook) | attacker(PieceKind::Queen);
    if rook_attacks(square, position.occupancy_all) & rooks_queens != 0 {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::{is_king_in_check, is_square_attacked};
    use crate::game_state::chess_types::Color;
    use crate::game_state::position::Position;

    #[test]
    fn start_position_has_no_checks() {
        let position = Position::new_game();
        assert!(!is_king_in_check(&position, Color::White));
        assert!(!is_king_in_check(&position, Color::Black));
        // e3 is covered by the d2 and f2 pawns.
        assert!(is_square_attacked(&position, 20, Color::White));
        assert!(!is_square_attacked(&position, 28, Color::White));
    }

    #[test]
    fn detects_each_attacker_kind() {
        let rook = Position::from_fen("4k3/8/8/8/8/8/8/4R1K1 b - - 0 1").expect("record parses");
        assert!(is_king_in_check(&rook, Color::Black));

        let blocked = Position::from_fen("4k3/4p3/8/8/8/8/8/4R1K1 b - - 0 1").expect("record parses");
        assert!(!is_king_in_check(&blocked, Color::Black));

        let bishop = Position::from_fen("4k3/8/8/1B6/8/8/8/6K1 b - - 0 1").expect("record parses");
        assert!(is_king_in_check(&bishop, Color::Black));

        let knight = Position::from_fen("4k3/8/3N4/8/8/8/8/6K1 b - - 0 1").expect("record parses");
        assert!(is_king_in_check(&knight, Color::Black));

        let pawn = Position::from_fen("4k3/3P4/8/8/8/8/8/6K1 b - - 0 1").expect("record parses");
        assert!(is_king_in_check(&pawn, Color::Black));

        let pawn_ahead = Position::from_fen("4k3/4P3/8/8/8/8/8/6K1 b - - 0 1").expect("record parses");
        assert!(!is_king_in_check(&pawn_ahead, Color::Black));

        let black_pawn = Position::from_fen("4k3/8/8/8/8/8/5p2/6K1 w - - 0 1").expect("record parses");
        assert!(is_king_in_check(&black_pawn, Color::White));
    }

    #[test]
    fn missing_king_is_never_in_check() {
        let position = Position::from_fen("8/8/8/8/8/8/8/R5K1 b - - 0 1").expect("record parses");
        assert!(!is_king_in_check(&position, Color::Black));
    }
}
