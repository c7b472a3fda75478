//! Core board state representation.
//!
//! `Position` is the central model for the engine. It stores piece bitboards,
//! occupancy caches, turn/state flags and clocks. Positions are plain values:
//! every move application produces a new one, so simulations work on clones
//! and never touch the live match state.

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;
use crate::game_state::chess_types::*;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position {
    // --- Bitboard representation ---
    // [color][piece_kind]
    pub pieces: [[u64; 6]; 2],

    // Occupancy caches.
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,

    // --- Side and state flags ---
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    /// File (`0..=7`) behind a pawn that just advanced two squares.
    pub en_passant_file: Option<u8>,

    // --- Clocks / move counters ---
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,

            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_file: None,

            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

impl Position {
    #[inline]
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Standard initial position: White to move, all castling rights.
    pub fn new_game() -> Self {
        let mut position = Self::new_empty();
        for (file, kind) in BACK_RANK.iter().copied().enumerate() {
            let file = file as u8;
            position.put_piece(make_square(file, 0), Piece::new(Color::White, kind));
            position.put_piece(make_square(file, 1), Piece::new(Color::White, PieceKind::Pawn));
            position.put_piece(make_square(file, 6), Piece::new(Color::Black, PieceKind::Pawn));
            position.put_piece(make_square(file, 7), Piece::new(Color::Black, kind));
        }
        position.castling_rights = CASTLE_ALL;
        position
    }

    #[inline]
    pub fn from_fen(fen: &str) -> Result<Self, ParseError> {
        parse_fen(fen)
    }

    #[inline]
    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let mask = 1u64 << square;
        if self.occupancy_all & mask == 0 {
            return None;
        }
        for color in [Color::White, Color::Black] {
            for kind in PieceKind::ALL {
                if self.pieces[color.index()][kind.index()] & mask != 0 {
                    return Some(Piece::new(color, kind));
                }
            }
        }
        None
    }

    /// Places `piece` on `square`, replacing whatever stood there.
    pub fn put_piece(&mut self, square: Square, piece: Piece) {
        self.clear_square(square);
        let mask = 1u64 << square;
        self.pieces[piece.color.index()][piece.kind.index()] |= mask;
        self.occupancy_by_color[piece.color.index()] |= mask;
        self.occupancy_all |= mask;
    }

    /// Removes and returns the piece on `square`, if any.
    pub fn clear_square(&mut self, square: Square) -> Option<Piece> {
        let removed = self.piece_at(square)?;
        let mask = !(1u64 << square);
        self.pieces[removed.color.index()][removed.kind.index()] &= mask;
        self.occupancy_by_color[removed.color.index()] &= mask;
        self.occupancy_all &= mask;
        Some(removed)
    }

    #[inline]
    pub fn bitboard(&self, color: Color, kind: PieceKind) -> u64 {
        self.pieces[color.index()][kind.index()]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let kings = self.bitboard(color, PieceKind::King);
        if kings == 0 {
            None
        } else {
            Some(kings.trailing_zeros() as Square)
        }
    }

    /// Target square implied by the recorded en-passant file.
    ///
    /// The rank follows from the side to move: the capturing pawn always lands
    /// on the sixth rank from its own side.
    #[inline]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_file
            .map(|file| make_square(file, self.side_to_move.en_passant_capture_rank()))
    }

    #[inline]
    pub fn has_castling_right(&self, right: CastlingRights) -> bool {
        self.castling_rights & right != 0
    }

    /// Iterates `(square, piece)` for every occupied square, a1 first.
    pub fn occupied_squares(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (0..64u8).filter_map(move |square| self.piece_at(square).map(|piece| (square, piece)))
    }
}

impl TryFrom<String> for Position {
    type Error = ParseError;

    fn try_from(record: String) -> Result<Self, Self::Error> {
        parse_fen(&record)
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        generate_fen(&position)
    }
}

impl std::str::FromStr for Position {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fen(s)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&generate_fen(self))
    }
}

#[cfg(test)]
mod tests {
    use super::Position;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::game_state::chess_types::{Color, Piece, PieceKind};

    #[test]
    fn new_game_matches_starting_record() {
        let position = Position::new_game();
        assert_eq!(position.to_fen(), STARTING_POSITION_FEN);
        assert_eq!(position, Position::from_fen(STARTING_POSITION_FEN).expect("start record parses"));
        assert_eq!(position.side_to_move(), Color::White);
    }

    #[test]
    fn put_and_clear_keep_occupancy_in_sync() {
        let mut position = Position::new_empty();
        position.put_piece(27, Piece::new(Color::Black, PieceKind::Queen));
        position.put_piece(27, Piece::new(Color::White, PieceKind::Knight));

        assert_eq!(position.piece_at(27), Some(Piece::new(Color::White, PieceKind::Knight)));
        assert_eq!(position.bitboard(Color::Black, PieceKind::Queen), 0);
        assert_eq!(position.occupancy_all.count_ones(), 1);

        assert_eq!(position.clear_square(27), Some(Piece::new(Color::White, PieceKind::Knight)));
        assert_eq!(position.occupancy_all, 0);
        assert_eq!(position.clear_square(27), None);
    }

    #[test]
    fn serde_uses_the_position_record() {
        let position = Position::new_game();
        let json = serde_json::to_string(&position).expect("position serializes");
        assert_eq!(json, format!("\"{STARTING_POSITION_FEN}\""));

        let back: Position = serde_json::from_str(&json).expect("position deserializes");
        assert_eq!(back, position);
        assert!(serde_json::from_str::<Position>("\"not a record\"").is_err());
    }
}
