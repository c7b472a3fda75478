//! Attack bitboards for every piece kind.
//!
//! Leapers (knight, king, pawn captures) use tables computed at compile time;
//! sliders trace rays against the current occupancy and stop on the first
//! blocker, which is included in the attack set. The unobstructed ray tables
//! let legality checks tell "wrong geometry" apart from "path blocked".

use crate::game_state::chess_types::{Color, PieceKind, Square};

pub const KNIGHT_ATTACKS: [u64; 64] = generate_leaper_table(&KNIGHT_OFFSETS);
pub const KING_ATTACKS: [u64; 64] = generate_leaper_table(&KING_OFFSETS);
pub const WHITE_PAWN_ATTACKS: [u64; 64] = generate_leaper_table(&[(-1, 1), (1, 1)]);
pub const BLACK_PAWN_ATTACKS: [u64; 64] = generate_leaper_table(&[(-1, -1), (1, -1)]);

pub const ROOK_RAYS: [u64; 64] = generate_ray_table(&ROOK_DIRECTIONS);
pub const BISHOP_RAYS: [u64; 64] = generate_ray_table(&BISHOP_DIRECTIONS);

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const ROOK_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

#[inline]
pub const fn knight_attacks(square: Square) -> u64 {
    KNIGHT_ATTACKS[square as usize]
}

#[inline]
pub const fn king_attacks(square: Square) -> u64 {
    KING_ATTACKS[square as usize]
}

/// Squares a pawn of `color` on `square` attacks diagonally.
#[inline]
pub const fn pawn_attacks(color: Color, square: Square) -> u64 {
    match color {
        Color::White => WHITE_PAWN_ATTACKS[square as usize],
        Color::Black => BLACK_PAWN_ATTACKS[square as usize],
    }
}

#[inline]
pub fn rook_attacks(square: Square, occupancy: u64) -> u64 {
    ROOK_DIRECTIONS
        .iter()
        .fold(0u64, |acc, &(df, dr)| acc | trace_ray(square, df, dr, occupancy))
}

#[inline]
pub fn bishop_attacks(square: Square, occupancy: u64) -> u64 {
    BISHOP_DIRECTIONS
        .iter()
        .fold(0u64, |acc, &(df, dr)| acc | trace_ray(square, df, dr, occupancy))
}

#[inline]
pub fn queen_attacks(square: Square, occupancy: u64) -> u64 {
    rook_attacks(square, occupancy) | bishop_attacks(square, occupancy)
}

/// Unobstructed reach of a slider on an empty board; zero for other kinds.
#[inline]
pub const fn slider_rays(kind: PieceKind, square: Square) -> u64 {
    match kind {
        PieceKind::Rook => ROOK_RAYS[square as usize],
        PieceKind::Bishop => BISHOP_RAYS[square as usize],
        PieceKind::Queen => ROOK_RAYS[square as usize] | BISHOP_RAYS[square as usize],
        PieceKind::Pawn | PieceKind::Knight | PieceKind::King => 0,
    }
}

/// Attack set of a slider given the current occupancy; zero for other kinds.
#[inline]
pub fn slider_attacks(kind: PieceKind, square: Square, occupancy: u64) -> u64 {
    match kind {
        PieceKind::Rook => rook_attacks(square, occupancy),
        PieceKind::Bishop => bishop_attacks(square, occupancy),
        PieceKind::Queen => queen_attacks(square, occupancy),
        PieceKind::Pawn | PieceKind::Knight | PieceKind::King => 0,
    }
}

fn trace_ray(square: Square, file_step: i32, rank_step: i32, occupancy: u64) -> u64 {
    let mut file = (square % 8) as i32 + file_step;
    let mut rank = (square / 8) as i32 + rank_step;
    let mut attacks = 0u64;

    while (0..8).contains(&file) && (0..8).contains(&rank) {
        let bit = 1u64 << ((rank * 8 + file) as u32);
        attacks |= bit;

        if occupancy & bit != 0 {
            break;
        }

        file += file_step;
        rank += rank_step;
    }

    attacks
}

const fn generate_leaper_table(offsets: &[(i32, i32)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut attacks = 0u64;
        let mut i = 0usize;

        while i < offsets.len() {
            let (df, dr) = offsets[i];
            attacks |= bit_if_on_board(file + df, rank + dr);
            i += 1;
        }

        table[sq] = attacks;
        sq += 1;
    }

    table
}

const fn generate_ray_table(directions: &[(i32, i32); 4]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let mut rays = 0u64;
        let mut d = 0usize;

        while d < directions.len() {
            let (df, dr) = directions[d];
            let mut file = (sq % 8) as i32 + df;
            let mut rank = (sq / 8) as i32 + dr;
            while file >= 0 && file < 8 && rank >= 0 && rank < 8 {
                rays |= 1u64 << ((rank * 8 + file) as u32);
                file += df;
                rank += dr;
            }
            d += 1;
        }

        table[sq] = rays;
        sq += 1;
    }

    table
}

const fn bit_if_on_board(file: i32, rank: i32) -> u64 {
    if file < 0 || file > 7 || rank < 0 || rank > 7 {
        return 0;
    }
    1u64 << ((rank * 8 + file) as u32)
}
