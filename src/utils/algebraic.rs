//! Square conversions for long algebraic coordinates.
//!
//! Converts between human-readable coordinates (e.g., `e4`) and internal
//! square indices; reused by the position record and move record codecs.

use crate::game_state::chess_types::{make_square, square_file, square_rank, Square};

/// Convert a coordinate such as `"e4"` to a square index.
///
/// Returns `None` unless the input is exactly a file `a..=h` followed by a
/// rank `1..=8`.
#[inline]
pub fn algebraic_to_square(square: &str) -> Option<Square> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return None;
    }

    let file = file_index(bytes[0] as char)?;
    let rank = rank_index(bytes[1] as char)?;
    Some(make_square(file, rank))
}

/// Convert a square index (`0..=63`) to its coordinate, for example `"e4"`.
#[inline]
pub fn square_to_algebraic(square: Square) -> String {
    debug_assert!(square < 64, "square index out of bounds: {square}");
    let mut out = String::with_capacity(2);
    out.push(file_char(square_file(square)));
    out.push(char::from(b'1' + square_rank(square)));
    out
}

#[inline]
fn file_index(ch: char) -> Option<u8> {
    ('a'..='h').contains(&ch).then(|| ch as u8 - b'a')
}

#[inline]
fn rank_index(ch: char) -> Option<u8> {
    ('1'..='8').contains(&ch).then(|| ch as u8 - b'1')
}

#[inline]
fn file_char(file: u8) -> char {
    char::from(b'a' + file)
}

#[cfg(test)]
mod tests {
    use super::{algebraic_to_square, square_to_algebraic};

    #[test]
    fn round_trip_square_conversions() {
        assert_eq!(algebraic_to_square("a1"), Some(0));
        assert_eq!(algebraic_to_square("h8"), Some(63));
        assert_eq!(algebraic_to_square("e4"), Some(28));
        assert_eq!(square_to_algebraic(0), "a1");
        assert_eq!(square_to_algebraic(63), "h8");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(algebraic_to_square("i1"), None);
        assert_eq!(algebraic_to_square("a9"), None);
        assert_eq!(algebraic_to_square("a10"), None);
        assert_eq!(algebraic_to_square("E4"), None);
        assert_eq!(algebraic_to_square(""), None);
    }
}
