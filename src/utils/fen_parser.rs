//! Position-record parser.
//!
//! Builds a fully-populated `Position` from the six-field record, including
//! piece bitboards, rights, clocks and occupancies.

use crate::errors::ParseError;
use crate::game_state::{chess_types::*, position::Position};
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> Result<Position, ParseError> {
    let parts: Vec<&str> = fen.split(' ').collect();
    if parts.len() != 6 {
        return Err(ParseError::FieldCount(parts.len()));
    }

    let mut position = Position::new_empty();

    parse_board(parts[0], &mut position)?;
    position.side_to_move = parse_side_to_move(parts[1])?;
    position.castling_rights = parse_castling_rights(parts[2])?;
    position.en_passant_file = parse_en_passant(parts[3], position.side_to_move)?;
    position.halfmove_clock = parse_counter("halfmove clock", parts[4])?;
    position.fullmove_number = parse_counter("fullmove number", parts[5])?;

    Ok(position)
}

fn parse_board(board_part: &str, position: &mut Position) -> Result<(), ParseError> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(ParseError::InvalidPlacement(format!(
            "expected 8 ranks, found {}",
            ranks.len()
        )));
    }

    for (record_rank_idx, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - record_rank_idx as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(ParseError::InvalidPlacement(format!(
                        "invalid empty-square count '{ch}'"
                    )));
                }
                file += empty_count as u8;
            } else {
                let piece = Piece::from_record_char(ch).ok_or_else(|| {
                    ParseError::InvalidPlacement(format!("invalid piece character '{ch}'"))
                })?;
                if file >= 8 {
                    return Err(ParseError::InvalidPlacement(format!(
                        "rank {} has more than 8 files",
                        board_rank + 1
                    )));
                }
                position.put_piece(make_square(file, board_rank), piece);
                file += 1;
            }

            if file > 8 {
                return Err(ParseError::InvalidPlacement(format!(
                    "rank {} has more than 8 files",
                    board_rank + 1
                )));
            }
        }

        if file != 8 {
            return Err(ParseError::InvalidPlacement(format!(
                "rank {} does not sum to 8 files",
                board_rank + 1
            )));
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> Result<Color, ParseError> {
    match side_part {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(ParseError::InvalidSideToMove(side_part.to_owned())),
    }
}

fn parse_castling_rights(castling_part: &str) -> Result<CastlingRights, ParseError> {
    if castling_part == "-" {
        return Ok(0);
    }
    if castling_part.is_empty() {
        return Err(ParseError::InvalidCastling(' '));
    }

    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        match ch {
            'K' => rights |= CASTLE_WHITE_KINGSIDE,
            'Q' => rights |= CASTLE_WHITE_QUEENSIDE,
            'k' => rights |= CASTLE_BLACK_KINGSIDE,
            'q' => rights |= CASTLE_BLACK_QUEENSIDE,
            _ => return Err(ParseError::InvalidCastling(ch)),
        }
    }

    Ok(rights)
}

fn parse_en_passant(en_passant_part: &str, side_to_move: Color) -> Result<Option<u8>, ParseError> {
    if en_passant_part == "-" {
        return Ok(None);
    }

    let square = algebraic_to_square(en_passant_part)
        .ok_or_else(|| ParseError::InvalidEnPassant(en_passant_part.to_owned()))?;
    if square_rank(square) != side_to_move.en_passant_capture_rank() {
        return Err(ParseError::InvalidEnPassant(en_passant_part.to_owned()));
    }

    Ok(Some(square_file(square)))
}

fn parse_counter(field: &'static str, value: &str) -> Result<u16, ParseError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidCounter {
            field,
            value: value.to_owned(),
        });
    }
    value.parse::<u16>().map_err(|_| ParseError::InvalidCounter {
        field,
        value: value.to_owned(),
    })
}
