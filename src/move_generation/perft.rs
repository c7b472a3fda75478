use std::thread::{self, JoinHandle};

use crate::errors::{ArenaError, ArenaResult};
use crate::game_state::chess_rules::castling_side_for;
use crate::game_state::chess_types::PieceKind;
use crate::game_state::position::Position;
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_move_generator::{generate_moves, has_any_legal_move, GeneratedMove};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: usize,
    pub captures: usize,
    pub en_passant: usize,
    pub castles: usize,
    pub promotions: usize,
    pub checks: usize,
    pub checkmates: usize,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
        self.checkmates += rhs.checkmates;
    }
}

/// Counts leaf nodes (and leaf move categories) `depth` plies below `position`.
pub fn perft(position: &Position, depth: u8) -> PerftCounts {
    if depth == 0 {
        return PerftCounts {
            nodes: 1,
            ..PerftCounts::default()
        };
    }

    let mut total = PerftCounts::default();
    for generated in generate_moves(position) {
        perft_recurse(position, &generated, depth, 1, &mut total);
    }
    total
}

/// Same totals as [`perft`], one thread per root move.
///
/// A worker that panics fails the whole count instead of leaving its subtree
/// out.
pub fn perft_multi_threaded(position: &Position, depth: u8) -> ArenaResult<PerftCounts> {
    if depth == 0 {
        return Ok(perft(position, 0));
    }

    let root = position.clone();
    let handles: Vec<_> = generate_moves(position)
        .into_iter()
        .map(|generated| {
            let parent = root.clone();
            thread::spawn(move || {
                let mut local = PerftCounts::default();
                perft_recurse(&parent, &generated, depth, 1, &mut local);
                local
            })
        })
        .collect();

    join_workers(handles)
}

fn join_workers(handles: Vec<JoinHandle<PerftCounts>>) -> ArenaResult<PerftCounts> {
    let mut total = PerftCounts::default();
    for handle in handles {
        let local = handle
            .join()
            .map_err(|_| ArenaError::Worker("perft worker thread panicked".to_owned()))?;
        total.merge(local);
    }
    Ok(total)
}

/// Leaf-node count below each root move, for locating generator bugs.
pub fn perft_divide(position: &Position, depth: u8) -> Vec<(String, usize)> {
    generate_moves(position)
        .into_iter()
        .map(|generated| {
            let nodes = perft(&generated.applied.position, depth.saturating_sub(1)).nodes;
            (generated.mv.to_string(), nodes)
        })
        .collect()
}

fn perft_recurse(
    parent: &Position,
    generated: &GeneratedMove,
    search_depth: u8,
    current_depth: u8,
    counts: &mut PerftCounts,
) {
    let next = &generated.applied.position;

    if current_depth == search_depth {
        counts.nodes += 1;

        let applied = &generated.applied;
        let is_pawn = applied.moved.kind == PieceKind::Pawn;
        if applied.captured.is_some() {
            counts.captures += 1;
            if is_pawn && parent.piece_at(generated.mv.to).is_none() {
                counts.en_passant += 1;
            }
        }
        if applied.moved.kind == PieceKind::King
            && castling_side_for(applied.moved.color, generated.mv.from, generated.mv.to).is_some()
        {
            counts.castles += 1;
        }
        if generated.mv.promotion.is_some() {
            counts.promotions += 1;
        }
        if is_king_in_check(next, next.side_to_move) {
            counts.checks += 1;
            if !has_any_legal_move(next) {
                counts.checkmates += 1;
            }
        }
        return;
    }

    for child in generate_moves(next) {
        perft_recurse(next, &child, search_depth, current_depth + 1, counts);
    }
}
