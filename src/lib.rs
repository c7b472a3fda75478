//! Crate root module declarations for the chess arena.
//!
//! Exposes the position engine (board model, move legality, termination),
//! the match services built on it (clock, lifecycle, ratings, matchmaking)
//! and their collaborators (storage, notifications, configuration) so the
//! console binary, tests and benches import stable module paths.

pub mod arena;
pub mod config;
pub mod errors;

pub mod game_state {
    pub mod chess_rules;
    pub mod chess_types;
    pub mod position;
}

pub mod moves {
    pub mod attacks;
    pub mod chess_move;
}

pub mod move_generation {
    pub mod legal_move_apply;
    pub mod legal_move_checks;
    pub mod legal_move_generator;
    pub mod legal_move_validate;
    pub mod perft;
    pub mod termination;
}

pub mod clock {
    pub mod chess_clock;
    pub mod time_control;
}

pub mod matches {
    pub mod match_lifecycle;
    pub mod match_locks;
    pub mod match_record;
}

pub mod rating {
    pub mod elo;
    pub mod rating_engine;
}

pub mod matchmaking {
    pub mod queue;
}

pub mod storage {
    pub mod memory_store;
    pub mod store_traits;
}

pub mod notify {
    pub mod notifier;
}

pub mod console {
    pub mod console_top;
}

pub mod utils {
    pub mod algebraic;
    pub mod fen_generator;
    pub mod fen_parser;
    pub mod render_game_state;
}
