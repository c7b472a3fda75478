//! Elo arithmetic.

use serde::{Deserialize, Serialize};

/// Rating constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating assumed for a player with no record for the game type.
    pub default_rating: i32,
    pub k_factor: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            default_rating: 1200,
            k_factor: 32.0,
        }
    }
}

/// Score a player rated `rating` is expected to take against `opponent`.
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(opponent - rating) / 400.0))
}

/// Rating change for a player who scored `actual` (1, ½ or 0).
///
/// Halves round up, so a delta of exactly -0.5 becomes 0.
pub fn rating_delta(rating: i32, opponent: i32, actual: f64, k_factor: f64) -> i32 {
    let raw = k_factor * (actual - expected_score(rating, opponent));
    (raw + 0.5).floor() as i32
}

/// Score from one player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameScore {
    Win,
    Loss,
    Draw,
}

impl GameScore {
    pub const fn actual(self) -> f64 {
        match self {
            GameScore::Win => 1.0,
            GameScore::Loss => 0.0,
            GameScore::Draw => 0.5,
        }
    }

    pub const fn reversed(self) -> GameScore {
        match self {
            GameScore::Win => GameScore::Loss,
            GameScore::Loss => GameScore::Win,
            GameScore::Draw => GameScore::Draw,
        }
    }
}
