//! Persistent match data: identifiers, status, the match row and its move log.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::time_control::{GameType, TimeControl};
use crate::game_state::chess_types::{Color, PieceKind};
use crate::game_state::position::Position;
use crate::moves::chess_move::ChessMove;

/// Player identity issued by the account service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub Uuid);

impl MatchId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(MatchId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Ongoing,
    Player1Won,
    Player2Won,
    Draw,
    Abandoned,
}

impl MatchStatus {
    #[inline]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, MatchStatus::Ongoing)
    }
}

/// One match. Player 1 plays White.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub game_type: GameType,
    pub status: MatchStatus,
    pub ply: u32,
    pub position: Position,
    pub last_move: Option<ChessMove>,
    pub draw_offered_by: Option<PlayerId>,
    pub player1_remaining_seconds: u32,
    pub player2_remaining_seconds: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub last_move_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    /// A fresh ongoing match from the standard starting position. The two
    /// players must differ; the match service refuses to create one otherwise.
    pub fn new(
        player1: PlayerId,
        player2: PlayerId,
        game_type: GameType,
        time_control: TimeControl,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MatchId::new_v4(),
            player1,
            player2,
            game_type,
            status: MatchStatus::Ongoing,
            ply: 0,
            position: Position::new_game(),
            last_move: None,
            draw_offered_by: None,
            player1_remaining_seconds: time_control.initial_seconds,
            player2_remaining_seconds: time_control.initial_seconds,
            created_at: now,
            started_at: now,
            last_move_at: None,
            finished_at: None,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_participant(&self, player: PlayerId) -> bool {
        player == self.player1 || player == self.player2
    }

    /// Color `player` plays, if they are in this match.
    pub fn color_of(&self, player: PlayerId) -> Option<Color> {
        if player == self.player1 {
            Some(Color::White)
        } else if player == self.player2 {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn player_for(&self, color: Color) -> PlayerId {
        match color {
            Color::White => self.player1,
            Color::Black => self.player2,
        }
    }

    /// The other player; `player` is assumed to be a participant.
    pub fn opponent_of(&self, player: PlayerId) -> PlayerId {
        if player == self.player1 {
            self.player2
        } else {
            self.player1
        }
    }

    pub fn remaining_seconds(&self, color: Color) -> u32 {
        match color {
            Color::White => self.player1_remaining_seconds,
            Color::Black => self.player2_remaining_seconds,
        }
    }

    pub fn set_remaining_seconds(&mut self, color: Color, seconds: u32) {
        match color {
            Color::White => self.player1_remaining_seconds = seconds,
            Color::Black => self.player2_remaining_seconds = seconds,
        }
    }

    /// Status in which `player` is the winner.
    pub fn win_for(&self, player: PlayerId) -> MatchStatus {
        if player == self.player1 {
            MatchStatus::Player1Won
        } else {
            MatchStatus::Player2Won
        }
    }

    /// Start of the current thinking interval.
    pub fn clock_reference(&self) -> DateTime<Utc> {
        self.last_move_at.unwrap_or(self.started_at)
    }
}

/// One applied move in a match's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLogEntry {
    pub match_id: MatchId,
    pub ply: u32,
    pub mv: ChessMove,
    pub piece: PieceKind,
    pub position_after: Position,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub played_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn new_match_starts_from_the_standard_position() {
        let record = MatchRecord::new(
            PlayerId(1),
            PlayerId(2),
            GameType::Blitz,
            TimeControl::new(180, 2),
            Utc::now(),
        );

        assert_eq!(record.status, MatchStatus::Ongoing);
        assert_eq!(record.ply, 0);
        assert_eq!(record.position, Position::new_game());
        assert_eq!(record.remaining_seconds(Color::White), 180);
        assert_eq!(record.remaining_seconds(Color::Black), 180);
        assert_eq!(record.clock_reference(), record.started_at);
    }

    #[test]
    fn seats_and_colors() {
        let record = MatchRecord::new(PlayerId(7), PlayerId(9), GameType::Rapid, TimeControl::new(600, 0), Utc::now());

        assert_eq!(record.color_of(PlayerId(7)), Some(Color::White));
        assert_eq!(record.color_of(PlayerId(9)), Some(Color::Black));
        assert_eq!(record.color_of(PlayerId(3)), None);
        assert_eq!(record.opponent_of(PlayerId(9)), PlayerId(7));
        assert_eq!(record.win_for(PlayerId(9)), MatchStatus::Player2Won);
        assert!(MatchStatus::Abandoned.is_terminal());
        assert!(!MatchStatus::Ongoing.is_terminal());
    }

    #[test]
    fn record_serializes_position_as_text() {
        let record = MatchRecord::new(PlayerId(1), PlayerId(2), GameType::Bullet, TimeControl::new(60, 1), Utc::now());
        let json = serde_json::to_value(&record).expect("serializes");
        assert_eq!(
            json["position"],
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        let back: MatchRecord = serde_json::from_value(json).expect("deserializes");
        assert_eq!(back, record);
    }
}
