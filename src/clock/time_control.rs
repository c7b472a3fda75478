//! Game types and their time controls.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Classical,
    Rapid,
    Blitz,
    Bullet,
}

impl GameType {
    pub const ALL: [GameType; 4] = [
        GameType::Classical,
        GameType::Rapid,
        GameType::Blitz,
        GameType::Bullet,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            GameType::Classical => "classical",
            GameType::Rapid => "rapid",
            GameType::Blitz => "blitz",
            GameType::Bullet => "bullet",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        GameType::ALL
            .into_iter()
            .find(|game_type| game_type.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Starting clock and per-move increment, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    pub initial_seconds: u32,
    pub increment_seconds: u32,
}

impl TimeControl {
    pub const fn new(initial_seconds: u32, increment_seconds: u32) -> Self {
        Self {
            initial_seconds,
            increment_seconds,
        }
    }
}

/// Time control for each game type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeControlTable {
    pub classical: TimeControl,
    pub rapid: TimeControl,
    pub blitz: TimeControl,
    pub bullet: TimeControl,
}

impl Default for TimeControlTable {
    fn default() -> Self {
        Self {
            classical: TimeControl::new(1800, 0),
            rapid: TimeControl::new(600, 0),
            blitz: TimeControl::new(180, 2),
            bullet: TimeControl::new(60, 1),
        }
    }
}

impl TimeControlTable {
    pub fn for_game_type(&self, game_type: GameType) -> TimeControl {
        match game_type {
            GameType::Classical => self.classical,
            GameType::Rapid => self.rapid,
            GameType::Blitz => self.blitz,
            GameType::Bullet => self.bullet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_published_controls() {
        let table = TimeControlTable::default();
        assert_eq!(table.for_game_type(GameType::Classical), TimeControl::new(1800, 0));
        assert_eq!(table.for_game_type(GameType::Rapid), TimeControl::new(600, 0));
        assert_eq!(table.for_game_type(GameType::Blitz), TimeControl::new(180, 2));
        assert_eq!(table.for_game_type(GameType::Bullet), TimeControl::new(60, 1));
    }

    #[test]
    fn game_type_names() {
        assert_eq!(GameType::from_name("BLITZ"), Some(GameType::Blitz));
        assert_eq!(GameType::from_name("armageddon"), None);
        assert_eq!(GameType::Bullet.to_string(), "bullet");
        assert_eq!(serde_json::to_string(&GameType::Rapid).expect("serializes"), "\"rapid\"");
    }
}
