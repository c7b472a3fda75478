//! Arena configuration.
//!
//! Every table the services consult (time controls, rating constants, pairing
//! tolerance) lives here and is passed in explicitly at construction. The
//! defaults are the published values; a JSON file can override any subset.
//!
//! ## Environment Variables
//!
//! - `CHESS_ARENA_CONFIG`: path to a JSON file read by
//!   [`ArenaConfig::from_env_or_default`].

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::time_control::TimeControlTable;
use crate::errors::{ArenaError, ArenaResult};
use crate::matchmaking::queue::MatchmakingConfig;
use crate::rating::elo::RatingConfig;

pub const CONFIG_PATH_VAR: &str = "CHESS_ARENA_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub time_controls: TimeControlTable,
    pub rating: RatingConfig,
    pub matchmaking: MatchmakingConfig,
}

impl ArenaConfig {
    pub fn from_json_str(json: &str) -> ArenaResult<Self> {
        let config: ArenaConfig =
            serde_json::from_str(json).map_err(|err| ArenaError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ArenaResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|err| ArenaError::Config(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Load the file named by `CHESS_ARENA_CONFIG`, or use the defaults when
    /// the variable is unset or the file is unusable.
    pub fn from_env_or_default() -> Self {
        let Ok(path) = env::var(CONFIG_PATH_VAR) else {
            return Self::default();
        };

        match Self::from_path(&path) {
            Ok(config) => {
                info!(%path, "configuration loaded");
                config
            }
            Err(err) => {
                warn!(%path, error = %err, "falling back to default configuration");
                Self::default()
            }
        }
    }

    fn validate(&self) -> ArenaResult<()> {
        if self.rating.k_factor <= 0.0 || !self.rating.k_factor.is_finite() {
            return Err(ArenaError::Config(format!(
                "k_factor must be positive, got {}",
                self.rating.k_factor
            )));
        }
        if self.matchmaking.rating_tolerance < 0 {
            return Err(ArenaError::Config(format!(
                "rating_tolerance must not be negative, got {}",
                self.matchmaking.rating_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::time_control::{GameType, TimeControl};

    #[test]
    fn test_default_config() {
        let config = ArenaConfig::default();
        assert_eq!(config.rating.default_rating, 1200);
        assert_eq!(config.rating.k_factor, 32.0);
        assert_eq!(config.matchmaking.rating_tolerance, 200);
        assert_eq!(config.time_controls.for_game_type(GameType::Blitz), TimeControl::new(180, 2));
    }

    #[test]
    fn test_partial_override() {
        let config = ArenaConfig::from_json_str(
            r#"{ "matchmaking": { "rating_tolerance": 150 }, "time_controls": { "bullet": { "initial_seconds": 30, "increment_seconds": 0 } } }"#,
        )
        .expect("valid config");

        assert_eq!(config.matchmaking.rating_tolerance, 150);
        assert_eq!(config.time_controls.bullet, TimeControl::new(30, 0));
        assert_eq!(config.time_controls.rapid, TimeControl::new(600, 0));
        assert_eq!(config.rating, RatingConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = ArenaConfig::from_json_str(r#"{ "rating": { "k_factor": 0 } }"#).expect_err("k must be positive");
        assert!(matches!(err, ArenaError::Config(_)));
        assert!(ArenaConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_serialization() {
        let config = ArenaConfig::default();
        let json = serde_json::to_string(&config).expect("serializes");
        assert_eq!(ArenaConfig::from_json_str(&json).expect("parses"), config);
    }
}
