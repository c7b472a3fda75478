//! Per-game-type ratings and their update when a match ends.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::time_control::GameType;
use crate::errors::{ArenaError, ArenaResult, NotFoundError};
use crate::matches::match_record::{MatchRecord, MatchStatus, PlayerId};
use crate::rating::elo::{rating_delta, GameScore, RatingConfig};
use crate::storage::store_traits::RatingStore;

/// A player's standing in one game type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub player: PlayerId,
    pub game_type: GameType,
    pub rating: i32,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl RatingRecord {
    pub fn new(player: PlayerId, game_type: GameType, rating: i32) -> Self {
        Self {
            player,
            game_type,
            rating,
            games_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    fn record_game(&mut self, score: GameScore, delta: i32) {
        self.rating += delta;
        self.games_played += 1;
        match score {
            GameScore::Win => self.wins += 1,
            GameScore::Loss => self.losses += 1,
            GameScore::Draw => self.draws += 1,
        }
    }
}

/// Rating change applied to both players of a finished match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingUpdate {
    pub player1: RatingRecord,
    pub player2: RatingRecord,
    pub player1_delta: i32,
    pub player2_delta: i32,
}

pub struct RatingEngine {
    store: Arc<dyn RatingStore>,
    config: RatingConfig,
    // Held from reading the old rows until the new ones are committed.
    update_lock: Mutex<()>,
}

impl RatingEngine {
    pub fn new(store: Arc<dyn RatingStore>, config: RatingConfig) -> Self {
        Self {
            store,
            config,
            update_lock: Mutex::new(()),
        }
    }

    /// Current rating, or the default when the player has no record.
    pub fn rating_for(&self, player: PlayerId, game_type: GameType) -> ArenaResult<i32> {
        Ok(self
            .store
            .load_rating(player, game_type)?
            .map_or(self.config.default_rating, |record| record.rating))
    }

    pub fn rating_record(&self, player: PlayerId, game_type: GameType) -> ArenaResult<RatingRecord> {
        self.store
            .load_rating(player, game_type)?
            .ok_or(ArenaError::NotFound(NotFoundError::Rating { player, game_type }))
    }

    pub fn ratings_for_player(&self, player: PlayerId) -> ArenaResult<Vec<RatingRecord>> {
        self.store.ratings_for_player(player)
    }

    /// Computes the Elo update `record`'s result calls for and hands the new
    /// rows to `commit`, which must store them together with the match.
    ///
    /// Ongoing and abandoned matches are committed with no rows and return no
    /// update. Nothing is stored when the rating read or `commit` fails.
    pub fn settle<T>(
        &self,
        record: &MatchRecord,
        commit: impl FnOnce(&[RatingRecord]) -> ArenaResult<T>,
    ) -> ArenaResult<(T, Option<RatingUpdate>)> {
        let player1_score = match record.status {
            MatchStatus::Player1Won => GameScore::Win,
            MatchStatus::Player2Won => GameScore::Loss,
            MatchStatus::Draw => GameScore::Draw,
            MatchStatus::Ongoing | MatchStatus::Abandoned => return Ok((commit(&[])?, None)),
        };

        let _guard = self.update_lock.lock();

        let mut player1 = self.load_or_default(record.player1, record.game_type)?;
        let mut player2 = self.load_or_default(record.player2, record.game_type)?;

        let player1_delta = rating_delta(
            player1.rating,
            player2.rating,
            player1_score.actual(),
            self.config.k_factor,
        );
        let player2_delta = rating_delta(
            player2.rating,
            player1.rating,
            player1_score.reversed().actual(),
            self.config.k_factor,
        );

        player1.record_game(player1_score, player1_delta);
        player2.record_game(player1_score.reversed(), player2_delta);
        let committed = commit(&[player1.clone(), player2.clone()])?;

        info!(
            match_id = %record.id,
            game_type = %record.game_type,
            player1 = %record.player1,
            player2 = %record.player2,
            player1_delta,
            player2_delta,
            "ratings updated"
        );

        Ok((
            committed,
            Some(RatingUpdate {
                player1,
                player2,
                player1_delta,
                player2_delta,
            }),
        ))
    }

    fn load_or_default(&self, player: PlayerId, game_type: GameType) -> ArenaResult<RatingRecord> {
        Ok(self
            .store
            .load_rating(player, game_type)?
            .unwrap_or_else(|| RatingRecord::new(player, game_type, self.config.default_rating)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::clock::time_control::TimeControl;
    use crate::storage::memory_store::MemoryStore;
    use crate::storage::store_traits::MatchStore;

    fn finished(status: MatchStatus) -> MatchRecord {
        let mut record = MatchRecord::new(PlayerId(1), PlayerId(2), GameType::Blitz, TimeControl::new(180, 2), Utc::now());
        record.status = status;
        record
    }

    struct Rated {
        engine: RatingEngine,
        store: Arc<MemoryStore>,
    }

    impl Rated {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            Self {
                engine: RatingEngine::new(store.clone(), RatingConfig::default()),
                store,
            }
        }

        /// Stores `record` and settles it the way the match service does.
        fn settle(&self, record: &MatchRecord) -> Option<RatingUpdate> {
            self.store.insert_match(record.clone()).expect("match stored");
            let ((), update) = self
                .engine
                .settle(record, |rows| self.store.commit_match(record, None, rows))
                .expect("settle succeeds");
            update
        }
    }

    #[test]
    fn first_win_moves_sixteen_points() {
        let rated = Rated::new();
        let engine = &rated.engine;
        let update = rated
            .settle(&finished(MatchStatus::Player1Won))
            .expect("finished match is rated");

        assert_eq!(update.player1_delta, 16);
        assert_eq!(update.player2_delta, -16);
        assert_eq!(engine.rating_for(PlayerId(1), GameType::Blitz).expect("lookup"), 1216);
        assert_eq!(engine.rating_for(PlayerId(2), GameType::Blitz).expect("lookup"), 1184);

        let winner = engine.rating_record(PlayerId(1), GameType::Blitz).expect("record exists");
        assert_eq!((winner.games_played, winner.wins, winner.losses, winner.draws), (1, 1, 0, 0));
        let loser = engine.rating_record(PlayerId(2), GameType::Blitz).expect("record exists");
        assert_eq!((loser.games_played, loser.wins, loser.losses, loser.draws), (1, 0, 1, 0));
    }

    #[test]
    fn draw_between_equals_only_counts_the_game() {
        let rated = Rated::new();
        let engine = &rated.engine;
        rated.settle(&finished(MatchStatus::Draw));

        let record = engine.rating_record(PlayerId(2), GameType::Blitz).expect("record exists");
        assert_eq!(record.rating, 1200);
        assert_eq!(record.draws, 1);
    }

    #[test]
    fn ongoing_and_abandoned_are_not_rated() {
        let rated = Rated::new();
        let engine = &rated.engine;
        assert_eq!(rated.settle(&finished(MatchStatus::Ongoing)), None);
        assert_eq!(rated.settle(&finished(MatchStatus::Abandoned)), None);

        let err = engine.rating_record(PlayerId(1), GameType::Blitz).expect_err("no record written");
        assert!(matches!(err, ArenaError::NotFound(NotFoundError::Rating { .. })));
        assert_eq!(engine.rating_for(PlayerId(1), GameType::Blitz).expect("default"), 1200);
    }

    #[test]
    fn ratings_are_kept_per_game_type() {
        let rated = Rated::new();
        let engine = &rated.engine;
        rated.settle(&finished(MatchStatus::Player2Won));

        assert_eq!(engine.rating_for(PlayerId(2), GameType::Rapid).expect("default"), 1200);
        let all = engine.ratings_for_player(PlayerId(2)).expect("lookup");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rating, 1216);
    }

    #[test]
    fn failed_commit_leaves_ratings_untouched() {
        let rated = Rated::new();
        let record = finished(MatchStatus::Player1Won);
        rated.store.insert_match(record.clone()).expect("match stored");

        let err = rated
            .engine
            .settle(&record, |rows| {
                assert_eq!(rows.len(), 2);
                Err::<(), _>(ArenaError::Storage("offline".to_owned()))
            })
            .expect_err("commit failed");
        assert_eq!(err, ArenaError::Storage("offline".to_owned()));
        assert!(rated.engine.ratings_for_player(PlayerId(1)).expect("lookup").is_empty());
    }
}
