//! Rating-bracketed matchmaking.
//!
//! A join runs under its game type's lock: record the entry, then scan the
//! waiting players of that type in ascending rating order and pair the first
//! two within the tolerance. The scan is first-fit: the earliest `(i, j)` pair
//! in sorted order wins even when a closer pair exists further on.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::clock::chess_clock::TimeSource;
use crate::clock::time_control::GameType;
use crate::errors::{ArenaError, ArenaResult, NotFoundError};
use crate::matches::match_lifecycle::MatchService;
use crate::matches::match_record::{MatchRecord, PlayerId};
use crate::notify::notifier::{ArenaEvent, Notifier};
use crate::rating::rating_engine::RatingEngine;
use crate::storage::store_traits::{QueueStore, QueueUpsert};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    /// Largest rating gap two paired players may have.
    pub rating_tolerance: i32,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self { rating_tolerance: 200 }
    }
}

/// A waiting player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub player: PlayerId,
    pub game_type: GameType,
    /// Rating for `game_type` when the player joined.
    pub rating: i32,
    pub enqueued_at: DateTime<Utc>,
}

pub struct MatchmakingQueue {
    store: Arc<dyn QueueStore>,
    matches: Arc<MatchService>,
    ratings: Arc<RatingEngine>,
    notifier: Arc<dyn Notifier>,
    time_source: Arc<dyn TimeSource>,
    config: MatchmakingConfig,
    pairing_locks: HashMap<GameType, Mutex<()>>,
}

impl MatchmakingQueue {
    pub fn new(
        store: Arc<dyn QueueStore>,
        matches: Arc<MatchService>,
        ratings: Arc<RatingEngine>,
        notifier: Arc<dyn Notifier>,
        time_source: Arc<dyn TimeSource>,
        config: MatchmakingConfig,
    ) -> Self {
        let pairing_locks = GameType::ALL
            .into_iter()
            .map(|game_type| (game_type, Mutex::new(())))
            .collect();

        Self {
            store,
            matches,
            ratings,
            notifier,
            time_source,
            config,
            pairing_locks,
        }
    }

    /// Queues `player` for `game_type` and tries to pair.
    ///
    /// An entry for another game type is replaced; joining the same game type
    /// twice changes nothing. Returns the created match when this join
    /// completed a pair.
    pub fn join(&self, player: PlayerId, game_type: GameType) -> ArenaResult<Option<MatchRecord>> {
        let lock = self
            .pairing_locks
            .get(&game_type)
            .ok_or_else(|| ArenaError::Config(format!("no pairing lock for {game_type}")))?;
        let _guard = lock.lock();

        let entry = QueueEntry {
            player,
            game_type,
            rating: self.ratings.rating_for(player, game_type)?,
            enqueued_at: self.time_source.now(),
        };

        match self.store.upsert_for_player(entry)? {
            QueueUpsert::AlreadyQueued(_) => {
                debug!(%player, %game_type, "already queued");
                return Ok(None);
            }
            QueueUpsert::Replaced(previous) => {
                debug!(%player, from = %previous.game_type, to = %game_type, "queue entry moved");
            }
            QueueUpsert::Inserted => {
                debug!(%player, %game_type, "joined queue");
            }
        }

        self.pair(game_type)
    }

    /// Removes the player's entry. Leaving when not queued is fine.
    pub fn leave(&self, player: PlayerId) -> ArenaResult<()> {
        if let Some(entry) = self.store.remove_player(player)? {
            debug!(%player, game_type = %entry.game_type, "left queue");
        }
        Ok(())
    }

    /// Waiting players for `game_type`, in ascending rating order.
    pub fn queued_entries(&self, game_type: GameType) -> ArenaResult<Vec<QueueEntry>> {
        let mut entries = self.store.entries_for(game_type)?;
        entries.sort_by_key(|entry| entry.rating);
        Ok(entries)
    }

    pub fn queued_entry(&self, player: PlayerId) -> ArenaResult<QueueEntry> {
        self.store
            .entry_for_player(player)?
            .ok_or(ArenaError::NotFound(NotFoundError::QueuedPlayer(player)))
    }

    fn pair(&self, game_type: GameType) -> ArenaResult<Option<MatchRecord>> {
        // A pair that vanished between the scan and the removal (a concurrent
        // leave or re-join elsewhere) forces a fresh scan.
        loop {
            let entries = self.queued_entries(game_type)?;
            let Some((first, second)) = first_fit_pair(&entries, self.config.rating_tolerance) else {
                return Ok(None);
            };

            if !self.store.take_pair(first, second)? {
                continue;
            }

            let record = match self.matches.create_match(first.player, second.player, game_type) {
                Ok(record) => record,
                Err(err) => {
                    self.requeue([first, second]);
                    return Err(err);
                }
            };
            info!(
                match_id = %record.id,
                %game_type,
                player1 = %first.player,
                player2 = %second.player,
                rating_gap = second.rating - first.rating,
                "players paired"
            );

            for (recipient, opponent) in [(first.player, second.player), (second.player, first.player)] {
                self.notifier.notify(ArenaEvent::MatchCreated {
                    recipient,
                    match_id: record.id,
                    opponent,
                    game_type,
                });
            }
            return Ok(Some(record));
        }
    }

    /// Puts a taken pair back after its match could not be created.
    fn requeue(&self, entries: [&QueueEntry; 2]) {
        for entry in entries {
            match self.store.restore_entry(entry.clone()) {
                Ok(true) => debug!(player = %entry.player, game_type = %entry.game_type, "queue entry restored"),
                Ok(false) => debug!(player = %entry.player, "player queued again; entry not restored"),
                Err(err) => error!(player = %entry.player, error = %err, "queue entry lost"),
            }
        }
    }
}

/// First `(i, j)` with `i < j` whose ratings differ by at most `tolerance`.
/// `entries` must be sorted by ascending rating.
pub fn first_fit_pair(entries: &[QueueEntry], tolerance: i32) -> Option<(&QueueEntry, &QueueEntry)> {
    for (i, first) in entries.iter().enumerate() {
        for second in &entries[i + 1..] {
            if (second.rating - first.rating).abs() <= tolerance {
                return Some((first, second));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::TimeZone;

    use super::*;
    use crate::clock::chess_clock::ManualTimeSource;
    use crate::clock::time_control::TimeControlTable;
    use crate::matches::match_record::{MatchId, MatchStatus, MoveLogEntry};
    use crate::notify::notifier::RecordingNotifier;
    use crate::rating::elo::RatingConfig;
    use crate::rating::rating_engine::RatingRecord;
    use crate::storage::memory_store::MemoryStore;
    use crate::storage::store_traits::MatchStore;

    struct Harness {
        queue: MatchmakingQueue,
        matches: Arc<MatchService>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        harness_with(store.clone(), store)
    }

    /// Queue and ratings live in `store`; matches go to `match_store`.
    fn harness_with(store: Arc<MemoryStore>, match_store: Arc<dyn MatchStore>) -> Harness {
        let clock = Arc::new(ManualTimeSource::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).single().expect("valid instant"),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let ratings = Arc::new(RatingEngine::new(store.clone(), RatingConfig::default()));
        let matches = Arc::new(MatchService::new(
            match_store,
            ratings.clone(),
            notifier.clone(),
            clock.clone(),
            TimeControlTable::default(),
        ));
        let queue = MatchmakingQueue::new(
            store.clone(),
            matches.clone(),
            ratings,
            notifier.clone(),
            clock,
            MatchmakingConfig::default(),
        );
        Harness {
            queue,
            matches,
            store,
            notifier,
        }
    }

    /// Refuses every new match.
    struct FullMatchTable;

    impl MatchStore for FullMatchTable {
        fn insert_match(&self, _record: MatchRecord) -> ArenaResult<()> {
            Err(ArenaError::Storage("match table full".to_owned()))
        }

        fn load_match(&self, _id: MatchId) -> ArenaResult<Option<MatchRecord>> {
            Ok(None)
        }

        fn commit_match(
            &self,
            _record: &MatchRecord,
            _appended: Option<&MoveLogEntry>,
            _ratings: &[RatingRecord],
        ) -> ArenaResult<()> {
            Err(ArenaError::Storage("match table full".to_owned()))
        }

        fn matches_for_player(&self, _player: PlayerId) -> ArenaResult<Vec<MatchRecord>> {
            Ok(Vec::new())
        }

        fn move_log(&self, _id: MatchId) -> ArenaResult<Vec<MoveLogEntry>> {
            Ok(Vec::new())
        }
    }

    fn seed_rating(store: &MemoryStore, player: u64, game_type: GameType, rating: i32) {
        store.seed_ratings(&[RatingRecord::new(PlayerId(player), game_type, rating)]);
    }

    fn entry(player: u64, rating: i32) -> QueueEntry {
        QueueEntry {
            player: PlayerId(player),
            game_type: GameType::Blitz,
            rating,
            enqueued_at: Utc::now(),
        }
    }

    #[test]
    fn close_ratings_are_paired() {
        let h = harness();
        seed_rating(&h.store, 1, GameType::Blitz, 1200);
        seed_rating(&h.store, 2, GameType::Blitz, 1350);

        assert_eq!(h.queue.join(PlayerId(1), GameType::Blitz).expect("join"), None);
        let record = h
            .queue
            .join(PlayerId(2), GameType::Blitz)
            .expect("join")
            .expect("pair found");

        assert_eq!((record.player1, record.player2), (PlayerId(1), PlayerId(2)));
        assert_eq!(record.status, MatchStatus::Ongoing);
        assert_eq!(record.player1_remaining_seconds, 180);
        assert!(h.queue.queued_entries(GameType::Blitz).expect("entries").is_empty());

        let created: Vec<_> = h
            .notifier
            .events()
            .into_iter()
            .filter(|event| matches!(event, ArenaEvent::MatchCreated { .. }))
            .collect();
        assert_eq!(created.len(), 2);
    }

    #[test]
    fn distant_ratings_stay_queued() {
        let h = harness();
        seed_rating(&h.store, 1, GameType::Blitz, 1200);
        seed_rating(&h.store, 2, GameType::Blitz, 1450);

        assert_eq!(h.queue.join(PlayerId(1), GameType::Blitz).expect("join"), None);
        assert_eq!(h.queue.join(PlayerId(2), GameType::Blitz).expect("join"), None);
        assert_eq!(h.queue.queued_entries(GameType::Blitz).expect("entries").len(), 2);
        assert!(h.notifier.events().is_empty());
    }

    #[test]
    fn same_type_join_is_a_no_op() {
        let h = harness();
        h.queue.join(PlayerId(5), GameType::Rapid).expect("join");
        let first = h.queue.queued_entry(PlayerId(5)).expect("queued");

        assert_eq!(h.queue.join(PlayerId(5), GameType::Rapid).expect("join"), None);
        assert_eq!(h.queue.queued_entry(PlayerId(5)).expect("queued"), first);
    }

    #[test]
    fn joining_another_type_evicts_the_old_entry() {
        let h = harness();
        h.queue.join(PlayerId(5), GameType::Rapid).expect("join");
        h.queue.join(PlayerId(5), GameType::Bullet).expect("join");

        assert!(h.queue.queued_entries(GameType::Rapid).expect("entries").is_empty());
        assert_eq!(h.queue.queued_entry(PlayerId(5)).expect("queued").game_type, GameType::Bullet);

        // A rapid player no longer finds them.
        assert_eq!(h.queue.join(PlayerId(6), GameType::Rapid).expect("join"), None);
    }

    #[test]
    fn leave_is_idempotent() {
        let h = harness();
        h.queue.join(PlayerId(3), GameType::Classical).expect("join");
        h.queue.leave(PlayerId(3)).expect("leave");
        h.queue.leave(PlayerId(3)).expect("leave again");

        let err = h.queue.queued_entry(PlayerId(3)).expect_err("gone");
        assert_eq!(err, ArenaError::NotFound(NotFoundError::QueuedPlayer(PlayerId(3))));
    }

    #[test]
    fn first_fit_prefers_earliest_pair_over_closest() {
        // 1000/1190 differ by 190; 1190/1195 would be closer.
        let sorted = [entry(1, 1000), entry(2, 1190), entry(3, 1195)];
        let (a, b) = first_fit_pair(&sorted, 200).expect("pair");
        assert_eq!((a.player, b.player), (PlayerId(1), PlayerId(2)));

        let spread = [entry(1, 1000), entry(2, 1300), entry(3, 1450)];
        let (a, b) = first_fit_pair(&spread, 200).expect("pair");
        assert_eq!((a.player, b.player), (PlayerId(2), PlayerId(3)));

        assert!(first_fit_pair(&[entry(1, 1000), entry(2, 1201)], 200).is_none());
        assert!(first_fit_pair(&[entry(1, 1000), entry(2, 1200)], 200).is_some());
    }

    #[test]
    fn lower_rated_player_takes_white() {
        let h = harness();
        seed_rating(&h.store, 10, GameType::Bullet, 1500);
        seed_rating(&h.store, 11, GameType::Bullet, 1400);

        h.queue.join(PlayerId(10), GameType::Bullet).expect("join");
        let record = h
            .queue
            .join(PlayerId(11), GameType::Bullet)
            .expect("join")
            .expect("paired");
        assert_eq!((record.player1, record.player2), (PlayerId(11), PlayerId(10)));
    }

    #[test]
    fn failed_match_creation_puts_the_pair_back() {
        let store = Arc::new(MemoryStore::new());
        let h = harness_with(store, Arc::new(FullMatchTable));

        assert_eq!(h.queue.join(PlayerId(1), GameType::Blitz).expect("join"), None);
        let err = h.queue.join(PlayerId(2), GameType::Blitz).expect_err("no match can be stored");
        assert_eq!(err, ArenaError::Storage("match table full".to_owned()));

        let waiting: Vec<PlayerId> = h
            .queue
            .queued_entries(GameType::Blitz)
            .expect("entries")
            .iter()
            .map(|entry| entry.player)
            .collect();
        assert_eq!(waiting.len(), 2);
        assert!(waiting.contains(&PlayerId(1)) && waiting.contains(&PlayerId(2)));
        assert!(h.notifier.events().is_empty());
    }

    #[test]
    fn concurrent_joins_pair_every_player_exactly_once() {
        let h = harness();

        thread::scope(|scope| {
            for player in 1..=16u64 {
                let queue = &h.queue;
                scope.spawn(move || {
                    let game_type = if player % 2 == 0 { GameType::Blitz } else { GameType::Rapid };
                    queue.join(PlayerId(player), game_type).expect("join");
                });
            }
        });

        // Equal default ratings, so every second join of a type completes a pair.
        for game_type in [GameType::Blitz, GameType::Rapid] {
            assert!(h.queue.queued_entries(game_type).expect("entries").is_empty());
        }
        for player in 1..=16u64 {
            let found = h.matches.matches_for_player(PlayerId(player)).expect("lookup");
            assert_eq!(found.len(), 1, "player {player}");
        }

        let created = h
            .notifier
            .events()
            .into_iter()
            .filter(|event| matches!(event, ArenaEvent::MatchCreated { .. }))
            .count();
        assert_eq!(created, 16);
    }
}
