//! Wiring for a complete in-process arena.

use std::sync::Arc;

use crate::clock::chess_clock::{SystemTimeSource, TimeSource};
use crate::config::ArenaConfig;
use crate::matches::match_lifecycle::MatchService;
use crate::matchmaking::queue::MatchmakingQueue;
use crate::notify::notifier::{Notifier, TracingNotifier};
use crate::rating::rating_engine::RatingEngine;
use crate::storage::memory_store::MemoryStore;

/// The services sharing one [`MemoryStore`].
pub struct Arena {
    pub matches: Arc<MatchService>,
    pub ratings: Arc<RatingEngine>,
    pub queue: MatchmakingQueue,
    pub config: ArenaConfig,
}

impl Arena {
    pub fn new(config: ArenaConfig, time_source: Arc<dyn TimeSource>, notifier: Arc<dyn Notifier>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let ratings = Arc::new(RatingEngine::new(store.clone(), config.rating));
        let matches = Arc::new(MatchService::new(
            store.clone(),
            ratings.clone(),
            notifier.clone(),
            time_source.clone(),
            config.time_controls.clone(),
        ));
        let queue = MatchmakingQueue::new(
            store,
            matches.clone(),
            ratings.clone(),
            notifier,
            time_source,
            config.matchmaking,
        );

        Self {
            matches,
            ratings,
            queue,
            config,
        }
    }

    /// Wall-clock time and events written to the log.
    pub fn with_system_clock(config: ArenaConfig) -> Self {
        Self::new(config, Arc::new(SystemTimeSource), Arc::new(TracingNotifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::time_control::GameType;
    use crate::matches::match_record::{MatchStatus, PlayerId};

    #[test]
    fn queue_pairing_feeds_the_match_service() {
        let arena = Arena::with_system_clock(ArenaConfig::default());

        arena.queue.join(PlayerId(1), GameType::Rapid).expect("join");
        let record = arena
            .queue
            .join(PlayerId(2), GameType::Rapid)
            .expect("join")
            .expect("equal ratings pair");

        let stored = arena.matches.get_match(record.id).expect("stored");
        assert_eq!(stored.status, MatchStatus::Ongoing);
        assert_eq!(arena.matches.matches_for_player(PlayerId(2)).expect("lookup").len(), 1);

        arena.matches.make_move(record.id, PlayerId(1), "e2e4").expect("legal");
        assert_eq!(arena.matches.move_history(record.id).expect("history").len(), 1);
    }
}
