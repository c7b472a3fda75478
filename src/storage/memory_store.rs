use std::collections::HashMap;

use parking_lot::Mutex;

use crate::clock::time_control::GameType;
use crate::errors::{ArenaError, ArenaResult};
use crate::matches::match_record::{MatchId, MatchRecord, MoveLogEntry, PlayerId};
use crate::matchmaking::queue::QueueEntry;
use crate::rating::rating_engine::RatingRecord;
use crate::storage::store_traits::{MatchStore, QueueStore, QueueUpsert, RatingStore};

#[derive(Debug, Default)]
struct MatchTables {
    matches: HashMap<MatchId, MatchRecord>,
    logs: HashMap<MatchId, Vec<MoveLogEntry>>,
}

/// In-process store backing every collaborator trait.
///
/// A match commit takes the match table lock before the rating table lock;
/// every other method holds a single table lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    matches: Mutex<MatchTables>,
    ratings: Mutex<HashMap<(PlayerId, GameType), RatingRecord>>,
    queue: Mutex<HashMap<PlayerId, QueueEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes rating rows directly, outside any match.
    #[cfg(test)]
    pub(crate) fn seed_ratings(&self, records: &[RatingRecord]) {
        let mut ratings = self.ratings.lock();
        for record in records {
            ratings.insert((record.player, record.game_type), record.clone());
        }
    }
}

impl MatchStore for MemoryStore {
    fn insert_match(&self, record: MatchRecord) -> ArenaResult<()> {
        let mut tables = self.matches.lock();
        if tables.matches.contains_key(&record.id) {
            return Err(ArenaError::Storage(format!("match {} already exists", record.id)));
        }
        tables.logs.insert(record.id, Vec::new());
        tables.matches.insert(record.id, record);
        Ok(())
    }

    fn load_match(&self, id: MatchId) -> ArenaResult<Option<MatchRecord>> {
        Ok(self.matches.lock().matches.get(&id).cloned())
    }

    fn commit_match(
        &self,
        record: &MatchRecord,
        appended: Option<&MoveLogEntry>,
        ratings: &[RatingRecord],
    ) -> ArenaResult<()> {
        let mut tables = self.matches.lock();
        if !tables.matches.contains_key(&record.id) {
            return Err(ArenaError::Storage(format!("match {} was never inserted", record.id)));
        }

        if !ratings.is_empty() {
            let mut rating_table = self.ratings.lock();
            for row in ratings {
                rating_table.insert((row.player, row.game_type), row.clone());
            }
        }
        if let Some(entry) = appended {
            tables.logs.entry(record.id).or_default().push(entry.clone());
        }
        tables.matches.insert(record.id, record.clone());
        Ok(())
    }

    fn matches_for_player(&self, player: PlayerId) -> ArenaResult<Vec<MatchRecord>> {
        let tables = self.matches.lock();
        let mut found: Vec<MatchRecord> = tables
            .matches
            .values()
            .filter(|record| record.is_participant(player))
            .cloned()
            .collect();
        found.sort_by_key(|record| record.created_at);
        Ok(found)
    }

    fn move_log(&self, id: MatchId) -> ArenaResult<Vec<MoveLogEntry>> {
        let tables = self.matches.lock();
        Ok(tables.logs.get(&id).cloned().unwrap_or_default())
    }
}

impl RatingStore for MemoryStore {
    fn load_rating(&self, player: PlayerId, game_type: GameType) -> ArenaResult<Option<RatingRecord>> {
        Ok(self.ratings.lock().get(&(player, game_type)).cloned())
    }

    fn ratings_for_player(&self, player: PlayerId) -> ArenaResult<Vec<RatingRecord>> {
        let ratings = self.ratings.lock();
        let mut found: Vec<RatingRecord> = ratings
            .values()
            .filter(|record| record.player == player)
            .cloned()
            .collect();
        found.sort_by_key(|record| record.game_type);
        Ok(found)
    }
}

impl QueueStore for MemoryStore {
    fn upsert_for_player(&self, entry: QueueEntry) -> ArenaResult<QueueUpsert> {
        let mut queue = self.queue.lock();
        match queue.get(&entry.player) {
            Some(existing) if existing.game_type == entry.game_type => {
                Ok(QueueUpsert::AlreadyQueued(existing.clone()))
            }
            _ => Ok(match queue.insert(entry.player, entry) {
                Some(previous) => QueueUpsert::Replaced(previous),
                None => QueueUpsert::Inserted,
            }),
        }
    }

    fn entry_for_player(&self, player: PlayerId) -> ArenaResult<Option<QueueEntry>> {
        Ok(self.queue.lock().get(&player).cloned())
    }

    fn entries_for(&self, game_type: GameType) -> ArenaResult<Vec<QueueEntry>> {
        let queue = self.queue.lock();
        let mut found: Vec<QueueEntry> = queue
            .values()
            .filter(|entry| entry.game_type == game_type)
            .cloned()
            .collect();
        found.sort_by_key(|entry| (entry.enqueued_at, entry.player));
        Ok(found)
    }

    fn remove_player(&self, player: PlayerId) -> ArenaResult<Option<QueueEntry>> {
        Ok(self.queue.lock().remove(&player))
    }

    fn take_pair(&self, first: &QueueEntry, second: &QueueEntry) -> ArenaResult<bool> {
        let mut queue = self.queue.lock();
        let both_present = queue.get(&first.player) == Some(first) && queue.get(&second.player) == Some(second);
        if both_present {
            queue.remove(&first.player);
            queue.remove(&second.player);
        }
        Ok(both_present)
    }

    fn restore_entry(&self, entry: QueueEntry) -> ArenaResult<bool> {
        let mut queue = self.queue.lock();
        if queue.contains_key(&entry.player) {
            return Ok(false);
        }
        queue.insert(entry.player, entry);
        Ok(true)
    }
}
