//! Persistence collaborators.
//!
//! The services own no data; every read and write goes through these traits.
//! Implementations must be safe to share between threads. A call that returns
//! an error must not have written anything.

use crate::clock::time_control::GameType;
use crate::errors::ArenaResult;
use crate::matches::match_record::{MatchId, MatchRecord, MoveLogEntry, PlayerId};
use crate::matchmaking::queue::QueueEntry;
use crate::rating::rating_engine::RatingRecord;

pub trait MatchStore: Send + Sync {
    fn insert_match(&self, record: MatchRecord) -> ArenaResult<()>;

    fn load_match(&self, id: MatchId) -> ArenaResult<Option<MatchRecord>>;

    /// Replaces the stored row, appends `appended` to its move log and stores
    /// the `ratings` rows the match result produced, all as one write.
    fn commit_match(
        &self,
        record: &MatchRecord,
        appended: Option<&MoveLogEntry>,
        ratings: &[RatingRecord],
    ) -> ArenaResult<()>;

    fn matches_for_player(&self, player: PlayerId) -> ArenaResult<Vec<MatchRecord>>;

    /// Log entries in ply order.
    fn move_log(&self, id: MatchId) -> ArenaResult<Vec<MoveLogEntry>>;
}

/// Read side of the rating table. Rows are written by
/// [`MatchStore::commit_match`] together with the match that produced them.
pub trait RatingStore: Send + Sync {
    fn load_rating(&self, player: PlayerId, game_type: GameType) -> ArenaResult<Option<RatingRecord>>;

    fn ratings_for_player(&self, player: PlayerId) -> ArenaResult<Vec<RatingRecord>>;
}

/// Result of [`QueueStore::upsert_for_player`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueUpsert {
    Inserted,
    /// The player already waits for the same game type; nothing changed.
    AlreadyQueued(QueueEntry),
    /// The player's entry for another game type was replaced.
    Replaced(QueueEntry),
}

pub trait QueueStore: Send + Sync {
    /// Atomically makes `entry` the player's only entry, unless the player is
    /// already queued for the same game type.
    fn upsert_for_player(&self, entry: QueueEntry) -> ArenaResult<QueueUpsert>;

    fn entry_for_player(&self, player: PlayerId) -> ArenaResult<Option<QueueEntry>>;

    fn entries_for(&self, game_type: GameType) -> ArenaResult<Vec<QueueEntry>>;

    fn remove_player(&self, player: PlayerId) -> ArenaResult<Option<QueueEntry>>;

    /// Removes both entries iff both are still stored unchanged. Returns
    /// whether the pair was taken.
    fn take_pair(&self, first: &QueueEntry, second: &QueueEntry) -> ArenaResult<bool>;

    /// Puts a taken entry back unless the player has queued again since.
    /// Returns whether it was restored.
    fn restore_entry(&self, entry: QueueEntry) -> ArenaResult<bool>;
}
