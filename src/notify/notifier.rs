//! Outbound events for players and match watchers.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::time_control::GameType;
use crate::matches::match_record::{MatchId, MatchRecord, MatchStatus, PlayerId};
use crate::moves::chess_move::ChessMove;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ArenaEvent {
    /// Sent to each paired player.
    MatchCreated {
        recipient: PlayerId,
        match_id: MatchId,
        opponent: PlayerId,
        game_type: GameType,
    },
    /// Sent to the match channel after every committed change.
    GameUpdate {
        match_id: MatchId,
        status: MatchStatus,
        ply: u32,
        position: String,
        last_move: Option<ChessMove>,
        draw_offered_by: Option<PlayerId>,
        player1_remaining_seconds: u32,
        player2_remaining_seconds: u32,
    },
}

impl ArenaEvent {
    pub fn game_update(record: &MatchRecord) -> Self {
        ArenaEvent::GameUpdate {
            match_id: record.id,
            status: record.status,
            ply: record.ply,
            position: record.position.to_fen(),
            last_move: record.last_move,
            draw_offered_by: record.draw_offered_by,
            player1_remaining_seconds: record.player1_remaining_seconds,
            player2_remaining_seconds: record.player2_remaining_seconds,
        }
    }
}

/// Delivery is best effort; a notifier must not fail the operation that
/// produced the event.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: ArenaEvent);
}

/// Writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: ArenaEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => info!(target: "chess_arena::events", %payload, "event"),
            Err(err) => warn!(target: "chess_arena::events", error = %err, "event could not be encoded"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ArenaEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ArenaEvent> {
        self.events.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: ArenaEvent) {
        self.events.lock().push(event);
    }
}
