//! Match state machine.
//!
//! Every operation runs under the match's own lock: load the row, check the
//! preconditions, mutate a clone, commit. An operation that fails returns
//! before the commit, so the stored match is exactly as it was. A terminal
//! transition is committed in the same store write as the rating rows it
//! produces, so a match is never finished without being rated.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::chess_clock::{elapsed_seconds, tick, TimeSource};
use crate::clock::time_control::{GameType, TimeControlTable};
use crate::errors::{ArenaError, ArenaResult, IllegalStateReason, NotFoundError};
use crate::game_state::chess_types::Color;
use crate::matches::match_locks::KeyedLocks;
use crate::matches::match_record::{MatchId, MatchRecord, MatchStatus, MoveLogEntry, PlayerId};
use crate::move_generation::legal_move_apply::apply_move_detailed;
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_move_validate::validate_move;
use crate::move_generation::termination::{evaluate_termination, Termination};
use crate::moves::chess_move::ChessMove;
use crate::notify::notifier::{ArenaEvent, Notifier};
use crate::rating::rating_engine::RatingEngine;
use crate::storage::store_traits::MatchStore;

/// Result of a move submission that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The move was played.
    Applied {
        record: MatchRecord,
        entry: MoveLogEntry,
    },
    /// The mover's clock ran out before the move; the opponent won on time and
    /// the move was not played.
    Flagged(MatchRecord),
}

impl MoveOutcome {
    pub fn record(&self) -> &MatchRecord {
        match self {
            MoveOutcome::Applied { record, .. } => record,
            MoveOutcome::Flagged(record) => record,
        }
    }
}

pub struct MatchService {
    store: Arc<dyn MatchStore>,
    ratings: Arc<RatingEngine>,
    notifier: Arc<dyn Notifier>,
    time_source: Arc<dyn TimeSource>,
    time_controls: TimeControlTable,
    locks: KeyedLocks<MatchId>,
}

impl MatchService {
    pub fn new(
        store: Arc<dyn MatchStore>,
        ratings: Arc<RatingEngine>,
        notifier: Arc<dyn Notifier>,
        time_source: Arc<dyn TimeSource>,
        time_controls: TimeControlTable,
    ) -> Self {
        Self {
            store,
            ratings,
            notifier,
            time_source,
            time_controls,
            locks: KeyedLocks::new(),
        }
    }

    pub fn create_match(&self, player1: PlayerId, player2: PlayerId, game_type: GameType) -> ArenaResult<MatchRecord> {
        if player1 == player2 {
            return Err(IllegalStateReason::SelfPairing.into());
        }
        let record = MatchRecord::new(
            player1,
            player2,
            game_type,
            self.time_controls.for_game_type(game_type),
            self.time_source.now(),
        );
        self.store.insert_match(record.clone())?;

        info!(match_id = %record.id, %player1, %player2, %game_type, "match created");
        Ok(record)
    }

    pub fn get_match(&self, match_id: MatchId) -> ArenaResult<MatchRecord> {
        self.load(match_id)
    }

    pub fn matches_for_player(&self, player: PlayerId) -> ArenaResult<Vec<MatchRecord>> {
        self.store.matches_for_player(player)
    }

    /// Moves in ply order. Available in every state.
    pub fn move_history(&self, match_id: MatchId) -> ArenaResult<Vec<MoveLogEntry>> {
        self.load(match_id)?;
        self.store.move_log(match_id)
    }

    /// Plays `move_text` for `player`.
    ///
    /// The mover's clock is charged first. A fallen flag ends the match in the
    /// opponent's favour and is reported as [`MoveOutcome::Flagged`]; the move
    /// text is never looked at in that case.
    pub fn make_move(&self, match_id: MatchId, player: PlayerId, move_text: &str) -> ArenaResult<MoveOutcome> {
        self.locks.with_lock(&match_id, || {
            let current = self.load(match_id)?;
            require_ongoing(&current)?;

            let mover = current.color_of(player).ok_or(IllegalStateReason::TurnViolation)?;
            if mover != current.position.side_to_move {
                return Err(IllegalStateReason::TurnViolation.into());
            }

            let now = self.time_source.now();
            let elapsed = elapsed_seconds(current.clock_reference(), now);
            let increment = self.time_controls.for_game_type(current.game_type).increment_seconds;
            let clock = tick(current.remaining_seconds(mover), elapsed, increment);

            if clock.expired {
                let mut next = current.clone();
                next.set_remaining_seconds(mover, 0);
                next.status = next.win_for(next.opponent_of(player));
                next.last_move_at = Some(now);
                finish(&mut next, now);
                self.commit(&next, None)?;

                warn!(%match_id, %player, elapsed, "flag fell before the move");
                return Ok(MoveOutcome::Flagged(next));
            }

            let mv = ChessMove::parse(move_text)?;
            validate_move(&current.position, mv)?;
            let applied = apply_move_detailed(&current.position, mv)?;

            let mut next = current.clone();
            next.ply += 1;
            next.position = applied.position;
            next.last_move = Some(mv);
            next.last_move_at = Some(now);
            next.updated_at = now;
            next.set_remaining_seconds(mover, clock.remaining);

            let termination = evaluate_termination(&next.position);
            let entry = MoveLogEntry {
                match_id,
                ply: next.ply,
                mv,
                piece: applied.moved.kind,
                position_after: next.position.clone(),
                is_check: is_king_in_check(&next.position, next.position.side_to_move),
                is_checkmate: termination == Some(Termination::Checkmate),
                played_at: now,
            };

            if let Some(reason) = termination {
                next.status = match reason {
                    Termination::Checkmate => next.win_for(player),
                    Termination::Stalemate | Termination::InsufficientMaterial | Termination::FiftyMoveRule => {
                        MatchStatus::Draw
                    }
                };
                finish(&mut next, now);
            }

            self.commit(&next, Some(&entry))?;
            debug!(%match_id, %player, mv = %mv, ply = next.ply, "move applied");

            if let Some(reason) = termination {
                info!(%match_id, ?reason, status = ?next.status, "match finished");
            }

            Ok(MoveOutcome::Applied { record: next, entry })
        })
    }

    /// `player` concedes; the opponent wins.
    pub fn resign(&self, match_id: MatchId, player: PlayerId) -> ArenaResult<MatchRecord> {
        self.transition(match_id, player, |record, now| {
            record.status = record.win_for(record.opponent_of(player));
            Ok(Some(now))
        })
    }

    pub fn offer_draw(&self, match_id: MatchId, player: PlayerId) -> ArenaResult<MatchRecord> {
        self.transition(match_id, player, |record, _| {
            if record.draw_offered_by.is_some() {
                return Err(IllegalStateReason::DrawOfferConflict.into());
            }
            record.draw_offered_by = Some(player);
            Ok(None)
        })
    }

    pub fn accept_draw(&self, match_id: MatchId, player: PlayerId) -> ArenaResult<MatchRecord> {
        self.transition(match_id, player, |record, now| {
            match record.draw_offered_by {
                None => return Err(IllegalStateReason::NoOfferPending.into()),
                Some(offerer) if offerer == player => return Err(IllegalStateReason::SelfAccept.into()),
                Some(_) => {}
            }
            record.status = MatchStatus::Draw;
            record.draw_offered_by = None;
            Ok(Some(now))
        })
    }

    /// Clears a pending offer. Without one this changes nothing.
    pub fn decline_draw(&self, match_id: MatchId, player: PlayerId) -> ArenaResult<MatchRecord> {
        self.locks.with_lock(&match_id, || {
            let current = self.load(match_id)?;
            require_ongoing(&current)?;
            require_participant(&current, player)?;
            if current.draw_offered_by.is_none() {
                return Ok(current);
            }

            let mut next = current;
            next.draw_offered_by = None;
            next.updated_at = self.time_source.now();
            self.commit(&next, None)?;
            Ok(next)
        })
    }

    /// Administrative stop. The match becomes `Abandoned` and nobody is rated.
    pub fn abandon(&self, match_id: MatchId) -> ArenaResult<MatchRecord> {
        self.locks.with_lock(&match_id, || {
            let current = self.load(match_id)?;
            require_ongoing(&current)?;

            let now = self.time_source.now();
            let mut next = current;
            next.status = MatchStatus::Abandoned;
            next.draw_offered_by = None;
            finish(&mut next, now);
            self.commit(&next, None)?;

            info!(%match_id, "match abandoned");
            Ok(next)
        })
    }

    /// Shared body of resign and the draw-offer operations. `apply` edits the
    /// clone and returns the finish time when the match became terminal.
    fn transition(
        &self,
        match_id: MatchId,
        player: PlayerId,
        apply: impl FnOnce(&mut MatchRecord, DateTime<Utc>) -> ArenaResult<Option<DateTime<Utc>>>,
    ) -> ArenaResult<MatchRecord> {
        self.locks.with_lock(&match_id, || {
            let current = self.load(match_id)?;
            require_ongoing(&current)?;
            require_participant(&current, player)?;

            let now = self.time_source.now();
            let mut next = current.clone();
            let finished = apply(&mut next, now)?;
            next.updated_at = now;
            if let Some(at) = finished {
                finish(&mut next, at);
            }
            self.commit(&next, None)?;

            if next.status.is_terminal() {
                info!(%match_id, %player, status = ?next.status, "match finished");
            }
            Ok(next)
        })
    }

    fn load(&self, match_id: MatchId) -> ArenaResult<MatchRecord> {
        self.store
            .load_match(match_id)?
            .ok_or(ArenaError::NotFound(NotFoundError::Match(match_id)))
    }

    /// Stores `record`, its new log entry and any rating rows its result
    /// produces in one write, then publishes the change.
    fn commit(&self, record: &MatchRecord, entry: Option<&MoveLogEntry>) -> ArenaResult<()> {
        self.ratings
            .settle(record, |rows| self.store.commit_match(record, entry, rows))?;
        self.notifier.notify(ArenaEvent::game_update(record));
        Ok(())
    }
}

fn finish(record: &mut MatchRecord, now: DateTime<Utc>) {
    record.finished_at = Some(now);
    record.updated_at = now;
}

fn require_ongoing(record: &MatchRecord) -> ArenaResult<()> {
    if record.status == MatchStatus::Ongoing {
        Ok(())
    } else {
        Err(IllegalStateReason::NotOngoing.into())
    }
}

fn require_participant(record: &MatchRecord, player: PlayerId) -> ArenaResult<Color> {
    record
        .color_of(player)
        .ok_or_else(|| IllegalStateReason::NotAParticipant.into())
}
