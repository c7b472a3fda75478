//! Line-oriented console front-end.
//!
//! Reads one command per line, runs it against an [`Arena`] and prints the
//! result. Failures are printed as `error: ...` and never end the loop.

use std::io::{self, BufRead, Write};

use crate::arena::Arena;
use crate::clock::time_control::GameType;
use crate::config::ArenaConfig;
use crate::errors::ArenaError;
use crate::game_state::position::Position;
use crate::matches::match_lifecycle::MoveOutcome;
use crate::matches::match_record::{MatchId, MatchRecord, PlayerId};
use crate::move_generation::perft::perft_multi_threaded;
use crate::utils::render_game_state::render_game_state;

const HELP: &str = "\
commands:
  join <player> <classical|rapid|blitz|bullet>
  leave <player>
  queue <game-type>
  new <player1> <player2> <game-type>
  move <match> <player> <move>
  resign|offer|accept|decline <match> <player>
  abandon <match>
  show <match>
  history <match>
  rating <player>
  perft <depth> [record]
  quit";

pub fn run_stdio_loop(config: ArenaConfig) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut console = ConsoleState::new(Arena::with_system_clock(config));

    for line in stdin.lock().lines() {
        let line = line?;
        let should_quit = console.handle_command(&line, &mut stdout)?;
        stdout.flush()?;
        if should_quit {
            break;
        }
    }

    Ok(())
}

struct ConsoleState {
    arena: Arena,
}

impl ConsoleState {
    fn new(arena: Arena) -> Self {
        Self { arena }
    }

    fn handle_command(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let result = match cmd {
            "quit" | "exit" => return Ok(true),
            "help" => Ok(format!("{HELP}\n")),
            "join" => self.join(&args),
            "leave" => self.leave(&args),
            "queue" => self.queue(&args),
            "new" => self.new_match(&args),
            "move" => self.make_move(&args),
            "resign" | "offer" | "accept" | "decline" => self.draw_or_resign(cmd, &args),
            "abandon" => self.abandon(&args),
            "show" => self.show(&args),
            "history" => self.history(&args),
            "rating" => self.rating(&args),
            "perft" => self.perft(&args),
            _ => Err(format!("unknown command '{cmd}', try 'help'")),
        };

        match result {
            Ok(text) => write!(out, "{text}")?,
            Err(message) => writeln!(out, "error: {message}")?,
        }
        Ok(false)
    }

    fn join(&self, args: &[&str]) -> Result<String, String> {
        let player = player_arg(args, 0)?;
        let game_type = game_type_arg(args, 1)?;

        match self.arena.queue.join(player, game_type).map_err(|err| err.to_string())? {
            Some(record) => Ok(match_line("paired", &record)),
            None => Ok(format!("queued {player} for {game_type}\n")),
        }
    }

    fn leave(&self, args: &[&str]) -> Result<String, String> {
        let player = player_arg(args, 0)?;
        self.arena.queue.leave(player).map_err(|err| err.to_string())?;
        Ok(format!("left {player}\n"))
    }

    fn queue(&self, args: &[&str]) -> Result<String, String> {
        let game_type = game_type_arg(args, 0)?;
        let entries = self
            .arena
            .queue
            .queued_entries(game_type)
            .map_err(|err| err.to_string())?;
        Ok(entries
            .iter()
            .map(|entry| format!("{} {}\n", entry.player, entry.rating))
            .collect())
    }

    fn new_match(&self, args: &[&str]) -> Result<String, String> {
        let player1 = player_arg(args, 0)?;
        let player2 = player_arg(args, 1)?;
        let game_type = game_type_arg(args, 2)?;

        let record = self
            .arena
            .matches
            .create_match(player1, player2, game_type)
            .map_err(|err| err.to_string())?;
        Ok(match_line("created", &record))
    }

    fn make_move(&self, args: &[&str]) -> Result<String, String> {
        let match_id = match_arg(args, 0)?;
        let player = player_arg(args, 1)?;
        let text = text_arg(args, 2)?;

        match self.arena.matches.make_move(match_id, player, text).map_err(|err| describe(&err))? {
            MoveOutcome::Applied { record, entry } => {
                let suffix = if entry.is_checkmate {
                    " mate"
                } else if entry.is_check {
                    " check"
                } else {
                    ""
                };
                let mut reply = format!("ok {} {}{suffix}\n", entry.mv, record.position);
                if record.status.is_terminal() {
                    reply.push_str(&format!("result {:?}\n", record.status));
                }
                Ok(reply)
            }
            MoveOutcome::Flagged(record) => Ok(format!("flag fell, result {:?}\n", record.status)),
        }
    }

    fn draw_or_resign(&self, cmd: &str, args: &[&str]) -> Result<String, String> {
        let match_id = match_arg(args, 0)?;
        let player = player_arg(args, 1)?;

        let matches = &self.arena.matches;
        let record = match cmd {
            "resign" => matches.resign(match_id, player),
            "offer" => matches.offer_draw(match_id, player),
            "accept" => matches.accept_draw(match_id, player),
            _ => matches.decline_draw(match_id, player),
        }
        .map_err(|err| describe(&err))?;
        Ok(status_line(&record))
    }

    fn abandon(&self, args: &[&str]) -> Result<String, String> {
        let match_id = match_arg(args, 0)?;
        let record = self.arena.matches.abandon(match_id).map_err(|err| describe(&err))?;
        Ok(status_line(&record))
    }

    fn show(&self, args: &[&str]) -> Result<String, String> {
        let match_id = match_arg(args, 0)?;
        let record = self.arena.matches.get_match(match_id).map_err(|err| describe(&err))?;
        Ok(format!("{}\n{}", render_game_state(&record.position), status_line(&record)))
    }

    fn history(&self, args: &[&str]) -> Result<String, String> {
        let match_id = match_arg(args, 0)?;
        let entries = self
            .arena
            .matches
            .move_history(match_id)
            .map_err(|err| describe(&err))?;
        Ok(entries
            .iter()
            .map(|entry| format!("{} {} {}\n", entry.ply, entry.mv, entry.position_after))
            .collect())
    }

    fn rating(&self, args: &[&str]) -> Result<String, String> {
        let player = player_arg(args, 0)?;
        let records = self
            .arena
            .ratings
            .ratings_for_player(player)
            .map_err(|err| err.to_string())?;

        if records.is_empty() {
            return Ok(format!("{player} unrated ({})\n", self.arena.config.rating.default_rating));
        }
        Ok(records
            .iter()
            .map(|record| {
                format!(
                    "{} {} games={} w={} l={} d={}\n",
                    record.game_type, record.rating, record.games_played, record.wins, record.losses, record.draws
                )
            })
            .collect())
    }

    fn perft(&self, args: &[&str]) -> Result<String, String> {
        let depth = text_arg(args, 0)?
            .parse::<u8>()
            .map_err(|_| "perft needs a depth".to_owned())?;
        let position = if args.len() > 1 {
            Position::from_fen(&args[1..].join(" ")).map_err(|err| err.to_string())?
        } else {
            Position::new_game()
        };

        let counts = perft_multi_threaded(&position, depth).map_err(|err| err.to_string())?;
        Ok(format!(
            "nodes={} captures={} ep={} castles={} promotions={} checks={} mates={}\n",
            counts.nodes,
            counts.captures,
            counts.en_passant,
            counts.castles,
            counts.promotions,
            counts.checks,
            counts.checkmates
        ))
    }
}

fn match_line(verb: &str, record: &MatchRecord) -> String {
    format!(
        "{verb} {} {} white={} black={}\n",
        record.id, record.game_type, record.player1, record.player2
    )
}

fn status_line(record: &MatchRecord) -> String {
    let offer = record
        .draw_offered_by
        .map(|player| format!(" draw-offer={player}"))
        .unwrap_or_default();
    format!(
        "{} {:?} ply={} white={}s black={}s{offer}\n",
        record.id, record.status, record.ply, record.player1_remaining_seconds, record.player2_remaining_seconds
    )
}

/// Reason tags for the rule errors, plain text for everything else.
fn describe(err: &ArenaError) -> String {
    match (err.move_reason(), err.state_reason()) {
        (Some(reason), _) => format!("illegal move: {reason}"),
        (_, Some(reason)) => format!("illegal state: {reason}"),
        _ => err.to_string(),
    }
}

fn text_arg<'a>(args: &[&'a str], index: usize) -> Result<&'a str, String> {
    args.get(index)
        .copied()
        .ok_or_else(|| format!("missing argument {}", index + 1))
}

fn player_arg(args: &[&str], index: usize) -> Result<PlayerId, String> {
    let raw = text_arg(args, index)?;
    raw.parse::<u64>()
        .map(PlayerId)
        .map_err(|_| format!("invalid player id '{raw}'"))
}

fn match_arg(args: &[&str], index: usize) -> Result<MatchId, String> {
    let raw = text_arg(args, index)?;
    raw.parse::<MatchId>()
        .map_err(|_| format!("invalid match id '{raw}'"))
}

fn game_type_arg(args: &[&str], index: usize) -> Result<GameType, String> {
    let raw = text_arg(args, index)?;
    GameType::from_name(raw).ok_or_else(|| format!("unknown game type '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::ConsoleState;
    use crate::arena::Arena;
    use crate::config::ArenaConfig;

    fn run(state: &mut ConsoleState, line: &str) -> String {
        let mut out = Vec::new();
        state.handle_command(line, &mut out).expect("write to buffer");
        String::from_utf8(out).expect("utf-8 output")
    }

    #[test]
    fn pairing_and_moving_through_commands() {
        let mut state = ConsoleState::new(Arena::with_system_clock(ArenaConfig::default()));

        assert_eq!(run(&mut state, "join 1 blitz"), "queued 1 for blitz\n");
        let paired = run(&mut state, "join 2 blitz");
        assert!(paired.starts_with("paired "), "{paired}");
        let match_id = paired.split_whitespace().nth(1).expect("match id").to_owned();

        let reply = run(&mut state, &format!("move {match_id} 1 e2e4"));
        assert_eq!(reply, "ok e2e4 rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1\n");

        let reply = run(&mut state, &format!("move {match_id} 1 d2d4"));
        assert_eq!(reply, "error: illegal state: turn-violation\n");

        let reply = run(&mut state, &format!("move {match_id} 2 e7e4"));
        assert_eq!(reply, "error: illegal move: invalid-piece-movement\n");
    }

    #[test]
    fn bad_arguments_are_reported_not_fatal() {
        let mut state = ConsoleState::new(Arena::with_system_clock(ArenaConfig::default()));
        assert_eq!(run(&mut state, "join x blitz"), "error: invalid player id 'x'\n");
        assert_eq!(run(&mut state, "join 1 armageddon"), "error: unknown game type 'armageddon'\n");
        assert_eq!(run(&mut state, "frobnicate"), "error: unknown command 'frobnicate', try 'help'\n");
        assert_eq!(run(&mut state, "perft 2"), "nodes=400 captures=0 ep=0 castles=0 promotions=0 checks=0 mates=0\n");

        let mut out = Vec::new();
        assert!(state.handle_command("quit", &mut out).expect("write"));
    }
}
