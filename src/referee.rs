//! The match loop.
//!
//! A [`Referee`] loads a map, starts both bots and plays turns until the match is decided:
//!
//! 1. wait the configured delay,
//! 2. ask player one for a move on the map, then player two on the swapped map,
//! 3. apply player one's move, then player two's,
//! 4. stop on a collision or a crash, otherwise print the map and go on.
//!
//! The final line on stdout is always one of the announcements of [`MatchOutcome`].
//!
//! # Example
//!
//! ```no_run
//! use tron_referee::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let limits = BotLimitsBuilder::new().build()?;
//!     let referee = Referee::new(Configuration::new(), limits)?;
//!     let report = referee.run("maps/empty-room.txt", "./randbot", "./wallbot")?;
//!     println!("{} turns", report.turns);
//!     Ok(())
//! }
//! ```

use std::{
    fmt,
    io::{self, Write},
    path::Path,
    thread,
};

use anyhow::Context;
use tracing::{debug, info, instrument, trace};

use crate::{
    arbiter::Arbiter,
    configuration::Configuration,
    game_interface::Contestant,
    grid::{Grid, MoveOutcome, Player},
    limits::BotLimits,
    logger::init_logger,
    protocol,
};

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Both heads entered the same cell.
    Collision,
    /// Both players crashed in the same turn.
    BothCrashed,
    /// The other player crashed.
    Winner(Player),
}

impl MatchOutcome {
    /// The line printed at the end of the match.
    pub fn announcement(self) -> &'static str {
        match self {
            MatchOutcome::Collision => "Players collided. Draw!",
            MatchOutcome::BothCrashed => "Both players crashed. Draw!",
            MatchOutcome::Winner(Player::One) => "Player One Wins!",
            MatchOutcome::Winner(Player::Two) => "Player Two Wins!",
        }
    }

    /// The winner, if the match was not a draw.
    pub fn winner(self) -> Option<Player> {
        match self {
            MatchOutcome::Winner(player) => Some(player),
            MatchOutcome::Collision | MatchOutcome::BothCrashed => None,
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.announcement())
    }
}

/// Summary of a finished match.
#[derive(Debug, Clone)]
pub struct MatchReport {
    /// How it ended.
    pub outcome: MatchOutcome,
    /// Turns played, the deciding one included.
    pub turns: usize,
    /// The grid after the deciding turn.
    pub final_grid: Grid,
}

/// Decides whether the turn that produced `grid` ends the match.
///
/// A collision wins over crashes, and a double crash over a single one.
pub fn judge(grid: &Grid, one: MoveOutcome, two: MoveOutcome) -> Option<MatchOutcome> {
    if grid.heads_collided() {
        return Some(MatchOutcome::Collision);
    }
    match (one.is_crashed(), two.is_crashed()) {
        (true, true) => Some(MatchOutcome::BothCrashed),
        (true, false) => Some(MatchOutcome::Winner(Player::Two)),
        (false, true) => Some(MatchOutcome::Winner(Player::One)),
        (false, false) => None,
    }
}

/// Runs matches with fixed settings.
#[derive(Debug, Clone)]
pub struct Referee {
    config: Configuration,
    limits: BotLimits,
}

impl Referee {
    /// Creates a referee. Installs the file logger when `config` asks for it.
    ///
    /// # Errors
    ///
    /// When the log file or the global subscriber cannot be set up.
    #[instrument(skip_all)]
    pub fn new(config: Configuration, limits: BotLimits) -> anyhow::Result<Referee> {
        if config.log {
            init_logger()?;
        }
        trace!(?config, ?limits);
        Ok(Referee { config, limits })
    }

    /// Plays one match on the map at `map` between two bot commands, printing to stdout.
    ///
    /// # Errors
    ///
    /// When the map cannot be loaded, a bot cannot be started, or stdout is closed. Bots
    /// misbehaving during the match lose it; they never cause an error.
    pub fn run(
        &self,
        map: impl AsRef<Path>,
        player_one: &str,
        player_two: &str,
    ) -> anyhow::Result<MatchReport> {
        let grid = Grid::load(map)?;
        let one = Arbiter::start("player one", player_one, &self.limits, self.config)
            .context("problem while starting program 1")?;
        let two = Arbiter::start("player two", player_two, &self.limits, self.config)
            .context("problem while starting program 2")?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.play(grid, one, two, &mut out)
    }

    /// Plays `grid` to the end between two contestants, writing maps and the result to `out`.
    ///
    /// Both contestants are destroyed before returning, even on error.
    pub fn play<A, B, W>(
        &self,
        mut grid: Grid,
        mut one: A,
        mut two: B,
        out: &mut W,
    ) -> anyhow::Result<MatchReport>
    where
        A: Contestant,
        B: Contestant,
        W: Write + ?Sized,
    {
        let played = self.play_turns(&mut grid, &mut one, &mut two, out);
        one.destroy();
        two.destroy();
        let (outcome, turns) = played?;

        info!(turns, "{outcome}");
        writeln!(out, "{outcome}").context("could not print result")?;
        out.flush().context("could not print result")?;
        Ok(MatchReport {
            outcome,
            turns,
            final_grid: grid,
        })
    }

    fn play_turns<A, B, W>(
        &self,
        grid: &mut Grid,
        one: &mut A,
        two: &mut B,
        out: &mut W,
    ) -> anyhow::Result<(MatchOutcome, usize)>
    where
        A: Contestant,
        B: Contestant,
        W: Write + ?Sized,
    {
        let timeout = self.limits.move_timeout();
        let delay = self.limits.turn_delay();
        self.print_grid(grid, out)?;

        let mut turns = 0;
        loop {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            turns += 1;

            let first = one.get_move(&protocol::encode(&*grid), timeout);
            let second = two.get_move(&protocol::encode(&grid.swapped()), timeout);
            let (one_outcome, two_outcome) = grid.apply_turn(first, second);
            debug!(
                turn = turns,
                ?first,
                ?second,
                ?one_outcome,
                ?two_outcome,
                walls = grid.wall_count(),
                "turn played"
            );

            if let Some(outcome) = judge(grid, one_outcome, two_outcome) {
                return Ok((outcome, turns));
            }
            self.print_grid(grid, out)?;
        }
    }

    fn print_grid<W: Write + ?Sized>(&self, grid: &Grid, out: &mut W) -> anyhow::Result<()> {
        if self.config.verbose {
            write!(out, "{grid}").context("could not print map")?;
            out.flush().context("could not print map")?;
        }
        Ok(())
    }
}
