//! # Tron Referee
//!
//! Referee for two-player Tron (light cycles) between bot programs.
//!
//! Each bot is a separate process speaking a line protocol on its stdin and stdout. Every turn,
//! the referee sends each bot the whole map, addressed to that bot, and waits a bounded time
//! for a one-digit move. The first player to crash loses; crashing together or entering the
//! same cell is a draw.
//!
//! It provides:
//! - Map parsing and rendering ([`protocol`]) over a grid with permanent trails ([`grid`])
//! - A process adapter with bounded, non-blocking move queries ([`arbiter`])
//! - The match loop and result announcements ([`referee`])
//! - Optional per-bot memory and CPU limits through Linux cgroups v2 ([`limits`])
//! - A starter kit for bots written in Rust ([`bot`])
//!
//! # Documentation Overview
//!
//! - For the match rules and the output of the referee, see the [`referee`] module.
//! - For the map format and the wire protocol, see [`protocol`].
//! - For referee behavior and resource limits, see
//!   [`Configuration`](crate::configuration::Configuration) and [`limits`].
//! - To plug in players that are not processes, implement
//!   [`Contestant`](crate::game_interface::Contestant).
//!
//! # Usage Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tron_referee::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Half a second per move, no pause between turns
//!     let limits = BotLimitsBuilder::new()
//!         .with_move_timeout(Duration::from_millis(500))
//!         .with_turn_delay(Duration::ZERO)
//!         .build()?;
//!
//!     // Only print the result
//!     let config = Configuration::new().with_verbose(false);
//!
//!     let referee = Referee::new(config, limits)?;
//!     let report = referee.run("maps/empty-room.txt", "./randbot", "python3 mybot.py")?;
//!     match report.outcome.winner() {
//!         Some(player) => println!("{player} won after {} turns", report.turns),
//!         None => println!("draw after {} turns", report.turns),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Bot Requirements
//!
//! - Read a map (header line `W H`, then `H` rows of `W` cells) from stdin every turn; the
//!   bot's own head is `1`, the opponent's `2`, walls and trails `#`
//! - Answer with one digit: `1` north, `2` east, `3` south, `4` west
//! - Answer within the move timeout, otherwise the bot crashes
//! - End of input means the game is over
#![warn(missing_docs)]

pub mod arbiter;
pub mod bot;
mod cgroup_manager;
pub mod configuration;
pub mod game_interface;
pub mod grid;
pub mod limits;
mod logger;
pub mod protocol;
pub mod referee;
pub use anyhow;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use tron_referee::prelude::*;
/// ```
pub mod prelude {
    pub use crate::configuration::Configuration;
    pub use crate::game_interface::Contestant;
    pub use crate::grid::{Direction, Grid, Player};
    pub use crate::limits::{BotLimits, BotLimitsBuilder};
    pub use crate::referee::{MatchOutcome, MatchReport, Referee};
}
