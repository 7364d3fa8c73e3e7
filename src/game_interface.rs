//! What the match loop needs from a player.
//!
//! The referee talks to both players through [`Contestant`]. Bot processes implement it via
//! [`Arbiter`](crate::arbiter::Arbiter); [`InProcess`] wraps a plain function so a strategy can
//! play without spawning anything.

use std::time::Duration;

use tracing::warn;

use crate::{bot::Board, grid::Direction, protocol};

/// A player the match loop can ask for moves.
pub trait Contestant {
    /// Sends the encoded `map` (already addressed to this player) and waits up to `timeout`
    /// for an answer.
    ///
    /// `None` means the player crashed this turn: no valid move in time, or the map could not
    /// be delivered.
    fn get_move(&mut self, map: &str, timeout: Duration) -> Option<Direction>;

    /// Ends the player. Called once the match is decided; must tolerate repeated calls.
    fn destroy(&mut self);
}

impl<C: Contestant + ?Sized> Contestant for Box<C> {
    fn get_move(&mut self, map: &str, timeout: Duration) -> Option<Direction> {
        (**self).get_move(map, timeout)
    }

    fn destroy(&mut self) {
        (**self).destroy();
    }
}

/// A strategy running inside the referee process.
///
/// The map is decoded back into a [`Board`] exactly as a bot process would read it. The
/// timeout is not enforced: the function runs to completion.
pub struct InProcess<F> {
    strategy: F,
}

impl<F> InProcess<F>
where
    F: FnMut(&Board) -> Option<Direction>,
{
    /// Wraps `strategy`.
    pub fn new(strategy: F) -> Self {
        InProcess { strategy }
    }
}

impl<F> Contestant for InProcess<F>
where
    F: FnMut(&Board) -> Option<Direction>,
{
    fn get_move(&mut self, map: &str, _timeout: Duration) -> Option<Direction> {
        match protocol::parse_map(map) {
            Ok(grid) => (self.strategy)(&Board::from(grid)),
            Err(e) => {
                warn!("in-process player got an unreadable map: {e:#}");
                None
            }
        }
    }

    fn destroy(&mut self) {}
}
