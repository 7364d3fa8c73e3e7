//! Hugs walls, with a direction preference drawn once at startup.

use tron_referee::bot::{self, WallHugger};

fn main() -> anyhow::Result<()> {
    let hugger = WallHugger::shuffled(&mut rand::thread_rng());
    bot::play(|board| hugger.which_move(board))
}
