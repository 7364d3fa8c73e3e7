//! Plays a random legal move every turn.

use tron_referee::bot;

fn main() -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    bot::play(|board| bot::random_move(board, &mut rng))
}
