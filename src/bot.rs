//! Starter kit for writing a bot in Rust.
//!
//! A bot reads one map per turn from stdin and answers with a move on stdout. The map is
//! always addressed to the bot itself: its own head is player one.
//!
//! ```no_run
//! use tron_referee::bot::{self, Board};
//! use tron_referee::grid::Direction;
//!
//! fn which_move(board: &Board) -> Direction {
//!     // `moves` is never empty, it falls back to north when every move is fatal
//!     board.moves()[0]
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     bot::play(which_move)
//! }
//! ```

use std::io::{self, BufRead, Write};

use anyhow::Context;
use rand::{seq::SliceRandom, Rng};

use crate::{
    grid::{Direction, Grid, MapView, Position},
    protocol,
};

/// One turn's map, seen by the bot reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: Grid,
}

impl From<Grid> for Board {
    fn from(grid: Grid) -> Self {
        Board { grid }
    }
}

impl Board {
    /// Reads the next board. `Ok(None)` means the game is over.
    pub fn read<R: BufRead + ?Sized>(reader: &mut R) -> anyhow::Result<Option<Board>> {
        Ok(protocol::read_map(reader)?.map(Board::from))
    }

    /// The underlying grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// This bot's head.
    pub fn me(&self) -> Position {
        self.grid.me()
    }

    /// The opponent's head.
    pub fn them(&self) -> Position {
        self.grid.them()
    }

    /// Walls, trails, both heads, and everything off the board.
    pub fn is_wall(&self, position: Position) -> bool {
        self.grid.is_wall(position.x, position.y)
    }

    /// Only open cells can be entered safely.
    pub fn passable(&self, position: Position) -> bool {
        !self.is_wall(position)
    }

    /// The cell next to `origin` in `direction`.
    pub fn rel(&self, direction: Direction, origin: Position) -> Position {
        origin.step(direction)
    }

    /// The four orthogonal neighbours of `origin`, in direction order.
    pub fn adjacent(&self, origin: Position) -> [Position; 4] {
        Direction::ALL.map(|direction| origin.step(direction))
    }

    /// Moves onto an open cell this turn. When there are none the game is lost anyway and
    /// `[North]` is returned so a bot always has something to send.
    ///
    /// A listed move can still lose: the opponent may enter the same cell, or the cell may
    /// be a dead end.
    pub fn moves(&self) -> Vec<Direction> {
        let me = self.me();
        let passable = Direction::ALL
            .into_iter()
            .filter(|&direction| self.passable(me.step(direction)))
            .collect::<Vec<_>>();
        if passable.is_empty() {
            vec![Direction::North]
        } else {
            passable
        }
    }
}

/// Iterator over the boards of a game, ending when the referee closes the stream.
pub struct Boards<R> {
    reader: R,
}

impl<R: BufRead> Iterator for Boards<R> {
    type Item = anyhow::Result<Board>;

    fn next(&mut self) -> Option<Self::Item> {
        Board::read(&mut self.reader).transpose()
    }
}

/// Boards read from `reader`, one per turn.
pub fn boards<R: BufRead>(reader: R) -> Boards<R> {
    Boards { reader }
}

/// Writes `direction` as its wire digit and flushes.
pub fn send_move<W: Write + ?Sized>(out: &mut W, direction: Direction) -> io::Result<()> {
    writeln!(out, "{}", direction.code())?;
    out.flush()
}

/// Runs a bot on stdin/stdout until the game ends: one call to `which_move` per board.
///
/// # Errors
///
/// When the input is not a valid map or stdout is closed.
pub fn play<F>(mut which_move: F) -> anyhow::Result<()>
where
    F: FnMut(&Board) -> Direction,
{
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for board in boards(stdin.lock()) {
        let board = board.context("invalid input")?;
        send_move(&mut stdout, which_move(&board)).context("could not send move")?;
    }
    Ok(())
}

/// A legal move picked uniformly at random.
pub fn random_move<G: Rng + ?Sized>(board: &Board, rng: &mut G) -> Direction {
    *board
        .moves()
        .choose(rng)
        .unwrap_or(&Direction::North)
}

/// Follows walls: prefers, in its own fixed order, a move whose destination touches a wall.
#[derive(Debug, Clone)]
pub struct WallHugger {
    order: [Direction; 4],
}

impl WallHugger {
    /// Uses `order` as the preference order between directions.
    pub fn new(order: [Direction; 4]) -> Self {
        WallHugger { order }
    }

    /// A preference order drawn at random, as each wallbot instance picks its own.
    pub fn shuffled<G: Rng + ?Sized>(rng: &mut G) -> Self {
        let mut order = Direction::ALL;
        order.shuffle(rng);
        WallHugger { order }
    }

    /// The first preferred move along a wall, else the first legal move.
    pub fn which_move(&self, board: &Board) -> Direction {
        let fallback = board.moves()[0];
        self.order
            .into_iter()
            .find(|&direction| {
                let destination = board.rel(direction, board.me());
                board.passable(destination)
                    && board
                        .adjacent(destination)
                        .into_iter()
                        .any(|position| position != board.me() && board.is_wall(position))
            })
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    const ROOM: &str = "5 4\n#####\n#1  #\n#  2#\n#####\n";

    fn board(text: &str) -> Board {
        Board::from(protocol::parse_map(text).unwrap())
    }

    #[test]
    fn queries() {
        let board = board(ROOM);
        assert_eq!(board.me(), Position::new(1, 1));
        assert_eq!(board.them(), Position::new(3, 2));
        assert!(board.is_wall(Position::new(0, 0)));
        assert!(board.is_wall(Position::new(-1, 7)));
        assert!(board.passable(Position::new(2, 1)));
        assert!(!board.passable(board.them()));
        assert_eq!(
            board.rel(Direction::South, board.me()),
            Position::new(1, 2)
        );
        assert_eq!(
            board.adjacent(Position::new(2, 2)),
            [
                Position::new(2, 1),
                Position::new(3, 2),
                Position::new(2, 3),
                Position::new(1, 2)
            ]
        );
    }

    #[test]
    fn moves_lists_open_neighbours() {
        assert_eq!(board(ROOM).moves(), vec![Direction::East, Direction::South]);
        assert_eq!(board("3 3\n###\n#1#\n#2#\n").moves(), vec![Direction::North]);
    }

    #[test]
    fn boards_stop_at_game_over() {
        let input = format!("{ROOM}{}\n", "3 1\r\n1 2\r");
        let all = boards(input.as_bytes())
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].width(), 3);

        let mut ended = boards("".as_bytes());
        assert!(ended.next().is_none());
        let mut empty_line = boards("\n3 1\n1 2\n".as_bytes());
        assert!(empty_line.next().is_none());
    }

    #[test]
    fn boards_report_bad_input() {
        let mut bad = boards("3 1\n1?2\n".as_bytes());
        assert!(bad.next().unwrap().is_err());
    }

    #[test]
    fn send_move_writes_digit() {
        let mut out = Vec::new();
        send_move(&mut out, Direction::West).unwrap();
        assert_eq!(out, b"4\n");
    }

    #[test]
    fn random_move_is_legal() {
        let board = board(ROOM);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let direction = random_move(&board, &mut rng);
            assert!(board.passable(board.rel(direction, board.me())));
        }
    }

    #[test]
    fn wall_hugger_prefers_walls() {
        // every move from (2,2) ends next to a wall, so the first preference wins
        let board = board("5 5\n#####\n#   #\n# 1 #\n#  2#\n#####\n");
        let hugger = WallHugger::new([
            Direction::East,
            Direction::South,
            Direction::West,
            Direction::North,
        ]);
        let choice = hugger.which_move(&board);
        assert_eq!(choice, Direction::East);

        let open = board_with_open_centre();
        let hugger = WallHugger::new(Direction::ALL);
        assert_eq!(hugger.which_move(&open), Direction::North);
    }

    fn board_with_open_centre() -> Board {
        board("7 7\n#######\n#     #\n#     #\n#  1  #\n#     #\n#    2#\n#######\n")
    }

    #[test]
    fn wall_hugger_falls_back_to_a_legal_move() {
        let board = board_with_open_centre();
        let hugger = WallHugger::shuffled(&mut StdRng::seed_from_u64(1));
        let choice = hugger.which_move(&board);
        assert!(board.moves().contains(&choice));
    }
}
