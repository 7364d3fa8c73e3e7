//! The Tron grid: a wall bitmap plus the two light-cycle heads.
//!
//! Cells outside the grid are always walls. A head leaves a permanent trail: every cell a
//! head has occupied, including the one it occupies now, is a wall.
//!
//! Bots always see themselves as player one. The referee gives player two a
//! [`SwappedView`], a borrowed read-only view of the same grid with the heads exchanged.

use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use anyhow::{anyhow, bail, Context};
use tracing::{debug, instrument, trace};

/// One of the two players of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    /// Launched first, queried first, moved first.
    One,
    /// Sees the swapped view of the grid.
    Two,
}

impl Player {
    /// The other player.
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => write!(f, "Player One"),
            Player::Two => write!(f, "Player Two"),
        }
    }
}

/// Zero-based cell coordinates. Signed so that a step off the edge is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Column, growing eastward.
    pub x: i32,
    /// Row, growing southward.
    pub y: i32,
}

impl Position {
    /// Shorthand constructor.
    pub const fn new(x: i32, y: i32) -> Position {
        Position { x, y }
    }

    /// The neighbouring cell in `direction`.
    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.offset();
        Position::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// A move. On the wire, `North`..`West` are the digits `1`..`4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `1`, toward row 0.
    North = 1,
    /// `2`
    East = 2,
    /// `3`
    South = 3,
    /// `4`
    West = 4,
}

impl Direction {
    /// Every direction, in wire-code order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Maps a move code (`1..=4`) to a direction.
    pub fn from_code(code: u8) -> Option<Direction> {
        match code {
            1 => Some(Direction::North),
            2 => Some(Direction::East),
            3 => Some(Direction::South),
            4 => Some(Direction::West),
            _ => None,
        }
    }

    /// Numeric move code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// `(dx, dy)` displacement. North is toward row 0.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "North",
            Direction::East => "East",
            Direction::South => "South",
            Direction::West => "West",
        };
        f.write_str(name)
    }
}

/// Accepts any non-empty string whose first character, upcased, is `N`, `E`, `S` or `W`.
impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = s
            .chars()
            .next()
            .ok_or_else(|| anyhow!("empty move string"))?;
        match first.to_ascii_uppercase() {
            'N' => Ok(Direction::North),
            'E' => Ok(Direction::East),
            'S' => Ok(Direction::South),
            'W' => Ok(Direction::West),
            _ => bail!("invalid move '{s}'"),
        }
    }
}

/// Result of moving one player for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The head moved to an open cell.
    Ok,
    /// Invalid or missing move, wall, or boundary.
    Crashed,
}

impl MoveOutcome {
    /// True for [`MoveOutcome::Crashed`].
    pub fn is_crashed(self) -> bool {
        self == MoveOutcome::Crashed
    }
}

/// Read access to a grid from one player's point of view.
///
/// "Me" is the player the view is addressed to, who is labelled `1` on the wire.
pub trait MapView {
    /// Number of columns.
    fn width(&self) -> usize;
    /// Number of rows.
    fn height(&self) -> usize;
    /// Out-of-bounds coordinates are walls.
    fn is_wall(&self, x: i32, y: i32) -> bool;
    /// Head of the player this view is addressed to.
    fn me(&self) -> Position;
    /// Head of the opponent.
    fn them(&self) -> Position;
}

/// The canonical match state. Only the match loop mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    walls: Vec<bool>,
    heads: [Position; 2],
}

impl Grid {
    /// Builds a grid from a row-major wall bitmap and both heads.
    ///
    /// Head cells are marked as walls.
    ///
    /// # Errors
    ///
    /// When a dimension is zero, the bitmap does not hold `width * height` cells, a head
    /// lies outside the grid, or both heads share a cell.
    pub fn new(
        width: usize,
        height: usize,
        mut walls: Vec<bool>,
        player_one: Position,
        player_two: Position,
    ) -> anyhow::Result<Grid> {
        if width == 0 || height == 0 {
            bail!("grid dimensions must be positive, got {width}x{height}");
        }
        let cells = width
            .checked_mul(height)
            .with_context(|| format!("a {width}x{height} grid is too large"))?;
        if walls.len() != cells {
            bail!("wall bitmap holds {} cells instead of {cells}", walls.len());
        }
        if player_one == player_two {
            bail!("both players start at {player_one}");
        }
        for head in [player_one, player_two] {
            let index = Self::index_of(width, height, head)
                .with_context(|| format!("head {head} is outside the {width}x{height} grid"))?;
            walls[index] = true;
        }
        Ok(Grid {
            width,
            height,
            walls,
            heads: [player_one, player_two],
        })
    }

    /// Reads a map file (see [`crate::protocol`] for the format).
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Grid> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("could not open map file '{}'", path.display()))?;
        let grid = crate::protocol::read_map(&mut BufReader::new(file))
            .and_then(|grid| grid.context("missing header line"))
            .with_context(|| format!("invalid map file '{}'", path.display()))?;
        debug!(width = grid.width, height = grid.height, "map loaded");
        Ok(grid)
    }

    fn index_of(width: usize, height: usize, position: Position) -> Option<usize> {
        let x = usize::try_from(position.x).ok()?;
        let y = usize::try_from(position.y).ok()?;
        (x < width && y < height).then_some(y * width + x)
    }

    /// Current head of `player`.
    pub fn head(&self, player: Player) -> Position {
        self.heads[player.index()]
    }

    /// Number of wall cells inside the grid.
    pub fn wall_count(&self) -> usize {
        self.walls.iter().filter(|&&wall| wall).count()
    }

    /// Moves `player` one cell.
    ///
    /// The origin cell is (and stays) a wall. `None` stands for an invalid move code: the
    /// player crashes in place. A destination that is a wall (or off the grid) also
    /// crashes, and the head stays where it was. A successful move marks the destination.
    pub fn move_player(&mut self, player: Player, direction: Option<Direction>) -> MoveOutcome {
        self.advance(player, direction, None)
    }

    /// Applies one full turn: player one's move, then player two's.
    ///
    /// Player two sees player one's trail, including the cell player one left this turn.
    /// The single exception is the cell player one has just entered: if player two steps
    /// into it too, both heads end on that cell and the caller sees a collision. Two heads
    /// facing each other across one open cell therefore collide; neither wins.
    pub fn apply_turn(
        &mut self,
        one: Option<Direction>,
        two: Option<Direction>,
    ) -> (MoveOutcome, MoveOutcome) {
        let first = self.advance(Player::One, one, None);
        let contested = (!first.is_crashed()).then(|| self.head(Player::One));
        let second = self.advance(Player::Two, two, contested);
        (first, second)
    }

    /// True when both heads share a cell, which only `apply_turn` can produce.
    pub fn heads_collided(&self) -> bool {
        self.heads[0] == self.heads[1]
    }

    fn advance(
        &mut self,
        player: Player,
        direction: Option<Direction>,
        contested: Option<Position>,
    ) -> MoveOutcome {
        let origin = self.head(player);
        self.mark_wall(origin);

        let Some(direction) = direction else {
            trace!(%player, "no valid move code");
            return MoveOutcome::Crashed;
        };

        let destination = origin.step(direction);
        if contested == Some(destination) {
            trace!(%player, %destination, "heads collided");
            self.heads[player.index()] = destination;
            return MoveOutcome::Ok;
        }
        if self.is_wall(destination.x, destination.y) {
            trace!(%player, %origin, %destination, "crashed");
            return MoveOutcome::Crashed;
        }
        self.heads[player.index()] = destination;
        self.mark_wall(destination);
        MoveOutcome::Ok
    }

    fn mark_wall(&mut self, position: Position) {
        if let Some(index) = Self::index_of(self.width, self.height, position) {
            self.walls[index] = true;
        }
    }

    /// Like [`Grid::move_player`], from a raw numeric move code.
    pub fn move_player_code(&mut self, player: Player, code: u8) -> MoveOutcome {
        self.move_player(player, Direction::from_code(code))
    }

    /// The grid as seen by player two: same walls, heads exchanged.
    pub fn swapped(&self) -> SwappedView<'_> {
        SwappedView { grid: self }
    }
}

impl MapView for Grid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn is_wall(&self, x: i32, y: i32) -> bool {
        match Self::index_of(self.width, self.height, Position::new(x, y)) {
            Some(index) => self.walls[index],
            None => true,
        }
    }

    fn me(&self) -> Position {
        self.head(Player::One)
    }

    fn them(&self) -> Position {
        self.head(Player::Two)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::protocol::encode(self))
    }
}

/// Player two's view of a [`Grid`]. Holds a shared borrow, so the grid cannot change while
/// the view is alive and nothing can be moved through it.
#[derive(Debug, Clone, Copy)]
pub struct SwappedView<'a> {
    grid: &'a Grid,
}

impl MapView for SwappedView<'_> {
    fn width(&self) -> usize {
        self.grid.width
    }

    fn height(&self) -> usize {
        self.grid.height
    }

    fn is_wall(&self, x: i32, y: i32) -> bool {
        self.grid.is_wall(x, y)
    }

    fn me(&self) -> Position {
        self.grid.head(Player::Two)
    }

    fn them(&self) -> Position {
        self.grid.head(Player::One)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_map;

    fn corridor() -> Grid {
        parse_map("5 1\n1   2\n").unwrap()
    }

    #[test]
    fn out_of_bounds_is_wall() {
        let grid = corridor();
        assert!(grid.is_wall(-1, 0));
        assert!(grid.is_wall(5, 0));
        assert!(grid.is_wall(0, 1));
        assert!(grid.is_wall(2, -1));
        assert!(!grid.is_wall(2, 0));
    }

    #[test]
    fn heads_start_as_walls() {
        let grid = corridor();
        assert_eq!(grid.head(Player::One), Position::new(0, 0));
        assert_eq!(grid.head(Player::Two), Position::new(4, 0));
        assert!(grid.is_wall(0, 0));
        assert!(grid.is_wall(4, 0));
        assert_eq!(grid.wall_count(), 2);
    }

    #[test]
    fn move_leaves_trail() {
        let mut grid = corridor();
        assert_eq!(
            grid.move_player(Player::One, Some(Direction::East)),
            MoveOutcome::Ok
        );
        assert_eq!(grid.head(Player::One), Position::new(1, 0));
        assert!(grid.is_wall(0, 0));

        grid.move_player(Player::One, Some(Direction::East));
        assert!(grid.is_wall(1, 0));
        assert_eq!(grid.head(Player::One), Position::new(2, 0));
    }

    #[test]
    fn crash_into_boundary_keeps_head() {
        let mut grid = corridor();
        let outcome = grid.move_player(Player::One, Some(Direction::North));
        assert!(outcome.is_crashed());
        assert_eq!(grid.head(Player::One), Position::new(0, 0));
    }

    #[test]
    fn invalid_code_crashes_and_marks_origin() {
        let mut grid = parse_map("3 1\n1 2\n").unwrap();
        grid.move_player(Player::One, Some(Direction::East));

        let outcome = grid.move_player_code(Player::One, 9);
        assert_eq!(outcome, MoveOutcome::Crashed);
        assert_eq!(grid.head(Player::One), Position::new(1, 0));
        assert!(grid.is_wall(1, 0));
    }

    #[test]
    fn walls_are_monotone() {
        let mut grid = parse_map("4 4\n1   \n    \n    \n   2\n").unwrap();
        let moves = [
            (Direction::East, Direction::West),
            (Direction::South, Direction::North),
            (Direction::East, Direction::West),
            (Direction::South, Direction::North),
        ];
        let mut previous = grid.clone();
        for (one, two) in moves {
            grid.apply_turn(Some(one), Some(two));
            for y in 0..4 {
                for x in 0..4 {
                    if previous.is_wall(x, y) {
                        assert!(grid.is_wall(x, y), "wall at ({x},{y}) disappeared");
                    }
                }
            }
            assert!(grid.wall_count() >= previous.wall_count());
            previous = grid.clone();
        }
    }

    #[test]
    fn head_cell_is_wall_after_move() {
        let mut grid = corridor();
        grid.move_player(Player::One, Some(Direction::East));
        let head = grid.head(Player::One);
        assert!(grid.is_wall(head.x, head.y));
        assert_eq!(grid.wall_count(), 3);
    }

    #[test]
    fn second_mover_sees_first_movers_trail() {
        // player one leaves (1,0) eastward, player two steps into it from the west
        let mut grid = parse_map("4 1\n21  \n").unwrap();
        let outcomes = grid.apply_turn(Some(Direction::East), Some(Direction::East));
        assert_eq!(outcomes, (MoveOutcome::Ok, MoveOutcome::Crashed));
        assert!(!grid.heads_collided());
    }

    #[test]
    fn entering_the_same_cell_collides() {
        let mut grid = parse_map("3 1\n1 2\n").unwrap();
        let outcomes = grid.apply_turn(Some(Direction::East), Some(Direction::West));
        assert_eq!(outcomes, (MoveOutcome::Ok, MoveOutcome::Ok));
        assert!(grid.heads_collided());
        assert_eq!(grid.head(Player::One), Position::new(1, 0));
    }

    #[test]
    fn stepping_onto_a_crashed_head_crashes() {
        let mut grid = parse_map("3 3\n###\n#1#\n#2#\n").unwrap();
        let outcomes = grid.apply_turn(Some(Direction::North), Some(Direction::North));
        assert_eq!(outcomes, (MoveOutcome::Crashed, MoveOutcome::Crashed));
        assert!(!grid.heads_collided());
    }

    #[test]
    fn first_mover_cannot_enter_second_movers_head() {
        let mut grid = parse_map("3 1\n12 \n").unwrap();
        let outcomes = grid.apply_turn(Some(Direction::East), Some(Direction::East));
        assert_eq!(outcomes, (MoveOutcome::Crashed, MoveOutcome::Ok));
    }

    #[test]
    fn swapped_view_exchanges_heads() {
        let grid = corridor();
        let view = grid.swapped();
        assert_eq!(view.me(), grid.them());
        assert_eq!(view.them(), grid.me());
        assert_eq!(view.width(), 5);
        assert_eq!(view.height(), 1);
        assert_eq!(view.is_wall(2, 0), grid.is_wall(2, 0));
    }

    #[test]
    fn direction_from_str() {
        assert_eq!("north".parse::<Direction>().unwrap(), Direction::North);
        assert_eq!("E".parse::<Direction>().unwrap(), Direction::East);
        assert_eq!("south-ish".parse::<Direction>().unwrap(), Direction::South);
        assert_eq!("w".parse::<Direction>().unwrap(), Direction::West);
        assert!("".parse::<Direction>().is_err());
        assert!("up".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_codes() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_code(direction.code()), Some(direction));
        }
        assert_eq!(Direction::from_code(0), None);
        assert_eq!(Direction::from_code(5), None);
    }

    #[test]
    fn new_rejects_bad_input() {
        assert!(Grid::new(0, 1, vec![], Position::new(0, 0), Position::new(0, 0)).is_err());
        assert!(Grid::new(2, 1, vec![false], Position::new(0, 0), Position::new(1, 0)).is_err());
        assert!(Grid::new(2, 1, vec![false; 2], Position::new(0, 0), Position::new(0, 0)).is_err());
        assert!(Grid::new(2, 1, vec![false; 2], Position::new(0, 0), Position::new(2, 0)).is_err());
        assert!(Grid::new(usize::MAX, 2, vec![], Position::new(0, 0), Position::new(1, 0)).is_err());
    }

    #[test]
    fn facing_heads_one_cell_apart_collide() {
        let mut grid =
            parse_map("6 5\n######\n#    #\n# 1 2#\n#    #\n######\n").unwrap();
        let outcomes = grid.apply_turn(Some(Direction::East), Some(Direction::West));
        assert_eq!(outcomes, (MoveOutcome::Ok, MoveOutcome::Ok));
        assert!(grid.heads_collided());
        assert_eq!(grid.head(Player::One), Position::new(3, 2));
        assert_eq!(grid.head(Player::Two), Position::new(3, 2));
    }
}
