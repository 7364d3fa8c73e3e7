//! Text protocol between the referee and the bots.
//!
//! A map is a header line `W H` followed by `H` rows of `W` cells, each row ending with LF
//! (CR is ignored wherever it appears):
//!
//! ```text
//! 5 3
//! #####
//! #1 2#
//! #####
//! ```
//!
//! - `#`: wall
//! - space: open cell
//! - `1`: the head of the player reading the map (also a wall)
//! - `2`: the opponent's head (also a wall)
//!
//! Each turn the referee writes the whole map to a bot's stdin. The bot answers with one
//! ASCII digit (`1` north, `2` east, `3` south, `4` west); anything after the digit is ignored.
//! EOF or an empty header line tells a bot the game is over.

use std::io::BufRead;

use anyhow::{bail, Context};

use crate::grid::{Direction, Grid, MapView, Position};

/// Open cell.
pub const FLOOR: u8 = b' ';
/// Wall or trail.
pub const WALL: u8 = b'#';
/// Head of the player the map is addressed to.
pub const ME: u8 = b'1';
/// Head of the opponent.
pub const THEM: u8 = b'2';

/// Renders `view` in the wire format.
///
/// Pass [`Grid::swapped`] to address the map to player two.
pub fn encode<V: MapView + ?Sized>(view: &V) -> String {
    let (width, height) = (view.width(), view.height());
    let (me, them) = (view.me(), view.them());

    let mut out = String::with_capacity((width + 1) * height + 16);
    out.push_str(&format!("{width} {height}\n"));
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let position = Position::new(x, y);
            let cell = if position == me {
                ME
            } else if position == them {
                THEM
            } else if view.is_wall(x, y) {
                WALL
            } else {
                FLOOR
            };
            out.push(cell as char);
        }
        out.push('\n');
    }
    out
}

/// A bot's reply byte. Only `'1'..='4'` is a move.
pub fn decode_move(byte: u8) -> Option<Direction> {
    match byte {
        b'1'..=b'4' => Direction::from_code(byte - b'0'),
        _ => None,
    }
}

/// Parses a complete map held in memory.
///
/// # Errors
///
/// Same as [`read_map`], plus an empty input.
pub fn parse_map(text: &str) -> anyhow::Result<Grid> {
    read_map(&mut text.as_bytes())?.context("missing header line")
}

/// Reads one map from `reader`.
///
/// Returns `Ok(None)` at EOF or when the header line is empty, which is how the referee
/// signals the end of a game. Reading stops right after the last row, so successive maps
/// on a live stream are read one call at a time.
///
/// # Errors
///
/// On a malformed header, a row of the wrong width, a byte outside `#`, space, `1`, `2`,
/// CR and LF, a missing or repeated head, too few cells, or an I/O error.
pub fn read_map<R: BufRead + ?Sized>(reader: &mut R) -> anyhow::Result<Option<Grid>> {
    let mut line = Vec::new();
    if reader
        .read_until(b'\n', &mut line)
        .context("could not read header line")?
        == 0
    {
        return Ok(None);
    }
    strip_line_end(&mut line);
    if line.is_empty() {
        return Ok(None);
    }
    let (width, height, cells) = parse_header(&line)?;

    // rows are checked as they arrive, so the header alone never sizes the buffer
    let mut walls = Vec::with_capacity(cells.min(MAX_PREALLOCATED_CELLS));
    let mut player_one: Option<Position> = None;
    let mut player_two: Option<Position> = None;

    for y in 0..height {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .with_context(|| format!("could not read row {y}"))?;
        if n == 0 {
            bail!(
                "wrong number of cells: expected {cells}, found {} before end of input",
                walls.len()
            );
        }
        strip_line_end(&mut line);
        if line.len() != width {
            bail!("row {y} has {} cells, expected {width}", line.len());
        }

        for (x, &cell) in line.iter().enumerate() {
            let position = Position::new(x as i32, y as i32);
            match cell {
                FLOOR => walls.push(false),
                WALL => walls.push(true),
                ME | THEM => {
                    let (slot, label) = if cell == ME {
                        (&mut player_one, "1")
                    } else {
                        (&mut player_two, "2")
                    };
                    if let Some(first) = slot {
                        bail!("found two locations for player {label}: {first} and {position}");
                    }
                    *slot = Some(position);
                    walls.push(true);
                }
                other => bail!("invalid character at {position}: ASCII value {other}"),
            }
        }
    }

    let player_one = player_one.context("did not find a location for player 1")?;
    let player_two = player_two.context("did not find a location for player 2")?;
    Grid::new(width, height, walls, player_one, player_two).map(Some)
}

const MAX_PREALLOCATED_CELLS: usize = 1 << 20;

/// Width, height and cell count. Both dimensions must fit a signed coordinate.
fn parse_header(line: &[u8]) -> anyhow::Result<(usize, usize, usize)> {
    let header = std::str::from_utf8(line).context("header line is not valid text")?;
    let tokens = header.split(' ').collect::<Vec<_>>();
    let [width, height] = tokens[..] else {
        bail!("the first line should be two integers separated by a space, got '{header}'");
    };
    let width: usize = width
        .parse()
        .with_context(|| format!("invalid map width '{width}'"))?;
    let height: usize = height
        .parse()
        .with_context(|| format!("invalid map height '{height}'"))?;
    if width == 0 || height == 0 {
        bail!("map dimensions must be positive, got '{header}'");
    }
    if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
        bail!("map dimensions are too large, got '{header}'");
    }
    let cells = width
        .checked_mul(height)
        .with_context(|| format!("map dimensions are too large, got '{header}'"))?;
    Ok((width, height, cells))
}

/// Drops the trailing LF and every CR: CR never counts as a cell.
fn strip_line_end(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    line.retain(|&b| b != b'\r');
}
