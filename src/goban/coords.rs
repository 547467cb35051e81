use std::fmt;

use serde::{Deserialize, Serialize, de};

use crate::goban::prelude::*;

/// The largest board edge the engine's label grammar can address.
pub const MAX_BOARD_SIZE: usize = 19;

/// Column letters in engine order; `I` is skipped by convention.
pub const COLUMN_LETTERS: &str = "ABCDEFGHJKLMNOPQRST";

/// An intersection on a Go board, with `(0, 0)` at the lower-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub col: u8,
    pub row: u8,
}

impl Coord {
    /// Builds a coordinate, rejecting anything off a `size`-wide board.
    pub fn get(col: usize, row: usize, size: usize) -> Result<Coord> {
        check_size(size)?;
        if col >= size || row >= size {
            return Err(Error::OutOfRange(format!(
                "({col}, {row}) is off a {size}x{size} board"
            )));
        }
        Ok(Coord {
            col: col as u8,
            row: row as u8,
        })
    }

    /// The stable index of this coordinate on a `size`-wide board.
    pub fn index(&self, size: usize) -> usize {
        self.row as usize * size + self.col as usize
    }

    /// The engine label, e.g. `D4` or `Q16`. Rows count from the bottom.
    pub fn label(&self) -> String {
        let column = COLUMN_LETTERS.as_bytes()[self.col as usize] as char;
        format!("{}{}", column, self.row + 1)
    }

    /// Up to four orthogonal neighbours, clipped to the board.
    pub fn neighbors(&self, size: usize) -> impl Iterator<Item = Coord> {
        let (col, row) = (self.col as isize, self.row as isize);
        [(0, -1), (-1, 0), (1, 0), (0, 1)]
            .into_iter()
            .filter_map(move |(dc, dr)| {
                let (c, r) = (col + dc, row + dr);
                (c >= 0 && r >= 0 && (c as usize) < size && (r as usize) < size).then(|| Coord {
                    col: c as u8,
                    row: r as u8,
                })
            })
    }

    /// Whether the coordinate fits on a `size`-wide board.
    pub fn in_bounds(&self, size: usize) -> bool {
        (self.col as usize) < size && (self.row as usize) < size
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Iterates every coordinate of a `size`-wide board in index order.
pub fn all_coords(size: usize) -> impl Iterator<Item = Coord> {
    (0..size * size).map(move |i| Coord {
        col: (i % size) as u8,
        row: (i / size) as u8,
    })
}

pub(crate) fn check_size(size: usize) -> Result<()> {
    if size == 0 || size > MAX_BOARD_SIZE {
        return Err(Error::OutOfRange(format!(
            "board size {size} is not in 1..={MAX_BOARD_SIZE}"
        )));
    }
    Ok(())
}

/// A move: either an intersection or the pass sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Vertex {
    Play(Coord),
    Pass,
}

impl Vertex {
    /// The wire label: `pass`, or the coordinate label.
    pub fn label(&self) -> String {
        match self {
            Vertex::Play(coord) => coord.label(),
            Vertex::Pass => "pass".into(),
        }
    }

    /// Parses a wire label. `pass` is case-insensitive; anything else must
    /// be a column letter followed by a 1-based row on the given board.
    pub fn parse(s: &str, size: usize) -> Result<Vertex> {
        if s.eq_ignore_ascii_case("pass") {
            return Ok(Vertex::Pass);
        }

        let mut chars = s.chars();
        let column_letter = chars
            .next()
            .ok_or_else(|| Error::EngineProtocol("empty move label".into()))?;
        let col = COLUMN_LETTERS
            .find(column_letter.to_ascii_uppercase())
            .ok_or_else(|| Error::EngineProtocol(format!("unrecognized move label {s}")))?;
        let row: usize = chars
            .as_str()
            .parse()
            .map_err(|_| Error::EngineProtocol(format!("unrecognized move label {s}")))?;
        if row == 0 || row > size || col >= size {
            return Err(Error::EngineProtocol(format!(
                "move label {s} is off a {size}x{size} board"
            )));
        }

        Ok(Vertex::Play(Coord {
            col: col as u8,
            row: (row - 1) as u8,
        }))
    }

    /// Resolves an entry of the engine's flat policy arrays. Those arrays
    /// run row-by-row from the top of the board; the final entry is pass.
    pub fn from_policy_index(index: usize, size: usize) -> Result<Vertex> {
        check_size(size)?;
        if index == size * size {
            return Ok(Vertex::Pass);
        }
        if index > size * size {
            return Err(Error::OutOfRange(format!(
                "policy index {index} is off a {size}x{size} board"
            )));
        }

        let col = index % size;
        let row_from_top = index / size;
        Ok(Vertex::Play(Coord {
            col: col as u8,
            row: (size - 1 - row_from_top) as u8,
        }))
    }

    /// The inverse of [`Vertex::from_policy_index`].
    pub fn policy_index(&self, size: usize) -> usize {
        match self {
            Vertex::Pass => size * size,
            Vertex::Play(coord) => (size - 1 - coord.row as usize) * size + coord.col as usize,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Vertex::Pass)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Vertex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for Vertex {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vertex, D::Error> {
        let label = String::deserialize(deserializer)?;
        Vertex::parse(&label, MAX_BOARD_SIZE).map_err(de::Error::custom)
    }
}
