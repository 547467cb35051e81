use crate::goban::prelude::*;

/// The eight elements of the dihedral group acting on board coordinates.
///
/// The declared order is the canonical order: it breaks ties when two
/// orientations produce the same board code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Orientation {
    Unchanged,
    MirrorHorizontal,
    MirrorVertical,
    RotateTwice,
    MirrorLeftDiagonal,
    RotateLeft,
    RotateRight,
    MirrorRightDiagonal,
}

impl Orientation {
    /// All orientations in canonical order.
    pub fn all() -> [Orientation; 8] {
        [
            Orientation::Unchanged,
            Orientation::MirrorHorizontal,
            Orientation::MirrorVertical,
            Orientation::RotateTwice,
            Orientation::MirrorLeftDiagonal,
            Orientation::RotateLeft,
            Orientation::RotateRight,
            Orientation::MirrorRightDiagonal,
        ]
    }

    pub fn ordinal(&self) -> usize {
        Orientation::all()
            .iter()
            .position(|o| o == self)
            .unwrap_or(0)
    }

    /// Maps a coordinate through this orientation on a `size`-wide board.
    pub fn transform_coord(&self, coord: Coord, size: usize) -> Coord {
        let last = (size - 1) as u8;
        let (col, row) = (coord.col, coord.row);
        let (col, row) = match self {
            Orientation::Unchanged => (col, row),
            Orientation::MirrorHorizontal => (last - col, row),
            Orientation::MirrorVertical => (col, last - row),
            Orientation::RotateTwice => (last - col, last - row),
            Orientation::MirrorLeftDiagonal => (row, col),
            Orientation::RotateLeft => (last - row, col),
            Orientation::RotateRight => (row, last - col),
            Orientation::MirrorRightDiagonal => (last - row, last - col),
        };
        Coord { col, row }
    }

    /// Maps a move through this orientation; passes are fixed points.
    pub fn transform(&self, vertex: Vertex, size: usize) -> Vertex {
        match vertex {
            Vertex::Pass => Vertex::Pass,
            Vertex::Play(coord) => Vertex::Play(self.transform_coord(coord, size)),
        }
    }

    /// Applies the inverse transform.
    pub fn undo(&self, vertex: Vertex, size: usize) -> Vertex {
        self.inverse().transform(vertex, size)
    }

    /// Every orientation is its own inverse except the two quarter turns,
    /// which undo each other.
    pub fn inverse(&self) -> Orientation {
        match self {
            Orientation::RotateLeft => Orientation::RotateRight,
            Orientation::RotateRight => Orientation::RotateLeft,
            other => *other,
        }
    }
}
