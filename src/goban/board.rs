use std::fmt;

use crate::goban::prelude::*;
use crate::goban::zobrist;

/// A dense grid of intersections plus an incrementally maintained 64-bit
/// zobrist hash. Boards are mutable while a turn is being resolved and must
/// be locked before they are published on a game snapshot.
#[derive(Clone, Debug)]
pub struct Board {
    size: usize,
    cells: Vec<Color>,
    zobrist_hash: u64,
    locked: bool,
}

impl Board {
    /// An empty, unlocked board.
    pub fn new(size: usize) -> Result<Board> {
        coords::check_size(size)?;
        Ok(Board {
            size,
            cells: vec![Color::Empty; size * size],
            zobrist_hash: 0,
            locked: false,
        })
    }

    /// An unlocked working copy of this board.
    pub fn scratch(&self) -> Board {
        let mut copy = self.clone();
        copy.locked = false;
        copy
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn zobrist_hash(&self) -> u64 {
        self.zobrist_hash
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn get(&self, coord: Coord) -> Color {
        debug_assert!(coord.in_bounds(self.size));
        self.cells[coord.index(self.size)]
    }

    /// Sets a cell, folding the old and new stone constants into the hash.
    /// Locked boards must never be mutated.
    pub fn set(&mut self, coord: Coord, color: Color) {
        assert!(!self.locked, "attempted to mutate a locked board");
        debug_assert!(coord.in_bounds(self.size));

        let index = coord.index(self.size);
        self.zobrist_hash ^= zobrist::stone_hash(coord, self.cells[index]);
        self.zobrist_hash ^= zobrist::stone_hash(coord, color);
        self.cells[index] = color;
    }

    /// Freezes the board for publication; sharing a locked board needs no
    /// further synchronization.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Whether two boards hold the same logical position. Temporarily
    /// unplayable cells compare as empty; this is the full comparison that
    /// confirms zobrist collisions during ko checks.
    pub fn is_same_position_as(&self, other: &Board) -> bool {
        self.size == other.size
            && self
                .cells
                .iter()
                .zip(other.cells.iter())
                .all(|(lhs, rhs)| lhs == rhs || lhs.counts_as_liberty() && rhs.counts_as_liberty())
    }

    /// Encodes the board as seen through `orientation`: row-major, with
    /// `.`/`X`/`O` for open, black, and white cells. Temporarily unplayable
    /// cells encode as open.
    pub fn get_code_for(&self, orientation: Orientation) -> String {
        let mut code = String::with_capacity(self.size * self.size);
        for coord in coords::all_coords(self.size) {
            let source = orientation.transform_coord(coord, self.size);
            code.push(match self.get(source) {
                Color::Black => 'X',
                Color::White => 'O',
                _ => '.',
            });
        }
        code
    }

    /// The orientation whose code is lexicographically smallest; ties break
    /// toward the earlier orientation in [`Orientation::all`].
    pub fn canonical_orientation(&self) -> Orientation {
        self.canonical().0
    }

    /// The smallest code over all eight orientations, a position fingerprint
    /// invariant under reflection and rotation.
    pub fn canonical_code(&self) -> String {
        self.canonical().1
    }

    fn canonical(&self) -> (Orientation, String) {
        let mut best: Option<(Orientation, String)> = None;
        for orientation in Orientation::all() {
            let code = self.get_code_for(orientation);
            match &best {
                Some((_, smallest)) if *smallest <= code => {}
                _ => best = Some((orientation, code)),
            }
        }
        best.expect("at least one orientation is always considered")
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.size).rev() {
            for col in 0..self.size {
                let cell = self.cells[row * self.size + col];
                let glyph = match cell {
                    Color::Black => 'X',
                    Color::White => 'O',
                    Color::Empty => '.',
                    Color::TemporarilyUnplayable => ',',
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goban::zobrist::stone_hash;

    fn coord(col: usize, row: usize) -> Coord {
        Coord::get(col, row, 19).unwrap()
    }

    /// Recomputes the hash the slow way: XOR over every occupied cell.
    fn folded_hash(board: &Board) -> u64 {
        coords::all_coords(board.size())
            .map(|c| stone_hash(c, board.get(c)))
            .fold(0, |acc, h| acc ^ h)
    }

    #[test]
    fn hash_tracks_the_xor_fold() {
        let mut board = Board::new(19).unwrap();
        assert_eq!(board.zobrist_hash(), 0);

        board.set(coord(3, 3), Color::Black);
        board.set(coord(15, 15), Color::White);
        board.set(coord(9, 9), Color::Black);
        assert_eq!(board.zobrist_hash(), folded_hash(&board));

        board.set(coord(9, 9), Color::Empty);
        assert_eq!(board.zobrist_hash(), folded_hash(&board));
    }

    #[test]
    fn temporarily_unplayable_cells_do_not_hash() {
        let mut board = Board::new(19).unwrap();
        board.set(coord(3, 3), Color::Black);
        let hash = board.zobrist_hash();

        board.set(coord(0, 0), Color::TemporarilyUnplayable);
        assert_eq!(board.zobrist_hash(), hash);
    }

    #[test]
    fn positions_compare_through_the_unplayable_mask() {
        let mut lhs = Board::new(19).unwrap();
        let mut rhs = Board::new(19).unwrap();
        lhs.set(coord(3, 3), Color::Black);
        rhs.set(coord(3, 3), Color::Black);
        rhs.set(coord(4, 4), Color::TemporarilyUnplayable);

        assert!(lhs.is_same_position_as(&rhs));

        rhs.set(coord(4, 4), Color::White);
        assert!(!lhs.is_same_position_as(&rhs));
    }

    #[test]
    #[should_panic(expected = "locked board")]
    fn locked_boards_reject_mutation() {
        let mut board = Board::new(19).unwrap();
        board.lock();
        board.set(coord(0, 0), Color::Black);
    }

    #[test]
    fn empty_board_code_is_all_dots_under_identity() {
        let board = Board::new(19).unwrap();
        assert_eq!(board.canonical_code(), ".".repeat(361));
        assert_eq!(board.canonical_orientation(), Orientation::Unchanged);
    }

    #[test]
    fn canonical_code_is_the_minimum_over_all_orientations() {
        let mut board = Board::new(9).unwrap();
        board.set(Coord::get(2, 6, 9).unwrap(), Color::Black);
        board.set(Coord::get(6, 2, 9).unwrap(), Color::White);
        board.set(Coord::get(4, 4, 9).unwrap(), Color::Black);

        let canonical = board.canonical_code();
        for orientation in Orientation::all() {
            assert!(canonical <= board.get_code_for(orientation));
        }
        assert_eq!(
            canonical,
            board.get_code_for(board.canonical_orientation())
        );
    }

    #[test]
    fn codes_are_invariant_over_symmetric_placements() {
        // The same stone placed in each of the four corners reads back as a
        // single fingerprint.
        let mut codes = Vec::new();
        for (col, row) in [(0, 0), (0, 18), (18, 0), (18, 18)] {
            let mut board = Board::new(19).unwrap();
            board.set(coord(col, row), Color::Black);
            codes.push(board.canonical_code());
        }
        codes.dedup();
        assert_eq!(codes.len(), 1);
    }
}
