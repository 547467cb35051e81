use std::hash::{DefaultHasher, Hasher};
use std::sync::OnceLock;

use super::color::Color;
use super::coords::{Coord, MAX_BOARD_SIZE};

const NUM_CELLS: usize = MAX_BOARD_SIZE * MAX_BOARD_SIZE * 2;

static STONE_TABLE: OnceLock<[u64; NUM_CELLS]> = OnceLock::new();

/// The hash constant for a stone of `color` at `coord`. Empty and
/// temporarily-unplayable cells contribute nothing, so callers can XOR the
/// result of this function unconditionally.
pub(super) fn stone_hash(coord: Coord, color: Color) -> u64 {
    let offset = match color {
        Color::Black => 0,
        Color::White => 1,
        _ => return 0,
    };

    let table = STONE_TABLE.get_or_init(|| {
        let mut table = [0u64; NUM_CELLS];
        let mut hasher = DefaultHasher::new();
        for (i, entry) in table.iter_mut().enumerate() {
            hasher.write_usize(i);
            *entry = hasher.finish();
        }
        table
    });

    table[offset * MAX_BOARD_SIZE * MAX_BOARD_SIZE
        + coord.row as usize * MAX_BOARD_SIZE
        + coord.col as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liberty_ish_cells_never_contribute() {
        let coord = Coord { col: 3, row: 3 };
        assert_eq!(stone_hash(coord, Color::Empty), 0);
        assert_eq!(stone_hash(coord, Color::TemporarilyUnplayable), 0);
        assert_ne!(stone_hash(coord, Color::Black), 0);
    }

    #[test]
    fn constants_are_distinct_per_cell_and_color() {
        let a = Coord { col: 0, row: 0 };
        let b = Coord { col: 1, row: 0 };
        assert_ne!(stone_hash(a, Color::Black), stone_hash(a, Color::White));
        assert_ne!(stone_hash(a, Color::Black), stone_hash(b, Color::Black));
    }
}
