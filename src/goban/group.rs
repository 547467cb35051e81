use crate::goban::prelude::*;

/// A maximal connected region grown from a seed intersection.
///
/// Seeding on a stone yields that stone's chain with its liberty count.
/// Seeding on an open point enumerates the contiguous open region instead (a
/// pseudo-group), recording which stone colors border it; the liberty-ish
/// cell states merge into one region for this purpose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    color: Color,
    members: BTreeSet<Coord>,
    liberties: usize,
    borders_black: bool,
    borders_white: bool,
}

impl Group {
    /// Breadth-first search from `seed`. The queue and seen tables are sized
    /// to the board and addressed by coordinate index.
    pub fn new(board: &Board, seed: Coord) -> Group {
        let size = board.size();
        let color = board.get(seed);

        let mut queue: Vec<Coord> = Vec::with_capacity(size * size);
        let mut seen: Vec<Option<Color>> = vec![None; size * size];
        queue.push(seed);
        seen[seed.index(size)] = Some(color);

        let mut members = BTreeSet::new();
        let mut liberties = 0;
        let mut borders_black = false;
        let mut borders_white = false;

        let mut i = 0;
        while i < queue.len() {
            let current = queue[i];
            let current_color = seen[current.index(size)].unwrap();
            i += 1;

            if current_color == color
                || color.counts_as_liberty() && current_color.counts_as_liberty()
            {
                members.insert(current);
                for neighbor in current.neighbors(size) {
                    let index = neighbor.index(size);
                    if seen[index].is_none() {
                        seen[index] = Some(board.get(neighbor));
                        queue.push(neighbor);
                    }
                }
            } else if current_color.counts_as_liberty() {
                liberties += 1;
            } else if current_color == Color::Black {
                borders_black = true;
            } else {
                borders_white = true;
            }
        }

        let color = if color == Color::TemporarilyUnplayable {
            Color::Empty
        } else {
            color
        };

        Group {
            color,
            members,
            liberties,
            borders_black,
            borders_white,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn members(&self) -> &BTreeSet<Coord> {
        &self.members
    }

    pub fn liberties(&self) -> usize {
        self.liberties
    }

    pub fn borders_black(&self) -> bool {
        self.borders_black
    }

    pub fn borders_white(&self) -> bool {
        self.borders_white
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.members.contains(&coord)
    }
}
