/*
 *  The Go rules domain: boards, groups, symmetries, and game replay.
 */

pub mod board;
pub mod color;
pub mod coords;
pub mod game;
pub mod group;
pub mod orientation;
pub mod ruleset;
pub(crate) mod zobrist;

pub mod prelude {
    pub(crate) use crate::utils::prelude::*;

    pub use super::{
        board::Board,
        color::Color,
        coords::{self, COLUMN_LETTERS, Coord, MAX_BOARD_SIZE, Vertex},
        game::Game,
        group::Group,
        orientation::Orientation,
        ruleset::{KoRule, Ruleset, RulesSpecification, Scoring},
    };
}
