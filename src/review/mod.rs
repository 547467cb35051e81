/*
 *  Orchestration: symmetry handling, response consumption, and composition
 *  of the per-move analysis table.
 */

pub mod compose;
pub mod equivalence;
pub mod session;
pub mod symmetry;
pub mod table;

pub mod prelude {
    pub use super::compose::{AccuracyConfig, AnalysisRow, compose_analysis};
    pub use super::equivalence::MoveEquivalence;
    pub use super::session::{ReviewConfig, review_game};
    pub use super::symmetry::SymmetryFold;
    pub use super::table::write_analysis_csv;
}
