use rayon::prelude::*;

use crate::goban::prelude::*;

/// The legal moves of one position, grouped by the canonical code of the
/// position each one produces. Two moves in the same group lead to
/// board-symmetric futures, whatever the engine thought of them.
#[derive(Clone, Debug, Default)]
pub struct MoveEquivalence {
    identical: HashMap<Vertex, BTreeSet<Vertex>>,
}

impl MoveEquivalence {
    /// Plays every legal move of `state` and groups the results.
    pub fn new(state: &Game) -> MoveEquivalence {
        let mut move_to_code: HashMap<Vertex, String> = HashMap::new();
        let mut code_to_moves: HashMap<String, BTreeSet<Vertex>> = HashMap::new();

        for vertex in state.legal_moves() {
            let Ok(next) = state.play(vertex) else {
                continue;
            };
            let code = next.canonical_code();
            code_to_moves
                .entry(code.clone())
                .or_default()
                .insert(vertex);
            move_to_code.insert(vertex, code);
        }

        let identical = move_to_code
            .into_iter()
            .map(|(vertex, code)| (vertex, code_to_moves[&code].clone()))
            .collect();
        MoveEquivalence { identical }
    }

    /// Precomputes the map for every state of a game. The states are
    /// immutable snapshots, so the workers are stateless and free to run in
    /// parallel.
    pub fn for_states(states: &[Game]) -> Vec<MoveEquivalence> {
        states.par_iter().map(MoveEquivalence::new).collect()
    }

    /// The moves transformationally identical to `vertex`; a singleton for
    /// anything illegal or unknown here.
    pub fn identical_to(&self, vertex: Vertex) -> BTreeSet<Vertex> {
        self.identical
            .get(&vertex)
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([vertex]))
    }

    pub fn are_identical(&self, lhs: Vertex, rhs: Vertex) -> bool {
        lhs == rhs
            || self
                .identical
                .get(&lhs)
                .is_some_and(|class| class.contains(&rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(label: &str) -> Vertex {
        Vertex::parse(label, 19).unwrap()
    }

    #[test]
    fn opening_corners_are_identical() {
        let root = Game::new(Ruleset::Chinese, 7.5, &BTreeSet::new(), 19).unwrap();
        let equivalence = MoveEquivalence::new(&root);

        let class = equivalence.identical_to(vertex("D4"));
        assert_eq!(
            class,
            BTreeSet::from([vertex("D4"), vertex("D16"), vertex("Q4"), vertex("Q16")])
        );
        assert!(equivalence.are_identical(vertex("D4"), vertex("Q16")));
        assert!(!equivalence.are_identical(vertex("D4"), vertex("K10")));

        // The center is a fixed point of every orientation.
        assert_eq!(
            equivalence.identical_to(vertex("K10")),
            BTreeSet::from([vertex("K10")])
        );
        // Pass only ever maps to itself.
        assert_eq!(
            equivalence.identical_to(Vertex::Pass),
            BTreeSet::from([Vertex::Pass])
        );
    }

    #[test]
    fn symmetry_breaks_once_a_stone_lands() {
        let root = Game::new(Ruleset::Chinese, 7.5, &BTreeSet::new(), 19).unwrap();
        let after = root.play(vertex("D4")).unwrap();
        let equivalence = MoveEquivalence::new(&after);

        // D4 occupies a corner, so the remaining corners are no longer all
        // interchangeable; only the pair across D4's diagonal still is.
        assert!(!equivalence.are_identical(vertex("Q16"), vertex("D16")));
        assert!(equivalence.are_identical(vertex("D16"), vertex("Q4")));
    }

    #[test]
    fn precompute_matches_single_state_results() {
        let root = Game::new(Ruleset::Chinese, 7.5, &BTreeSet::new(), 9).unwrap();
        let next = root.play(Vertex::parse("C3", 9).unwrap()).unwrap();
        let states = vec![root.clone(), next];

        let precomputed = MoveEquivalence::for_states(&states);
        assert_eq!(precomputed.len(), 2);
        assert_eq!(
            precomputed[0].identical_to(Vertex::parse("C3", 9).unwrap()),
            MoveEquivalence::new(&root).identical_to(Vertex::parse("C3", 9).unwrap())
        );
    }
}
