use crate::goban::prelude::*;
use crate::katago::response::MoveInfo;

/// The result of collapsing a turn's move list by its `isSymmetryOf`
/// back-references: the representative infos in their original order, plus
/// the move→info and move→equivalence-class maps.
#[derive(Clone, Debug, Default)]
pub struct SymmetryFold {
    kept: Vec<MoveInfo>,
    info_of: HashMap<Vertex, usize>,
    class_of: HashMap<Vertex, usize>,
    classes: Vec<BTreeSet<Vertex>>,
}

impl SymmetryFold {
    /// Folds a turn's move infos. A move without a back-reference seeds its
    /// own class and is kept; a move with one joins its representative's
    /// class and borrows its info. The engine lists representatives before
    /// their symmetries; an orphaned back-reference degrades to a seed.
    pub fn new(move_infos: &[MoveInfo]) -> SymmetryFold {
        let mut fold = SymmetryFold::default();

        for info in move_infos {
            let vertex = info.vertex;
            let representative = info
                .is_symmetry_of
                .filter(|r| fold.class_of.contains_key(r));

            match representative {
                Some(representative) => {
                    let class = fold.class_of[&representative];
                    fold.classes[class].insert(vertex);
                    fold.class_of.insert(vertex, class);
                    fold.info_of.insert(vertex, fold.info_of[&representative]);
                }
                None => fold.seed(vertex, info),
            }
        }

        fold
    }

    fn seed(&mut self, vertex: Vertex, info: &MoveInfo) {
        self.class_of.insert(vertex, self.classes.len());
        self.classes.push(BTreeSet::from([vertex]));
        self.info_of.insert(vertex, self.kept.len());
        self.kept.push(info.clone());
    }

    /// The representative infos, in the order the engine reported them.
    pub fn kept(&self) -> &[MoveInfo] {
        &self.kept
    }

    /// The info representing `vertex`, following symmetry indirection.
    pub fn info(&self, vertex: Vertex) -> Option<&MoveInfo> {
        self.info_of.get(&vertex).map(|&i| &self.kept[i])
    }

    /// Every move equivalent to `vertex`. Moves the engine never mentioned
    /// form their own singleton class.
    pub fn class(&self, vertex: Vertex) -> BTreeSet<Vertex> {
        match self.class_of.get(&vertex) {
            Some(&class) => self.classes[class].clone(),
            None => BTreeSet::from([vertex]),
        }
    }

    pub fn same_class(&self, lhs: Vertex, rhs: Vertex) -> bool {
        lhs == rhs
            || match (self.class_of.get(&lhs), self.class_of.get(&rhs)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }
}
