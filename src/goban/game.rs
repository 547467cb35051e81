use std::fmt;
use std::sync::Arc;

use crate::goban::prelude::*;

/// What the ko lookup remembers about a previously seen position: enough to
/// confirm a zobrist collision and to apply the situational rule, and
/// nothing that points back into the game lineage.
#[derive(Clone, Debug)]
struct KoPoint {
    board: Board,
    to_move: Color,
    after_pass: bool,
}

/// An immutable snapshot of a game in progress.
///
/// `play` produces the successor snapshot; earlier snapshots stay valid and
/// can be shared freely because their boards are locked. The lineage is a
/// chain of owning references back to the root.
#[derive(Clone, Debug)]
pub struct Game {
    ruleset: Ruleset,
    komi: f64,
    size: usize,
    handicap_stones: BTreeSet<Coord>,
    current_player: Color,
    moves_played: usize,
    previous_move: Option<Vertex>,
    previous: Option<Arc<Game>>,
    captures_by_black: usize,
    captures_by_white: usize,
    stones_captured_last_turn: usize,
    initial: Board,
    board: Board,
    kos: BTreeSet<Coord>,
    ko_lookup: HashMap<u64, Vec<KoPoint>>,
}

impl Game {
    /// A root snapshot from initial conditions. Handicap stones are placed
    /// for Black and hand White the first move.
    pub fn new(
        ruleset: Ruleset,
        komi: f64,
        handicap_stones: &BTreeSet<Coord>,
        size: usize,
    ) -> Result<Game> {
        let mut board = Board::new(size)?;
        for &stone in handicap_stones {
            if !stone.in_bounds(size) {
                return Err(Error::OutOfRange(format!(
                    "handicap stone {} is off a {size}x{size} board",
                    stone.label()
                )));
            }
            board.set(stone, Color::Black);
        }

        let current_player = if handicap_stones.is_empty() {
            Color::Black
        } else {
            Color::White
        };
        let board = Game::mark_unplayable_for(&board, current_player);

        let mut initial = board.clone();
        initial.lock();
        let mut board = board;
        board.lock();

        let mut ko_lookup = HashMap::new();
        if ruleset.ko_rule() != KoRule::Simple {
            ko_lookup.insert(
                board.zobrist_hash(),
                vec![KoPoint {
                    board: board.clone(),
                    to_move: current_player,
                    after_pass: false,
                }],
            );
        }

        Ok(Game {
            ruleset,
            komi,
            size,
            handicap_stones: handicap_stones.clone(),
            current_player,
            moves_played: 0,
            previous_move: None,
            previous: None,
            captures_by_black: 0,
            captures_by_white: 0,
            stones_captured_last_turn: 0,
            initial,
            board,
            kos: BTreeSet::new(),
            ko_lookup,
        })
    }

    /// Every open intersection plus the pass move. Suicide and ko points
    /// were painted temporarily unplayable when this snapshot was prepared,
    /// so they are already excluded.
    pub fn legal_moves(&self) -> BTreeSet<Vertex> {
        let mut legal: BTreeSet<Vertex> = coords::all_coords(self.size)
            .filter(|&c| self.board.get(c).playable())
            .map(Vertex::Play)
            .collect();
        legal.insert(Vertex::Pass);
        legal
    }

    /// Plays a move, producing the successor snapshot.
    pub fn play(&self, vertex: Vertex) -> Result<Game> {
        match vertex {
            Vertex::Pass => Ok(self.pass()),
            Vertex::Play(coord) => self.perform_move(coord),
        }
    }

    fn pass(&self) -> Game {
        let (next_board, kos) = self.prepare_board_for_next_player(&self.board);
        self.successor(Vertex::Pass, 0, next_board, kos)
    }

    fn perform_move(&self, coord: Coord) -> Result<Game> {
        if !coord.in_bounds(self.size) {
            return Err(Error::OutOfRange(format!(
                "{} is off a {}x{} board",
                coord.label(),
                self.size,
                self.size
            )));
        }
        let color = self.board.get(coord);
        if !color.playable() {
            return Err(Error::IllegalMove(format!(
                "{} cannot be played on move {}: the point is {}",
                coord.label(),
                self.moves_played + 1,
                match color {
                    Color::TemporarilyUnplayable => "blocked by suicide or ko".into(),
                    occupied => format!("occupied by {occupied:?}"),
                }
            )));
        }

        let mut next_board = self.board.scratch();
        next_board.set(coord, self.current_player);
        let (captures, _) = Game::remove_captures(&mut next_board, coord, self.current_player);
        let (next_board, kos) = self.prepare_board_for_next_player(&next_board);
        Ok(self.successor(Vertex::Play(coord), captures, next_board, kos))
    }

    fn successor(
        &self,
        previous_move: Vertex,
        additional_captures: usize,
        mut board: Board,
        kos: BTreeSet<Coord>,
    ) -> Game {
        let mut captures_by_black = self.captures_by_black;
        let mut captures_by_white = self.captures_by_white;
        match self.current_player {
            Color::Black => captures_by_black += additional_captures,
            _ => captures_by_white += additional_captures,
        }

        let current_player = self.current_player.opposite();
        board.lock();
        let point = KoPoint {
            board: board.clone(),
            to_move: current_player,
            after_pass: previous_move.is_pass(),
        };

        let mut ko_lookup;
        if self.ruleset.ko_rule() == KoRule::Simple {
            ko_lookup = HashMap::new();
            if !previous_move.is_pass() {
                ko_lookup.insert(board.zobrist_hash(), vec![point]);
            }
        } else {
            ko_lookup = self.ko_lookup.clone();
            ko_lookup
                .entry(board.zobrist_hash())
                .or_default()
                .push(point);
        }

        Game {
            ruleset: self.ruleset,
            komi: self.komi,
            size: self.size,
            handicap_stones: self.handicap_stones.clone(),
            current_player,
            moves_played: self.moves_played + 1,
            previous_move: Some(previous_move),
            previous: Some(Arc::new(self.clone())),
            captures_by_black,
            captures_by_white,
            stones_captured_last_turn: additional_captures,
            initial: self.initial.clone(),
            board,
            kos,
            ko_lookup,
        }
    }

    /// Removes any opposing chains left without liberties around `around`.
    /// Returns the number of stones taken and the points they occupied.
    fn remove_captures(
        board: &mut Board,
        around: Coord,
        played_by: Color,
    ) -> (usize, BTreeSet<Coord>) {
        let opposite = played_by.opposite();
        let mut captures = 0;
        let mut captured = BTreeSet::new();

        for neighbor in around.neighbors(board.size()) {
            if board.get(neighbor) != opposite {
                continue;
            }
            let group = Group::new(board, neighbor);
            if group.liberties() == 0 {
                captures += group.len();
                for &member in group.members() {
                    board.set(member, Color::Empty);
                    captured.insert(member);
                }
            }
        }

        (captures, captured)
    }

    /// Repaints every liberty-ish cell for the next player's turn: suicide
    /// points and ko-blocked points become temporarily unplayable, everything
    /// else resets to open. Returns the prepared board and the set of points
    /// blocked specifically by ko.
    fn prepare_board_for_next_player(&self, board: &Board) -> (Board, BTreeSet<Coord>) {
        let next_player = self.current_player.opposite();
        let mut next_board = board.scratch();
        let mut kos = BTreeSet::new();

        for coord in coords::all_coords(self.size) {
            if !next_board.get(coord).counts_as_liberty() {
                continue;
            }
            let mut playable = true;

            let mut scratch = board.scratch();
            scratch.set(coord, next_player);
            let (captures, _) = Game::remove_captures(&mut scratch, coord, next_player);
            if captures == 0 {
                let group = Group::new(&scratch, coord);
                if group.liberties() == 0 {
                    playable = false;
                }
            }

            // The hypothetical position after this stone has the mover's
            // opponent to move, which is the current player again.
            if playable && self.violates_ko_rule(self.current_player, &scratch) {
                playable = false;
                kos.insert(coord);
            }

            next_board.set(
                coord,
                if playable {
                    Color::Empty
                } else {
                    Color::TemporarilyUnplayable
                },
            );
        }

        (next_board, kos)
    }

    /// Root boards get the same suicide marking without any ko history.
    fn mark_unplayable_for(board: &Board, player: Color) -> Board {
        let size = board.size();
        let mut marked = board.scratch();

        for coord in coords::all_coords(size) {
            if !marked.get(coord).counts_as_liberty() {
                continue;
            }
            let mut scratch = board.scratch();
            scratch.set(coord, player);
            let (captures, _) = Game::remove_captures(&mut scratch, coord, player);
            let suicide = captures == 0 && Group::new(&scratch, coord).liberties() == 0;
            marked.set(
                coord,
                if suicide {
                    Color::TemporarilyUnplayable
                } else {
                    Color::Empty
                },
            );
        }

        marked
    }

    /// Whether `board` recreates a forbidden earlier position. `to_move` is
    /// the player who would move next in the hypothetical position. Zobrist
    /// hits are confirmed by full position comparison before they count.
    fn violates_ko_rule(&self, to_move: Color, board: &Board) -> bool {
        let Some(collisions) = self.ko_lookup.get(&board.zobrist_hash()) else {
            return false;
        };
        let confirmed: Vec<&KoPoint> = collisions
            .iter()
            .filter(|point| point.board.is_same_position_as(board))
            .collect();
        if confirmed.is_empty() {
            return false;
        }

        match self.ruleset.ko_rule() {
            // Natural situational super-ko: only positions the same player
            // created with a board move are forbidden.
            KoRule::Situational => confirmed
                .iter()
                .any(|point| point.to_move == to_move && !point.after_pass),
            _ => true,
        }
    }

    /// A position fingerprint invariant under the board symmetries: rules,
    /// komi, player to move, the capture differential under territory
    /// scoring, and the initial and current boards encoded in the current
    /// board's canonical orientation.
    pub fn canonical_code(&self) -> String {
        let mut code = format!(
            "{}_{}_{}_",
            self.ruleset.command(),
            self.komi,
            self.current_player.letter()
        );
        if self.ruleset.scoring() == Scoring::Territory {
            code.push_str(&format!(
                "{}_",
                self.captures_by_black as i64 - self.captures_by_white as i64
            ));
        }

        if self.moves_played == 0 {
            let board_code = self.board.canonical_code();
            code.push_str(&board_code);
            code.push('_');
            code.push_str(&board_code);
        } else {
            let orientation = self.board.canonical_orientation();
            code.push_str(&self.initial.get_code_for(orientation));
            code.push('_');
            code.push_str(&self.board.canonical_code());
        }

        code
    }

    pub fn canonical_orientation(&self) -> Orientation {
        self.board.canonical_orientation()
    }

    // accessors

    pub fn ruleset(&self) -> Ruleset {
        self.ruleset
    }

    pub fn komi(&self) -> f64 {
        self.komi
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn handicap_stones(&self) -> &BTreeSet<Coord> {
        &self.handicap_stones
    }

    pub fn current_player(&self) -> Color {
        self.current_player
    }

    pub fn moves_played(&self) -> usize {
        self.moves_played
    }

    pub fn previous_move(&self) -> Option<Vertex> {
        self.previous_move
    }

    pub fn previous_state(&self) -> Option<&Game> {
        self.previous.as_deref()
    }

    pub fn captures_by_black(&self) -> usize {
        self.captures_by_black
    }

    pub fn captures_by_white(&self) -> usize {
        self.captures_by_white
    }

    pub fn stones_captured_last_turn(&self) -> usize {
        self.stones_captured_last_turn
    }

    /// The locked current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The locked initial board.
    pub fn initial(&self) -> &Board {
        &self.initial
    }

    /// Points that would be legal on the bare board but are blocked by ko
    /// for the player to move.
    pub fn kos(&self) -> &BTreeSet<Coord> {
        &self.kos
    }

    #[cfg(test)]
    pub(crate) fn ko_lookup_len(&self) -> usize {
        self.ko_lookup.values().map(Vec::len).sum()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} game, {} moves, {:?} to play",
            self.ruleset, self.moves_played, self.current_player
        )?;
        writeln!(
            f,
            "komi {}, handicap {}, captures B {} / W {}",
            self.komi,
            self.handicap_stones.len(),
            self.captures_by_black,
            self.captures_by_white
        )?;
        if let Some(previous) = self.previous_move {
            writeln!(f, "previous move @ {previous}")?;
        }
        writeln!(f, "zobrist {:#018x}", self.board.zobrist_hash())?;
        write!(f, "{}", self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(ruleset: Ruleset, size: usize) -> Game {
        Game::new(ruleset, ruleset.default_komi(), &BTreeSet::new(), size).unwrap()
    }

    fn vertex(label: &str) -> Vertex {
        Vertex::parse(label, 19).unwrap()
    }

    fn play_all(start: Game, labels: &[&str]) -> Game {
        labels.iter().fold(start, |state, label| {
            state
                .play(Vertex::parse(label, state.size()).unwrap())
                .unwrap()
        })
    }

    #[test]
    fn successors_alternate_and_count() {
        let root = game(Ruleset::Japanese, 19);
        assert_eq!(root.current_player(), Color::Black);

        let next = root.play(vertex("Q16")).unwrap();
        assert_eq!(next.current_player(), Color::White);
        assert_eq!(next.moves_played(), 1);
        assert_eq!(next.previous_move(), Some(vertex("Q16")));
        assert_eq!(next.previous_state().unwrap().moves_played(), 0);

        let after_pass = next.play(Vertex::Pass).unwrap();
        assert_eq!(after_pass.current_player(), Color::Black);
        assert_eq!(after_pass.moves_played(), 2);
    }

    #[test]
    fn occupied_points_are_rejected() {
        let state = game(Ruleset::Japanese, 19).play(vertex("D4")).unwrap();
        assert!(matches!(
            state.play(vertex("D4")),
            Err(Error::IllegalMove(_))
        ));
    }

    #[test]
    fn corner_capture_updates_counts_and_board() {
        // White A1 is captured by black stones on its two liberties.
        let state = play_all(
            game(Ruleset::Chinese, 19),
            &["A2", "A1", "B1"],
        );
        assert_eq!(state.captures_by_black(), 1);
        assert_eq!(state.captures_by_white(), 0);
        assert_eq!(state.stones_captured_last_turn(), 1);
        assert!(
            state
                .board()
                .get(Coord::get(0, 0, 19).unwrap())
                .counts_as_liberty()
        );
    }

    #[test]
    fn multi_stone_captures_are_complete() {
        // The white chain A1+B1 loses its last liberty at C1.
        let state = play_all(
            game(Ruleset::Chinese, 19),
            &["A2", "A1", "B2", "B1", "C1"],
        );
        assert_eq!(state.captures_by_black(), 2);
        assert_eq!(state.stones_captured_last_turn(), 2);
        assert!(
            state
                .board()
                .get(Coord::get(0, 0, 19).unwrap())
                .counts_as_liberty()
        );
        assert!(
            state
                .board()
                .get(Coord::get(1, 0, 19).unwrap())
                .counts_as_liberty()
        );
    }

    #[test]
    fn suicide_points_are_marked_and_excluded() {
        // Black builds an eye at D5; white tenukis along the right edge.
        let state = play_all(
            game(Ruleset::Japanese, 19),
            &["D4", "T1", "D6", "T2", "C5", "T3", "E5", "T4"],
        );
        // With black to move, D5 is just an own eye and stays open. Once it
        // is white's turn, playing inside is suicide and the point is
        // repainted.
        let for_white = state.play(vertex("Q16")).unwrap();
        let d5 = Coord::get(3, 4, 19).unwrap();
        assert_eq!(for_white.board().get(d5), Color::TemporarilyUnplayable);
        assert!(!for_white.legal_moves().contains(&Vertex::Play(d5)));
        assert!(matches!(
            for_white.play(Vertex::Play(d5)),
            Err(Error::IllegalMove(_))
        ));
        assert!(for_white.kos().is_empty());
    }

    #[test]
    fn simple_ko_lookup_stays_tiny() {
        let mut state = game(Ruleset::Japanese, 19);
        assert_eq!(state.ko_lookup_len(), 0);
        for label in ["Q16", "D4", "Q4", "D16", "K10"] {
            state = state.play(vertex(label)).unwrap();
            assert!(state.ko_lookup_len() <= 1);
        }
        let after_pass = state.play(Vertex::Pass).unwrap();
        assert_eq!(after_pass.ko_lookup_len(), 0);
    }

    #[test]
    fn super_ko_lookups_accumulate() {
        let mut state = game(Ruleset::ChineseKgs, 19);
        assert_eq!(state.ko_lookup_len(), 1);
        for (i, label) in ["Q16", "D4", "Q4", "D16"].iter().enumerate() {
            state = state.play(vertex(label)).unwrap();
            assert_eq!(state.ko_lookup_len(), i + 2);
        }
    }

    #[test]
    fn one_by_one_boards_offer_only_pass() {
        let root = game(Ruleset::Chinese, 1);
        let only = Coord::get(0, 0, 1).unwrap();
        // The single point is self-capture, so the root marking blocks it.
        assert_eq!(root.board().get(only), Color::TemporarilyUnplayable);
        assert_eq!(root.legal_moves(), BTreeSet::from([Vertex::Pass]));
        assert!(matches!(
            root.play(Vertex::Play(only)),
            Err(Error::IllegalMove(_))
        ));

        let passed = root.play(Vertex::Pass).unwrap();
        assert_eq!(passed.legal_moves(), BTreeSet::from([Vertex::Pass]));
    }

    #[test]
    fn handicap_roots_hand_white_the_move() {
        let stones: BTreeSet<Coord> = [(15, 15), (3, 3)]
            .into_iter()
            .map(|(c, r)| Coord::get(c, r, 19).unwrap())
            .collect();
        let root = Game::new(Ruleset::Japanese, 0.5, &stones, 19).unwrap();
        assert_eq!(root.current_player(), Color::White);
        assert_eq!(root.board().get(Coord::get(3, 3, 19).unwrap()), Color::Black);
        assert_eq!(root.initial().get(Coord::get(15, 15, 19).unwrap()), Color::Black);
    }

    #[test]
    fn replaying_the_previous_move_reproduces_the_board() {
        let state = play_all(
            game(Ruleset::Chinese, 19),
            &["A2", "A1", "B1"],
        );
        let previous = state.previous_state().unwrap();
        let Some(Vertex::Play(last)) = state.previous_move() else {
            panic!("expected a board move");
        };
        let replayed = previous.play(Vertex::Play(last)).unwrap();
        assert!(replayed.board().is_same_position_as(state.board()));
        assert_eq!(
            replayed.board().zobrist_hash(),
            state.board().zobrist_hash()
        );
    }

    #[test]
    fn empty_game_canonical_code() {
        let root = game(Ruleset::Japanese, 19);
        let dots = ".".repeat(361);
        assert_eq!(
            root.canonical_code(),
            format!("japanese_6.5_B_0_{dots}_{dots}")
        );
        assert_eq!(root.canonical_orientation(), Orientation::Unchanged);

        let area = game(Ruleset::Chinese, 19);
        assert_eq!(area.canonical_code(), format!("chinese_7.5_B_{dots}_{dots}"));
    }

    #[test]
    fn canonical_codes_identify_symmetric_openings() {
        let root = game(Ruleset::Chinese, 19);
        let corners: BTreeSet<String> = ["D4", "D16", "Q4", "Q16"]
            .iter()
            .map(|label| root.play(vertex(label)).unwrap().canonical_code())
            .collect();
        assert_eq!(corners.len(), 1);

        let center = root.play(vertex("K10")).unwrap().canonical_code();
        assert!(!corners.contains(&center));
    }
}
