use serde::Deserialize;
use serde_json::Value;

use crate::goban::prelude::*;
use crate::katago::query::{Placement, Player, Query, Rules};

/// One node of a parsed game record: a property bag keyed by SGF-style
/// identifiers. Parsing record text is a separate tool's job; its output
/// deserializes directly into this.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct RecordNode {
    properties: BTreeMap<String, Value>,
}

impl RecordNode {
    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// The property as text, whatever scalar the parser produced.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.properties.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.properties.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The property as a list of strings; scalars count as one-element
    /// lists, which is how single-stone `AB` properties usually arrive.
    pub fn values(&self, key: &str) -> Vec<String> {
        match self.properties.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Number(n)) => vec![n.to_string()],
            _ => Vec::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.properties.insert(key.to_owned(), value);
    }
}

/// The main variation of a recorded game, as an ordered node sequence. Move
/// properties carry engine-style labels (`Q16`, empty or `pass` for a pass).
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct GameRecord {
    pub nodes: Vec<RecordNode>,
}

/// The standard 19x19 star points for handicaps 2 through 9, as placed when
/// a record declares `HA` without explicit stones.
fn star_points(handicap: usize) -> Vec<&'static str> {
    let mut points = Vec::new();
    if handicap >= 2 {
        points.extend(["Q16", "D4"]);
    }
    if handicap >= 3 {
        points.push("Q4");
    }
    if handicap >= 4 {
        points.push("D16");
    }
    if matches!(handicap, 5 | 7 | 9) {
        points.push("K10");
    }
    if matches!(handicap, 6 | 8 | 9) {
        points.extend(["D10", "Q10"]);
    }
    if handicap >= 8 {
        points.extend(["K16", "K4"]);
    }
    points
}

impl GameRecord {
    /// Deserializes the upstream parser's JSON: an array of property bags.
    pub fn from_json(text: &str) -> Result<GameRecord> {
        let record: GameRecord = serde_json::from_str(text)
            .map_err(|e| Error::SgfParse(format!("record does not deserialize: {e}")))?;
        record.root()?;
        Ok(record)
    }

    fn root(&self) -> Result<&RecordNode> {
        let root = self
            .nodes
            .first()
            .ok_or_else(|| Error::SgfParse("the record has no main variation".into()))?;
        if let Some(game) = root.integer("GM") {
            if game != 1 {
                return Err(Error::SgfParse(format!("GM {game} is not a go record")));
            }
        }
        Ok(root)
    }

    pub fn size(&self) -> Result<usize> {
        let size = self.root()?.integer("SZ").unwrap_or(19);
        if size < 1 || size as usize > MAX_BOARD_SIZE {
            return Err(Error::SgfParse(format!(
                "SZ {size} is not a reviewable board size"
            )));
        }
        Ok(size as usize)
    }

    /// The record's ruleset; unrecognized or missing `RU` degrades to
    /// Japanese with a warning, matching how sloppy real-world records are.
    pub fn ruleset(&self) -> Result<Ruleset> {
        let Some(text) = self.root()?.text("RU") else {
            return Ok(Ruleset::Japanese);
        };
        match text.parse() {
            Ok(ruleset) => Ok(ruleset),
            Err(_) => {
                log::warn!("RU {text:?} is not a ruleset the engine knows; assuming japanese");
                Ok(Ruleset::Japanese)
            }
        }
    }

    pub fn komi(&self) -> Result<f64> {
        let ruleset = self.ruleset()?;
        Ok(self
            .root()?
            .number("KM")
            .unwrap_or_else(|| ruleset.default_komi()))
    }

    /// Handicap stones from `AB`, or the standard star points when only
    /// `HA` is declared.
    pub fn handicap_stones(&self) -> Result<BTreeSet<Coord>> {
        let root = self.root()?;
        let size = self.size()?;

        let handicap = root.integer("HA").unwrap_or(0);
        if !(0..=9).contains(&handicap) {
            return Err(Error::SgfParse(format!("HA {handicap} is out of range")));
        }

        let placements = root.values("AB");
        if !placements.is_empty() {
            return placements
                .iter()
                .map(|label| parse_stone(label, size))
                .collect();
        }

        if handicap >= 2 {
            if size != 19 {
                return Err(Error::SgfParse(format!(
                    "HA {handicap} without AB stones is only defined on 19x19, not {size}x{size}"
                )));
            }
            return star_points(handicap as usize)
                .iter()
                .map(|label| parse_stone(label, size))
                .collect();
        }

        Ok(BTreeSet::new())
    }

    /// The move list in record order. A node may carry `B` or `W`; an empty
    /// value is that player passing. Nodes with neither are skipped.
    pub fn moves(&self) -> Result<Vec<Placement>> {
        let size = self.size()?;
        let mut moves = Vec::new();

        for node in &self.nodes {
            for (key, player) in [("B", Player::B), ("W", Player::W)] {
                if !node.has(key) {
                    continue;
                }
                let label = node.text(key).unwrap_or_default();
                let vertex = if label.is_empty() {
                    Vertex::Pass
                } else {
                    Vertex::parse(&label, size)
                        .map_err(|_| Error::SgfParse(format!("unparseable move {label:?}")))?
                };
                moves.push(Placement(player, vertex));
            }
        }

        Ok(moves)
    }

    /// The move list with passes inserted wherever the record skips a
    /// color. Both the replay and the analysis queries are built from this,
    /// so the engine's turn numbering and the replayed states line up
    /// exactly.
    pub fn normalized_moves(&self) -> Result<Vec<Placement>> {
        let mut current = if self.handicap_stones()?.is_empty() {
            Player::B
        } else {
            Player::W
        };

        let mut normalized = Vec::new();
        for Placement(player, vertex) in self.moves()? {
            if player != current {
                normalized.push(Placement(current, Vertex::Pass));
                current = current.opposite();
            }
            normalized.push(Placement(player, vertex));
            current = current.opposite();
        }
        Ok(normalized)
    }

    /// The color that moves first: White when handicap stones are down,
    /// Black otherwise. The normalized move list starts with this color.
    pub fn initial_player(&self) -> Result<Player> {
        Ok(if self.handicap_stones()?.is_empty() {
            Player::B
        } else {
            Player::W
        })
    }

    /// Replays the record into the full list of game states, root included.
    pub fn play_through(&self) -> Result<Vec<Game>> {
        let mut game = Game::new(
            self.ruleset()?,
            self.komi()?,
            &self.handicap_stones()?,
            self.size()?,
        )?;
        let mut states = vec![game.clone()];

        for Placement(_, vertex) in self.normalized_moves()? {
            game = game.play(vertex)?;
            states.push(game.clone());
        }

        Ok(states)
    }

    /// The deep analysis query covering every position of the game.
    pub fn to_query(&self) -> Result<Query> {
        let size = self.size()?;
        let moves = self.normalized_moves()?;
        let stones = self.handicap_stones()?;

        let initial_stones: Vec<Placement> = stones
            .iter()
            .map(|&stone| Placement(Player::B, Vertex::Play(stone)))
            .collect();

        Ok(Query {
            board_x_size: size,
            board_y_size: size,
            rules: Rules::Named(self.ruleset()?),
            komi: Some(self.komi()?),
            initial_player: Some(self.initial_player()?),
            initial_stones: (!initial_stones.is_empty()).then_some(initial_stones),
            analyze_turns: Some((0..=moves.len()).collect()),
            moves,
            ..Query::default()
        })
    }
}

fn parse_stone(label: &str, size: usize) -> Result<Coord> {
    match Vertex::parse(label, size) {
        Ok(Vertex::Play(coord)) => Ok(coord),
        _ => Err(Error::SgfParse(format!("unparseable stone {label:?}"))),
    }
}
