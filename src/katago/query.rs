use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::goban::prelude::*;
use crate::katago::profile::HumanProfile;

pub const HUMAN_PROFILE_SETTING: &str = "humanSLProfile";
pub const SEARCH_TIME_SETTING: &str = "maxTime";

/// Stone color on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Player {
    B,
    W,
}

impl Player {
    pub fn opposite(&self) -> Player {
        match self {
            Player::B => Player::W,
            Player::W => Player::B,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Player::B => Color::Black,
            Player::W => Color::White,
        }
    }

    /// Only stone colors have a wire form.
    pub fn from_color(color: Color) -> Option<Player> {
        match color {
            Color::Black => Some(Player::B),
            Color::White => Some(Player::W),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Player::B => 'B',
            Player::W => 'W',
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One `["B","Q16"]` pair: a stone placement or a played move.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement(pub Player, pub Vertex);

/// The `rules` field accepts either a named ruleset or an explicit rules
/// object.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rules {
    Named(Ruleset),
    Explicit(RulesSpecification),
}

impl Default for Rules {
    fn default() -> Self {
        Rules::Named(Ruleset::Japanese)
    }
}

/// A single analysis query, serialized as one line of camelCase JSON.
/// Optional fields are omitted entirely rather than sent as null.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Assigned by the engine driver immediately before the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub board_x_size: usize,
    pub board_y_size: usize,
    pub rules: Rules,
    pub moves: Vec<Placement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyze_turns: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_stones: Option<Vec<Placement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_player: Option<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub komi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_policy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_ownership: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_visits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_settings: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_handicap_bonus: Option<crate::goban::ruleset::WhiteHandicapBonus>,
}

impl Query {
    /// Selects the human profile this query should be answered under.
    pub fn set_human_profile(&mut self, profile: HumanProfile) {
        self.update_override_setting(HUMAN_PROFILE_SETTING, Value::from(profile.setting()));
    }

    pub fn remove_human_profile(&mut self) {
        self.remove_override_setting(HUMAN_PROFILE_SETTING);
    }

    /// Caps the engine-side wall clock for this query.
    pub fn set_search_seconds(&mut self, seconds: u64) {
        self.update_override_setting(SEARCH_TIME_SETTING, Value::from(seconds));
    }

    pub fn remove_search_seconds(&mut self) {
        self.remove_override_setting(SEARCH_TIME_SETTING);
    }

    fn update_override_setting(&mut self, key: &str, value: Value) {
        self.override_settings
            .get_or_insert_with(Map::new)
            .insert(key.to_owned(), value);
    }

    fn remove_override_setting(&mut self, key: &str) {
        if let Some(settings) = self.override_settings.as_mut() {
            settings.remove(key);
            if settings.is_empty() {
                self.override_settings = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(player: Player, label: &str) -> Placement {
        Placement(player, Vertex::parse(label, 19).unwrap())
    }

    #[test]
    fn queries_serialize_with_camel_case_keys_and_move_pairs() {
        let query = Query {
            id: Some("abc".into()),
            board_x_size: 19,
            board_y_size: 19,
            rules: Rules::Named(Ruleset::ChineseKgs),
            moves: vec![placement(Player::B, "Q16"), placement(Player::W, "D4")],
            analyze_turns: Some(vec![0, 1, 2]),
            komi: Some(7.5),
            include_policy: Some(true),
            ..Query::default()
        };

        let json = serde_json::to_string(&query).unwrap();
        assert!(json.contains("\"boardXSize\":19"));
        assert!(json.contains("\"rules\":\"chinese-kgs\""));
        assert!(json.contains("\"moves\":[[\"B\",\"Q16\"],[\"W\",\"D4\"]]"));
        assert!(json.contains("\"analyzeTurns\":[0,1,2]"));
        assert!(json.contains("\"includePolicy\":true"));
        assert!(!json.contains("maxVisits"));
        assert!(!json.contains("null"));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn explicit_rules_objects_are_inlined() {
        let query = Query {
            board_x_size: 9,
            board_y_size: 9,
            rules: Rules::Explicit(Ruleset::NewZealand.specification()),
            ..Query::default()
        };
        let json = serde_json::to_string(&query).unwrap();
        assert!(json.contains("\"rules\":{"));
        assert!(json.contains("\"ko\":\"SITUATIONAL\""));
    }

    #[test]
    fn override_settings_accumulate_and_clear() {
        let mut query = Query::default();
        query.set_human_profile(HumanProfile::Rank5k);
        query.set_search_seconds(12);

        let json = serde_json::to_string(&query).unwrap();
        assert!(json.contains("\"humanSLProfile\":\"rank_5k\""));
        assert!(json.contains("\"maxTime\":12"));

        query.remove_search_seconds();
        query.remove_human_profile();
        assert!(query.override_settings.is_none());
    }

    #[test]
    fn pass_moves_serialize_by_label() {
        let pass = Placement(Player::W, Vertex::Pass);
        assert_eq!(serde_json::to_string(&pass).unwrap(), "[\"W\",\"pass\"]");
    }
}
