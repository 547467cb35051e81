use serde::Deserialize;

use crate::goban::prelude::*;
use crate::katago::query::Player;

/// Root statistics for one analyzed position. Only the fields the review
/// pipeline consumes are required; the engine sends more, which is ignored.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootInfo {
    pub current_player: Player,
    pub winrate: f64,
    pub score_lead: f64,
    pub visits: u64,
    #[serde(default)]
    pub score_stdev: Option<f64>,
    #[serde(default)]
    pub utility: Option<f64>,
    #[serde(default)]
    pub this_hash: Option<String>,
    #[serde(default)]
    pub sym_hash: Option<String>,
    #[serde(default)]
    pub raw_winrate: Option<f64>,
    #[serde(default)]
    pub human_winrate: Option<f64>,
}

/// Per-candidate-move statistics from the search.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveInfo {
    #[serde(rename = "move")]
    pub vertex: Vertex,
    pub order: usize,
    pub visits: u64,
    pub prior: f64,
    pub winrate: f64,
    pub score_lead: f64,
    #[serde(default)]
    pub pv: Vec<Vertex>,
    #[serde(default)]
    pub lcb: Option<f64>,
    #[serde(default)]
    pub utility: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub score_mean: Option<f64>,
    #[serde(default)]
    pub score_stdev: Option<f64>,
    #[serde(default)]
    pub human_prior: Option<f64>,
    /// When present, this move's subtree was folded into the named move,
    /// its board-symmetric canonical representative.
    #[serde(default)]
    pub is_symmetry_of: Option<Vertex>,
}

/// One successfully analyzed turn.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub id: String,
    pub turn_number: usize,
    #[serde(default)]
    pub is_during_search: bool,
    pub root_info: RootInfo,
    pub move_infos: Vec<MoveInfo>,
    #[serde(default)]
    pub policy: Option<Vec<f64>>,
    #[serde(default)]
    pub ownership: Option<Vec<f64>>,
    #[serde(default)]
    pub human_policy: Option<Vec<f64>>,
}

/// A query the engine rejected outright.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// A field the engine accepted but complained about.
#[derive(Clone, Debug, Deserialize)]
pub struct WarningResponse {
    pub warning: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Any single line the engine emits on stdout.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Error(ErrorResponse),
    Warning(WarningResponse),
    Success(SuccessResponse),
}
