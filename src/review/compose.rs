use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::goban::prelude::*;
use crate::katago::prelude::*;
use crate::review::equivalence::MoveEquivalence;
use crate::review::symmetry::SymmetryFold;

/// How long to sleep when a round of polling yields nothing.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

fn default_lead_drop() -> f64 {
    0.5
}

fn default_winrate_drop() -> f64 {
    0.02
}

fn default_max_visit_ratio() -> f64 {
    0.25
}

fn default_top_moves() -> usize {
    6
}

/// Tolerances for deciding when a played move counts as best or as a match.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyConfig {
    /// A move within this many points of the favorite is indistinguishable
    /// from it.
    #[serde(default = "default_lead_drop")]
    pub lead_drop: f64,
    /// Same, in win-rate terms.
    #[serde(default = "default_winrate_drop")]
    pub winrate_drop: f64,
    /// Candidates with fewer than this fraction of the favorite's visits
    /// are too unreliable to match against.
    #[serde(default = "default_max_visit_ratio")]
    pub max_visit_ratio: f64,
    /// How many candidates after the favorite are considered for a match.
    #[serde(default = "default_top_moves")]
    pub top_moves: usize,
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        AccuracyConfig {
            lead_drop: default_lead_drop(),
            winrate_drop: default_winrate_drop(),
            max_visit_ratio: default_max_visit_ratio(),
            top_moves: default_top_moves(),
        }
    }
}

/// One composed row per played move.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisRow {
    pub move_index: usize,
    pub player: Player,
    pub prior_lead: f64,
    pub posterior_lead: f64,
    pub loss: f64,
    pub prior_win_rate: f64,
    pub posterior_win_rate: f64,
    pub drop: f64,
    pub played: Vertex,
    pub best: Vertex,
    pub played_visits: u64,
    pub best_visits: u64,
    pub accuracy: f64,
    pub counts_as_best: u8,
    pub counts_as_match: u8,
    pub expected_loss: f64,
    /// Played-move likelihood per rating band, plus `random` and `AI`.
    pub priors: BTreeMap<String, f64>,
    /// Full label→likelihood policy per rating band, plus `random` and `AI`.
    pub policies: BTreeMap<String, BTreeMap<String, f64>>,
    /// A trimmed snapshot of the raw search response.
    pub search: Value,
}

/// Converts a raw policy array into a label→likelihood map, dropping the
/// illegal-move sentinel entries.
pub fn convert_to_policy_map(size: usize, raw: &[f64]) -> Result<BTreeMap<String, f64>> {
    let mut policy = BTreeMap::new();
    for (index, &value) in raw.iter().enumerate() {
        if value < -0.5 {
            continue;
        }
        let vertex = Vertex::from_policy_index(index, size)?;
        policy.insert(vertex.label(), value);
    }
    Ok(policy)
}

/// Drains the deep search stream until every analyzed position has reported,
/// then orders the responses by turn number. The engine emits turns in
/// whatever order it finishes them.
pub fn collect_search_responses(
    source: &impl ResponseSource,
    search_id: &str,
    position_count: usize,
    started: Instant,
) -> Result<Vec<SuccessResponse>> {
    let mut responses: Vec<SuccessResponse> = Vec::with_capacity(position_count);

    while responses.len() < position_count {
        let Some(response) = source.next_response(search_id) else {
            if source.closed() {
                return Err(Error::EngineProtocol(format!(
                    "the engine stopped after {} of {position_count} search responses",
                    responses.len()
                )));
            }
            thread::sleep(POLL_INTERVAL);
            continue;
        };
        if response.id != search_id {
            return Err(Error::EngineProtocol(format!(
                "response for query {} arrived in query {search_id}'s stream",
                response.id
            )));
        }

        let turn = response.turn_number;
        responses.push(response);

        let done = responses.len();
        let elapsed = started.elapsed().as_secs_f64();
        log::info!(
            "{done} positions analyzed; turn {turn} complete; {elapsed:.3} seconds elapsed; {:.3} SPP",
            elapsed / done as f64
        );
    }

    responses.sort_by_key(|response| response.turn_number);
    Ok(responses)
}

/// Round-robins over the per-profile streams until each has reported every
/// analyzed position, converting each response's human policy into a label
/// map keyed by turn.
pub fn collect_human_policies(
    source: &impl ResponseSource,
    profile_ids: &BTreeMap<HumanProfile, String>,
    position_count: usize,
    size: usize,
) -> Result<HashMap<usize, BTreeMap<HumanProfile, BTreeMap<String, f64>>>> {
    let mut result: HashMap<usize, BTreeMap<HumanProfile, BTreeMap<String, f64>>> = HashMap::new();
    let total = profile_ids.len() * position_count.saturating_sub(1);
    let mut complete = 0;

    while complete < total {
        let mut found = false;

        for (&profile, query_id) in profile_ids {
            let Some(response) = source.next_response(query_id) else {
                continue;
            };
            if response.id != *query_id {
                return Err(Error::EngineProtocol(format!(
                    "response for query {} arrived in query {query_id}'s stream",
                    response.id
                )));
            }

            complete += 1;
            found = true;

            let human_policy = response.human_policy.as_deref().ok_or_else(|| {
                Error::EngineProtocol(format!(
                    "profile {profile} response for turn {} carried no human policy",
                    response.turn_number
                ))
            })?;
            result
                .entry(response.turn_number)
                .or_default()
                .insert(profile, convert_to_policy_map(size, human_policy)?);
        }

        if found {
            log::info!("{complete} / {total} profile policies received");
        } else if complete < total {
            if source.closed() {
                return Err(Error::EngineProtocol(format!(
                    "the engine stopped after {complete} of {total} profile policies"
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    Ok(result)
}

/// Composes the full analysis table for a replayed game.
///
/// Positions are visited from last-but-one down to first so each row can
/// borrow the next position's evaluation as its posterior. When the player
/// found the favorite move (directly, through an engine-reported symmetry,
/// or through transformational equivalence of the resulting positions), the
/// posterior is also written back over the prior: the engine's estimate for
/// the next position is the more reliable one, and the player must not be
/// charged a loss for the engine's own best move.
pub fn compose_analysis(
    source: &impl ResponseSource,
    states: &[Game],
    config: &AccuracyConfig,
    search_id: &str,
    profile_ids: &BTreeMap<HumanProfile, String>,
    started: Instant,
) -> Result<Vec<AnalysisRow>> {
    let position_count = states.len();
    if position_count < 2 {
        return Ok(Vec::new());
    }
    let size = states[0].size();

    log::info!("collecting search responses...");
    let search_responses = collect_search_responses(source, search_id, position_count, started)?;

    log::info!("collecting human profile policies...");
    let human_policies = collect_human_policies(source, profile_ids, position_count, size)?;

    log::info!("precomputing transformational equivalence across the game...");
    let equivalences = MoveEquivalence::for_states(&states[..position_count - 1]);

    let last = &search_responses[position_count - 1];
    let mut posterior_lead = -favorite_of(last)?.score_lead;
    let mut posterior_win_rate = 1.0 - favorite_of(last)?.winrate;

    let mut analysis: Vec<AnalysisRow> = Vec::with_capacity(position_count - 1);
    for i in (0..position_count - 1).rev() {
        let response = &search_responses[i];
        if response.turn_number != i {
            return Err(Error::EngineProtocol(format!(
                "expected a response for turn {i}, found turn {}",
                response.turn_number
            )));
        }

        let player = response.root_info.current_player;
        let favorite_info = favorite_of(response)?;
        let favorite = favorite_info.vertex;
        let mut prior_lead = favorite_info.score_lead;
        let mut prior_win_rate = favorite_info.winrate;

        let played = states[i + 1]
            .previous_move()
            .expect("successor states always record their move");

        let fold = SymmetryFold::new(&response.move_infos);
        let equivalence = &equivalences[i];

        let favorite_visits = favorite_info.visits;
        let threshold = (favorite_visits as f64 * config.max_visit_ratio).floor() as u64;
        let played_visits = fold.info(played).map_or(0, |info| info.visits);

        let counts_as_best;
        let counts_as_match;
        if fold.class(favorite).contains(&played) || equivalence.are_identical(played, favorite) {
            // The posterior correction.
            counts_as_best = 1;
            counts_as_match = 1;
            prior_lead = posterior_lead;
            prior_win_rate = posterior_win_rate;
        } else if prior_lead - posterior_lead < config.lead_drop
            && prior_win_rate - posterior_win_rate < config.winrate_drop
        {
            counts_as_best = 1;
            counts_as_match = 1;
        } else {
            counts_as_best = 0;
            let played_class = fold.class(played);
            let mut matched = 0;
            for candidate in fold.kept().iter().skip(1).take(config.top_moves) {
                if candidate.visits < threshold {
                    break;
                }
                if played_class.contains(&candidate.vertex)
                    || equivalence.are_identical(candidate.vertex, played)
                    || candidate.score_lead - posterior_lead < config.lead_drop
                        && candidate.winrate - posterior_win_rate < config.winrate_drop
                {
                    matched = 1;
                    break;
                }
            }
            counts_as_match = matched;
        }

        // The engine's expected loss over the moves it actually considered;
        // the divisor renormalizes the priors to that subset.
        let mut expected_loss = 0.0;
        let mut seen = favorite_info.prior;
        for info in fold.kept().iter().skip(1) {
            expected_loss += (prior_lead - info.score_lead) * info.prior;
            seen += info.prior;
        }
        if seen > 0.0 {
            expected_loss /= seen;
        }

        // Per-profile priors and policies, plus the synthetic entries.
        let played_label = played.label();
        let mut priors: BTreeMap<String, f64> = BTreeMap::new();
        let mut policies: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        if let Some(turn_policies) = human_policies.get(&i) {
            for (profile, policy) in turn_policies {
                let label = profile.label().to_owned();
                priors.insert(
                    label.clone(),
                    policy.get(&played_label).copied().unwrap_or(0.0),
                );
                policies.insert(label, policy.clone());
            }
        }
        if let Some(raw) = response.policy.as_deref() {
            let ai_policy = convert_to_policy_map(size, raw)?;

            let legal_count = raw.iter().filter(|&&value| value > -0.5).count();
            if legal_count > 0 {
                let random_prior = 1.0 / legal_count as f64;
                priors.insert("random".into(), random_prior);
                policies.insert(
                    "random".into(),
                    ai_policy.keys().map(|k| (k.clone(), random_prior)).collect(),
                );
            }

            priors.insert(
                "AI".into(),
                ai_policy.get(&played_label).copied().unwrap_or(0.0),
            );
            policies.insert("AI".into(), ai_policy);
        }

        let search = snapshot(response, size)?;

        analysis.push(AnalysisRow {
            move_index: i + 1,
            player,
            prior_lead,
            posterior_lead,
            loss: prior_lead - posterior_lead,
            prior_win_rate,
            posterior_win_rate,
            drop: prior_win_rate - posterior_win_rate,
            played,
            best: favorite,
            played_visits,
            best_visits: favorite_visits,
            accuracy: if favorite_visits > 0 {
                played_visits.min(favorite_visits) as f64 / favorite_visits as f64
            } else {
                0.0
            },
            counts_as_best,
            counts_as_match,
            expected_loss,
            priors,
            policies,
            search,
        });

        // The corrected values feed the previous row's posterior.
        posterior_lead = -prior_lead;
        posterior_win_rate = 1.0 - prior_win_rate;
    }

    analysis.reverse();
    log::info!("analysis composed");
    Ok(analysis)
}

fn favorite_of(response: &SuccessResponse) -> Result<&MoveInfo> {
    response.move_infos.first().ok_or_else(|| {
        Error::EngineProtocol(format!(
            "the response for turn {} carried no move infos",
            response.turn_number
        ))
    })
}

/// The trimmed raw-search snapshot embedded in each row.
fn snapshot(response: &SuccessResponse, size: usize) -> Result<Value> {
    let ownership: Option<BTreeMap<String, f64>> = match response.ownership.as_deref() {
        Some(raw) => {
            let mut map = BTreeMap::new();
            for (index, &value) in raw.iter().enumerate() {
                map.insert(Vertex::from_policy_index(index, size)?.label(), value);
            }
            Some(map)
        }
        None => None,
    };

    Ok(json!({
        "turnNumber": response.turn_number,
        "rootInfo": {
            "currentPlayer": response.root_info.current_player.letter().to_string(),
            "visits": response.root_info.visits,
        },
        "policy": response.policy,
        "ownership": ownership,
        "moveInfos": response
            .move_infos
            .iter()
            .map(|info| {
                json!({
                    "isSymmetryOf": info.is_symmetry_of.map(|v| v.label()),
                    "move": info.vertex.label(),
                    "order": info.order,
                    "prior": info.prior,
                    "scoreLead": info.score_lead,
                    "visits": info.visits,
                    "winrate": info.winrate,
                })
            })
            .collect::<Vec<_>>(),
    }))
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::katago::response::RootInfo;

    /// Hands out pre-recorded responses the way the driver would.
    #[derive(Default)]
    struct StubSource {
        responses: Mutex<HashMap<String, VecDeque<SuccessResponse>>>,
        closed: bool,
    }

    impl StubSource {
        fn push(&mut self, response: SuccessResponse) {
            self.responses
                .lock()
                .entry(response.id.clone())
                .or_default()
                .push_back(response);
        }
    }

    impl ResponseSource for StubSource {
        fn next_response(&self, query_id: &str) -> Option<SuccessResponse> {
            self.responses.lock().get_mut(query_id)?.pop_front()
        }

        fn closed(&self) -> bool {
            self.closed
        }
    }

    fn info(label: &str, visits: u64, prior: f64, winrate: f64, score_lead: f64) -> MoveInfo {
        MoveInfo {
            vertex: Vertex::parse(label, 19).unwrap(),
            order: 0,
            visits,
            prior,
            winrate,
            score_lead,
            pv: vec![],
            lcb: None,
            utility: None,
            weight: None,
            score_mean: None,
            score_stdev: None,
            human_prior: None,
            is_symmetry_of: None,
        }
    }

    fn response(
        id: &str,
        turn_number: usize,
        player: Player,
        move_infos: Vec<MoveInfo>,
    ) -> SuccessResponse {
        let favorite = &move_infos[0];
        SuccessResponse {
            id: id.into(),
            turn_number,
            is_during_search: false,
            root_info: RootInfo {
                current_player: player,
                winrate: favorite.winrate,
                score_lead: favorite.score_lead,
                visits: move_infos.iter().map(|m| m.visits).sum(),
                score_stdev: None,
                utility: None,
                this_hash: None,
                sym_hash: None,
                raw_winrate: None,
                human_winrate: None,
            },
            move_infos,
            policy: None,
            ownership: None,
            human_policy: None,
        }
    }

    fn states(labels: &[&str]) -> Vec<Game> {
        let mut states = vec![Game::new(Ruleset::Chinese, 7.5, &BTreeSet::new(), 19).unwrap()];
        for label in labels {
            let next = states
                .last()
                .unwrap()
                .play(Vertex::parse(label, 19).unwrap())
                .unwrap();
            states.push(next);
        }
        states
    }

    #[test]
    fn playing_the_favorite_costs_nothing() {
        // Black plays the favorite D4, then white plays the favorite Q16.
        let states = states(&["D4", "Q16"]);
        let mut source = StubSource::default();
        source.push(response("s", 0, Player::B, vec![info("D4", 100, 0.5, 0.52, 1.0)]));
        source.push(response("s", 1, Player::W, vec![info("Q16", 90, 0.4, 0.49, -0.8)]));
        source.push(response("s", 2, Player::B, vec![info("K10", 80, 0.3, 0.51, 0.6)]));

        let analysis = compose_analysis(
            &source,
            &states,
            &AccuracyConfig::default(),
            "s",
            &BTreeMap::new(),
            Instant::now(),
        )
        .unwrap();

        assert_eq!(analysis.len(), 2);
        for row in &analysis {
            assert_eq!(row.counts_as_best, 1);
            assert_eq!(row.counts_as_match, 1);
            assert_eq!(row.loss, 0.0);
            assert_eq!(row.drop, 0.0);
        }

        // The corrected posterior flows backward: each prior is the
        // negation of the next row's (corrected) evaluation.
        assert_eq!(analysis[1].prior_lead, -0.6);
        assert_eq!(analysis[0].posterior_lead, 0.6);
        assert_eq!(analysis[0].prior_lead, 0.6);
        assert_eq!(analysis[0].move_index, 1);
        assert_eq!(analysis[1].move_index, 2);
        assert_eq!(analysis[1].accuracy, 1.0);
    }

    #[test]
    fn symmetric_favorites_also_count_as_best() {
        // Black plays D4 while the engine favored Q16; on the empty board
        // the two moves lead to board-symmetric positions.
        let states = states(&["D4"]);
        let mut source = StubSource::default();
        source.push(response("s", 0, Player::B, vec![info("Q16", 100, 0.5, 0.52, 1.0)]));
        source.push(response("s", 1, Player::W, vec![info("D16", 90, 0.4, 0.49, -0.8)]));

        let analysis = compose_analysis(
            &source,
            &states,
            &AccuracyConfig::default(),
            "s",
            &BTreeMap::new(),
            Instant::now(),
        )
        .unwrap();

        assert_eq!(analysis.len(), 1);
        assert_eq!(analysis[0].counts_as_best, 1);
        assert_eq!(analysis[0].counts_as_match, 1);
        assert_eq!(analysis[0].loss, 0.0);
        assert_eq!(analysis[0].prior_lead, 0.8);
    }

    #[test]
    fn expected_loss_renormalizes_over_the_considered_moves() {
        // Black plays C3, which the engine never considered; the two
        // candidates carry priors 0.4 and 0.2 with leads 10 and 7.
        let states = states(&["C3"]);
        let mut source = StubSource::default();
        source.push(response(
            "s",
            0,
            Player::B,
            vec![
                info("Q16", 100, 0.4, 0.62, 10.0),
                info("D4", 10, 0.2, 0.5, 7.0),
            ],
        ));
        source.push(response("s", 1, Player::W, vec![info("Q16", 90, 0.4, 0.4, -2.0)]));

        let analysis = compose_analysis(
            &source,
            &states,
            &AccuracyConfig::default(),
            "s",
            &BTreeMap::new(),
            Instant::now(),
        )
        .unwrap();

        let row = &analysis[0];
        assert!((row.expected_loss - 1.0).abs() < 1e-12);
        assert_eq!(row.counts_as_best, 0);
        // The one candidate after the favorite falls under the visit
        // threshold, so it cannot rescue a match.
        assert_eq!(row.counts_as_match, 0);
        assert_eq!(row.loss, 8.0);
        assert_eq!(row.played_visits, 0);
        assert_eq!(row.best_visits, 100);
        assert_eq!(row.accuracy, 0.0);
    }

    #[test]
    fn foreign_ids_and_dead_streams_are_protocol_errors() {
        let states = states(&["D4"]);
        let mut source = StubSource::default();
        source.push(response("other", 0, Player::B, vec![info("D4", 1, 0.5, 0.5, 0.0)]));
        let mut table = source.responses.lock();
        let queue = table.remove("other").unwrap();
        table.insert("s".into(), queue);
        drop(table);

        let result = collect_search_responses(&source, "s", states.len(), Instant::now());
        assert!(matches!(result, Err(Error::EngineProtocol(_))));

        let dead = StubSource {
            closed: true,
            ..StubSource::default()
        };
        let result = collect_search_responses(&dead, "s", 2, Instant::now());
        assert!(matches!(result, Err(Error::EngineProtocol(_))));
    }

    #[test]
    fn human_policies_key_by_turn_and_profile() {
        let mut source = StubSource::default();
        let mut turn0 = response("p20k", 0, Player::B, vec![info("D4", 1, 0.5, 0.5, 0.0)]);
        // A1 sits at the front of the bottom row; the board-sized prefix is
        // the sentinel except two entries.
        let mut human = vec![-1.0; 362];
        human[361] = 0.25; // pass
        human[360] = 0.75; // T1
        turn0.human_policy = Some(human);
        source.push(turn0);

        let ids = BTreeMap::from([(HumanProfile::Rank20k, "p20k".to_owned())]);
        let policies = collect_human_policies(&source, &ids, 2, 19).unwrap();
        let map = &policies[&0][&HumanProfile::Rank20k];
        assert_eq!(map.len(), 2);
        assert_eq!(map["pass"], 0.25);
        assert_eq!(map["T1"], 0.75);
    }
}
