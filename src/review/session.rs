use std::path::Path;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::goban::prelude::*;
use crate::katago::prelude::*;
use crate::record::GameRecord;
use crate::review::compose::{AccuracyConfig, AnalysisRow, compose_analysis};
use crate::review::table::write_analysis_csv;

fn default_ready_timeout_seconds() -> u64 {
    300
}

/// Everything a review run needs: how to launch the engine and how strictly
/// to judge the moves.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewConfig {
    pub katago: LaunchConfiguration,
    #[serde(default)]
    pub accuracy: AccuracyConfig,
    #[serde(default = "default_ready_timeout_seconds")]
    pub ready_timeout_seconds: u64,
}

impl ReviewConfig {
    /// Loads and validates a JSON configuration file.
    pub fn load(path: &Path) -> Result<ReviewConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigInvalid(format!("cannot read {}: {e}", path.display())))?;
        let config: ReviewConfig = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigInvalid(format!("cannot parse {}: {e}", path.display())))?;
        if config.ready_timeout_seconds == 0 {
            return Err(Error::ConfigInvalid(
                "readyTimeoutSeconds must be at least 1".into(),
            ));
        }
        config.katago.validate()?;
        Ok(config)
    }
}

/// Reviews one game record wall to wall: replays it, launches the engine,
/// issues the deep search plus one shallow query per human profile, composes
/// the analysis as responses stream in, and writes the CSV.
///
/// The session owns the engine child; killing it at the end is final and
/// abandons anything still in flight.
pub fn review_game(
    config: &ReviewConfig,
    record: &GameRecord,
    output: &Path,
) -> Result<Vec<AnalysisRow>> {
    let states = record.play_through()?;
    if states.len() < 2 {
        return Err(Error::SgfParse("the record contains no moves".into()));
    }

    let mut engine = Engine::launch(&config.katago)?;
    let started = Instant::now();
    engine.wait_until_ready(Duration::from_secs(config.ready_timeout_seconds))?;
    log::info!(
        "engine v{} ready after {:.3} seconds",
        engine.version().unwrap_or_else(|| "?".into()),
        started.elapsed().as_secs_f64()
    );

    // The deep search covers every position and carries the policy and
    // ownership arrays the report needs.
    let mut deep = record.to_query()?;
    deep.include_policy = Some(true);
    deep.include_ownership = Some(true);
    let search_id = engine.write_query(&mut deep)?;

    // One shallow query per profile: a single visit exposes the raw human
    // policy head, and the last position needs none because no move follows.
    let mut profile_ids = BTreeMap::new();
    for profile in HumanProfile::all() {
        let mut query = record.to_query()?;
        query.include_policy = Some(true);
        query.max_visits = Some(1);
        query.analyze_turns = Some((0..states.len() - 1).collect());
        query.set_human_profile(profile);
        let id = engine.write_query(&mut query)?;
        profile_ids.insert(profile, id);
    }

    let analysis = compose_analysis(
        &engine,
        &states,
        &config.accuracy,
        &search_id,
        &profile_ids,
        started,
    )?;
    engine.kill();

    write_analysis_csv(output, &analysis)?;

    let elapsed = started.elapsed().as_secs_f64();
    log::info!(
        "game reviewed in {elapsed:.3} seconds ({:.3} seconds per position)",
        elapsed / states.len() as f64
    );
    Ok(analysis)
}
