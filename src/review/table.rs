use std::path::Path;

use itertools::Itertools;

use crate::katago::profile::HumanProfile;
use crate::review::compose::AnalysisRow;
use crate::utils::prelude::*;

const BASE_COLUMNS: [&str; 15] = [
    "Move",
    "Player",
    "Prior Lead",
    "Posterior Lead",
    "Loss",
    "Prior Win Rate",
    "Posterior Win Rate",
    "Drop",
    "Played",
    "Played Search",
    "Best",
    "Best Search",
    "Counts as Best",
    "Counts as Match",
    "Expected Loss",
];

/// The rating bands in column order: the synthetic uniform player, the
/// human profiles weakest first, then the engine itself.
fn rating_bands() -> Vec<(String, String)> {
    let mut bands = vec![("Random".to_owned(), "random".to_owned())];
    bands.extend(
        HumanProfile::all()
            .iter()
            .map(|p| (capitalize_pro(p.label()), p.label().to_owned())),
    );
    bands.push(("AI".to_owned(), "AI".to_owned()));
    bands
}

fn capitalize_pro(label: &str) -> String {
    if label == "pro" {
        "Pro".to_owned()
    } else {
        label.to_owned()
    }
}

/// The full header contract: the base columns, one prior column per rating
/// band, one JSON-encoded policy column per band, and the raw search
/// snapshot.
pub fn csv_header() -> Vec<String> {
    let bands = rating_bands();
    BASE_COLUMNS
        .iter()
        .map(|&c| c.to_owned())
        .chain(bands.iter().map(|(header, _)| header.clone()))
        .chain(bands.iter().map(|(header, _)| format!("{header} Policy")))
        .chain(std::iter::once("Search".to_owned()))
        .collect()
}

/// Writes one wide row per played move. Policy cells hold JSON documents;
/// the writer quotes them with doubled quotes per the CSV convention.
pub fn write_analysis_csv(path: &Path, analysis: &[AnalysisRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::ConfigInvalid(format!("cannot write {}: {e}", path.display())))?;

    let bands = rating_bands();
    writer
        .write_record(csv_header())
        .and_then(|()| {
            for row in analysis {
                writer.write_record(record_for(row, &bands)?)?;
            }
            writer.flush().map_err(csv::Error::from)
        })
        .map_err(|e| Error::ConfigInvalid(format!("cannot write {}: {e}", path.display())))?;

    log::info!("analysis written to {}", path.display());
    Ok(())
}

fn record_for(row: &AnalysisRow, bands: &[(String, String)]) -> Result<Vec<String>, csv::Error> {
    let mut record = vec![
        row.move_index.to_string(),
        row.player.to_string(),
        row.prior_lead.to_string(),
        row.posterior_lead.to_string(),
        row.loss.to_string(),
        row.prior_win_rate.to_string(),
        row.posterior_win_rate.to_string(),
        row.drop.to_string(),
        row.played.label(),
        row.played_visits.to_string(),
        row.best.label(),
        row.best_visits.to_string(),
        row.counts_as_best.to_string(),
        row.counts_as_match.to_string(),
        row.expected_loss.to_string(),
    ];

    for (_, key) in bands {
        record.push(
            row.priors
                .get(key)
                .map_or_else(String::new, |prior| prior.to_string()),
        );
    }
    for (_, key) in bands {
        let policy = row.policies.get(key);
        record.push(match policy {
            Some(policy) => serde_json::to_string(policy).map_err(std::io::Error::other)?,
            None => String::new(),
        });
    }
    record.push(serde_json::to_string(&row.search).map_err(std::io::Error::other)?);

    Ok(record)
}

/// The header as a single display line, for diagnostics.
pub fn header_line() -> String {
    csv_header().iter().join(",")
}
