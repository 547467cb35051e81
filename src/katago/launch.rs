use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::Deserialize;

use crate::katago::profile::HumanProfile;
use crate::utils::prelude::*;

fn default_analysis_threads() -> u32 {
    10
}

fn default_search_threads() -> u32 {
    1
}

fn default_playouts() -> u64 {
    16384
}

fn default_visits() -> u64 {
    1048576
}

fn default_fast_quit() -> bool {
    true
}

/// Everything needed to start the engine child process in analysis mode.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfiguration {
    pub executable: PathBuf,
    pub config: PathBuf,
    pub search_model: PathBuf,
    pub human_model: PathBuf,
    pub profile: HumanProfile,

    #[serde(default = "default_analysis_threads")]
    pub analysis_threads: u32,
    #[serde(default = "default_search_threads")]
    pub search_threads: u32,
    #[serde(default = "default_playouts")]
    pub playouts: u64,
    #[serde(default = "default_visits")]
    pub visits: u64,
    #[serde(default = "default_fast_quit")]
    pub fast_quit: bool,
    #[serde(default)]
    pub override_config: BTreeMap<String, String>,
}

impl LaunchConfiguration {
    /// Checks that the referenced files exist and the bounds make sense.
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("executable", &self.executable),
            ("config", &self.config),
            ("searchModel", &self.search_model),
            ("humanModel", &self.human_model),
        ] {
            require_file(name, path)?;
        }
        if self.analysis_threads == 0 || self.search_threads == 0 {
            return Err(Error::ConfigInvalid(
                "thread counts must be at least 1".into(),
            ));
        }
        if self.playouts == 0 || self.visits == 0 {
            return Err(Error::ConfigInvalid(
                "playout and visit caps must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The argument vector for the analysis subcommand. The winrate
    /// perspective is pinned to the side to move; nothing downstream works
    /// otherwise.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            "analysis".to_owned(),
            "-config".to_owned(),
            self.config.display().to_string(),
            "-model".to_owned(),
            self.search_model.display().to_string(),
            "-human-model".to_owned(),
            self.human_model.display().to_string(),
            "-override-config".to_owned(),
            format!(
                "humanSLProfile={},numAnalysisThreads={},numSearchThreads={},maxPlayouts={},maxVisits={},reportAnalysisWinrateAs=SIDETOMOVE",
                self.profile, self.analysis_threads, self.search_threads, self.playouts, self.visits
            ),
        ];
        if self.fast_quit {
            args.push("-quit-without-waiting".to_owned());
        }
        for (key, value) in &self.override_config {
            args.push("-override-config".to_owned());
            args.push(format!("{key}={value}"));
        }
        args
    }

    /// The full command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.display().to_string())
            .chain(self.launch_args())
            .join(" ")
    }
}

fn require_file(name: &str, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(Error::ConfigInvalid(format!(
            "{name} path {} is missing or not a file",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration() -> LaunchConfiguration {
        LaunchConfiguration {
            executable: "/opt/katago/katago".into(),
            config: "/opt/katago/analysis.cfg".into(),
            search_model: "/opt/katago/model.bin.gz".into(),
            human_model: "/opt/katago/human.bin.gz".into(),
            profile: HumanProfile::Rank9d,
            analysis_threads: 16,
            search_threads: 4,
            playouts: 16384,
            visits: 1048576,
            fast_quit: true,
            override_config: BTreeMap::from([(
                "nnCacheSizePowerOfTwo".to_owned(),
                "20".to_owned(),
            )]),
        }
    }

    #[test]
    fn launch_args_carry_the_forced_overrides() {
        let args = configuration().launch_args();
        assert_eq!(args[0], "analysis");
        assert!(args.contains(&"-quit-without-waiting".to_owned()));

        let packed = args
            .iter()
            .find(|a| a.starts_with("humanSLProfile="))
            .unwrap();
        assert!(packed.contains("humanSLProfile=rank_9d"));
        assert!(packed.contains("numAnalysisThreads=16"));
        assert!(packed.contains("maxPlayouts=16384"));
        assert!(packed.ends_with("reportAnalysisWinrateAs=SIDETOMOVE"));

        assert!(args.contains(&"nnCacheSizePowerOfTwo=20".to_owned()));
    }

    #[test]
    fn missing_paths_fail_validation() {
        let configuration = configuration();
        assert!(matches!(
            configuration.validate(),
            Err(Error::ConfigInvalid(_))
        ));
    }

    #[test]
    fn configurations_deserialize_with_defaults() {
        let json = r#"{
            "executable": "/engine/katago",
            "config": "/engine/analysis.cfg",
            "searchModel": "/engine/model.bin.gz",
            "humanModel": "/engine/human.bin.gz",
            "profile": "rank_9d"
        }"#;
        let configuration: LaunchConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(configuration.analysis_threads, 10);
        assert_eq!(configuration.visits, 1048576);
        assert!(configuration.fast_quit);
        assert!(configuration.override_config.is_empty());
    }
}
