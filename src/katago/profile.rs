use serde::{Deserialize, Serialize};

/// The human-style policy profiles the engine's human model can emulate,
/// from weakest kyu to professional play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HumanProfile {
    #[serde(rename = "rank_20k")]
    Rank20k,
    #[serde(rename = "rank_19k")]
    Rank19k,
    #[serde(rename = "rank_18k")]
    Rank18k,
    #[serde(rename = "rank_17k")]
    Rank17k,
    #[serde(rename = "rank_16k")]
    Rank16k,
    #[serde(rename = "rank_15k")]
    Rank15k,
    #[serde(rename = "rank_14k")]
    Rank14k,
    #[serde(rename = "rank_13k")]
    Rank13k,
    #[serde(rename = "rank_12k")]
    Rank12k,
    #[serde(rename = "rank_11k")]
    Rank11k,
    #[serde(rename = "rank_10k")]
    Rank10k,
    #[serde(rename = "rank_9k")]
    Rank9k,
    #[serde(rename = "rank_8k")]
    Rank8k,
    #[serde(rename = "rank_7k")]
    Rank7k,
    #[serde(rename = "rank_6k")]
    Rank6k,
    #[serde(rename = "rank_5k")]
    Rank5k,
    #[serde(rename = "rank_4k")]
    Rank4k,
    #[serde(rename = "rank_3k")]
    Rank3k,
    #[serde(rename = "rank_2k")]
    Rank2k,
    #[serde(rename = "rank_1k")]
    Rank1k,
    #[serde(rename = "rank_1d")]
    Rank1d,
    #[serde(rename = "rank_2d")]
    Rank2d,
    #[serde(rename = "rank_3d")]
    Rank3d,
    #[serde(rename = "rank_4d")]
    Rank4d,
    #[serde(rename = "rank_5d")]
    Rank5d,
    #[serde(rename = "rank_6d")]
    Rank6d,
    #[serde(rename = "rank_7d")]
    Rank7d,
    #[serde(rename = "rank_8d")]
    Rank8d,
    #[serde(rename = "rank_9d")]
    Rank9d,
    #[serde(rename = "proyear_2023")]
    Pro,
}

impl HumanProfile {
    /// Every profile, weakest first.
    pub fn all() -> [HumanProfile; 30] {
        [
            HumanProfile::Rank20k,
            HumanProfile::Rank19k,
            HumanProfile::Rank18k,
            HumanProfile::Rank17k,
            HumanProfile::Rank16k,
            HumanProfile::Rank15k,
            HumanProfile::Rank14k,
            HumanProfile::Rank13k,
            HumanProfile::Rank12k,
            HumanProfile::Rank11k,
            HumanProfile::Rank10k,
            HumanProfile::Rank9k,
            HumanProfile::Rank8k,
            HumanProfile::Rank7k,
            HumanProfile::Rank6k,
            HumanProfile::Rank5k,
            HumanProfile::Rank4k,
            HumanProfile::Rank3k,
            HumanProfile::Rank2k,
            HumanProfile::Rank1k,
            HumanProfile::Rank1d,
            HumanProfile::Rank2d,
            HumanProfile::Rank3d,
            HumanProfile::Rank4d,
            HumanProfile::Rank5d,
            HumanProfile::Rank6d,
            HumanProfile::Rank7d,
            HumanProfile::Rank8d,
            HumanProfile::Rank9d,
            HumanProfile::Pro,
        ]
    }

    /// The value written into `overrideSettings.humanSLProfile`.
    pub fn setting(&self) -> &'static str {
        match self {
            HumanProfile::Rank20k => "rank_20k",
            HumanProfile::Rank19k => "rank_19k",
            HumanProfile::Rank18k => "rank_18k",
            HumanProfile::Rank17k => "rank_17k",
            HumanProfile::Rank16k => "rank_16k",
            HumanProfile::Rank15k => "rank_15k",
            HumanProfile::Rank14k => "rank_14k",
            HumanProfile::Rank13k => "rank_13k",
            HumanProfile::Rank12k => "rank_12k",
            HumanProfile::Rank11k => "rank_11k",
            HumanProfile::Rank10k => "rank_10k",
            HumanProfile::Rank9k => "rank_9k",
            HumanProfile::Rank8k => "rank_8k",
            HumanProfile::Rank7k => "rank_7k",
            HumanProfile::Rank6k => "rank_6k",
            HumanProfile::Rank5k => "rank_5k",
            HumanProfile::Rank4k => "rank_4k",
            HumanProfile::Rank3k => "rank_3k",
            HumanProfile::Rank2k => "rank_2k",
            HumanProfile::Rank1k => "rank_1k",
            HumanProfile::Rank1d => "rank_1d",
            HumanProfile::Rank2d => "rank_2d",
            HumanProfile::Rank3d => "rank_3d",
            HumanProfile::Rank4d => "rank_4d",
            HumanProfile::Rank5d => "rank_5d",
            HumanProfile::Rank6d => "rank_6d",
            HumanProfile::Rank7d => "rank_7d",
            HumanProfile::Rank8d => "rank_8d",
            HumanProfile::Rank9d => "rank_9d",
            HumanProfile::Pro => "proyear_2023",
        }
    }

    /// The short label used in reports and CSV headers: the rank band for
    /// the rated profiles, `pro` for the professional one.
    pub fn label(&self) -> &'static str {
        match self {
            HumanProfile::Pro => "pro",
            other => {
                let setting = other.setting();
                &setting[setting.find('_').map(|i| i + 1).unwrap_or(0)..]
            }
        }
    }
}

impl std::fmt::Display for HumanProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.setting())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_simplify_the_setting() {
        assert_eq!(HumanProfile::Rank20k.label(), "20k");
        assert_eq!(HumanProfile::Rank1d.label(), "1d");
        assert_eq!(HumanProfile::Pro.label(), "pro");
    }

    #[test]
    fn profiles_are_ordered_weakest_first() {
        let all = HumanProfile::all();
        assert_eq!(all.len(), 30);
        assert_eq!(all[0], HumanProfile::Rank20k);
        assert_eq!(all[19], HumanProfile::Rank1k);
        assert_eq!(all[20], HumanProfile::Rank1d);
        assert_eq!(all[29], HumanProfile::Pro);
    }

    #[test]
    fn settings_serialize_as_wire_values() {
        let json = serde_json::to_string(&HumanProfile::Rank3d).unwrap();
        assert_eq!(json, "\"rank_3d\"");
        let parsed: HumanProfile = serde_json::from_str("\"proyear_2023\"").unwrap();
        assert_eq!(parsed, HumanProfile::Pro);
    }
}
