use serde::{Deserialize, Serialize};

use crate::goban::prelude::*;

/// Ko-repetition variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KoRule {
    Simple,
    Positional,
    Situational,
}

/// How finished games are counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scoring {
    Area,
    Territory,
}

/// Group-tax variants carried on the wire rules object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxRule {
    None,
    Seki,
    All,
}

/// How many points White receives per handicap stone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WhiteHandicapBonus {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "N")]
    N,
    #[serde(rename = "N-1")]
    NMinusOne,
}

/// The explicit rules object the engine accepts in place of a named ruleset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesSpecification {
    pub ko: KoRule,
    pub scoring: Scoring,
    pub tax: TaxRule,
    pub suicide: bool,
    pub has_button: bool,
    pub white_handicap_bonus: WhiteHandicapBonus,
    pub friendly_pass_ok: bool,
}

/// The named rulesets the engine understands on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ruleset {
    Aga,
    AgaButton,
    Bga,
    Chinese,
    ChineseKgs,
    ChineseOgs,
    Japanese,
    Korean,
    NewZealand,
    StoneScoring,
    TrompTaylor,
}

impl Ruleset {
    pub fn all() -> [Ruleset; 11] {
        [
            Ruleset::Aga,
            Ruleset::AgaButton,
            Ruleset::Bga,
            Ruleset::Chinese,
            Ruleset::ChineseKgs,
            Ruleset::ChineseOgs,
            Ruleset::Japanese,
            Ruleset::Korean,
            Ruleset::NewZealand,
            Ruleset::StoneScoring,
            Ruleset::TrompTaylor,
        ]
    }

    /// The wire name, e.g. `chinese-kgs`.
    pub fn command(&self) -> &'static str {
        match self {
            Ruleset::Aga => "aga",
            Ruleset::AgaButton => "aga-button",
            Ruleset::Bga => "bga",
            Ruleset::Chinese => "chinese",
            Ruleset::ChineseKgs => "chinese-kgs",
            Ruleset::ChineseOgs => "chinese-ogs",
            Ruleset::Japanese => "japanese",
            Ruleset::Korean => "korean",
            Ruleset::NewZealand => "new-zealand",
            Ruleset::StoneScoring => "stone-scoring",
            Ruleset::TrompTaylor => "tromp-taylor",
        }
    }

    pub fn ko_rule(&self) -> KoRule {
        match self {
            Ruleset::Aga | Ruleset::AgaButton | Ruleset::Bga | Ruleset::NewZealand => {
                KoRule::Situational
            }
            Ruleset::ChineseKgs | Ruleset::ChineseOgs | Ruleset::TrompTaylor => KoRule::Positional,
            Ruleset::Chinese | Ruleset::Japanese | Ruleset::Korean | Ruleset::StoneScoring => {
                KoRule::Simple
            }
        }
    }

    pub fn scoring(&self) -> Scoring {
        match self {
            Ruleset::Japanese | Ruleset::Korean => Scoring::Territory,
            _ => Scoring::Area,
        }
    }

    /// The komi assumed when a record does not carry one.
    pub fn default_komi(&self) -> f64 {
        match self {
            Ruleset::Japanese | Ruleset::Korean => 6.5,
            Ruleset::NewZealand | Ruleset::TrompTaylor => 7.0,
            _ => 7.5,
        }
    }

    /// The explicit rules object equivalent to this named ruleset.
    pub fn specification(&self) -> RulesSpecification {
        let (tax, suicide, has_button, white_handicap_bonus, friendly_pass_ok) = match self {
            Ruleset::Aga | Ruleset::Bga => {
                (TaxRule::None, false, false, WhiteHandicapBonus::NMinusOne, true)
            }
            Ruleset::AgaButton => {
                (TaxRule::None, false, true, WhiteHandicapBonus::NMinusOne, true)
            }
            Ruleset::Chinese | Ruleset::ChineseKgs | Ruleset::ChineseOgs => {
                (TaxRule::None, false, false, WhiteHandicapBonus::N, true)
            }
            Ruleset::Japanese | Ruleset::Korean => {
                (TaxRule::Seki, false, false, WhiteHandicapBonus::Zero, true)
            }
            Ruleset::NewZealand => (TaxRule::None, true, false, WhiteHandicapBonus::Zero, true),
            Ruleset::StoneScoring => (TaxRule::All, false, false, WhiteHandicapBonus::Zero, true),
            Ruleset::TrompTaylor => (TaxRule::None, true, false, WhiteHandicapBonus::Zero, false),
        };

        RulesSpecification {
            ko: self.ko_rule(),
            scoring: self.scoring(),
            tax,
            suicide,
            has_button,
            white_handicap_bonus,
            friendly_pass_ok,
        }
    }

    fn simplified(&self) -> String {
        simplify(self.command())
    }
}

impl Serialize for Ruleset {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.command())
    }
}

/// Uppercases and strips everything but letters, so that `Chinese KGS`,
/// `chinese_kgs`, and `chinese-kgs` all compare equal.
fn simplify(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl std::str::FromStr for Ruleset {
    type Err = Error;

    /// Matches simplified names first, then falls back to the first letter
    /// for the sloppy one-character rule tags some records carry.
    fn from_str(s: &str) -> Result<Ruleset> {
        let needle = simplify(s);
        if needle.is_empty() {
            return Err(Error::SgfParse(format!("unrecognized ruleset {s:?}")));
        }

        for candidate in Ruleset::all() {
            if candidate.simplified() == needle {
                return Ok(candidate);
            }
        }
        for candidate in Ruleset::all() {
            if candidate.simplified().starts_with(&needle[..1]) {
                return Ok(candidate);
            }
        }
        Err(Error::SgfParse(format!("unrecognized ruleset {s:?}")))
    }
}

impl std::fmt::Display for Ruleset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())
    }
}
