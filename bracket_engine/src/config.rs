//! Bracket configuration models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::bracket::formats::{DoubleElimination, Format, RoundRobin, SingleElimination, Swiss};
use crate::bracket::models::{Segment, Side};
use crate::errors::{BracketError, BracketResult};

/// Supported competition formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    Swiss,
}

impl fmt::Display for BracketFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketFormat::SingleElimination => write!(f, "single_elimination"),
            BracketFormat::DoubleElimination => write!(f, "double_elimination"),
            BracketFormat::RoundRobin => write!(f, "round_robin"),
            BracketFormat::Swiss => write!(f, "swiss"),
        }
    }
}

impl FromStr for BracketFormat {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_elimination" => Ok(BracketFormat::SingleElimination),
            "double_elimination" => Ok(BracketFormat::DoubleElimination),
            "round_robin" => Ok(BracketFormat::RoundRobin),
            "swiss" => Ok(BracketFormat::Swiss),
            other => Err(BracketError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// How entrants are ordered into seeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedingPolicy {
    /// Rating descending, input order breaks ties
    #[default]
    Rating,
    /// Organiser-supplied seed numbers
    Manual,
    /// Uniform shuffle from the supplied generator
    Random,
    /// Rating order, shuffled within consecutive groups of four
    Grouped,
}

impl fmt::Display for SeedingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedingPolicy::Rating => write!(f, "rating"),
            SeedingPolicy::Manual => write!(f, "manual"),
            SeedingPolicy::Random => write!(f, "random"),
            SeedingPolicy::Grouped => write!(f, "grouped"),
        }
    }
}

impl FromStr for SeedingPolicy {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(SeedingPolicy::Rating),
            "manual" => Ok(SeedingPolicy::Manual),
            "random" => Ok(SeedingPolicy::Random),
            "grouped" => Ok(SeedingPolicy::Grouped),
            other => Err(BracketError::UnsupportedSeedingPolicy(other.to_string())),
        }
    }
}

/// First-round Swiss pairing method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwissPairing {
    /// 1v2, 3v4, ...
    #[default]
    Adjacent,
    /// Top half against bottom half: 1 v N/2+1, 2 v N/2+2, ...
    Folding,
    /// Shuffled, then paired adjacently
    Random,
}

impl FromStr for SwissPairing {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adjacent" => Ok(SwissPairing::Adjacent),
            "folding" => Ok(SwissPairing::Folding),
            "random" => Ok(SwissPairing::Random),
            other => Err(BracketError::InvalidConfiguration(format!(
                "unknown swiss pairing: {other}"
            ))),
        }
    }
}

/// Number of games in a match; always odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BestOf(u8);

impl BestOf {
    pub const BO1: BestOf = BestOf(1);
    pub const BO3: BestOf = BestOf(3);
    pub const BO5: BestOf = BestOf(5);

    /// Create a best-of rule.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for zero or even game counts.
    pub fn new(games: u8) -> BracketResult<Self> {
        if games == 0 || games % 2 == 0 {
            return Err(BracketError::InvalidConfiguration(format!(
                "best-of must be a positive odd number, got {games}"
            )));
        }
        Ok(Self(games))
    }

    pub fn games(self) -> u8 {
        self.0
    }

    /// Game wins needed to take the match
    pub fn wins_required(self) -> u32 {
        u32::from(self.0) / 2 + 1
    }

    /// Check a reported score and return the winning side.
    ///
    /// A score is decisive when one side has exactly the required wins and the
    /// other has fewer.
    pub fn decide(self, score_a: u32, score_b: u32) -> BracketResult<Side> {
        let needed = self.wins_required();
        match (score_a, score_b) {
            (a, b) if a == needed && b < needed => Ok(Side::A),
            (a, b) if b == needed && a < needed => Ok(Side::B),
            _ => Err(BracketError::InvalidScore {
                score_a,
                score_b,
                best_of: self.0,
            }),
        }
    }

    /// Score recorded for a walkover or forfeit won by `winner`
    pub fn walkover_score(self, winner: Side) -> (u32, u32) {
        match winner {
            Side::A => (self.wins_required(), 0),
            Side::B => (0, self.wins_required()),
        }
    }
}

impl Default for BestOf {
    fn default() -> Self {
        BestOf::BO1
    }
}

impl TryFrom<u8> for BestOf {
    type Error = BracketError;

    fn try_from(games: u8) -> Result<Self, Self::Error> {
        BestOf::new(games)
    }
}

impl From<BestOf> for u8 {
    fn from(best_of: BestOf) -> Self {
        best_of.0
    }
}

impl fmt::Display for BestOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bo{}", self.0)
    }
}

impl FromStr for BestOf {
    type Err = BracketError;

    /// Accepts `3` or `bo3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("bo").unwrap_or(trimmed);
        let games = digits.parse::<u8>().map_err(|_| {
            BracketError::InvalidConfiguration(format!("invalid best-of: {s}"))
        })?;
        BestOf::new(games)
    }
}

/// Where a best-of override applies: a whole segment or one round of it.
///
/// Written as `upper`, `lower:3` or `grand_final:2`; `reset` is shorthand for
/// the second grand final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BestOfKey {
    pub segment: Segment,
    pub round: Option<u32>,
}

impl BestOfKey {
    pub fn segment(segment: Segment) -> Self {
        Self {
            segment,
            round: None,
        }
    }

    pub fn round(segment: Segment, round: u32) -> Self {
        Self {
            segment,
            round: Some(round),
        }
    }

    /// The bracket reset match
    pub fn reset() -> Self {
        Self::round(Segment::GrandFinal, 2)
    }
}

impl fmt::Display for BestOfKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.round {
            Some(round) => write!(f, "{}:{}", self.segment, round),
            None => write!(f, "{}", self.segment),
        }
    }
}

impl FromStr for BestOfKey {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "reset" {
            return Ok(BestOfKey::reset());
        }

        match s.split_once(':') {
            Some((segment, round)) => {
                let round = round.parse::<u32>().map_err(|_| {
                    BracketError::InvalidConfiguration(format!("invalid round in key: {s}"))
                })?;
                Ok(BestOfKey::round(segment.parse()?, round))
            }
            None => Ok(BestOfKey::segment(s.parse()?)),
        }
    }
}

/// Best-of rules for every match in a bracket
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "MatchOptionsRepr", into = "MatchOptionsRepr")]
pub struct MatchOptions {
    default_best_of: BestOf,
    overrides: BTreeMap<BestOfKey, BestOf>,
}

#[derive(Serialize, Deserialize)]
struct MatchOptionsRepr {
    #[serde(default)]
    default_best_of: BestOf,
    #[serde(default)]
    overrides: BTreeMap<String, BestOf>,
}

impl TryFrom<MatchOptionsRepr> for MatchOptions {
    type Error = BracketError;

    fn try_from(repr: MatchOptionsRepr) -> Result<Self, Self::Error> {
        let mut options = MatchOptions::new(repr.default_best_of);
        for (key, best_of) in repr.overrides {
            options = options.with_override(key.parse()?, best_of);
        }
        Ok(options)
    }
}

impl From<MatchOptions> for MatchOptionsRepr {
    fn from(options: MatchOptions) -> Self {
        Self {
            default_best_of: options.default_best_of,
            overrides: options
                .overrides
                .into_iter()
                .map(|(key, best_of)| (key.to_string(), best_of))
                .collect(),
        }
    }
}

impl MatchOptions {
    pub fn new(default_best_of: BestOf) -> Self {
        Self {
            default_best_of,
            overrides: BTreeMap::new(),
        }
    }

    /// Add an override for a segment or a single round
    pub fn with_override(mut self, key: BestOfKey, best_of: BestOf) -> Self {
        self.overrides.insert(key, best_of);
        self
    }

    pub fn default_best_of(&self) -> BestOf {
        self.default_best_of
    }

    /// Resolve the rule for a match: round override, then segment override,
    /// then the default.
    pub fn best_of(&self, segment: Segment, round: u32) -> BestOf {
        self.overrides
            .get(&BestOfKey::round(segment, round))
            .or_else(|| self.overrides.get(&BestOfKey::segment(segment)))
            .copied()
            .unwrap_or(self.default_best_of)
    }

    /// Parse `bo3,upper:3=bo5,grand_final=5`.
    ///
    /// A bare token sets the default; `key=value` tokens add overrides.
    pub fn parse(spec: &str) -> BracketResult<Self> {
        let mut options = MatchOptions::default();
        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('=') {
                Some((key, value)) => {
                    options = options.with_override(key.trim().parse()?, value.trim().parse()?);
                }
                None => options.default_best_of = token.parse()?,
            }
        }
        Ok(options)
    }
}

fn default_bracket_reset() -> bool {
    true
}

/// Bracket configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketConfig {
    /// Competition format
    pub format: BracketFormat,

    /// Seeding policy
    #[serde(default)]
    pub seeding: SeedingPolicy,

    /// Best-of rules
    #[serde(default)]
    pub match_options: MatchOptions,

    /// Swiss rounds (default: ceil(log2 N))
    #[serde(default)]
    pub swiss_rounds: Option<u32>,

    /// Swiss first-round pairing method
    #[serde(default)]
    pub swiss_first_round: SwissPairing,

    /// Swiss match points that qualify an entrant and stop its pairing
    #[serde(default)]
    pub swiss_qualify_wins: Option<u32>,

    /// Swiss losses that eliminate an entrant
    #[serde(default)]
    pub swiss_eliminate_losses: Option<u32>,

    /// Play a second grand final when the lower-bracket champion wins the first
    #[serde(default = "default_bracket_reset")]
    pub bracket_reset: bool,

    /// Seed for the random generator (random seeding, random Swiss pairing)
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self::new(BracketFormat::SingleElimination, SeedingPolicy::Rating)
    }
}

impl BracketConfig {
    pub fn new(format: BracketFormat, seeding: SeedingPolicy) -> Self {
        Self {
            format,
            seeding,
            match_options: MatchOptions::default(),
            swiss_rounds: None,
            swiss_first_round: SwissPairing::default(),
            swiss_qualify_wins: None,
            swiss_eliminate_losses: None,
            bracket_reset: true,
            random_seed: None,
        }
    }

    /// Validate configuration independent of the field size
    pub fn validate(&self) -> BracketResult<()> {
        let swiss_settings = [
            ("swiss_rounds", self.swiss_rounds),
            ("swiss_qualify_wins", self.swiss_qualify_wins),
            ("swiss_eliminate_losses", self.swiss_eliminate_losses),
        ];

        for (name, value) in swiss_settings {
            match value {
                Some(_) if self.format != BracketFormat::Swiss => {
                    return Err(BracketError::InvalidConfiguration(format!(
                        "{name} only applies to swiss, not {}",
                        self.format
                    )));
                }
                Some(0) => {
                    return Err(BracketError::InvalidConfiguration(format!(
                        "{name} must be at least 1"
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Strategy object for the configured format
    pub fn strategy(&self) -> Format {
        match self.format {
            BracketFormat::SingleElimination => SingleElimination.into(),
            BracketFormat::DoubleElimination => DoubleElimination {
                bracket_reset: self.bracket_reset,
            }
            .into(),
            BracketFormat::RoundRobin => RoundRobin.into(),
            BracketFormat::Swiss => Swiss {
                rounds: self.swiss_rounds,
                first_round: self.swiss_first_round,
                qualify_at: self.swiss_qualify_wins,
                eliminate_at: self.swiss_eliminate_losses,
            }
            .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::formats::FormatStrategy;

    #[test]
    fn test_format_parsing() {
        assert_eq!(
            "double_elimination".parse::<BracketFormat>().unwrap(),
            BracketFormat::DoubleElimination
        );
        assert_eq!(
            "ladder".parse::<BracketFormat>(),
            Err(BracketError::UnsupportedFormat("ladder".to_string()))
        );
        assert_eq!(BracketFormat::RoundRobin.to_string(), "round_robin");
    }

    #[test]
    fn test_seeding_policy_parsing() {
        assert_eq!("grouped".parse::<SeedingPolicy>().unwrap(), SeedingPolicy::Grouped);
        assert!("balanced".parse::<SeedingPolicy>().is_err());
        assert!(matches!(
            "elo".parse::<SeedingPolicy>(),
            Err(BracketError::UnsupportedSeedingPolicy(_))
        ));
    }

    #[test]
    fn test_best_of_rules() {
        assert!(BestOf::new(0).is_err());
        assert!(BestOf::new(4).is_err());

        let bo3 = BestOf::BO3;
        assert_eq!(bo3.wins_required(), 2);
        assert_eq!(bo3.decide(2, 1).unwrap(), Side::A);
        assert_eq!(bo3.decide(0, 2).unwrap(), Side::B);
        assert!(bo3.decide(1, 1).is_err());
        assert!(bo3.decide(3, 0).is_err());
        assert!(bo3.decide(2, 2).is_err());

        assert_eq!(BestOf::BO1.decide(1, 0).unwrap(), Side::A);
        assert_eq!(BestOf::BO5.walkover_score(Side::B), (0, 3));
        assert_eq!("bo5".parse::<BestOf>().unwrap(), BestOf::BO5);
        assert_eq!("3".parse::<BestOf>().unwrap(), BestOf::BO3);
        assert!("bobo3".parse::<BestOf>().is_err());
        assert!("bo".parse::<BestOf>().is_err());
    }

    #[test]
    fn test_best_of_key_parsing() {
        assert_eq!(
            "upper".parse::<BestOfKey>().unwrap(),
            BestOfKey::segment(Segment::Upper)
        );
        assert_eq!(
            "lower:3".parse::<BestOfKey>().unwrap(),
            BestOfKey::round(Segment::Lower, 3)
        );
        assert_eq!("reset".parse::<BestOfKey>().unwrap(), BestOfKey::reset());
        assert!("middle".parse::<BestOfKey>().is_err());
        assert!("upper:x".parse::<BestOfKey>().is_err());
    }

    #[test]
    fn test_match_options_lookup() {
        let options = MatchOptions::parse("bo1, upper:3=bo3, grand_final=5").unwrap();

        assert_eq!(options.best_of(Segment::Upper, 1), BestOf::BO1);
        assert_eq!(options.best_of(Segment::Upper, 3), BestOf::BO3);
        assert_eq!(options.best_of(Segment::GrandFinal, 1), BestOf::BO5);
        // reset falls back to the grand-final override
        assert_eq!(options.best_of(Segment::GrandFinal, 2), BestOf::BO5);

        let options = options.with_override(BestOfKey::reset(), BestOf::BO3);
        assert_eq!(options.best_of(Segment::GrandFinal, 2), BestOf::BO3);
    }

    #[test]
    fn test_match_options_serde() {
        let options = MatchOptions::new(BestOf::BO3)
            .with_override(BestOfKey::round(Segment::Lower, 2), BestOf::BO5);
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"lower:2\""));

        let parsed: MatchOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);

        let bad = r#"{"default_best_of": 2}"#;
        assert!(serde_json::from_str::<MatchOptions>(bad).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = BracketConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.bracket_reset);

        config.swiss_rounds = Some(3);
        assert!(config.validate().is_err());

        config.format = BracketFormat::Swiss;
        assert!(config.validate().is_ok());

        config.swiss_rounds = Some(0);
        assert!(config.validate().is_err());

        config.swiss_rounds = None;
        config.swiss_qualify_wins = Some(3);
        config.swiss_eliminate_losses = Some(3);
        assert!(config.validate().is_ok());

        config.swiss_eliminate_losses = Some(0);
        assert!(config.validate().is_err());

        config.swiss_eliminate_losses = None;
        config.format = BracketFormat::RoundRobin;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: BracketConfig = serde_json::from_str(r#"{"format": "swiss"}"#).unwrap();
        assert_eq!(config.format, BracketFormat::Swiss);
        assert_eq!(config.seeding, SeedingPolicy::Rating);
        assert_eq!(config.swiss_first_round, SwissPairing::Adjacent);
        assert!(config.bracket_reset);
        assert_eq!(config.swiss_qualify_wins, None);
        assert_eq!(config.strategy().kind(), BracketFormat::Swiss);
    }
}
