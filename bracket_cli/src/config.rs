//! Command-line configuration management.
//!
//! Consolidates all environment variable reads and turns them, together with
//! command-line overrides, into a validated bracket configuration.

use bracket_engine::config::{
    BracketConfig, BracketFormat, MatchOptions, SeedingPolicy, SwissPairing,
};
use std::fmt::Display;
use std::str::FromStr;

/// Values given on the command line; each one wins over its environment
/// variable.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub format: Option<String>,
    pub seeding: Option<String>,
    pub best_of: Option<String>,
    pub rng_seed: Option<u64>,
    pub swiss_rounds: Option<u32>,
    pub swiss_first_round: Option<String>,
    pub qualify_wins: Option<u32>,
    pub eliminate_losses: Option<u32>,
    pub bracket_reset: Option<bool>,
}

/// Complete CLI configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Bracket configuration handed to the engine
    pub bracket: BracketConfig,
}

impl CliConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `overrides` - Values from the command line
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds a value that does not parse. Unknown
    /// formats or policies are never replaced by a default.
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(overrides: Overrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str, given: Option<String>| given.or_else(|| lookup(key));

        let format = parse_or(
            "BRACKET_FORMAT",
            value("BRACKET_FORMAT", overrides.format),
            BracketFormat::SingleElimination,
        )?;
        let seeding = parse_or(
            "BRACKET_SEEDING",
            value("BRACKET_SEEDING", overrides.seeding),
            SeedingPolicy::default(),
        )?;
        let swiss_first_round = parse_or(
            "BRACKET_SWISS_FIRST_ROUND",
            value("BRACKET_SWISS_FIRST_ROUND", overrides.swiss_first_round),
            SwissPairing::default(),
        )?;

        let match_options = match value("BRACKET_BEST_OF", overrides.best_of) {
            Some(spec) => MatchOptions::parse(&spec).map_err(|e| ConfigError::Invalid {
                var: "BRACKET_BEST_OF".to_string(),
                reason: e.to_string(),
            })?,
            None => MatchOptions::default(),
        };

        let random_seed = match overrides.rng_seed {
            Some(seed) => Some(seed),
            None => parse_opt("BRACKET_RNG_SEED", lookup("BRACKET_RNG_SEED"))?,
        };
        let swiss_rounds = match overrides.swiss_rounds {
            Some(rounds) => Some(rounds),
            None => parse_opt("BRACKET_SWISS_ROUNDS", lookup("BRACKET_SWISS_ROUNDS"))?,
        };
        let qualify_wins = match overrides.qualify_wins {
            Some(wins) => Some(wins),
            None => parse_opt(
                "BRACKET_SWISS_QUALIFY_WINS",
                lookup("BRACKET_SWISS_QUALIFY_WINS"),
            )?,
        };
        let eliminate_losses = match overrides.eliminate_losses {
            Some(losses) => Some(losses),
            None => parse_opt(
                "BRACKET_SWISS_ELIMINATE_LOSSES",
                lookup("BRACKET_SWISS_ELIMINATE_LOSSES"),
            )?,
        };
        let bracket_reset = match overrides.bracket_reset {
            Some(reset) => reset,
            None => parse_or("BRACKET_RESET", lookup("BRACKET_RESET"), true)?,
        };

        let mut bracket = BracketConfig::new(format, seeding);
        bracket.match_options = match_options;
        bracket.swiss_rounds = swiss_rounds;
        bracket.swiss_first_round = swiss_first_round;
        bracket.swiss_qualify_wins = qualify_wins;
        bracket.swiss_eliminate_losses = eliminate_losses;
        bracket.bracket_reset = bracket_reset;
        bracket.random_seed = random_seed;

        Ok(CliConfig { bracket })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        // the engine only rejects Swiss settings here
        self.bracket.validate().map_err(|e| ConfigError::Invalid {
            var: "BRACKET_SWISS_*".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required argument: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse a value when present, otherwise fall back to `default`
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(parse_opt(key, raw)?.unwrap_or(default))
}

fn parse_opt<T>(key: &str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(|v| {
        v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_engine::bracket::Segment;
    use bracket_engine::config::BestOf;
    use std::collections::HashMap;

    fn load(
        overrides: Overrides,
        vars: &[(&str, &str)],
    ) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(overrides, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "ENTRANTS".to_string(),
            hint: "Pass a JSON file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ENTRANTS"));
        assert!(msg.contains("Pass a JSON file"));
    }

    #[test]
    fn test_defaults() {
        let config = load(Overrides::default(), &[]).unwrap();
        assert_eq!(config.bracket.format, BracketFormat::SingleElimination);
        assert_eq!(config.bracket.seeding, SeedingPolicy::Rating);
        assert!(config.bracket.bracket_reset);
        assert_eq!(config.bracket.random_seed, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_environment_values() {
        let config = load(
            Overrides::default(),
            &[
                ("BRACKET_FORMAT", "double_elimination"),
                ("BRACKET_SEEDING", "grouped"),
                ("BRACKET_BEST_OF", "bo3,grand_final=bo5"),
                ("BRACKET_RNG_SEED", "42"),
                ("BRACKET_RESET", "false"),
            ],
        )
        .unwrap();

        assert_eq!(config.bracket.format, BracketFormat::DoubleElimination);
        assert_eq!(config.bracket.seeding, SeedingPolicy::Grouped);
        assert_eq!(config.bracket.random_seed, Some(42));
        assert!(!config.bracket.bracket_reset);
        assert_eq!(
            config.bracket.match_options.best_of(Segment::Upper, 1),
            BestOf::BO3
        );
        assert_eq!(
            config.bracket.match_options.best_of(Segment::GrandFinal, 1),
            BestOf::BO5
        );
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            format: Some("swiss".to_string()),
            swiss_rounds: Some(3),
            ..Overrides::default()
        };
        let config = load(
            overrides,
            &[("BRACKET_FORMAT", "round_robin"), ("BRACKET_SWISS_ROUNDS", "9")],
        )
        .unwrap();

        assert_eq!(config.bracket.format, BracketFormat::Swiss);
        assert_eq!(config.bracket.swiss_rounds, Some(3));
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        let err = load(Overrides::default(), &[("BRACKET_FORMAT", "ladder")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "BRACKET_FORMAT"));

        let err = load(Overrides::default(), &[("BRACKET_RESET", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_swiss_thresholds() {
        let overrides = Overrides {
            format: Some("swiss".to_string()),
            qualify_wins: Some(3),
            ..Overrides::default()
        };
        let config = load(overrides, &[("BRACKET_SWISS_ELIMINATE_LOSSES", "3")]).unwrap();
        assert_eq!(config.bracket.swiss_qualify_wins, Some(3));
        assert_eq!(config.bracket.swiss_eliminate_losses, Some(3));
        config.validate().unwrap();

        let config = load(Overrides::default(), &[("BRACKET_SWISS_QUALIFY_WINS", "2")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_swiss_rounds_need_swiss() {
        let overrides = Overrides {
            swiss_rounds: Some(4),
            ..Overrides::default()
        };
        let config = load(overrides, &[]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
