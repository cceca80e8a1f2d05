//! Front-end configuration

use crate::parser::{DEFAULT_MAX_BLOCK_DEPTH, DEFAULT_MAX_EXPRESSION_DEPTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Limits and switches for a [`crate::Frontend`].
///
/// Fixed at construction; parsing never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Maximum nesting of `define`/`if`/`when`/`for`/`while` blocks.
    pub max_block_depth: usize,
    /// Maximum expression nesting. Parentheses, unary operators, call arguments
    /// and each link of an operator or method chain count one level.
    pub max_expression_depth: usize,
    /// Report structural warnings alongside successful parses.
    pub structural_warnings: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            max_block_depth: DEFAULT_MAX_BLOCK_DEPTH,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
            structural_warnings: true,
        }
    }
}

impl FrontendConfig {
    /// Load from a TOML document. Missing keys take their defaults.
    ///
    /// ```text
    /// max_block_depth = 32
    /// structural_warnings = false
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `COGNI_MAX_BLOCK_DEPTH` (default: 64)
    /// - `COGNI_MAX_EXPRESSION_DEPTH` (default: 256)
    /// - `COGNI_STRUCTURAL_WARNINGS` (default: true; accepts `true`/`false`,
    ///   `1`/`0`, `yes`/`no`, `on`/`off`)
    ///
    /// Unusable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, as [`FrontendConfig::from_env`] does
    /// for the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            max_block_depth: depth_var(&lookup, "COGNI_MAX_BLOCK_DEPTH", defaults.max_block_depth),
            max_expression_depth: depth_var(
                &lookup,
                "COGNI_MAX_EXPRESSION_DEPTH",
                defaults.max_expression_depth,
            ),
            structural_warnings: flag_var(
                &lookup,
                "COGNI_STRUCTURAL_WARNINGS",
                defaults.structural_warnings,
            ),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_block_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_block_depth".to_string(),
                reason: "max_block_depth must be greater than 0".to_string(),
            });
        }

        if self.max_expression_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_expression_depth".to_string(),
                reason: "max_expression_depth must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn depth_var(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<usize>() {
        Ok(depth) if depth > 0 => depth,
        _ => {
            warn!(key, value = %raw, default, "ignoring invalid depth, expected a positive integer");
            default
        }
    }
}

fn flag_var(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!(key, value = %raw, default, "ignoring invalid flag, expected true or false");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FrontendConfig::default();
        assert_eq!(config.max_block_depth, 64);
        assert_eq!(config.max_expression_depth, 256);
        assert!(config.structural_warnings);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_from_toml_partial() -> Result<(), ConfigError> {
        let config = FrontendConfig::from_toml_str("max_block_depth = 8\nstructural_warnings = false\n")?;
        assert_eq!(config.max_block_depth, 8);
        assert_eq!(config.max_expression_depth, 256);
        assert!(!config.structural_warnings);
        Ok(())
    }

    #[test]
    fn test_from_toml_rejects_zero_depth() {
        assert!(matches!(
            FrontendConfig::from_toml_str("max_expression_depth = 0"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_from_toml_rejects_malformed() {
        assert!(matches!(
            FrontendConfig::from_toml_str("max_block_depth = \"deep\""),
            Err(ConfigError::Parse(_))
        ));
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        assert_eq!(FrontendConfig::from_lookup(lookup(&[])), FrontendConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = FrontendConfig::from_lookup(lookup(&[
            ("COGNI_MAX_BLOCK_DEPTH", "12"),
            ("COGNI_MAX_EXPRESSION_DEPTH", " 40 "),
            ("COGNI_STRUCTURAL_WARNINGS", "false"),
        ]));
        assert_eq!(config.max_block_depth, 12);
        assert_eq!(config.max_expression_depth, 40);
        assert!(!config.structural_warnings);
    }

    #[test]
    fn test_from_lookup_flag_spellings() {
        for (raw, expected) in [
            ("1", true),
            ("0", false),
            ("yes", true),
            ("No", false),
            ("ON", true),
            ("off", false),
            ("TRUE", true),
        ] {
            let config =
                FrontendConfig::from_lookup(lookup(&[("COGNI_STRUCTURAL_WARNINGS", raw)]));
            assert_eq!(config.structural_warnings, expected, "{raw}");
        }
    }

    #[test]
    fn test_from_lookup_invalid_values_fall_back() {
        let config = FrontendConfig::from_lookup(lookup(&[
            ("COGNI_MAX_BLOCK_DEPTH", "0"),
            ("COGNI_MAX_EXPRESSION_DEPTH", "deep"),
            ("COGNI_STRUCTURAL_WARNINGS", "maybe"),
        ]));
        assert_eq!(config, FrontendConfig::default());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_from_env_without_overrides_is_valid() {
        assert_eq!(FrontendConfig::from_env().validate(), Ok(()));
    }
}
