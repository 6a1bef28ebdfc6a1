//! Search engine configuration.
//!
//! Provides config file support via `pharmasearch.toml`, environment
//! variables, and compiled-in defaults.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`PHARM_*`)
//! 2. Configuration file (`pharmasearch.toml`)
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// How a query's result ordering is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    /// Keep arrival order (no final sort pass).
    #[default]
    None,
    /// Sort ascending by RMSD.
    Rmsd,
}

/// C5's weighting mode: whether per-point tolerance radii weight the RMSD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingMode {
    /// `w_i = 1 / r_i^2` (default).
    #[default]
    Weighted,
    /// All weights are 1.
    Unweighted,
}

/// Top-level result gating and ranking options (section 6's config surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Positive upper bound on accepted global weighted RMSD.
    pub max_rmsd: f64,
    /// Minimum accepted molecular weight (inclusive); `None` disables.
    pub min_weight: Option<f64>,
    /// Maximum accepted molecular weight (inclusive); `None` disables.
    pub max_weight: Option<f64>,
    /// Minimum accepted rotatable-bond count (inclusive); `None` disables.
    pub min_rot: Option<u32>,
    /// Maximum accepted rotatable-bond count (inclusive); `None` disables.
    pub max_rot: Option<u32>,
    /// Per-molecule conformer cap; 0 = unlimited.
    pub reduce_confs: u32,
    /// Overall result cap across the whole search; 0 = unlimited.
    pub max_hits: u32,
    /// Final ordering applied to the kept result set.
    pub sort: Sort,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            max_rmsd: 2.0,
            min_weight: None,
            max_weight: None,
            min_rot: None,
            max_rot: None,
            reduce_confs: 0,
            max_hits: 0,
            sort: Sort::None,
        }
    }
}

/// Threading and queueing options for the C3/C4/C5 pipeline (section 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Corresponder worker threads per shard. Default 1 (matches the
    /// legacy CLI default and preserves the N=1 determinism law).
    pub threads: u32,
    /// Bound on Q1 and Q2 capacity.
    pub queue_capacity: u32,
    /// Per-conformer cap on C4-generated orientations; 0 = unlimited.
    pub orientations_per_conf: u32,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            queue_capacity: 256,
            orientations_per_conf: 0,
        }
    }
}

/// C5's alignment mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Weighted vs unweighted Kabsch.
    pub weighting_mode: WeightingMode,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            weighting_mode: WeightingMode::Weighted,
        }
    }
}

/// Top-level search configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// Result ranking and filtering options.
    pub ranker: RankerConfig,
    /// Thread and queue sizing.
    pub concurrency: ConcurrencyConfig,
    /// Alignment mode.
    pub alignment: AlignmentConfig,
}

impl SearchConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_from_path("pharmasearch.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PHARM_").split("_").lowercase(false));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration, rejecting the combinations section 6/11
    /// call out.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ranker.max_rmsd <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "ranker.max_rmsd".to_string(),
                message: format!("must be positive, got {}", self.ranker.max_rmsd),
            });
        }

        if let (Some(min), Some(max)) = (self.ranker.min_weight, self.ranker.max_weight) {
            if min > max {
                return Err(ConfigError::InvalidValue {
                    key: "ranker.min_weight/max_weight".to_string(),
                    message: format!("min_weight {min} > max_weight {max}"),
                });
            }
        }

        if let (Some(min), Some(max)) = (self.ranker.min_rot, self.ranker.max_rot) {
            if min > max {
                return Err(ConfigError::InvalidValue {
                    key: "ranker.min_rot/max_rot".to_string(),
                    message: format!("min_rot {min} > max_rot {max}"),
                });
            }
        }

        if self.concurrency.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "concurrency.threads".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.concurrency.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "concurrency.queue_capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_max_rmsd() {
        let mut config = SearchConfig::default();
        config.ranker.max_rmsd = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_weight_window() {
        let mut config = SearchConfig::default();
        config.ranker.min_weight = Some(500.0);
        config.ranker.max_weight = Some(100.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_rotatable_bond_window() {
        let mut config = SearchConfig::default();
        config.ranker.min_rot = Some(10);
        config.ranker.max_rot = Some(2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_threads() {
        let mut config = SearchConfig::default();
        config.concurrency.threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_queue_capacity() {
        let mut config = SearchConfig::default();
        config.concurrency.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_thread_count_is_one() {
        assert_eq!(SearchConfig::default().concurrency.threads, 1);
    }

    #[test]
    fn toml_round_trip() {
        let config = SearchConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = SearchConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.ranker.max_rmsd, config.ranker.max_rmsd);
        assert_eq!(parsed.concurrency.threads, config.concurrency.threads);
    }

    #[test]
    fn env_override() {
        std::env::set_var("PHARM_CONCURRENCY_THREADS", "4");
        let figment = Figment::new()
            .merge(Serialized::defaults(SearchConfig::default()))
            .merge(Env::prefixed("PHARM_").split("_").lowercase(false));
        let config: SearchConfig = figment.extract().unwrap();
        std::env::remove_var("PHARM_CONCURRENCY_THREADS");
        assert_eq!(config.concurrency.threads, 4);
    }
}
