//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `PLACELINK_*` environment
//! variables; all explicit state the engines need is carried here and passed
//! at construction, never read from process-wide globals mid-run.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};

use crate::linking::DEFAULT_SMOOTHING_EXPONENT;
use crate::ranking::{FilterSettings, RankerSettings};

/// Engine configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `PLACELINK_*` overrides on top of
/// defaults, then [`Config::validate`] before loading resources.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gazetteer resource: variant to `{identifier: count}`.
    /// Default: `./resources/mentions_to_ids.json`.
    pub variants_path: PathBuf,

    /// Gazetteer resource: identifier to `{variant: count}`.
    /// Default: `./resources/ids_to_mentions.json`.
    pub ids_path: PathBuf,

    /// Identifier to `[latitude, longitude]` resource, required by the
    /// distance baseline.
    pub coordinates_path: Option<PathBuf>,

    /// External-label to identifier cross-reference, required by the
    /// delegated strategy.
    pub crossref_path: Option<PathBuf>,

    /// Keep only the N most frequent variants per identifier. Default: `10`.
    pub top_mentions: usize,

    /// Drop variants below this count share for their identifier.
    /// Default: `0.03`.
    pub minimum_relevance: f64,

    /// Minimum similarity for a fuzzy match to be kept. Default: `0.5`.
    pub similarity_threshold: f64,

    /// Matched variants kept per mention. Default: `3`.
    pub top_k: usize,

    /// Breadth of the embedding index sweep. Default: `32`.
    pub search_size: usize,

    /// Frequency-baseline smoothing exponent. Default: `2.072`.
    pub smoothing_exponent: f64,

    /// Max entries in the ranker's memoization cache. Default: `10_000`.
    pub cache_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variants_path: PathBuf::from("./resources/mentions_to_ids.json"),
            ids_path: PathBuf::from("./resources/ids_to_mentions.json"),
            coordinates_path: None,
            crossref_path: None,
            top_mentions: 10,
            minimum_relevance: 0.03,
            similarity_threshold: 0.5,
            top_k: 3,
            search_size: 32,
            smoothing_exponent: DEFAULT_SMOOTHING_EXPONENT,
            cache_capacity: 10_000,
        }
    }
}

impl Config {
    const ENV_VARIANTS_PATH: &'static str = "PLACELINK_VARIANTS_PATH";
    const ENV_IDS_PATH: &'static str = "PLACELINK_IDS_PATH";
    const ENV_COORDINATES_PATH: &'static str = "PLACELINK_COORDINATES_PATH";
    const ENV_CROSSREF_PATH: &'static str = "PLACELINK_CROSSREF_PATH";
    const ENV_TOP_MENTIONS: &'static str = "PLACELINK_TOP_MENTIONS";
    const ENV_MINIMUM_RELEVANCE: &'static str = "PLACELINK_MINIMUM_RELEVANCE";
    const ENV_SIMILARITY_THRESHOLD: &'static str = "PLACELINK_SIMILARITY_THRESHOLD";
    const ENV_TOP_K: &'static str = "PLACELINK_TOP_K";
    const ENV_SEARCH_SIZE: &'static str = "PLACELINK_SEARCH_SIZE";
    const ENV_SMOOTHING_EXPONENT: &'static str = "PLACELINK_SMOOTHING_EXPONENT";
    const ENV_CACHE_CAPACITY: &'static str = "PLACELINK_CACHE_CAPACITY";

    /// Loads configuration from environment variables (falling back to
    /// defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            variants_path: Self::parse_path_from_env(
                Self::ENV_VARIANTS_PATH,
                defaults.variants_path,
            ),
            ids_path: Self::parse_path_from_env(Self::ENV_IDS_PATH, defaults.ids_path),
            coordinates_path: Self::parse_optional_path_from_env(Self::ENV_COORDINATES_PATH),
            crossref_path: Self::parse_optional_path_from_env(Self::ENV_CROSSREF_PATH),
            top_mentions: Self::parse_usize_from_env(
                Self::ENV_TOP_MENTIONS,
                defaults.top_mentions,
            )?,
            minimum_relevance: Self::parse_f64_from_env(
                Self::ENV_MINIMUM_RELEVANCE,
                defaults.minimum_relevance,
            )?,
            similarity_threshold: Self::parse_f64_from_env(
                Self::ENV_SIMILARITY_THRESHOLD,
                defaults.similarity_threshold,
            )?,
            top_k: Self::parse_usize_from_env(Self::ENV_TOP_K, defaults.top_k)?,
            search_size: Self::parse_usize_from_env(Self::ENV_SEARCH_SIZE, defaults.search_size)?,
            smoothing_exponent: Self::parse_f64_from_env(
                Self::ENV_SMOOTHING_EXPONENT,
                defaults.smoothing_exponent,
            )?,
            cache_capacity: Self::parse_u64_from_env(
                Self::ENV_CACHE_CAPACITY,
                defaults.cache_capacity,
            )?,
        })
    }

    /// Validates ranges and resource paths (does not load anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("minimum relevance", self.minimum_relevance),
            ("similarity threshold", self.similarity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        if self.smoothing_exponent <= 1.0 {
            return Err(ConfigError::InvalidSmoothingExponent {
                value: self.smoothing_exponent,
            });
        }

        if self.top_k == 0 {
            return Err(ConfigError::ZeroCount { name: "top_k" });
        }
        if self.top_mentions == 0 {
            return Err(ConfigError::ZeroCount { name: "top_mentions" });
        }

        Self::validate_file(&self.variants_path)?;
        Self::validate_file(&self.ids_path)?;
        if let Some(path) = &self.coordinates_path {
            Self::validate_file(path)?;
        }
        if let Some(path) = &self.crossref_path {
            Self::validate_file(path)?;
        }

        Ok(())
    }

    /// Gazetteer pruning thresholds for the ranker's resource load.
    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            top_mentions: self.top_mentions,
            minimum_relevance: self.minimum_relevance,
        }
    }

    /// Ranker tuning knobs.
    pub fn ranker_settings(&self) -> RankerSettings {
        RankerSettings {
            similarity_threshold: self.similarity_threshold,
            top_k: self.top_k,
            search_size: self.search_size,
            cache_capacity: self.cache_capacity,
        }
    }

    fn validate_file(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(ConfigError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn parse_path_from_env(var_name: &'static str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &'static str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_usize_from_env(var_name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value.parse().map_err(|source| ConfigError::IntParseError {
                name: var_name,
                value,
                source,
            }),
            Err(_) => Ok(default),
        }
    }

    fn parse_u64_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value.parse().map_err(|source| ConfigError::IntParseError {
                name: var_name,
                value,
                source,
            }),
            Err(_) => Ok(default),
        }
    }

    fn parse_f64_from_env(var_name: &'static str, default: f64) -> Result<f64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .parse()
                .map_err(|source| ConfigError::FloatParseError {
                    name: var_name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }
}
