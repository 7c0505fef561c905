//! Configuration for malheur
//!
//! Loaded from TOML. Every section is optional and falls back to its
//! defaults; unknown keys are rejected so typos surface as configuration
//! errors instead of silently using a default.

use crate::error::{MalheurError, Result};
use crate::types::{ExportFormat, HashAlgorithm, KernelScheme, MetricDirection, Normalization};
use crate::validation::{
    validate_dimension_bits, validate_ngram_len, validate_threshold, DEFAULT_MAX_MATRIX_BYTES,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a malheur run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Report reading and tokenization
    pub input: InputConfig,
    /// Feature hashing
    pub features: FeaturesConfig,
    /// Kernel computation
    pub kernel: KernelConfig,
    /// Prototype extraction
    pub prototypes: PrototypeConfig,
    /// Result export
    pub output: OutputConfig,
}

impl Config {
    /// Load config from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MalheurError::config(format!("could not read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    /// Parse and validate config from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.input.delimiters.is_empty() {
            return Err(MalheurError::config("input.delimiters must not be empty"));
        }
        validate_ngram_len(self.input.ngram_len)?;
        validate_dimension_bits(self.features.dimension_bits)?;
        if self.kernel.max_matrix_bytes == 0 {
            return Err(MalheurError::config("kernel.max_matrix_bytes must be > 0"));
        }
        validate_threshold(
            self.prototypes.threshold,
            self.prototypes.metric,
            self.kernel.scheme,
            self.features.normalization,
        )?;
        Ok(())
    }
}

/// Report reading and tokenization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Characters separating words in a report
    pub delimiters: String,
    /// Number of consecutive words forming one token
    pub ngram_len: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiters: " \t\r\n,;()".into(),
            ngram_len: 1,
        }
    }
}

/// Feature hashing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeaturesConfig {
    /// Feature space size is `2^dimension_bits`
    pub dimension_bits: u32,
    /// Hash function mapping tokens to indices
    pub hash: HashAlgorithm,
    /// Normalization applied to every vector
    pub normalization: Normalization,
    /// Keep a reverse table from index to tokens for diagnostics
    pub lookup_table: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            dimension_bits: 20,
            hash: HashAlgorithm::Xxh3,
            normalization: Normalization::L2,
            lookup_table: false,
        }
    }
}

impl FeaturesConfig {
    /// Feature space size `D`
    pub fn dimension(&self) -> u64 {
        1u64 << self.dimension_bits
    }
}

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    /// Kernel used for matrices and prototype scores
    pub scheme: KernelScheme,
    /// Ceiling for a single kernel matrix buffer in bytes
    pub max_matrix_bytes: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            scheme: KernelScheme::Linear,
            max_matrix_bytes: DEFAULT_MAX_MATRIX_BYTES,
        }
    }
}

/// Prototype extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrototypeConfig {
    /// Compare scores as similarities or distances
    pub metric: MetricDirection,
    /// Acceptance threshold for joining an existing prototype
    pub threshold: f64,
}

impl Default for PrototypeConfig {
    fn default() -> Self {
        Self {
            metric: MetricDirection::Distance,
            threshold: 0.65,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Encoding of result files
    pub format: ExportFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.features.dimension(), 1 << 20);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [kernel]
            scheme = "cosine"

            [prototypes]
            metric = "similarity"
            threshold = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.kernel.scheme, KernelScheme::Cosine);
        assert_eq!(config.prototypes.metric, MetricDirection::Similarity);
        assert_eq!(config.features.dimension_bits, 20);
        assert_eq!(config.input.ngram_len, 1);
    }

    #[test]
    fn test_unknown_scheme_is_config_error() {
        let err = Config::from_toml_str("[kernel]\nscheme = \"rbf\"\n").unwrap_err();
        assert!(err.is_config(), "got {err}");

        let err = Config::from_toml_str("[features]\nhash = \"md4\"\n").unwrap_err();
        assert!(err.is_config(), "got {err}");
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = Config::from_toml_str("[features]\ndimension = 12\n").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml_str("[features]\ndimension_bits = 0\n").is_err());
        assert!(Config::from_toml_str("[input]\nngram_len = 0\n").is_err());
        assert!(Config::from_toml_str("[input]\ndelimiters = \"\"\n").is_err());
        assert!(Config::from_toml_str("[kernel]\nmax_matrix_bytes = 0\n").is_err());
        // Distance threshold above sqrt(2) on L2-normalized vectors
        assert!(Config::from_toml_str("[prototypes]\nthreshold = 2.0\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("malheur.toml");
        std::fs::write(&path, "[features]\nlookup_table = true\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.features.lookup_table);

        let missing = Config::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(missing.is_config());
    }
}
