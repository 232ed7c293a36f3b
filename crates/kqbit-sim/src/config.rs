//! Simulator configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with KQBIT_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Largest `max_qubits` accepted by [`SimConfig::validate`].
pub const QUBIT_CEILING: u32 = 48;

/// Largest `max_fused_qubits` accepted by [`SimConfig::validate`].
pub const FUSION_CEILING: u32 = 12;

/// Settings for optimizing and evaluating trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Widest tree the evaluator will allocate a statevector for
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,

    /// Pass manager level (0-3)
    #[serde(default = "default_optimization_level")]
    pub optimization_level: u8,

    /// Widest leaf tensor fusion may produce at level 3
    #[serde(default = "default_max_fused_qubits")]
    pub max_fused_qubits: u32,

    /// Check tree invariants before optimizing
    #[serde(default = "default_true")]
    pub validate_trees: bool,
}

// Default value functions
fn default_max_qubits() -> u32 {
    30
}

fn default_optimization_level() -> u8 {
    2
}

fn default_max_fused_qubits() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_qubits: default_max_qubits(),
            optimization_level: default_optimization_level(),
            max_fused_qubits: default_max_fused_qubits(),
            validate_trees: default_true(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SimError::ConfigIo(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> SimResult<Self> {
        serde_yaml_ng::from_str(contents).map_err(|e| SimError::ConfigParse(e.to_string()))
    }

    /// Override settings from `KQBIT_*` environment variables.
    pub fn with_env_overrides(self) -> SimResult<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration with the standard precedence: defaults, then the
    /// optional file, then the environment. The result is validated.
    pub fn load(path: Option<&str>) -> SimResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn merge_vars<F>(mut self, lookup: F) -> SimResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("KQBIT_MAX_QUBITS") {
            self.max_qubits = parse_var("KQBIT_MAX_QUBITS", &value)?;
        }
        if let Some(value) = lookup("KQBIT_OPT_LEVEL") {
            self.optimization_level = parse_var("KQBIT_OPT_LEVEL", &value)?;
        }
        if let Some(value) = lookup("KQBIT_MAX_FUSED_QUBITS") {
            self.max_fused_qubits = parse_var("KQBIT_MAX_FUSED_QUBITS", &value)?;
        }
        if let Some(value) = lookup("KQBIT_VALIDATE_TREES") {
            self.validate_trees = parse_var("KQBIT_VALIDATE_TREES", &value)?;
        }
        Ok(self)
    }

    /// Validate configuration.
    pub fn validate(&self) -> SimResult<()> {
        if self.max_qubits == 0 || self.max_qubits > QUBIT_CEILING {
            return Err(SimError::InvalidConfig(format!(
                "max_qubits must be between 1 and {QUBIT_CEILING}, got {}",
                self.max_qubits
            )));
        }
        if self.optimization_level > 3 {
            return Err(SimError::InvalidConfig(format!(
                "optimization_level must be at most 3, got {}",
                self.optimization_level
            )));
        }
        if self.max_fused_qubits == 0 || self.max_fused_qubits > FUSION_CEILING {
            return Err(SimError::InvalidConfig(format!(
                "max_fused_qubits must be between 1 and {FUSION_CEILING}, got {}",
                self.max_fused_qubits
            )));
        }
        Ok(())
    }

    /// Set the qubit limit.
    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Set the optimization level.
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level;
        self
    }

    /// Set the widest fused tensor leaf.
    #[must_use]
    pub fn with_max_fused_qubits(mut self, max_fused_qubits: u32) -> Self {
        self.max_fused_qubits = max_fused_qubits;
        self
    }

    /// Enable or disable tree validation.
    #[must_use]
    pub fn with_validation(mut self, validate_trees: bool) -> Self {
        self.validate_trees = validate_trees;
        self
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> SimResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SimError::InvalidConfig(format!("{key}: cannot parse {value:?}")))
}
