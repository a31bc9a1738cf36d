//! Analysis run configuration
//!
//! Every section is optional and falls back to its defaults, so an empty
//! document is a valid configuration.

use crate::analyzer::RiskConfig;
use crate::error::Result;
use crate::estimator::EstimatorConfig;
use crate::simulation::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration for an estimate → simulate → analyze run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub estimator: EstimatorConfig,
    pub simulation: SimulationConfig,
    pub risk: RiskConfig,
}

impl AnalysisConfig {
    /// Parse configuration from a YAML string
    ///
    /// # Example
    ///
    /// ```
    /// use mc_risk::{AnalysisConfig, ModelKind};
    ///
    /// let yaml = r#"
    /// simulation:
    ///   model: jump_diffusion
    ///   paths: 5000
    ///   random_seed: 7
    /// risk:
    ///   confidence_levels: [0.9, 0.95]
    /// "#;
    ///
    /// let config = AnalysisConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.simulation.model, ModelKind::JumpDiffusion);
    /// assert_eq!(config.simulation.steps, 21);
    /// assert_eq!(config.estimator.trading_days, 252);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from disk, picking the format from the file extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }
}
