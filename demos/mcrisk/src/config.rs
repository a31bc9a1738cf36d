use anyhow::Result;
use clap::ValueEnum;
use mc_risk::{AnalysisConfig, ModelKind};
use std::path::Path;

/// Model selector accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    Gbm,
    Jump,
}

impl From<ModelArg> for ModelKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Gbm => ModelKind::Diffusion,
            ModelArg::Jump => ModelKind::JumpDiffusion,
        }
    }
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub model: Option<ModelArg>,
    pub paths: Option<usize>,
    pub seed: Option<u64>,
    pub confidence_levels: Vec<f64>,
}

/// Load the config file, or the defaults when it does not exist
pub fn load(path: &Path, overrides: &Overrides) -> Result<AnalysisConfig> {
    let mut config = if path.exists() {
        AnalysisConfig::load(path)?
    } else {
        tracing::warn!("Config {:?} not found, using defaults", path);
        AnalysisConfig::default()
    };

    if let Some(model) = overrides.model {
        config.simulation.model = model.into();
    }
    if let Some(paths) = overrides.paths {
        config.simulation.paths = paths;
    }
    if let Some(seed) = overrides.seed {
        config.simulation.random_seed = Some(seed);
    }
    if !overrides.confidence_levels.is_empty() {
        config.risk.confidence_levels = overrides.confidence_levels.clone();
    }

    Ok(config)
}
