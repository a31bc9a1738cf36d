//! End-to-end estimate → simulate → analyze run

use crate::analyzer::{terminal_returns, RiskAnalyzer, RiskReport};
use crate::config::AnalysisConfig;
use crate::error::{Result, RiskError};
use crate::estimator::ParameterEstimator;
use crate::params::{ModelKind, ModelParameters};
use crate::returns::{summarize_rolling_returns, HistoricalTable, ReturnSeries, RollingReturnSummary};
use crate::simulation::{SimulationEngine, SimulationRequest};
use serde::Serialize;
use tracing::{debug, info};

/// Output of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    /// Starting price of the simulation
    pub s0: f64,

    /// Parameters the paths were simulated with
    pub params: ModelParameters,

    /// Tail statistics
    pub report: RiskReport,

    /// Raw terminal return distribution, one entry per path
    pub terminal_returns: Vec<f64>,

    /// Realised rolling-horizon returns, when enough history was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling: Option<RollingReturnSummary>,
}

/// Wires the estimator, simulation engine and analyzer together
#[derive(Debug, Clone, Default)]
pub struct RiskPipeline {
    estimator: ParameterEstimator,
    engine: SimulationEngine,
    analyzer: RiskAnalyzer,
}

impl RiskPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            estimator: ParameterEstimator::new(config.estimator),
            engine: SimulationEngine::new(config.simulation),
            analyzer: RiskAnalyzer::new(config.risk),
        }
    }

    pub fn estimator(&self) -> &ParameterEstimator {
        &self.estimator
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn analyzer(&self) -> &RiskAnalyzer {
        &self.analyzer
    }

    /// Estimate parameters from `returns`, then simulate and analyze from `s0`
    pub fn run(&self, returns: &ReturnSeries, s0: f64) -> Result<AnalysisRun> {
        let configured = self.engine.config().model;
        let params = self.estimator.fit(returns, configured)?;

        // A jump fit without detectable jumps falls back to pure diffusion
        let model = match (configured, params.jump) {
            (ModelKind::JumpDiffusion, None) => ModelKind::Diffusion,
            _ => configured,
        };
        info!(
            mu = params.mu,
            sigma = params.sigma,
            model = ?model,
            observations = returns.len(),
            "Estimated model parameters"
        );

        self.simulate_and_analyze(params, s0, model)
    }

    /// Simulate and analyze with known parameters under the configured model
    ///
    /// A jump-diffusion configuration requires `params.jump`.
    pub fn run_with_params(&self, params: ModelParameters, s0: f64) -> Result<AnalysisRun> {
        self.simulate_and_analyze(params, s0, self.engine.config().model)
    }

    fn simulate_and_analyze(
        &self,
        params: ModelParameters,
        s0: f64,
        model: ModelKind,
    ) -> Result<AnalysisRun> {
        let mut request = SimulationRequest::from_config(self.engine.config(), s0, params);
        request.model = model;

        let ensemble = self.engine.simulate(&request)?;
        let report = self.analyzer.analyze(&ensemble, s0)?;
        let terminal_returns = terminal_returns(&ensemble, s0)?;

        for measure in report.iter() {
            info!(
                confidence_level = measure.confidence_level,
                var = measure.var,
                expected_shortfall = measure.expected_shortfall,
                "Risk measure"
            );
        }

        Ok(AnalysisRun {
            s0,
            params,
            report,
            terminal_returns,
            rolling: None,
        })
    }

    /// Run from a historical price table, starting at its last close
    pub fn run_table(&self, table: &HistoricalTable) -> Result<AnalysisRun> {
        let s0 = table
            .last_close()
            .ok_or_else(|| RiskError::InsufficientData { needed: 3, got: 0 })?;
        let returns = table.return_series()?;

        let mut run = self.run(&returns, s0)?;

        let window = self.analyzer.config().rolling_window_days;
        match summarize_rolling_returns(&table.closes(), window) {
            Ok(summary) => run.rolling = Some(summary),
            Err(e) => debug!(window, error = %e, "Skipping rolling-return summary"),
        }

        Ok(run)
    }
}
