//! # mc-risk: Monte Carlo price-path risk engine
//!
//! Estimates drift, volatility and jump statistics from historical
//! log-returns, simulates forward price paths, and derives Value-at-Risk and
//! Expected Shortfall from the simulated terminal distribution.
//!
//! ## Core Components
//!
//! - **ParameterEstimator**: return series → model parameters
//! - **SimulationEngine**: model parameters → path ensemble (GBM or Merton
//!   jump-diffusion), batched across threads with per-batch seeded streams
//! - **RiskAnalyzer**: path ensemble → VaR / ES per confidence level
//! - **RiskPipeline**: the three stages wired together from an
//!   [`AnalysisConfig`]
//!
//! ## Example Usage
//!
//! ```rust
//! use mc_risk::{
//!     ModelKind, ParameterEstimator, ReturnSeries, RiskAnalyzer, SimulationConfig,
//!     SimulationEngine, SimulationRequest,
//! };
//!
//! let returns = ReturnSeries::new(vec![0.012, -0.008, 0.004, -0.015, 0.009, 0.001]).unwrap();
//! let params = ParameterEstimator::default().estimate(&returns).unwrap();
//!
//! let engine = SimulationEngine::new(SimulationConfig {
//!     random_seed: Some(42),
//!     ..Default::default()
//! });
//! let request = SimulationRequest {
//!     s0: 100.0,
//!     horizon_years: 1.0 / 12.0,
//!     steps: 21,
//!     paths: 1000,
//!     params,
//!     model: ModelKind::Diffusion,
//! };
//! let ensemble = engine.simulate(&request).unwrap();
//!
//! let report = RiskAnalyzer::default()
//!     .calculate_var_es(&ensemble, 100.0, &[0.95, 0.99])
//!     .unwrap();
//!
//! let m95 = report.get(0.95).unwrap();
//! let m99 = report.get(0.99).unwrap();
//! assert!(m95.var >= m99.var);
//! assert!(m99.expected_shortfall <= m99.var);
//! ```

mod analyzer;
mod config;
mod error;
mod estimator;
mod params;
mod pipeline;
mod returns;
pub mod simulation;

pub use analyzer::{
    percentile, terminal_returns, QuantileMethod, RiskAnalyzer, RiskConfig, RiskMeasure,
    RiskReport,
};
pub use config::AnalysisConfig;
pub use error::{Result, RiskError};
pub use estimator::{EstimatorConfig, ParameterEstimator};
pub use params::{JumpParameters, ModelKind, ModelParameters};
pub use pipeline::{AnalysisRun, RiskPipeline};
pub use returns::{
    rolling_returns, summarize_rolling_returns, HistoricalTable, PriceRow, ReturnSeries,
    RollingReturnSummary,
};
pub use simulation::{
    CancellationToken, GbmScaling, PathEnsemble, RandomSource, SeededSource, SimulationConfig,
    SimulationEngine, SimulationRequest,
};
