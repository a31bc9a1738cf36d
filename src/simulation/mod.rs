//! # Price path simulation
//!
//! Generates ensembles of forward price paths under two models:
//!
//! - `gbm`: Geometric Brownian Motion
//! - `jump`: Merton jump-diffusion with compensated drift
//!
//! Both share the same time stepping: `dt = T / steps`, row 0 is `S0`, and
//! each later row is the previous row times one multiplicative factor drawn
//! independently per path. Steps are sequential; paths are independent, so
//! the engine splits them into fixed-size batches and runs the batches on the
//! rayon pool. Each batch owns the random stream for its batch index.

mod ensemble;
mod gbm;
mod jump;
mod rng;

pub use ensemble::PathEnsemble;
pub use gbm::{GbmScaling, DAILY_SCALE_DAYS};
pub use rng::{RandomSource, SeededSource};

use crate::error::{Result, RiskError};
use crate::params::{ModelKind, ModelParameters};
use gbm::GbmKernel;
use jump::JumpDiffusionKernel;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// One multiplicative update applied to a batch of paths
pub(crate) trait StepKernel: Sync {
    /// Fill `factors` with one independent price multiplier per path
    fn fill_factors<R: Rng + ?Sized>(&self, rng: &mut R, factors: &mut [f64]);
}

/// Simulation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Stochastic model to simulate
    pub model: ModelKind,

    /// Horizon in years (1/12 = one month)
    pub horizon_years: f64,

    /// Number of time steps over the horizon
    pub steps: usize,

    /// Number of simulated paths
    pub paths: usize,

    /// Paths per batch; batches are the unit of parallel work
    pub batch_size: usize,

    /// Random seed for reproducible runs (None = random)
    pub random_seed: Option<u64>,

    /// How annualized GBM parameters are scaled per step
    pub gbm_scaling: GbmScaling,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Diffusion,
            horizon_years: 1.0 / 12.0,
            steps: 21,
            paths: 1000,
            batch_size: 256,
            random_seed: None,
            gbm_scaling: GbmScaling::DailyRescaled,
        }
    }
}

/// Everything needed to generate one ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Initial price
    pub s0: f64,

    /// Horizon in years
    pub horizon_years: f64,

    /// Number of time steps
    pub steps: usize,

    /// Number of paths
    pub paths: usize,

    /// Model parameters
    pub params: ModelParameters,

    /// Model selector
    pub model: ModelKind,
}

impl SimulationRequest {
    /// Request using the horizon, step and path counts from `config`
    pub fn from_config(config: &SimulationConfig, s0: f64, params: ModelParameters) -> Self {
        Self {
            s0,
            horizon_years: config.horizon_years,
            steps: config.steps,
            paths: config.paths,
            params,
            model: config.model,
        }
    }

    /// Time step in years
    pub fn dt(&self) -> f64 {
        self.horizon_years / self.steps as f64
    }

    /// Check domain constraints on every input
    pub fn validate(&self) -> Result<()> {
        if !self.s0.is_finite() || self.s0 <= 0.0 {
            return Err(RiskError::invalid(format!(
                "initial price must be positive, got {}",
                self.s0
            )));
        }
        if !self.horizon_years.is_finite() || self.horizon_years <= 0.0 {
            return Err(RiskError::invalid(format!(
                "horizon must be positive, got {}",
                self.horizon_years
            )));
        }
        if self.steps < 1 {
            return Err(RiskError::invalid("steps must be at least 1"));
        }
        if self.paths < 1 {
            return Err(RiskError::invalid("paths must be at least 1"));
        }
        if (self.steps + 1).checked_mul(self.paths).is_none() {
            return Err(RiskError::invalid(format!(
                "ensemble of {} steps x {} paths is too large",
                self.steps, self.paths
            )));
        }
        self.params.validate()
    }
}

/// Cooperative cancellation flag, checked between batches
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; batches not yet started are skipped
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Generates price path ensembles
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    config: SimulationConfig,
}

impl SimulationEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Random source for the configured seed
    pub fn random_source(&self) -> SeededSource {
        match self.config.random_seed {
            Some(seed) => SeededSource::new(seed),
            None => {
                let source = SeededSource::from_entropy();
                debug!(seed = source.seed(), "No random seed configured, drew one");
                source
            }
        }
    }

    /// Simulate the request with the model it selects
    ///
    /// # Example
    ///
    /// ```
    /// use mc_risk::{ModelKind, ModelParameters, SimulationConfig, SimulationEngine, SimulationRequest};
    ///
    /// let engine = SimulationEngine::new(SimulationConfig {
    ///     random_seed: Some(42),
    ///     ..Default::default()
    /// });
    ///
    /// let request = SimulationRequest {
    ///     s0: 100.0,
    ///     horizon_years: 1.0 / 12.0,
    ///     steps: 21,
    ///     paths: 500,
    ///     params: ModelParameters::diffusion(0.1, 0.2),
    ///     model: ModelKind::Diffusion,
    /// };
    ///
    /// let ensemble = engine.simulate(&request).unwrap();
    /// assert_eq!(ensemble.paths(), 500);
    /// assert_eq!(ensemble.row(0).unwrap(), vec![100.0; 500]);
    /// ```
    pub fn simulate(&self, request: &SimulationRequest) -> Result<PathEnsemble> {
        self.simulate_with(request, &self.random_source(), &CancellationToken::new())
    }

    /// Simulate with an explicit random source and cancellation token
    pub fn simulate_with<S: RandomSource>(
        &self,
        request: &SimulationRequest,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<PathEnsemble> {
        match request.model {
            ModelKind::Diffusion => self.run_gbm(request, source, cancel),
            ModelKind::JumpDiffusion => self.run_jump_diffusion(request, source, cancel),
        }
    }

    /// Geometric Brownian Motion paths
    pub fn simulate_gbm<S: RandomSource>(
        &self,
        request: &SimulationRequest,
        source: &S,
    ) -> Result<PathEnsemble> {
        self.run_gbm(request, source, &CancellationToken::new())
    }

    /// Merton jump-diffusion paths
    ///
    /// Requires `request.params.jump`.
    pub fn simulate_jump_diffusion<S: RandomSource>(
        &self,
        request: &SimulationRequest,
        source: &S,
    ) -> Result<PathEnsemble> {
        self.run_jump_diffusion(request, source, &CancellationToken::new())
    }

    fn run_gbm<S: RandomSource>(
        &self,
        request: &SimulationRequest,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<PathEnsemble> {
        request.validate()?;
        let kernel = GbmKernel::new(&request.params, request.dt(), self.config.gbm_scaling);
        self.run(request, &kernel, source, cancel)
    }

    fn run_jump_diffusion<S: RandomSource>(
        &self,
        request: &SimulationRequest,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<PathEnsemble> {
        request.validate()?;
        let kernel = JumpDiffusionKernel::new(&request.params, request.dt())?;
        self.run(request, &kernel, source, cancel)
    }

    fn run<K: StepKernel, S: RandomSource>(
        &self,
        request: &SimulationRequest,
        kernel: &K,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<PathEnsemble> {
        if self.config.batch_size == 0 {
            return Err(RiskError::invalid("batch_size must be at least 1"));
        }

        let rows = request.steps + 1;
        let batch_paths = self.config.batch_size.min(request.paths);
        let batches = request.paths.div_ceil(batch_paths);

        info!(
            model = ?request.model,
            s0 = request.s0,
            steps = request.steps,
            paths = request.paths,
            batches,
            "Simulating price paths"
        );

        let mut data = vec![0.0; rows * request.paths];
        data.par_chunks_mut(batch_paths * rows)
            .enumerate()
            .try_for_each(|(batch_index, chunk)| {
                if cancel.is_cancelled() {
                    return Err(RiskError::Cancelled);
                }
                let mut rng = source.batch_rng(batch_index as u64);
                simulate_batch(chunk, rows, request.s0, kernel, &mut rng);
                trace!(batch_index, paths = chunk.len() / rows, "Batch complete");
                Ok(())
            })?;

        Ok(PathEnsemble::from_raw(request.steps, request.paths, data))
    }

    /// Run a simulation on tokio's blocking pool
    ///
    /// Cancelling `cancel` stops the run at the next batch boundary.
    #[cfg(feature = "async")]
    pub async fn simulate_blocking_task(
        self: Arc<Self>,
        request: SimulationRequest,
        cancel: CancellationToken,
    ) -> Result<PathEnsemble> {
        let source = self.random_source();
        tokio::task::spawn_blocking(move || self.simulate_with(&request, &source, &cancel))
            .await
            .map_err(|e| RiskError::CalculationError(format!("simulation task failed: {}", e)))?
    }
}

/// Advance one contiguous batch of paths through every step
///
/// `chunk` holds `chunk.len() / rows` paths laid out path-major.
fn simulate_batch<K: StepKernel, R: Rng>(
    chunk: &mut [f64],
    rows: usize,
    s0: f64,
    kernel: &K,
    rng: &mut R,
) {
    let width = chunk.len() / rows;
    for path in chunk.chunks_exact_mut(rows) {
        path[0] = s0;
    }

    let mut factors = vec![1.0; width];
    for t in 1..rows {
        kernel.fill_factors(rng, &mut factors);
        for (j, factor) in factors.iter().enumerate() {
            let prev = chunk[j * rows + t - 1];
            // exp() can underflow for extreme inputs; prices stay strictly positive
            chunk[j * rows + t] = (prev * factor).max(f64::MIN_POSITIVE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::JumpParameters;

    fn request(model: ModelKind, params: ModelParameters) -> SimulationRequest {
        SimulationRequest {
            s0: 100.0,
            horizon_years: 1.0 / 12.0,
            steps: 21,
            paths: 300,
            params,
            model,
        }
    }

    fn seeded_engine(batch_size: usize) -> SimulationEngine {
        SimulationEngine::new(SimulationConfig {
            batch_size,
            random_seed: Some(42),
            ..Default::default()
        })
    }

    fn jump_params() -> ModelParameters {
        ModelParameters::jump_diffusion(
            0.1,
            0.2,
            JumpParameters { lambda: 5.0, mu_j: -0.05, sigma_j: 0.1 },
        )
    }

    #[test]
    fn test_zero_volatility_gbm_is_flat() {
        let engine = seeded_engine(2);
        let req = SimulationRequest {
            s0: 100.0,
            horizon_years: 1.0,
            steps: 10,
            paths: 5,
            params: ModelParameters::diffusion(0.0, 0.0),
            model: ModelKind::Diffusion,
        };

        let ensemble = engine.simulate(&req).unwrap();
        assert_eq!(ensemble.steps(), 10);
        assert_eq!(ensemble.paths(), 5);
        for path in ensemble.iter_paths() {
            assert!(path.iter().all(|p| *p == 100.0));
        }
    }

    #[test]
    fn test_row_zero_and_positivity() {
        let engine = seeded_engine(64);
        for req in [
            request(ModelKind::Diffusion, ModelParameters::diffusion(0.1, 0.6)),
            request(ModelKind::JumpDiffusion, jump_params()),
        ] {
            let ensemble = engine.simulate(&req).unwrap();
            assert_eq!(ensemble.row(0).unwrap(), vec![100.0; 300]);
            assert!(ensemble.iter_paths().flatten().all(|p| *p > 0.0));
        }
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let engine = seeded_engine(64);
        let req = request(ModelKind::JumpDiffusion, jump_params());

        let a = engine.simulate(&req).unwrap();
        let b = engine.simulate(&req).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_independent_of_thread_count() {
        let engine = seeded_engine(16);
        let req = request(ModelKind::Diffusion, ModelParameters::diffusion(0.1, 0.3));

        let single = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| engine.simulate(&req).unwrap());
        let multi = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap()
            .install(|| engine.simulate(&req).unwrap());

        assert_eq!(single, multi);
    }

    #[test]
    fn test_different_seeds_differ() {
        let req = request(ModelKind::Diffusion, ModelParameters::diffusion(0.1, 0.3));
        let engine = SimulationEngine::default();

        let a = engine.simulate_gbm(&req, &SeededSource::new(1)).unwrap();
        let b = engine.simulate_gbm(&req, &SeededSource::new(2)).unwrap();
        assert_ne!(a.final_row(), b.final_row());
    }

    #[test]
    fn test_invalid_requests() {
        let engine = seeded_engine(64);
        let base = request(ModelKind::Diffusion, ModelParameters::diffusion(0.1, 0.2));

        let cases = [
            SimulationRequest { s0: 0.0, ..base.clone() },
            SimulationRequest { s0: -1.0, ..base.clone() },
            SimulationRequest { horizon_years: 0.0, ..base.clone() },
            SimulationRequest { steps: 0, ..base.clone() },
            SimulationRequest { paths: 0, ..base.clone() },
            SimulationRequest { params: ModelParameters::diffusion(0.1, -0.2), ..base.clone() },
        ];

        for req in cases {
            let err = engine.simulate(&req).unwrap_err();
            assert!(matches!(err, RiskError::InvalidParameter(_)), "{:?}", req);
        }
    }

    #[test]
    fn test_jump_model_requires_jump_params() {
        let engine = seeded_engine(64);
        let req = request(ModelKind::JumpDiffusion, ModelParameters::diffusion(0.1, 0.2));
        assert!(matches!(
            engine.simulate(&req).unwrap_err(),
            RiskError::InvalidParameter(_)
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let engine = seeded_engine(0);
        let req = request(ModelKind::Diffusion, ModelParameters::diffusion(0.1, 0.2));
        assert!(engine.simulate(&req).is_err());
    }

    #[test]
    fn test_cancelled_before_start() {
        let engine = seeded_engine(8);
        let req = request(ModelKind::Diffusion, ModelParameters::diffusion(0.1, 0.2));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = engine
            .simulate_with(&req, &SeededSource::new(1), &cancel)
            .unwrap_err();
        assert!(matches!(err, RiskError::Cancelled));
    }

    #[test]
    fn test_single_path() {
        let engine = seeded_engine(64);
        let req = SimulationRequest {
            paths: 1,
            ..request(ModelKind::Diffusion, ModelParameters::diffusion(0.1, 0.2))
        };
        let ensemble = engine.simulate(&req).unwrap();
        assert_eq!(ensemble.paths(), 1);
        assert_eq!(ensemble.final_row().len(), 1);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_blocking_task() {
        let engine = Arc::new(seeded_engine(64));
        let req = request(ModelKind::Diffusion, ModelParameters::diffusion(0.1, 0.2));

        let ensemble = engine
            .clone()
            .simulate_blocking_task(req.clone(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(ensemble, engine.simulate(&req).unwrap());
    }
}
