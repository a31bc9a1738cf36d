//! Closed-form moment matching of model parameters from historical returns
//!
//! - Drift / volatility: sample mean and standard deviation, annualized
//! - Jumps: returns beyond `threshold_std` unconditional standard deviations
//!
//! The jump detector is a threshold heuristic, not a maximum-likelihood fit.
//! The threshold is a sensitivity knob; lowering it classifies ordinary
//! large moves as jumps.

use crate::error::{Result, RiskError};
use crate::params::{JumpParameters, ModelKind, ModelParameters};
use crate::returns::ReturnSeries;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::{debug, warn};

/// Estimator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Trading days per year used to annualize daily moments
    pub trading_days: u32,

    /// Jump classification threshold in unconditional standard deviations
    pub jump_threshold_std: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            trading_days: 252,
            jump_threshold_std: 3.0,
        }
    }
}

/// Converts a return series into model parameters
#[derive(Debug, Clone, Default)]
pub struct ParameterEstimator {
    config: EstimatorConfig,
}

impl ParameterEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Annualized drift and volatility
    ///
    /// `mu = mean * trading_days`, `sigma = stdev * sqrt(trading_days)`
    ///
    /// # Example
    ///
    /// ```
    /// use mc_risk::{ParameterEstimator, ReturnSeries};
    ///
    /// let series = ReturnSeries::new(vec![0.01, -0.01, 0.02, 0.0]).unwrap();
    /// let params = ParameterEstimator::default().estimate(&series).unwrap();
    ///
    /// assert!((params.mu - 0.005 * 252.0).abs() < 1e-12);
    /// assert!(params.sigma > 0.0);
    /// ```
    pub fn estimate(&self, returns: &ReturnSeries) -> Result<ModelParameters> {
        let values = returns.values();
        require_observations(values.len())?;
        let trading_days = self.trading_days()?;

        let mean = values.iter().mean();
        let std_dev = values.iter().std_dev();

        let mu = mean * trading_days;
        let sigma = std_dev * trading_days.sqrt();

        debug!(mu, sigma, observations = values.len(), "Estimated drift and volatility");

        Ok(ModelParameters::diffusion(mu, sigma))
    }

    /// Jump intensity and log jump-size statistics
    ///
    /// A return is a jump when `|r| > threshold_std * stdev(returns)`.
    /// `lambda` is jumps per year over the sample span. A single detected jump
    /// has no sample dispersion and gets `sigma_j = 0`.
    pub fn estimate_jump_params(&self, returns: &ReturnSeries) -> Result<JumpParameters> {
        let values = returns.values();
        require_observations(values.len())?;
        let trading_days = self.trading_days()?;

        let threshold_std = self.config.jump_threshold_std;
        if !threshold_std.is_finite() || threshold_std <= 0.0 {
            return Err(RiskError::invalid(format!(
                "jump threshold must be positive, got {}",
                threshold_std
            )));
        }

        let vol = values.iter().std_dev();
        if vol == 0.0 {
            // Constant series: no move stands out from the rest
            return Err(RiskError::NoJumpsDetected { threshold_std });
        }

        let cutoff = threshold_std * vol;
        let jumps: Vec<f64> = values.iter().copied().filter(|r| r.abs() > cutoff).collect();

        if jumps.is_empty() {
            return Err(RiskError::NoJumpsDetected { threshold_std });
        }

        let years = values.len() as f64 / trading_days;
        let lambda = jumps.len() as f64 / years;
        let mu_j = jumps.iter().mean();
        let sigma_j = if jumps.len() > 1 {
            jumps.iter().std_dev()
        } else {
            0.0
        };

        debug!(
            lambda,
            mu_j,
            sigma_j,
            jumps = jumps.len(),
            cutoff,
            "Estimated jump parameters"
        );

        Ok(JumpParameters { lambda, mu_j, sigma_j })
    }

    /// Full parameter set for the requested model
    ///
    /// For jump-diffusion, a series with no detectable jumps falls back to
    /// pure diffusion parameters.
    pub fn fit(&self, returns: &ReturnSeries, model: ModelKind) -> Result<ModelParameters> {
        let base = self.estimate(returns)?;

        match model {
            ModelKind::Diffusion => Ok(base),
            ModelKind::JumpDiffusion => match self.estimate_jump_params(returns) {
                Ok(jump) => Ok(ModelParameters::jump_diffusion(base.mu, base.sigma, jump)),
                Err(RiskError::NoJumpsDetected { threshold_std }) => {
                    warn!(
                        threshold_std,
                        "No jumps detected, falling back to pure diffusion"
                    );
                    Ok(base)
                }
                Err(e) => Err(e),
            },
        }
    }

    fn trading_days(&self) -> Result<f64> {
        if self.config.trading_days == 0 {
            return Err(RiskError::invalid("trading_days must be at least 1"));
        }
        Ok(self.config.trading_days as f64)
    }
}

fn require_observations(got: usize) -> Result<()> {
    if got < ReturnSeries::MIN_OBSERVATIONS {
        return Err(RiskError::InsufficientData {
            needed: ReturnSeries::MIN_OBSERVATIONS,
            got,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(values: &[f64]) -> ReturnSeries {
        ReturnSeries::new(values.to_vec()).unwrap()
    }

    /// 250 quiet days with two large moves
    fn series_with_jumps() -> ReturnSeries {
        let mut values: Vec<f64> = (0..250)
            .map(|i| if i % 2 == 0 { 0.001 } else { -0.001 })
            .collect();
        values[100] = -0.08;
        values[200] = -0.12;
        series(&values)
    }

    #[test]
    fn test_estimate_annualizes() {
        let returns = series(&[0.01, 0.03]);
        let params = ParameterEstimator::default().estimate(&returns).unwrap();

        // mean = 0.02, sample stdev = sqrt(0.0002)
        assert_relative_eq!(params.mu, 0.02 * 252.0, epsilon = 1e-12);
        assert_relative_eq!(params.sigma, 0.0002f64.sqrt() * 252f64.sqrt(), epsilon = 1e-12);
        assert!(params.jump.is_none());
    }

    #[test]
    fn test_estimate_custom_trading_days() {
        let estimator = ParameterEstimator::new(EstimatorConfig {
            trading_days: 365,
            ..Default::default()
        });
        let params = estimator.estimate(&series(&[0.01, 0.03])).unwrap();
        assert_relative_eq!(params.mu, 0.02 * 365.0, epsilon = 1e-12);
    }

    #[test]
    fn test_estimate_constant_series() {
        let params = ParameterEstimator::default()
            .estimate(&series(&[0.01, 0.01, 0.01]))
            .unwrap();
        assert_eq!(params.sigma, 0.0);
        assert!(params.mu.is_finite());
    }

    #[test]
    fn test_zero_trading_days_rejected() {
        let estimator = ParameterEstimator::new(EstimatorConfig {
            trading_days: 0,
            ..Default::default()
        });
        let err = estimator.estimate(&series(&[0.01, 0.02])).unwrap_err();
        assert!(matches!(err, RiskError::InvalidParameter(_)));
    }

    #[test]
    fn test_jump_detection() {
        let returns = series_with_jumps();
        let jump = ParameterEstimator::default()
            .estimate_jump_params(&returns)
            .unwrap();

        // 2 jumps over 250/252 years
        assert_relative_eq!(jump.lambda, 2.0 / (250.0 / 252.0), epsilon = 1e-9);
        assert_relative_eq!(jump.mu_j, -0.10, epsilon = 1e-12);
        assert_relative_eq!(jump.sigma_j, 0.0008f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_no_jumps_detected() {
        let returns = series(&[0.01, -0.01, 0.012, -0.009, 0.011]);
        let err = ParameterEstimator::default()
            .estimate_jump_params(&returns)
            .unwrap_err();
        assert!(matches!(err, RiskError::NoJumpsDetected { .. }));
    }

    #[test]
    fn test_constant_series_has_no_jumps() {
        let err = ParameterEstimator::default()
            .estimate_jump_params(&series(&[0.02, 0.02, 0.02]))
            .unwrap_err();
        assert!(matches!(err, RiskError::NoJumpsDetected { .. }));
    }

    #[test]
    fn test_single_jump_has_zero_dispersion() {
        let mut values = vec![0.001; 100];
        for (i, v) in values.iter_mut().enumerate() {
            if i % 2 == 1 {
                *v = -0.001;
            }
        }
        values[50] = 0.2;

        let jump = ParameterEstimator::default()
            .estimate_jump_params(&series(&values))
            .unwrap();
        assert_eq!(jump.mu_j, 0.2);
        assert_eq!(jump.sigma_j, 0.0);
    }

    #[test]
    fn test_fit_jump_diffusion() {
        let params = ParameterEstimator::default()
            .fit(&series_with_jumps(), ModelKind::JumpDiffusion)
            .unwrap();
        assert_eq!(params.kind(), ModelKind::JumpDiffusion);
    }

    #[test]
    fn test_fit_falls_back_without_jumps() {
        let params = ParameterEstimator::default()
            .fit(&series(&[0.01, -0.01, 0.012]), ModelKind::JumpDiffusion)
            .unwrap();
        assert_eq!(params.kind(), ModelKind::Diffusion);
    }
}
