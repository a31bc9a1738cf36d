//! Geometric Brownian Motion step kernel
//!
//! P_t = P_{t-1} * exp((mu - 0.5*sigma^2)*dt + sigma*sqrt(dt)*Z)

use super::StepKernel;
use crate::params::ModelParameters;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// Days per year used to rescale annualized GBM parameters
pub const DAILY_SCALE_DAYS: f64 = 252.0;

/// How annualized drift and volatility enter the GBM step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GbmScaling {
    /// Convert to daily scale (`mu/252`, `sigma/sqrt(252)`) and then apply
    /// `dt = T/steps` on top. The time scale is effectively applied twice;
    /// kept as the default to reproduce established results.
    #[default]
    DailyRescaled,

    /// Use the annualized parameters directly with `dt = T/steps`
    Annualized,
}

/// Per-step multiplicative factor for the diffusion model
#[derive(Debug, Clone)]
pub(crate) struct GbmKernel {
    drift: f64,
    diffusion: f64,
}

impl GbmKernel {
    pub(crate) fn new(params: &ModelParameters, dt: f64, scaling: GbmScaling) -> Self {
        let (mu, sigma) = match scaling {
            GbmScaling::DailyRescaled => (
                params.mu / DAILY_SCALE_DAYS,
                params.sigma / DAILY_SCALE_DAYS.sqrt(),
            ),
            GbmScaling::Annualized => (params.mu, params.sigma),
        };

        Self {
            drift: (mu - 0.5 * sigma * sigma) * dt,
            diffusion: sigma * dt.sqrt(),
        }
    }
}

impl StepKernel for GbmKernel {
    fn fill_factors<R: Rng + ?Sized>(&self, rng: &mut R, factors: &mut [f64]) {
        for factor in factors.iter_mut() {
            let z: f64 = StandardNormal.sample(rng);
            *factor = (self.drift + self.diffusion * z).exp();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_daily_rescaled_coefficients() {
        let params = ModelParameters::diffusion(0.252, 0.252f64.sqrt());
        let kernel = GbmKernel::new(&params, 0.5, GbmScaling::DailyRescaled);

        // mu_d = 0.001, sigma_d^2 = 0.001
        assert_relative_eq!(kernel.drift, (0.001 - 0.0005) * 0.5, epsilon = 1e-15);
        assert_relative_eq!(kernel.diffusion, 0.001f64.sqrt() * 0.5f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_annualized_coefficients() {
        let params = ModelParameters::diffusion(0.1, 0.2);
        let kernel = GbmKernel::new(&params, 0.25, GbmScaling::Annualized);

        assert_relative_eq!(kernel.drift, (0.1 - 0.02) * 0.25, epsilon = 1e-15);
        assert_relative_eq!(kernel.diffusion, 0.1, epsilon = 1e-15);
    }

    #[test]
    fn test_zero_volatility_factor_is_deterministic() {
        let params = ModelParameters::diffusion(0.0, 0.0);
        let kernel = GbmKernel::new(&params, 0.1, GbmScaling::DailyRescaled);

        let mut rng = StdRng::seed_from_u64(7);
        let mut factors = vec![0.0; 8];
        kernel.fill_factors(&mut rng, &mut factors);
        assert!(factors.iter().all(|f| *f == 1.0));
    }

    #[test]
    fn test_unit_draws_match_normal() {
        use rand_distr::Normal;

        // drift 0, diffusion 1: each factor is exp(z)
        let params = ModelParameters::diffusion(0.5, 1.0);
        let kernel = GbmKernel::new(&params, 1.0, GbmScaling::Annualized);
        assert_eq!(kernel.drift, 0.0);
        assert_eq!(kernel.diffusion, 1.0);

        let mut factors = vec![0.0; 32];
        kernel.fill_factors(&mut StdRng::seed_from_u64(3), &mut factors);

        let normal = Normal::<f64>::new(0.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for f in factors {
            assert_relative_eq!(f, normal.sample(&mut rng).exp(), epsilon = 1e-12);
        }
    }
}
