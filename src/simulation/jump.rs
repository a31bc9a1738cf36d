//! Merton jump-diffusion step kernel
//!
//! drift     = (mu - lambda * (exp(mu_j + 0.5*sigma_j^2) - 1)) * dt
//! diffusion = sigma * sqrt(dt)
//! P_t       = P_{t-1} * exp(drift + diffusion*Z) * Y^N
//!
//! N ~ Poisson(lambda*dt) and Y = exp(X), X ~ N(mu_j, sigma_j). A single jump
//! size is drawn per step and raised to N instead of compounding N
//! independent draws. With N = 0 the multiplier is 1.

use super::StepKernel;
use crate::error::{Result, RiskError};
use crate::params::ModelParameters;
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson, StandardNormal};

#[derive(Debug, Clone)]
pub(crate) struct JumpDiffusionKernel {
    drift: f64,
    diffusion: f64,
    /// None when `lambda * dt` is zero: no jump can occur
    jump_count: Option<Poisson<f64>>,
    jump_size: Normal<f64>,
}

impl JumpDiffusionKernel {
    pub(crate) fn new(params: &ModelParameters, dt: f64) -> Result<Self> {
        let jump = params.jump.ok_or_else(|| {
            RiskError::invalid("jump-diffusion requires jump parameters (lambda, mu_j, sigma_j)")
        })?;

        let drift = (params.mu - jump.lambda * jump.kappa()) * dt;
        let diffusion = params.sigma * dt.sqrt();

        let jump_size = Normal::new(jump.mu_j, jump.sigma_j)
            .map_err(|e| RiskError::CalculationError(e.to_string()))?;

        let rate = jump.lambda * dt;
        let jump_count = if rate > 0.0 {
            Some(Poisson::new(rate).map_err(|e| RiskError::CalculationError(e.to_string()))?)
        } else {
            None
        };

        Ok(Self {
            drift,
            diffusion,
            jump_count,
            jump_size,
        })
    }
}

impl StepKernel for JumpDiffusionKernel {
    fn fill_factors<R: Rng + ?Sized>(&self, rng: &mut R, factors: &mut [f64]) {
        for factor in factors.iter_mut() {
            let z: f64 = StandardNormal.sample(rng);
            let n = match &self.jump_count {
                Some(poisson) => poisson.sample(rng) as i32,
                None => 0,
            };
            let y = self.jump_size.sample(rng).exp();

            let multiplier = if n > 0 { y.powi(n) } else { 1.0 };
            *factor = (self.drift + self.diffusion * z).exp() * multiplier;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::JumpParameters;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_drift_compensates_expected_jump() {
        let jump = JumpParameters { lambda: 2.0, mu_j: -0.05, sigma_j: 0.1 };
        let params = ModelParameters::jump_diffusion(0.1, 0.2, jump);
        let kernel = JumpDiffusionKernel::new(&params, 0.5).unwrap();

        let expected = (0.1 - 2.0 * ((-0.05f64 + 0.005).exp() - 1.0)) * 0.5;
        assert_relative_eq!(kernel.drift, expected, epsilon = 1e-15);
        assert_relative_eq!(kernel.diffusion, 0.2 * 0.5f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_zero_intensity_has_no_jumps() {
        let jump = JumpParameters { lambda: 0.0, mu_j: -0.5, sigma_j: 0.3 };
        let params = ModelParameters::jump_diffusion(0.05, 0.0, jump);
        let kernel = JumpDiffusionKernel::new(&params, 0.1).unwrap();
        assert!(kernel.jump_count.is_none());

        let mut rng = StdRng::seed_from_u64(11);
        let mut factors = vec![0.0; 16];
        kernel.fill_factors(&mut rng, &mut factors);
        for f in factors {
            assert_relative_eq!(f, (0.05f64 * 0.1).exp(), epsilon = 1e-15);
        }
    }

    #[test]
    fn test_missing_jump_block_rejected() {
        let params = ModelParameters::diffusion(0.1, 0.2);
        let err = JumpDiffusionKernel::new(&params, 0.1).unwrap_err();
        assert!(matches!(err, RiskError::InvalidParameter(_)));
    }
}
