//! Model parameter value objects

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// Stochastic model used to generate price paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Geometric Brownian Motion
    #[default]
    Diffusion,

    /// Merton jump-diffusion
    JumpDiffusion,
}

/// Compound Poisson jump statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpParameters {
    /// Expected jumps per year
    pub lambda: f64,

    /// Mean of the log jump size
    pub mu_j: f64,

    /// Standard deviation of the log jump size
    pub sigma_j: f64,
}

impl JumpParameters {
    /// Expected relative jump size `E[Y] - 1` with `Y = exp(N(mu_j, sigma_j))`
    pub fn kappa(&self) -> f64 {
        (self.mu_j + 0.5 * self.sigma_j * self.sigma_j).exp() - 1.0
    }
}

/// Annualized drift and volatility, plus jump statistics for jump-diffusion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Annualized drift
    pub mu: f64,

    /// Annualized volatility
    pub sigma: f64,

    /// Jump block, present only for jump-diffusion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump: Option<JumpParameters>,
}

impl ModelParameters {
    /// Pure diffusion parameters
    pub fn diffusion(mu: f64, sigma: f64) -> Self {
        Self {
            mu,
            sigma,
            jump: None,
        }
    }

    /// Jump-diffusion parameters
    pub fn jump_diffusion(mu: f64, sigma: f64, jump: JumpParameters) -> Self {
        Self {
            mu,
            sigma,
            jump: Some(jump),
        }
    }

    /// Model these parameters can drive
    pub fn kind(&self) -> ModelKind {
        match self.jump {
            Some(_) => ModelKind::JumpDiffusion,
            None => ModelKind::Diffusion,
        }
    }

    /// Reject values a log-normal / normal scale parameter cannot take
    pub fn validate(&self) -> Result<()> {
        if !self.mu.is_finite() {
            return Err(RiskError::invalid(format!("drift must be finite, got {}", self.mu)));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(RiskError::invalid(format!(
                "volatility must be finite and non-negative, got {}",
                self.sigma
            )));
        }

        if let Some(jump) = &self.jump {
            if !jump.lambda.is_finite() || jump.lambda < 0.0 {
                return Err(RiskError::invalid(format!(
                    "jump intensity must be finite and non-negative, got {}",
                    jump.lambda
                )));
            }
            if !jump.mu_j.is_finite() {
                return Err(RiskError::invalid(format!(
                    "jump log-mean must be finite, got {}",
                    jump.mu_j
                )));
            }
            if !jump.sigma_j.is_finite() || jump.sigma_j < 0.0 {
                return Err(RiskError::invalid(format!(
                    "jump volatility must be finite and non-negative, got {}",
                    jump.sigma_j
                )));
            }
        }

        Ok(())
    }
}
