//! Tail-risk statistics from simulated terminal prices
//!
//! Returns are simple returns relative to the starting price:
//! `ret_i = (P_final_i - S0) / S0`.
//!
//! - VaR(cl): the `(1 - cl) * 100` percentile of the returns
//! - ES(cl): mean of every return at or below VaR(cl)
//!
//! Both are expressed as (usually negative) fractional returns, not as
//! positive loss amounts.

use crate::error::{Result, RiskError};
use crate::simulation::PathEnsemble;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Order-statistic convention for the VaR percentile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantileMethod {
    /// Linear interpolation between the two bracketing order statistics
    #[default]
    Linear,

    /// The upper bracketing order statistic, no interpolation
    Higher,
}

/// Risk aggregation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Confidence levels to report, each in (0, 1)
    pub confidence_levels: Vec<f64>,

    /// Percentile convention
    pub quantile_method: QuantileMethod,

    /// Horizon in trading days for realised rolling-return comparison
    pub rolling_window_days: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            confidence_levels: vec![0.95, 0.99],
            quantile_method: QuantileMethod::Linear,
            rolling_window_days: 30,
        }
    }
}

/// VaR and Expected Shortfall at one confidence level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMeasure {
    /// Confidence level (e.g., 0.95, 0.99)
    pub confidence_level: f64,

    /// Value-at-Risk as a fractional return
    pub var: f64,

    /// Expected Shortfall as a fractional return
    pub expected_shortfall: f64,
}

/// Tail statistics for every requested confidence level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Number of terminal observations behind the statistics
    pub observations: usize,

    /// Measures in the order the confidence levels were requested
    pub measures: Vec<RiskMeasure>,
}

impl RiskReport {
    /// Measure for an exact confidence level
    pub fn get(&self, confidence_level: f64) -> Option<&RiskMeasure> {
        self.measures
            .iter()
            .find(|m| m.confidence_level == confidence_level)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RiskMeasure> {
        self.measures.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }
}

/// Computes VaR / ES from a path ensemble
#[derive(Debug, Clone, Default)]
pub struct RiskAnalyzer {
    config: RiskConfig,
}

impl RiskAnalyzer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// VaR / ES at the configured confidence levels
    pub fn analyze(&self, ensemble: &PathEnsemble, s0: f64) -> Result<RiskReport> {
        self.calculate_var_es(ensemble, s0, &self.config.confidence_levels)
    }

    /// VaR / ES of the ensemble's terminal returns
    ///
    /// # Example
    ///
    /// ```
    /// use mc_risk::{PathEnsemble, RiskAnalyzer};
    ///
    /// let ensemble = PathEnsemble::from_paths(vec![
    ///     vec![100.0, 90.0],
    ///     vec![100.0, 105.0],
    ///     vec![100.0, 110.0],
    /// ]).unwrap();
    ///
    /// let report = RiskAnalyzer::default()
    ///     .calculate_var_es(&ensemble, 100.0, &[0.5])
    ///     .unwrap();
    ///
    /// let measure = report.get(0.5).unwrap();
    /// assert!((measure.var - 0.05).abs() < 1e-12);
    /// assert!((measure.expected_shortfall - (-0.025)).abs() < 1e-12);
    /// ```
    pub fn calculate_var_es(
        &self,
        ensemble: &PathEnsemble,
        s0: f64,
        confidence_levels: &[f64],
    ) -> Result<RiskReport> {
        validate_confidence_levels(confidence_levels)?;
        let returns = terminal_returns(ensemble, s0)?;
        self.analyze_returns(&returns, confidence_levels)
    }

    /// VaR / ES of an arbitrary return sample
    pub fn analyze_returns(&self, returns: &[f64], confidence_levels: &[f64]) -> Result<RiskReport> {
        validate_confidence_levels(confidence_levels)?;

        if returns.is_empty() {
            return Err(RiskError::InsufficientData { needed: 1, got: 0 });
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(RiskError::invalid("return sample contains non-finite values"));
        }

        let mut sorted = returns.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let measures = confidence_levels
            .iter()
            .map(|&cl| {
                let var = percentile(&sorted, (1.0 - cl) * 100.0, self.config.quantile_method)?;
                let expected_shortfall = tail_mean(&sorted, var).unwrap_or(var);

                debug!(confidence_level = cl, var, expected_shortfall, "Tail statistics");

                Ok(RiskMeasure {
                    confidence_level: cl,
                    var,
                    expected_shortfall,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RiskReport {
            observations: sorted.len(),
            measures,
        })
    }
}

/// Terminal simple returns `(P_final - S0) / S0`, one per path
pub fn terminal_returns(ensemble: &PathEnsemble, s0: f64) -> Result<Vec<f64>> {
    if !s0.is_finite() || s0 <= 0.0 {
        return Err(RiskError::invalid(format!(
            "initial price must be positive, got {}",
            s0
        )));
    }

    Ok(ensemble
        .final_row()
        .into_iter()
        .map(|p| (p - s0) / s0)
        .collect())
}

/// Percentile of an ascending sample, `pct` in [0, 100]
///
/// The fractional rank is `pct / 100 * (n - 1)`.
pub fn percentile(sorted: &[f64], pct: f64, method: QuantileMethod) -> Result<f64> {
    if sorted.is_empty() {
        return Err(RiskError::InsufficientData { needed: 1, got: 0 });
    }
    if !pct.is_finite() {
        return Err(RiskError::invalid(format!("percentile must be finite, got {}", pct)));
    }

    let last = sorted.len() - 1;
    let mut rank = (pct / 100.0).clamp(0.0, 1.0) * last as f64;

    // (1 - cl) * 100 is rarely exact; snap ranks within rounding noise of an integer
    if (rank - rank.round()).abs() < 1e-9 {
        rank = rank.round();
    }

    let lo = rank.floor() as usize;
    let hi = (rank.ceil() as usize).min(last);

    let value = match method {
        QuantileMethod::Linear => {
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
        QuantileMethod::Higher => sorted[hi],
    };
    Ok(value)
}

/// Mean of the ascending sample at or below `threshold`
fn tail_mean(sorted: &[f64], threshold: f64) -> Option<f64> {
    let count = sorted.partition_point(|r| *r <= threshold);
    if count == 0 {
        return None;
    }
    let mean = sorted[..count].iter().sum::<f64>() / count as f64;
    // Summation rounding on ties can nudge the mean just above the threshold
    Some(mean.min(threshold))
}

fn validate_confidence_levels(levels: &[f64]) -> Result<()> {
    match levels.iter().find(|cl| !(**cl > 0.0 && **cl < 1.0)) {
        Some(&cl) => Err(RiskError::InvalidConfidenceLevel(cl)),
        None => Ok(()),
    }
}
