//! Historical price table and log-return series
//!
//! The market-data provider hands over a table of closing prices indexed by
//! date, usually with a precomputed log-return column. This module turns that
//! table into the immutable [`ReturnSeries`] the estimator consumes and
//! computes realised rolling-horizon returns for comparison with simulated
//! tails.

use crate::error::{Result, RiskError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered log-returns `r_t = ln(P_t / P_{t-1})`
///
/// Always holds at least two finite observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Minimum number of observations for a sample standard deviation
    pub const MIN_OBSERVATIONS: usize = 2;

    /// Wrap a vector of log-returns
    ///
    /// # Example
    ///
    /// ```
    /// use mc_risk::ReturnSeries;
    ///
    /// let series = ReturnSeries::new(vec![0.01, -0.02, 0.005]).unwrap();
    /// assert_eq!(series.len(), 3);
    ///
    /// assert!(ReturnSeries::new(vec![0.01]).is_err());
    /// ```
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.len() < Self::MIN_OBSERVATIONS {
            return Err(RiskError::InsufficientData {
                needed: Self::MIN_OBSERVATIONS,
                got: values.len(),
            });
        }

        if let Some(idx) = values.iter().position(|r| !r.is_finite()) {
            return Err(RiskError::invalid(format!(
                "log return at index {} is not finite",
                idx
            )));
        }

        Ok(Self { values })
    }

    /// Derive log-returns from consecutive closing prices
    ///
    /// The first close has no predecessor and produces no return.
    pub fn from_closes(closes: &[f64]) -> Result<Self> {
        validate_prices(closes)?;

        let values = closes
            .windows(2)
            .map(|w| (w[1] / w[0]).ln())
            .collect();

        Self::new(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One row of the historical price table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Trading date
    pub date: NaiveDate,

    /// Closing price
    pub close: f64,

    /// Precomputed log-return against the previous row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_return: Option<f64>,
}

/// Historical price table produced by the market-data provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoricalTable {
    pub rows: Vec<PriceRow>,
}

impl HistoricalTable {
    pub fn new(rows: Vec<PriceRow>) -> Self {
        Self { rows }
    }

    /// Parse a table from a JSON array of rows
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a table from a YAML sequence of rows
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a table from disk, picking the format from the file extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            _ => Self::from_json(&contents),
        }
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    /// Most recent close, used as the simulation's starting price
    pub fn last_close(&self) -> Option<f64> {
        self.rows.last().map(|r| r.close)
    }

    /// Build the return series the estimator consumes
    ///
    /// Uses the precomputed log-return column when present. A missing value
    /// is tolerated only on the first row (it has no prior price); anywhere
    /// else it is rejected. A table without the column falls back to
    /// deriving returns from the closes.
    pub fn return_series(&self) -> Result<ReturnSeries> {
        if self.rows.iter().all(|r| r.log_return.is_none()) {
            return ReturnSeries::from_closes(&self.closes());
        }

        let mut values = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            match row.log_return {
                Some(r) => values.push(r),
                None if idx == 0 => {}
                None => {
                    return Err(RiskError::invalid(format!(
                        "missing log return on {}",
                        row.date
                    )))
                }
            }
        }

        ReturnSeries::new(values)
    }
}

/// Summary of realised returns over a rolling horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingReturnSummary {
    /// Horizon length in observations
    pub window: usize,

    /// Number of overlapping windows
    pub windows: usize,

    /// Worst simple return over any window
    pub worst: f64,

    /// Best simple return over any window
    pub best: f64,

    /// Mean simple return across windows
    pub average: f64,
}

/// Simple returns `(P_{t+w} - P_t) / P_t` for every window start `t`
pub fn rolling_returns(closes: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(RiskError::invalid("rolling window must be at least 1"));
    }
    if closes.len() <= window {
        return Err(RiskError::InsufficientData {
            needed: window + 1,
            got: closes.len(),
        });
    }
    validate_prices(closes)?;

    Ok(closes[window..]
        .iter()
        .zip(closes.iter())
        .map(|(end, start)| (end - start) / start)
        .collect())
}

/// Worst, best and average realised return over a rolling horizon
pub fn summarize_rolling_returns(closes: &[f64], window: usize) -> Result<RollingReturnSummary> {
    let returns = rolling_returns(closes, window)?;

    let worst = returns.iter().copied().fold(f64::INFINITY, f64::min);
    let best = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let average = returns.iter().sum::<f64>() / returns.len() as f64;

    Ok(RollingReturnSummary {
        window,
        windows: returns.len(),
        worst,
        best,
        average,
    })
}

fn validate_prices(prices: &[f64]) -> Result<()> {
    match prices.iter().position(|p| !p.is_finite() || *p <= 0.0) {
        Some(idx) => Err(RiskError::invalid(format!(
            "price at index {} must be positive and finite, got {}",
            idx, prices[idx]
        ))),
        None => Ok(()),
    }
}
