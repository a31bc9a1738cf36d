//! Simulated price path grid

use crate::error::{Result, RiskError};

/// `(steps + 1) × paths` grid of simulated prices
///
/// Stored path-major so a batch of paths is one contiguous slice. Row 0 holds
/// the starting price for every path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEnsemble {
    steps: usize,
    paths: usize,
    data: Vec<f64>,
}

impl PathEnsemble {
    pub(crate) fn from_raw(steps: usize, paths: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), (steps + 1) * paths);
        Self { steps, paths, data }
    }

    /// Build an ensemble from explicit trajectories
    ///
    /// Every path must have the same length (at least 2) and share the same
    /// positive starting price.
    pub fn from_paths(paths: Vec<Vec<f64>>) -> Result<Self> {
        let first = paths
            .first()
            .ok_or_else(|| RiskError::invalid("ensemble needs at least one path"))?;
        let rows = first.len();
        if rows < 2 {
            return Err(RiskError::invalid("each path needs at least one step"));
        }
        let s0 = first[0];

        let mut data = Vec::with_capacity(rows * paths.len());
        for (idx, path) in paths.iter().enumerate() {
            if path.len() != rows {
                return Err(RiskError::invalid(format!(
                    "path {} has {} rows, expected {}",
                    idx,
                    path.len(),
                    rows
                )));
            }
            if path[0] != s0 {
                return Err(RiskError::invalid(format!(
                    "path {} starts at {}, expected {}",
                    idx, path[0], s0
                )));
            }
            if path.iter().any(|p| !p.is_finite() || *p <= 0.0) {
                return Err(RiskError::invalid(format!(
                    "path {} contains a non-positive price",
                    idx
                )));
            }
            data.extend_from_slice(path);
        }

        Ok(Self::from_raw(rows - 1, paths.len(), data))
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn paths(&self) -> usize {
        self.paths
    }

    fn rows(&self) -> usize {
        self.steps + 1
    }

    /// Starting price shared by every path
    pub fn initial_price(&self) -> f64 {
        self.data[0]
    }

    /// Price at `step` on `path`
    pub fn price(&self, step: usize, path: usize) -> Option<f64> {
        if step > self.steps || path >= self.paths {
            return None;
        }
        Some(self.data[path * self.rows() + step])
    }

    /// One full trajectory
    pub fn path(&self, path: usize) -> Option<&[f64]> {
        if path >= self.paths {
            return None;
        }
        let rows = self.rows();
        Some(&self.data[path * rows..(path + 1) * rows])
    }

    /// Iterate over trajectories
    pub fn iter_paths(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.rows())
    }

    /// Prices of every path at `step`
    pub fn row(&self, step: usize) -> Option<Vec<f64>> {
        if step > self.steps {
            return None;
        }
        Some(self.iter_paths().map(|p| p[step]).collect())
    }

    /// Terminal prices, one per path
    pub fn final_row(&self) -> Vec<f64> {
        self.iter_paths().map(|p| p[self.steps]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PathEnsemble {
        PathEnsemble::from_paths(vec![
            vec![100.0, 101.0, 102.0],
            vec![100.0, 99.0, 98.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_shape() {
        let ensemble = sample();
        assert_eq!(ensemble.steps(), 2);
        assert_eq!(ensemble.paths(), 2);
        assert_eq!(ensemble.initial_price(), 100.0);
    }

    #[test]
    fn test_accessors() {
        let ensemble = sample();
        assert_eq!(ensemble.price(1, 1), Some(99.0));
        assert_eq!(ensemble.price(3, 0), None);
        assert_eq!(ensemble.path(0), Some(&[100.0, 101.0, 102.0][..]));
        assert_eq!(ensemble.row(0), Some(vec![100.0, 100.0]));
        assert_eq!(ensemble.final_row(), vec![102.0, 98.0]);
        assert_eq!(ensemble.iter_paths().count(), 2);
    }

    #[test]
    fn test_from_paths_validation() {
        assert!(PathEnsemble::from_paths(Vec::new()).is_err());
        assert!(PathEnsemble::from_paths(vec![vec![100.0]]).is_err());
        assert!(PathEnsemble::from_paths(vec![vec![100.0, 1.0], vec![100.0]]).is_err());
        assert!(PathEnsemble::from_paths(vec![vec![100.0, 1.0], vec![90.0, 1.0]]).is_err());
        assert!(PathEnsemble::from_paths(vec![vec![100.0, 0.0]]).is_err());
    }
}
