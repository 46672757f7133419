//! Sampled simulation results.

use nalgebra::{DMatrix, DVectorView};

/// Generalized positions indexed `[dof, sample]`, sampled every `dt`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub positions: DMatrix<f64>,
    pub dt: f64,
}

impl OutputTable {
    /// Builds a table from per-sample position vectors.
    pub fn from_samples(dof_count: usize, samples: &[Vec<f64>], dt: f64) -> Self {
        let positions = DMatrix::from_fn(dof_count, samples.len(), |dof, k| samples[k][dof]);
        OutputTable { positions, dt }
    }

    pub fn dof_count(&self) -> usize {
        self.positions.nrows()
    }

    /// Number of time samples.
    pub fn len(&self) -> usize {
        self.positions.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.ncols() == 0
    }

    /// Positions at sample `k`.
    pub fn sample(&self, k: usize) -> DVectorView<'_, f64> {
        self.positions.column(k)
    }

    /// Time of sample `k`.
    pub fn time(&self, k: usize) -> f64 {
        k as f64 * self.dt
    }

    /// Keeps the first `len` samples.
    pub fn truncated(self, len: usize) -> Self {
        let len = len.min(self.len());
        OutputTable {
            positions: self.positions.columns(0, len).into_owned(),
            dt: self.dt,
        }
    }
}

/// Result of one simulation call.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    /// Positions up to and including the contact sample.
    pub table: OutputTable,
    /// Samples kept in `table`.
    pub used_samples: usize,
    /// Samples produced by the integrator before truncation.
    pub total_samples: usize,
    /// Sample at which ground contact was detected, if any.
    pub contact_index: Option<usize>,
}
