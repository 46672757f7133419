//! Reference dynamics model with a posture-independent mass matrix.
//!
//! `tau = M * qddot + bias`, where the bias collects constant generalized
//! forces such as gravity. Velocity-dependent terms are absent, which keeps
//! the model exact for free flight of a rigid root with fixed coupling to the
//! driven DOFs.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use simcore::{ConfigError, DynamicsModel, NumericalFailure};

/// Standard gravity (m/s^2).
pub const GRAVITY: f64 = 9.81;

/// Configuration-independent inertia plus constant bias forces, in the
/// model's DOF convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantInertia {
    pub dof_count: usize,
    /// Mass matrix, row-major, `dof_count * dof_count` entries.
    pub mass_matrix: Vec<f64>,
    /// Generalized bias force per DOF.
    pub bias: Vec<f64>,
}

impl ConstantInertia {
    /// Diagonal inertia, no bias.
    pub fn diagonal(inertia: &[f64]) -> Self {
        let n = inertia.len();
        let mut mass_matrix = vec![0.0; n * n];
        for (i, &m) in inertia.iter().enumerate() {
            mass_matrix[i * n + i] = m;
        }
        ConstantInertia {
            dof_count: n,
            mass_matrix,
            bias: vec![0.0; n],
        }
    }

    /// Symmetric coupling between DOFs `i` and `j`.
    pub fn with_coupling(mut self, i: usize, j: usize, value: f64) -> Self {
        let n = self.dof_count;
        self.mass_matrix[i * n + j] = value;
        self.mass_matrix[j * n + i] = value;
        self
    }

    /// Weight `mass * g` acting against the positive direction of `dof`.
    pub fn with_gravity(mut self, dof: usize, mass: f64, g: f64) -> Self {
        self.bias[dof] += mass * g;
        self
    }

    pub fn with_bias(mut self, bias: Vec<f64>) -> Self {
        self.bias = bias;
        self
    }

    /// Checks sizes, finiteness and symmetry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.dof_count;
        if self.mass_matrix.iter().chain(self.bias.iter()).any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidDynamicsModel {
                reason: "non-finite parameter".to_string(),
            });
        }
        if self.mass_matrix.len() != n * n {
            return Err(ConfigError::DofCountMismatch {
                component: "mass matrix entries",
                expected: n * n,
                actual: self.mass_matrix.len(),
            });
        }
        if self.bias.len() != n {
            return Err(ConfigError::DofCountMismatch {
                component: "bias vector",
                expected: n,
                actual: self.bias.len(),
            });
        }
        let m = self.matrix();
        if (&m - m.transpose()).amax() > 1e-12 * m.amax().max(1.0) {
            return Err(ConfigError::InvalidDynamicsModel {
                reason: "mass matrix is not symmetric".to_string(),
            });
        }
        Ok(())
    }

    fn matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.dof_count, self.dof_count, &self.mass_matrix)
    }
}

impl DynamicsModel for ConstantInertia {
    fn dof_count(&self) -> usize {
        self.dof_count
    }

    fn mass_matrix(&self, q: &DVector<f64>) -> Result<DMatrix<f64>, NumericalFailure> {
        check_len("posture", q.len(), self.dof_count)?;
        Ok(self.matrix())
    }

    fn inverse_dynamics(
        &self,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
        qddot: &DVector<f64>,
    ) -> Result<DVector<f64>, NumericalFailure> {
        check_len("posture", q.len(), self.dof_count)?;
        check_len("velocity", qdot.len(), self.dof_count)?;
        check_len("acceleration", qddot.len(), self.dof_count)?;
        Ok(self.matrix() * qddot + DVector::from_column_slice(&self.bias))
    }
}

fn check_len(quantity: &'static str, actual: usize, expected: usize) -> Result<(), NumericalFailure> {
    if actual != expected {
        return Err(NumericalFailure::DimensionMismatch {
            quantity,
            expected,
            actual,
        });
    }
    Ok(())
}
