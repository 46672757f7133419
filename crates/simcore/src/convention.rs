//! Reindexing between the integration DOF order and the dynamics model's.

use crate::error::ConfigError;
use crate::model::LagrangianModel;

/// Fixed bijective relabeling of DOFs. `to_integration(to_model(x)) == x`.
pub trait DofConvention {
    fn dof_count(&self) -> usize;

    /// Integration order to model order.
    fn to_model(&self, x: &[f64]) -> Vec<f64>;

    /// Model order to integration order.
    fn to_integration(&self, x: &[f64]) -> Vec<f64>;

    /// Model-order position of an integration-order DOF.
    fn model_index(&self, integration_index: usize) -> usize;

    /// Applies [`DofConvention::to_model`] to both halves of `[q; qdot]`.
    fn state_to_model(&self, x: &[f64]) -> Vec<f64> {
        let n = self.dof_count();
        let mut out = self.to_model(&x[..n]);
        out.extend(self.to_model(&x[n..2 * n]));
        out
    }

    /// Applies [`DofConvention::to_integration`] to both halves of `[q; qdot]`.
    fn state_to_integration(&self, x: &[f64]) -> Vec<f64> {
        let n = self.dof_count();
        let mut out = self.to_integration(&x[..n]);
        out.extend(self.to_integration(&x[n..2 * n]));
        out
    }
}

/// A permutation: model slot `i` holds integration DOF `order[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofPermutation {
    order: Vec<usize>,
    inverse: Vec<usize>,
}

impl DofPermutation {
    pub fn new(order: Vec<usize>) -> Result<Self, ConfigError> {
        let n = order.len();
        let mut inverse = vec![usize::MAX; n];
        for (slot, &dof) in order.iter().enumerate() {
            if dof >= n {
                return Err(ConfigError::InvalidPermutation {
                    reason: format!("index {dof} out of range for {n} DOFs"),
                });
            }
            if inverse[dof] != usize::MAX {
                return Err(ConfigError::InvalidPermutation {
                    reason: format!("index {dof} appears twice"),
                });
            }
            inverse[dof] = slot;
        }
        Ok(DofPermutation { order, inverse })
    }

    pub fn identity(n: usize) -> Self {
        DofPermutation {
            order: (0..n).collect(),
            inverse: (0..n).collect(),
        }
    }

    /// Root DOFs (`q1`) first, then driven DOFs (`q2`), each in listed order.
    pub fn root_first(model: &LagrangianModel) -> Result<Self, ConfigError> {
        model.validate()?;
        let order = model.q1.iter().chain(model.q2.iter()).copied().collect();
        DofPermutation::new(order)
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

impl DofConvention for DofPermutation {
    fn dof_count(&self) -> usize {
        self.order.len()
    }

    fn to_model(&self, x: &[f64]) -> Vec<f64> {
        self.order.iter().map(|&dof| x[dof]).collect()
    }

    fn to_integration(&self, x: &[f64]) -> Vec<f64> {
        self.inverse.iter().map(|&slot| x[slot]).collect()
    }

    fn model_index(&self, integration_index: usize) -> usize {
        self.inverse[integration_index]
    }
}
