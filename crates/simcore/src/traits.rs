use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::NumericalFailure;
use crate::linear::solve_dense;

// Run context

/// Offline runs integrate the full flight from reference trajectories;
/// real-time runs would take references from live sensors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimulationMode {
    #[default]
    Offline,
    RealTime,
}

/// Slack, in sample steps, before a grid time counts as past the horizon.
const HORIZON_SLACK: f64 = 1e-9;

/// Per-run values threaded through the integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimContext {
    /// Output sample step (s).
    pub dt: f64,
    /// Flight duration (s); the horizon is `duration + dt`.
    pub duration: f64,
}

impl SimContext {
    pub fn new(dt: f64, duration: f64) -> Self {
        SimContext { dt, duration }
    }

    /// End of the integration horizon.
    pub fn t_end(&self) -> f64 {
        self.duration + self.dt
    }

    /// Number of samples `k * dt` in `[0, t_end]`.
    pub fn sample_count(&self) -> usize {
        (self.t_end() / self.dt + HORIZON_SLACK).floor() as usize + 1
    }
}

// External collaborators

/// Articulated-body dynamics, treated as a pure function of the posture,
/// velocity and desired acceleration. Vectors use the model's DOF convention.
pub trait DynamicsModel {
    /// Number of generalized coordinates the model works on.
    fn dof_count(&self) -> usize;

    /// Generalized inertia matrix `M(q)`, `n x n`.
    fn mass_matrix(&self, q: &DVector<f64>) -> Result<DMatrix<f64>, NumericalFailure>;

    /// Generalized forces producing `qddot` at `(q, qdot)`.
    fn inverse_dynamics(
        &self,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
        qddot: &DVector<f64>,
    ) -> Result<DVector<f64>, NumericalFailure>;

    /// Solves `a * x = b` for a small dense system.
    fn solve_linear(
        &self,
        a: &DMatrix<f64>,
        b: &DVector<f64>,
    ) -> Result<DVector<f64>, NumericalFailure> {
        solve_dense(a, b)
    }
}

/// Positions of the anatomical markers, one entry per marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerPositions {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl MarkerPositions {
    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    pub fn position(&self, index: usize) -> [f64; 3] {
        [self.x[index], self.y[index], self.z[index]]
    }

    /// The last marker approximates the centre of gravity.
    pub fn cg(&self) -> Option<[f64; 3]> {
        self.len().checked_sub(1).map(|last| self.position(last))
    }

    /// Lowest height over all markers; `+inf` when there are none.
    pub fn min_height(&self) -> f64 {
        self.z.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Lowest height over the given markers.
    pub fn min_height_of(&self, markers: &[usize]) -> f64 {
        markers
            .iter()
            .map(|&m| self.z[m])
            .fold(f64::INFINITY, f64::min)
    }
}

/// Kinematic-tag evaluator: marker positions for a generalized position in
/// the integration convention.
pub trait MarkerEvaluator {
    fn evaluate(&self, q: &[f64]) -> MarkerPositions;
}

impl<F> MarkerEvaluator for F
where
    F: Fn(&[f64]) -> MarkerPositions,
{
    fn evaluate(&self, q: &[f64]) -> MarkerPositions {
        self(q)
    }
}
