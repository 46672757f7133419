//! Error types for simulation runs.
//!
//! Configuration problems are detected before integration starts; numerical
//! failures abort the run in progress. Neither kind is retried.

use thiserror::Error;

use crate::traits::SimulationMode;

/// Malformed model topology or simulation inputs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The model declares no degrees of freedom.
    #[error("model has no degrees of freedom")]
    EmptyModel,

    /// A DOF index is outside `0..dof_count`.
    #[error("DOF index {index} out of range for a model with {dof_count} DOFs")]
    DofOutOfRange { index: usize, dof_count: usize },

    /// A DOF appears in both `q1` and `q2`, or twice in one of them.
    #[error("DOF {0} is listed more than once in the q1/q2 partition")]
    DuplicateDof(usize),

    /// A DOF is neither solved nor driven.
    #[error("DOF {0} is missing from the q1/q2 partition")]
    UnassignedDof(usize),

    /// The root set is empty.
    #[error("q1 must contain at least one root DOF")]
    NoRootDof,

    /// A root axis refers to a DOF that is not solved from the dynamics.
    #[error("root axis {axis} refers to DOF {index}, which is not in q1")]
    AxisNotRoot { axis: &'static str, index: usize },

    /// Timestep must be positive and finite.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Duration must be non-negative and finite.
    #[error("invalid duration: {0} (must be non-negative and finite)")]
    InvalidDuration(f64),

    /// Spline interval count outside the supported formulations.
    #[error("unsupported cubic spline interval count {0} (expected 3..=8)")]
    UnsupportedIntervalCount(usize),

    /// Spline knots or slopes have the wrong length.
    #[error("DOF {dof}: cubic spline expects {expected} {what}, got {actual}")]
    SplineShape {
        dof: usize,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Quintic breakpoints are too few, mismatched or not increasing.
    #[error("DOF {dof}: invalid breakpoints: {reason}")]
    InvalidBreakpoints { dof: usize, reason: String },

    /// Quintic breakpoints do not span the simulated time range.
    #[error("DOF {dof}: breakpoints [{first}, {last}] do not cover [0, {duration}]")]
    MissingBreakpoints {
        dof: usize,
        first: f64,
        last: f64,
        duration: f64,
    },

    /// A driven DOF has no joint node.
    #[error("driven DOF {0} has no joint node")]
    MissingJointNode(usize),

    /// A joint node targets a DOF that is not driven.
    #[error("joint node targets DOF {0}, which is not in q2")]
    UnexpectedJointNode(usize),

    /// Two joint nodes target the same DOF.
    #[error("DOF {0} has more than one joint node")]
    DuplicateJointNode(usize),

    /// The DOF reordering is not a permutation of `0..n`.
    #[error("DOF ordering is not a permutation: {reason}")]
    InvalidPermutation { reason: String },

    /// The DOF convention does not place the root DOFs first.
    #[error("DOF convention must map the {root_count} root DOFs to the leading block")]
    RootBlockMismatch { root_count: usize },

    /// The condition selector has no apparatus height.
    #[error("condition {condition} has no apparatus height ({available} configured)")]
    UnknownCondition { condition: usize, available: usize },

    /// A marker index exceeds what the marker evaluator produces.
    #[error("marker index {index} out of range ({available} markers)")]
    MarkerOutOfRange { index: usize, available: usize },

    /// The marker evaluator returned an empty marker set.
    #[error("marker evaluator returned no markers")]
    NoMarkers,

    /// Take-off motion on a model whose root axis roles share DOFs.
    #[error("take-off {quantity} must be zero when root axis roles share DOFs")]
    SharedRootMotion { quantity: &'static str },

    /// The dynamics model parameters are unusable.
    #[error("invalid dynamics model: {reason}")]
    InvalidDynamicsModel { reason: String },

    /// The driver only integrates offline flights.
    #[error("simulation mode {0:?} is not supported by the flight driver")]
    UnsupportedMode(SimulationMode),

    /// A collaborator works on a different DOF count than the model.
    #[error("{component} expects {expected} DOFs, model has {actual}")]
    DofCountMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Numerical breakdown inside a run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumericalFailure {
    /// Linear system with a singular matrix.
    #[error("singular {size}x{size} linear system")]
    Singular { size: usize },

    /// Linear system too badly conditioned to trust the solution.
    #[error("ill-conditioned {size}x{size} linear system (rcond {rcond:e})")]
    IllConditioned { size: usize, rcond: f64 },

    /// NaN or infinity produced at time `t`.
    #[error("non-finite {quantity} at t = {t}")]
    NonFinite { quantity: &'static str, t: f64 },

    /// Dynamics model returned data of the wrong size.
    #[error("{quantity}: expected length {expected}, got {actual}")]
    DimensionMismatch {
        quantity: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Adaptive integration gave up.
    #[error("integration failed: {reason}")]
    Integration { reason: String },
}

/// Any failure of a simulation call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("numerical failure: {0}")]
    Numerical(#[from] NumericalFailure),
}

pub type SimResult<T> = Result<T, SimError>;
