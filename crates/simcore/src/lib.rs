//! Core types shared by the airborne simulation crates
//!
//! This crate provides:
//! - The DOF topology of the articulated body ([`LagrangianModel`])
//! - The error taxonomy ([`ConfigError`], [`NumericalFailure`], [`SimError`])
//! - Contracts of the external collaborators (dynamics model, DOF convention,
//!   marker evaluator)
//! - The adaptive integrator and the sampled output table

pub mod convention;
pub mod error;
pub mod integrators;
pub mod linear;
pub mod model;
pub mod output;
pub mod traits;

pub use convention::{DofConvention, DofPermutation};
pub use error::{ConfigError, NumericalFailure, SimError, SimResult};
pub use integrators::{DormandPrince, DormandPrinceConfig, Integrator, OdeSystem, SampledSolution};
pub use linear::solve_dense;
pub use model::{AxisDof, LagrangianModel, RootAxes};
pub use output::{OutputTable, SimulationOutput};
pub use traits::{DynamicsModel, MarkerEvaluator, MarkerPositions, SimContext, SimulationMode};
