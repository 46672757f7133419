//! Reference joint trajectories for driven DOFs
//!
//! This crate provides:
//! - Minimum-jerk quintic segments between breakpoints
//! - Clamped cubic splines with 3 to 8 uniform intervals
//! - A validated per-DOF trajectory set evaluated at integration time

pub mod joint;
pub mod quintic;
pub mod spline;

pub use joint::{Interpolation, JointNode, Reference, TrajectorySet};
