//! Airborne phase of an acrobatic jump
//!
//! This crate provides:
//! - Take-off parameters and the initial state they produce
//! - The simulation driver running one flight to ground contact
//! - A rigid-body reference marker evaluator

pub mod contact;
pub mod driver;
pub mod initial;
pub mod markers;
pub mod takeoff;

pub use driver::*;
pub use initial::{InitialState, correct_cg_velocity, initial_state};
pub use markers::RigidMarkers;
pub use takeoff::*;
