//! Equations of motion of the airborne body
//!
//! This crate provides:
//! - The reduced state derivative with PD tracking of driven DOFs
//! - A constant-inertia reference dynamics model

pub mod inertia;
pub mod short_dynamics;

pub use inertia::*;
pub use short_dynamics::*;
