//! State derivative of the airborne body ("short dynamics").
//!
//! Driven DOFs are steered onto their reference trajectories, root DOFs are
//! solved from the leading block of the equations of motion:
//!
//! ```text
//! M_rr * qddot_r = -(M_rd * qddot_d + N_r)
//! ```
//!
//! The right-hand side is what inverse dynamics returns for the root rows
//! when the root acceleration is set to zero.

use log::debug;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use simcore::{
    ConfigError, DofConvention, DynamicsModel, LagrangianModel, NumericalFailure, OdeSystem, SimResult,
};
use trajectory::TrajectorySet;

/// Gains of the PD correction pulling driven DOFs onto their reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingGains {
    /// Position gain (1/s^2)
    pub kp: f64,
    /// Velocity gain (1/s)
    pub kd: f64,
}

impl Default for TrackingGains {
    fn default() -> Self {
        TrackingGains { kp: 10.0, kd: 3.0 }
    }
}

impl TrackingGains {
    pub fn new(kp: f64, kd: f64) -> Self {
        TrackingGains { kp, kd }
    }

    /// Reference acceleration plus the PD correction.
    pub fn corrected(&self, qd: f64, qdotd: f64, qddotd: f64, q: f64, qdot: f64) -> f64 {
        qddotd + self.kp * (qd - q) + self.kd * (qdotd - qdot)
    }
}

/// How driven DOFs follow their reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Integrated with the reference acceleration plus a PD correction.
    #[default]
    Servo,
    /// Position and velocity replaced by the reference before the dynamics
    /// call; only the root is integrated from dynamics.
    Prescribed,
}

/// Right-hand side `d/dt [q; qdot] = [qdot; qddot]` for the integrator.
///
/// State vectors use the integration DOF order; the dynamics model sees the
/// model order given by `convention`, with the root DOFs in the leading block.
pub struct ShortDynamics<'a, D, C> {
    trajectories: &'a TrajectorySet,
    dynamics: &'a D,
    convention: &'a C,
    gains: TrackingGains,
    mode: TrackingMode,
    dof_count: usize,
    root_count: usize,
}

impl<'a, D: DynamicsModel, C: DofConvention> ShortDynamics<'a, D, C> {
    /// Checks that all collaborators agree on the DOF count and that the
    /// convention puts the root DOFs first.
    pub fn new(
        model: &LagrangianModel,
        trajectories: &'a TrajectorySet,
        dynamics: &'a D,
        convention: &'a C,
    ) -> Result<Self, ConfigError> {
        model.validate()?;
        let n = model.dof_count;
        for (component, count) in [
            ("dynamics model", dynamics.dof_count()),
            ("DOF convention", convention.dof_count()),
            ("trajectory set", trajectories.dof_count()),
        ] {
            if count != n {
                return Err(ConfigError::DofCountMismatch {
                    component,
                    expected: count,
                    actual: n,
                });
            }
        }

        let root_count = model.root_count();
        if model.q1.iter().any(|&dof| convention.model_index(dof) >= root_count) {
            return Err(ConfigError::RootBlockMismatch { root_count });
        }

        debug!("short dynamics: {n} DOFs, {root_count} solved from dynamics");
        Ok(ShortDynamics {
            trajectories,
            dynamics,
            convention,
            gains: TrackingGains::default(),
            mode: TrackingMode::default(),
            dof_count: n,
            root_count,
        })
    }

    pub fn with_gains(mut self, gains: TrackingGains) -> Self {
        self.gains = gains;
        self
    }

    pub fn with_mode(mut self, mode: TrackingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn gains(&self) -> TrackingGains {
        self.gains
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Evaluates `[qdot; qddot]` at `t` for the augmented state `x`, both in
    /// integration order.
    pub fn state_derivative(&self, t: f64, x: &[f64]) -> SimResult<Vec<f64>> {
        let n = self.dof_count;
        let r = self.root_count;
        if x.len() != 2 * n {
            return Err(NumericalFailure::DimensionMismatch {
                quantity: "state",
                expected: 2 * n,
                actual: x.len(),
            }
            .into());
        }

        let x_model = self.convention.state_to_model(x);
        let mut q = DVector::from_column_slice(&x_model[..n]);
        let mut qdot = DVector::from_column_slice(&x_model[n..]);

        let reference = self.trajectories.evaluate(t, self.trajectories.driven());
        let qd = self.convention.to_model(&reference.position);
        let qdotd = self.convention.to_model(&reference.velocity);
        let qddotd = self.convention.to_model(&reference.acceleration);

        let mut qddot = DVector::zeros(n);
        match self.mode {
            TrackingMode::Servo => {
                for i in r..n {
                    qddot[i] = self.gains.corrected(qd[i], qdotd[i], qddotd[i], q[i], qdot[i]);
                }
            }
            TrackingMode::Prescribed => {
                for i in r..n {
                    q[i] = qd[i];
                    qdot[i] = qdotd[i];
                    qddot[i] = qddotd[i];
                }
            }
        }

        let mass = self.dynamics.mass_matrix(&q)?;
        if mass.nrows() != n || mass.ncols() != n {
            return Err(NumericalFailure::DimensionMismatch {
                quantity: "mass matrix",
                expected: n * n,
                actual: mass.nrows() * mass.ncols(),
            }
            .into());
        }
        let tau = self.dynamics.inverse_dynamics(&q, &qdot, &qddot)?;
        if tau.len() != n {
            return Err(NumericalFailure::DimensionMismatch {
                quantity: "generalized forces",
                expected: n,
                actual: tau.len(),
            }
            .into());
        }

        let m_root = mass.view((0, 0), (r, r)).into_owned();
        let tau_root = tau.rows(0, r).into_owned();
        let solution = self.dynamics.solve_linear(&m_root, &tau_root)?;
        if solution.len() != r {
            return Err(NumericalFailure::DimensionMismatch {
                quantity: "root solution",
                expected: r,
                actual: solution.len(),
            }
            .into());
        }
        for i in 0..r {
            qddot[i] = -solution[i];
        }

        if qddot.iter().any(|v| !v.is_finite()) {
            return Err(NumericalFailure::NonFinite { quantity: "acceleration", t }.into());
        }

        let mut derivative_model = Vec::with_capacity(2 * n);
        derivative_model.extend(qdot.iter());
        derivative_model.extend(qddot.iter());
        Ok(self.convention.state_to_integration(&derivative_model))
    }
}

impl<D: DynamicsModel, C: DofConvention> OdeSystem for ShortDynamics<'_, D, C> {
    fn dimension(&self) -> usize {
        2 * self.dof_count
    }

    fn derivative(&self, t: f64, x: &[f64], dx: &mut [f64]) -> SimResult<()> {
        let derivative = self.state_derivative(t, x)?;
        dx.copy_from_slice(&derivative);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inertia::ConstantInertia;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;
    use simcore::{DofPermutation, RootAxes, SimError};
    use trajectory::JointNode;

    /// DOF 0 is the root, DOF 1 is driven from 0 to 1 over one second.
    fn two_dof() -> (LagrangianModel, TrajectorySet) {
        let mut model = LagrangianModel::with_standard_root(0);
        model.dof_count = 2;
        model.root = RootAxes::collapsed(0);
        model.q1 = vec![0];
        model.q2 = vec![1];
        let nodes = vec![JointNode::quintic(1, vec![0.0, 1.0], vec![0.0, 1.0])];
        let set = TrajectorySet::new(&model, &nodes, 1.0).unwrap();
        (model, set)
    }

    #[test]
    fn test_default_gains() {
        let gains = TrackingGains::default();
        assert_eq!((gains.kp, gains.kd), (10.0, 3.0));
        // 10 * 0.5 + 3 * (-1)
        assert!((gains.corrected(1.0, 0.0, 0.0, 0.5, 1.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_root_reacts_to_driven_acceleration() {
        let (model, set) = two_dof();
        let dynamics = ConstantInertia::diagonal(&[2.0, 1.0]).with_coupling(0, 1, 0.5);
        let convention = DofPermutation::root_first(&model).unwrap();
        let rhs = ShortDynamics::new(&model, &set, &dynamics, &convention).unwrap();

        // On the reference at t = 0.25
        let reference = set.evaluate(0.25, &[1]);
        let x = [0.0, reference.position[1], 0.0, reference.velocity[1]];
        let dx = rhs.state_derivative(0.25, &x).unwrap();

        let qddot_d = reference.acceleration[1];
        assert!((dx[1] - reference.velocity[1]).abs() < 1e-12);
        assert!((dx[3] - qddot_d).abs() < 1e-12);
        // 2 * qddot_r + 0.5 * qddot_d = 0
        assert!((dx[2] + 0.25 * qddot_d).abs() < 1e-12);
    }

    #[test]
    fn test_pd_correction_off_reference() {
        let (model, set) = two_dof();
        let dynamics = ConstantInertia::diagonal(&[1.0, 1.0]);
        let convention = DofPermutation::root_first(&model).unwrap();
        let rhs = ShortDynamics::new(&model, &set, &dynamics, &convention).unwrap();

        // At t = 0 the reference is at rest at 0; the state is 0.1 ahead.
        let dx = rhs.state_derivative(0.0, &[0.0, 0.1, 0.0, 0.0]).unwrap();
        assert!((dx[3] - (-1.0)).abs() < 1e-12);
        assert_eq!(dx[2], 0.0);
    }

    #[test]
    fn test_prescribed_mode_overrides_driven_state() {
        let (model, set) = two_dof();
        let dynamics = ConstantInertia::diagonal(&[1.0, 1.0]);
        let convention = DofPermutation::root_first(&model).unwrap();
        let rhs = ShortDynamics::new(&model, &set, &dynamics, &convention)
            .unwrap()
            .with_mode(TrackingMode::Prescribed);

        let reference = set.evaluate(0.5, &[1]);
        let dx = rhs.state_derivative(0.5, &[0.0, 0.3, 0.0, 0.0]).unwrap();
        assert!((dx[1] - reference.velocity[1]).abs() < 1e-12);
        assert!((dx[3] - reference.acceleration[1]).abs() < 1e-12);
    }

    #[test]
    fn test_gravity_on_root() {
        let (model, set) = two_dof();
        let dynamics = ConstantInertia::diagonal(&[70.0, 1.0]).with_gravity(0, 70.0, 9.81);
        let convention = DofPermutation::root_first(&model).unwrap();
        let rhs = ShortDynamics::new(&model, &set, &dynamics, &convention).unwrap();

        let dx = rhs.state_derivative(0.0, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(dx[2], -9.81, epsilon = 1e-12);
    }

    #[test]
    fn test_permuted_convention() {
        // Root on integration DOF 1, driven DOF 0.
        let mut model = LagrangianModel::with_standard_root(0);
        model.dof_count = 2;
        model.root = RootAxes::collapsed(1);
        model.q1 = vec![1];
        model.q2 = vec![0];
        let nodes = vec![JointNode::quintic(0, vec![0.0, 1.0], vec![0.0, 1.0])];
        let set = TrajectorySet::new(&model, &nodes, 1.0).unwrap();
        let dynamics = ConstantInertia::diagonal(&[1.0, 1.0]).with_gravity(0, 1.0, 9.81);
        let convention = DofPermutation::root_first(&model).unwrap();
        let rhs = ShortDynamics::new(&model, &set, &dynamics, &convention).unwrap();

        let dx = rhs.state_derivative(0.0, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert!((dx[3] + 9.81).abs() < 1e-12);
        assert_eq!(dx[2], 0.0);
    }

    #[test]
    fn test_root_block_must_lead() {
        let (model, set) = two_dof();
        let dynamics = ConstantInertia::diagonal(&[1.0, 1.0]);
        let convention = DofPermutation::new(vec![1, 0]).unwrap();
        let err = ShortDynamics::new(&model, &set, &dynamics, &convention).err();
        assert_eq!(err, Some(ConfigError::RootBlockMismatch { root_count: 1 }));
    }

    #[test]
    fn test_singular_root_block_is_numerical_failure() {
        let (model, set) = two_dof();
        let dynamics = ConstantInertia::diagonal(&[0.0, 1.0]);
        let convention = DofPermutation::root_first(&model).unwrap();
        let rhs = ShortDynamics::new(&model, &set, &dynamics, &convention).unwrap();

        let err = rhs.state_derivative(0.0, &[0.0; 4]).unwrap_err();
        assert_eq!(err, SimError::Numerical(NumericalFailure::Singular { size: 1 }));
    }

    #[test]
    fn test_custom_solver_is_used() {
        struct Failing(ConstantInertia);

        impl DynamicsModel for Failing {
            fn dof_count(&self) -> usize {
                self.0.dof_count()
            }
            fn mass_matrix(&self, q: &DVector<f64>) -> Result<DMatrix<f64>, NumericalFailure> {
                self.0.mass_matrix(q)
            }
            fn inverse_dynamics(
                &self,
                q: &DVector<f64>,
                qdot: &DVector<f64>,
                qddot: &DVector<f64>,
            ) -> Result<DVector<f64>, NumericalFailure> {
                self.0.inverse_dynamics(q, qdot, qddot)
            }
            fn solve_linear(
                &self,
                a: &DMatrix<f64>,
                _b: &DVector<f64>,
            ) -> Result<DVector<f64>, NumericalFailure> {
                Err(NumericalFailure::IllConditioned { size: a.nrows(), rcond: 0.0 })
            }
        }

        let (model, set) = two_dof();
        let dynamics = Failing(ConstantInertia::diagonal(&[1.0, 1.0]));
        let convention = DofPermutation::root_first(&model).unwrap();
        let rhs = ShortDynamics::new(&model, &set, &dynamics, &convention).unwrap();
        let err = rhs.state_derivative(0.0, &[0.0; 4]).unwrap_err();
        assert!(matches!(err, SimError::Numerical(NumericalFailure::IllConditioned { .. })));
    }
}
