//! Initial posture and velocity at take-off.

use log::debug;
use nalgebra::{Matrix3, Vector3};
use simcore::{ConfigError, LagrangianModel, MarkerEvaluator, MarkerPositions, RootAxes};
use trajectory::TrajectorySet;

use crate::takeoff::TakeoffParameters;

/// Generalized position and velocity at `t = 0`, integration order.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    pub q: Vec<f64>,
    pub qdot: Vec<f64>,
}

impl InitialState {
    /// Augmented state `[q; qdot]`.
    pub fn augmented(&self) -> Vec<f64> {
        let mut x = Vec::with_capacity(self.q.len() + self.qdot.len());
        x.extend_from_slice(&self.q);
        x.extend_from_slice(&self.qdot);
        x
    }
}

/// Builds the take-off state: driven DOFs start on their reference, the root
/// gets the take-off angles and speeds, the translational velocity is
/// corrected for the CG offset and the body is lifted to the apparatus height.
/// Models whose root axis roles share DOFs must take off at rest.
pub fn initial_state<M: MarkerEvaluator>(
    model: &LagrangianModel,
    trajectories: &TrajectorySet,
    markers: &M,
    takeoff: &TakeoffParameters,
) -> Result<InitialState, ConfigError> {
    let height = model.height(takeoff.condition)?;
    if model.root.has_shared_dofs() {
        if let Some(quantity) = takeoff.first_motion() {
            return Err(ConfigError::SharedRootMotion { quantity });
        }
    }

    let reference = trajectories.evaluate(0.0, &model.q2);
    debug!(
        "reference at t = 0: q = {:?}, qdot = {:?}, qddot = {:?}",
        reference.position, reference.velocity, reference.acceleration
    );
    let mut q = reference.position;
    let mut qdot = reference.velocity;

    let root = model.root;
    q[root.tilt.index] = takeoff.tilt_radians();
    q[root.somersault.index] = takeoff.rotation_radians();
    qdot[root.forward.index] = takeoff.anteroposterior_speed;
    qdot[root.upward.index] = takeoff.vertical_speed;
    qdot[root.somersault.index] = takeoff.somersault_rate();
    qdot[root.twist.index] = takeoff.twist_rate();

    let tags = markers.evaluate(&q);
    let cg = tags.cg().ok_or(ConfigError::NoMarkers)?;
    correct_cg_velocity(&root, &q, &mut qdot, cg);

    let support = if takeoff.starts_on_feet() { model.feet } else { model.hands };
    let lowest = support_height(&tags, &support)?;
    q[root.upward.index] += height - lowest;

    debug!("initial state: q = {q:?}, qdot = {qdot:?}");
    Ok(InitialState { q, qdot })
}

/// Adds the velocity of the CG due to the root rotation to the translational
/// velocity: `v = (v * s + [u1]x * w) * s` per axis, with `u1` the CG offset
/// from the root origin and `w` the signed rotational velocity. The axis sign
/// `s` is applied twice.
pub fn correct_cg_velocity(root: &RootAxes, q: &[f64], qdot: &mut [f64], cg: [f64; 3]) {
    let translations = root.translations();
    let rotations = root.rotations();

    let u1 = Vector3::from_fn(|i, _| cg[i] - q[translations[i].index] * translations[i].sign());
    let rot = Vector3::from_fn(|i, _| qdot[rotations[i].index] * rotations[i].sign());
    let skew: Matrix3<f64> = u1.cross_matrix();
    let w = skew * rot;

    for (i, axis) in translations.iter().enumerate() {
        let v = qdot[axis.index] * axis.sign() + w[i];
        qdot[axis.index] = v * axis.sign();
    }
}

fn support_height(tags: &MarkerPositions, support: &[usize; 2]) -> Result<f64, ConfigError> {
    if let Some(&index) = support.iter().find(|&&m| m >= tags.len()) {
        return Err(ConfigError::MarkerOutOfRange {
            index,
            available: tags.len(),
        });
    }
    Ok(tags.min_height_of(support))
}
