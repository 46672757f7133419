//! Per-DOF reference trajectories.

use serde::{Deserialize, Serialize};
use simcore::{ConfigError, LagrangianModel};

use crate::quintic;
use crate::spline::{self, SplineFn};

/// Slack allowed when checking that breakpoints cover the flight.
const COVERAGE_TOLERANCE: f64 = 1e-9;

/// How a driven DOF's reference is interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interpolation {
    /// Minimum-jerk quintic segments through `(times[i], positions[i])`.
    Quintic { times: Vec<f64>, positions: Vec<f64> },
    /// Clamped cubic spline over the whole flight.
    CubicSpline {
        knots: Vec<f64>,
        /// Start and end slope.
        slopes: Vec<f64>,
        intervals: usize,
    },
}

/// Reference trajectory of one driven DOF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointNode {
    pub dof: usize,
    pub interpolation: Interpolation,
}

impl JointNode {
    pub fn quintic(dof: usize, times: Vec<f64>, positions: Vec<f64>) -> Self {
        JointNode {
            dof,
            interpolation: Interpolation::Quintic { times, positions },
        }
    }

    pub fn cubic_spline(dof: usize, knots: Vec<f64>, slopes: Vec<f64>) -> Self {
        let intervals = knots.len().saturating_sub(1);
        JointNode {
            dof,
            interpolation: Interpolation::CubicSpline {
                knots,
                slopes,
                intervals,
            },
        }
    }
}

/// Desired position, velocity and acceleration for every DOF. DOFs that were
/// not requested are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub acceleration: Vec<f64>,
}

impl Reference {
    pub fn zeros(dof_count: usize) -> Self {
        Reference {
            position: vec![0.0; dof_count],
            velocity: vec![0.0; dof_count],
            acceleration: vec![0.0; dof_count],
        }
    }
}

#[derive(Debug, Clone)]
enum Curve {
    Quintic { times: Vec<f64>, positions: Vec<f64> },
    Spline { eval: SplineFn, params: Vec<f64> },
}

impl Curve {
    fn eval(&self, t: f64) -> [f64; 3] {
        match self {
            Curve::Quintic { times, positions } => quintic::evaluate(times, positions, t),
            Curve::Spline { eval, params } => eval(t, params),
        }
    }
}

/// Validated reference trajectories of all driven DOFs.
#[derive(Debug, Clone)]
pub struct TrajectorySet {
    dof_count: usize,
    duration: f64,
    driven: Vec<usize>,
    curves: Vec<Option<Curve>>,
}

impl TrajectorySet {
    /// Checks every node against the model and the flight duration and
    /// resolves spline formulations.
    pub fn new(model: &LagrangianModel, nodes: &[JointNode], duration: f64) -> Result<Self, ConfigError> {
        model.validate()?;
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(ConfigError::InvalidDuration(duration));
        }

        let mut curves: Vec<Option<Curve>> = vec![None; model.dof_count];
        for node in nodes {
            let dof = node.dof;
            if dof >= model.dof_count {
                return Err(ConfigError::DofOutOfRange {
                    index: dof,
                    dof_count: model.dof_count,
                });
            }
            if !model.q2.contains(&dof) {
                return Err(ConfigError::UnexpectedJointNode(dof));
            }
            if curves[dof].is_some() {
                return Err(ConfigError::DuplicateJointNode(dof));
            }
            curves[dof] = Some(build_curve(dof, &node.interpolation, duration)?);
        }

        if let Some(&missing) = model.q2.iter().find(|&&dof| curves[dof].is_none()) {
            return Err(ConfigError::MissingJointNode(missing));
        }

        Ok(TrajectorySet {
            dof_count: model.dof_count,
            duration,
            driven: model.q2.clone(),
            curves,
        })
    }

    pub fn dof_count(&self) -> usize {
        self.dof_count
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Driven DOFs, in `q2` order.
    pub fn driven(&self) -> &[usize] {
        &self.driven
    }

    /// Reference state of `dofs` at `t`.
    pub fn evaluate(&self, t: f64, dofs: &[usize]) -> Reference {
        let mut reference = Reference::zeros(self.dof_count);
        for &dof in dofs {
            if let Some(Some(curve)) = self.curves.get(dof) {
                let [q, qdot, qddot] = curve.eval(t);
                reference.position[dof] = q;
                reference.velocity[dof] = qdot;
                reference.acceleration[dof] = qddot;
            }
        }
        reference
    }

    /// Reference positions of `dofs` at `t`.
    pub fn positions_at(&self, t: f64, dofs: &[usize]) -> Vec<f64> {
        let mut positions = vec![0.0; self.dof_count];
        for &dof in dofs {
            if let Some(Some(curve)) = self.curves.get(dof) {
                positions[dof] = curve.eval(t)[0];
            }
        }
        positions
    }
}

fn build_curve(dof: usize, interpolation: &Interpolation, duration: f64) -> Result<Curve, ConfigError> {
    match interpolation {
        Interpolation::Quintic { times, positions } => {
            if times.len() < 2 {
                return Err(ConfigError::InvalidBreakpoints {
                    dof,
                    reason: format!("need at least 2 breakpoints, got {}", times.len()),
                });
            }
            if times.len() != positions.len() {
                return Err(ConfigError::InvalidBreakpoints {
                    dof,
                    reason: format!("{} times for {} positions", times.len(), positions.len()),
                });
            }
            if times.iter().chain(positions.iter()).any(|v| !v.is_finite()) {
                return Err(ConfigError::InvalidBreakpoints {
                    dof,
                    reason: "non-finite value".to_string(),
                });
            }
            if let Some(w) = times.windows(2).find(|w| w[1] <= w[0]) {
                return Err(ConfigError::InvalidBreakpoints {
                    dof,
                    reason: format!("times not increasing at {} -> {}", w[0], w[1]),
                });
            }

            let first = times[0];
            let last = times[times.len() - 1];
            if first > COVERAGE_TOLERANCE || last < duration - COVERAGE_TOLERANCE {
                return Err(ConfigError::MissingBreakpoints {
                    dof,
                    first,
                    last,
                    duration,
                });
            }

            Ok(Curve::Quintic {
                times: times.clone(),
                positions: positions.clone(),
            })
        }
        Interpolation::CubicSpline {
            knots,
            slopes,
            intervals,
        } => {
            let eval = spline::variant(*intervals)?;
            if knots.len() != intervals + 1 {
                return Err(ConfigError::SplineShape {
                    dof,
                    what: "knots",
                    expected: intervals + 1,
                    actual: knots.len(),
                });
            }
            if slopes.len() != 2 {
                return Err(ConfigError::SplineShape {
                    dof,
                    what: "slopes",
                    expected: 2,
                    actual: slopes.len(),
                });
            }
            if duration <= 0.0 {
                return Err(ConfigError::InvalidDuration(duration));
            }
            Ok(Curve::Spline {
                eval,
                params: spline::parameters(knots, slopes, duration),
            })
        }
    }
}
