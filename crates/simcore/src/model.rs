//! DOF topology of the articulated body.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One root axis: the DOF it lives on and whether the model's axis points the
/// opposite way from the world convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisDof {
    pub index: usize,
    #[serde(default)]
    pub reversed: bool,
}

impl AxisDof {
    pub fn new(index: usize) -> Self {
        AxisDof { index, reversed: false }
    }

    pub fn reversed(index: usize) -> Self {
        AxisDof { index, reversed: true }
    }

    /// `+1.0` or `-1.0`.
    pub fn sign(&self) -> f64 {
        if self.reversed { -1.0 } else { 1.0 }
    }
}

/// The six root DOFs of the free-flying body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootAxes {
    pub somersault: AxisDof,
    pub tilt: AxisDof,
    pub twist: AxisDof,
    pub right: AxisDof,
    pub forward: AxisDof,
    pub upward: AxisDof,
}

impl RootAxes {
    /// Conventional layout: translations on DOFs 0..3, rotations on 3..6.
    pub fn standard() -> Self {
        RootAxes {
            right: AxisDof::new(0),
            forward: AxisDof::new(1),
            upward: AxisDof::new(2),
            somersault: AxisDof::new(3),
            tilt: AxisDof::new(4),
            twist: AxisDof::new(5),
        }
    }

    /// Every role on the same DOF, for reduced models with a single root DOF.
    /// Such a model can only take off at rest: the per-axis take-off values
    /// and CG correction have no distinct DOF to land on.
    pub fn collapsed(index: usize) -> Self {
        let axis = AxisDof::new(index);
        RootAxes {
            somersault: axis,
            tilt: axis,
            twist: axis,
            right: axis,
            forward: axis,
            upward: axis,
        }
    }

    /// Whether two axis roles live on the same DOF.
    pub fn has_shared_dofs(&self) -> bool {
        let named = self.named();
        named
            .iter()
            .enumerate()
            .any(|(i, (_, a))| named[i + 1..].iter().any(|(_, b)| a.index == b.index))
    }

    /// Somersault, tilt, twist.
    pub fn rotations(&self) -> [AxisDof; 3] {
        [self.somersault, self.tilt, self.twist]
    }

    /// Right, forward, upward.
    pub fn translations(&self) -> [AxisDof; 3] {
        [self.right, self.forward, self.upward]
    }

    fn named(&self) -> [(&'static str, AxisDof); 6] {
        [
            ("somersault", self.somersault),
            ("tilt", self.tilt),
            ("twist", self.twist),
            ("right", self.right),
            ("forward", self.forward),
            ("upward", self.upward),
        ]
    }
}

impl Default for RootAxes {
    fn default() -> Self {
        RootAxes::standard()
    }
}

/// DOF topology and per-model constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagrangianModel {
    /// Total number of generalized coordinates.
    pub dof_count: usize,
    pub root: RootAxes,
    /// DOFs solved from the reduced dynamics (the root).
    pub q1: Vec<usize>,
    /// DOFs driven by reference trajectories.
    pub q2: Vec<usize>,
    /// Apparatus height per condition, in model length units.
    pub heights: Vec<f64>,
    /// Output sample step and initial integration step (s).
    pub dt: f64,
    /// Marker indices of both feet.
    pub feet: [usize; 2],
    /// Marker indices of both hands.
    pub hands: [usize; 2],
}

impl LagrangianModel {
    /// A model with a standard six-DOF root followed by `driven` joint DOFs.
    pub fn with_standard_root(driven: usize) -> Self {
        let dof_count = 6 + driven;
        LagrangianModel {
            dof_count,
            root: RootAxes::standard(),
            q1: (0..6).collect(),
            q2: (6..dof_count).collect(),
            heights: vec![0.0],
            dt: 0.02,
            feet: [0, 1],
            hands: [2, 3],
        }
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_heights(mut self, heights: Vec<f64>) -> Self {
        self.heights = heights;
        self
    }

    pub fn with_feet(mut self, feet: [usize; 2]) -> Self {
        self.feet = feet;
        self
    }

    pub fn with_hands(mut self, hands: [usize; 2]) -> Self {
        self.hands = hands;
        self
    }

    /// Number of DOFs solved from the dynamics.
    pub fn root_count(&self) -> usize {
        self.q1.len()
    }

    /// Apparatus height for a condition.
    pub fn height(&self, condition: usize) -> Result<f64, ConfigError> {
        self.heights
            .get(condition)
            .copied()
            .ok_or(ConfigError::UnknownCondition {
                condition,
                available: self.heights.len(),
            })
    }

    /// Checks the partition and index invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dof_count == 0 {
            return Err(ConfigError::EmptyModel);
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::InvalidTimestep(self.dt));
        }
        if self.q1.is_empty() {
            return Err(ConfigError::NoRootDof);
        }

        let mut seen = vec![false; self.dof_count];
        for &index in self.q1.iter().chain(self.q2.iter()) {
            if index >= self.dof_count {
                return Err(ConfigError::DofOutOfRange {
                    index,
                    dof_count: self.dof_count,
                });
            }
            if seen[index] {
                return Err(ConfigError::DuplicateDof(index));
            }
            seen[index] = true;
        }
        if let Some(missing) = seen.iter().position(|assigned| !assigned) {
            return Err(ConfigError::UnassignedDof(missing));
        }

        for (axis, dof) in self.root.named() {
            if dof.index >= self.dof_count {
                return Err(ConfigError::DofOutOfRange {
                    index: dof.index,
                    dof_count: self.dof_count,
                });
            }
            if !self.q1.contains(&dof.index) {
                return Err(ConfigError::AxisNotRoot { axis, index: dof.index });
            }
        }
        Ok(())
    }
}
