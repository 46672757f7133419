//! Reference marker evaluator for a rigid root segment.

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use simcore::{AxisDof, MarkerEvaluator, MarkerPositions, RootAxes};

/// Markers fixed to the root segment. Body-frame offsets are rotated by the
/// somersault (about x), tilt (about y) and twist (about z) angles, in that
/// order, and translated by the root position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidMarkers {
    pub root: RootAxes,
    /// Body-frame offset of each anatomical marker (m).
    pub markers: Vec<[f64; 3]>,
    /// Body-frame offset of the centre of gravity, reported as the last marker.
    pub cg: [f64; 3],
}

impl RigidMarkers {
    pub fn new(root: RootAxes, markers: Vec<[f64; 3]>) -> Self {
        RigidMarkers {
            root,
            markers,
            cg: [0.0; 3],
        }
    }

    pub fn with_cg(mut self, cg: [f64; 3]) -> Self {
        self.cg = cg;
        self
    }

    /// Feet, hands, head and CG of a stretched body standing on the root
    /// origin: markers 0/1 are the feet, 2/3 the raised hands.
    pub fn stretched_body(root: RootAxes) -> Self {
        RigidMarkers::new(
            root,
            vec![
                [-0.1, 0.0, -0.95],
                [0.1, 0.0, -0.95],
                [-0.2, 0.0, 1.05],
                [0.2, 0.0, 1.05],
                [0.0, 0.0, 0.75],
            ],
        )
    }

    fn orientation(&self, q: &[f64]) -> Rotation3<f64> {
        let angle = |axis: AxisDof| q[axis.index] * axis.sign();
        Rotation3::from_axis_angle(&Vector3::x_axis(), angle(self.root.somersault))
            * Rotation3::from_axis_angle(&Vector3::y_axis(), angle(self.root.tilt))
            * Rotation3::from_axis_angle(&Vector3::z_axis(), angle(self.root.twist))
    }

    fn origin(&self, q: &[f64]) -> Vector3<f64> {
        let [right, forward, upward] = self.root.translations();
        Vector3::new(
            q[right.index] * right.sign(),
            q[forward.index] * forward.sign(),
            q[upward.index] * upward.sign(),
        )
    }
}

impl MarkerEvaluator for RigidMarkers {
    fn evaluate(&self, q: &[f64]) -> MarkerPositions {
        let rotation = self.orientation(q);
        let origin = self.origin(q);

        let count = self.markers.len() + 1;
        let mut positions = MarkerPositions {
            x: Vec::with_capacity(count),
            y: Vec::with_capacity(count),
            z: Vec::with_capacity(count),
        };
        for offset in self.markers.iter().chain(std::iter::once(&self.cg)) {
            let p = origin + rotation * Vector3::from_column_slice(offset);
            positions.x.push(p.x);
            positions.y.push(p.y);
            positions.z.push(p.z);
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_translation_only() {
        let markers = RigidMarkers::stretched_body(RootAxes::standard());
        let mut q = vec![0.0; 6];
        q[2] = 1.0;
        let positions = markers.evaluate(&q);

        assert_eq!(positions.len(), 6);
        assert_relative_eq!(positions.z[0], 0.05, epsilon = 1e-12);
        assert_eq!(positions.cg(), Some([0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_half_somersault_inverts_body() {
        let markers = RigidMarkers::stretched_body(RootAxes::standard());
        let mut q = vec![0.0; 6];
        q[3] = PI;
        let positions = markers.evaluate(&q);

        // Feet above, hands below the root
        assert_relative_eq!(positions.z[0], 0.95, epsilon = 1e-12);
        assert_relative_eq!(positions.z[2], -1.05, epsilon = 1e-12);
        assert_relative_eq!(positions.min_height_of(&[2, 3]), -1.05, epsilon = 1e-12);
    }

    #[test]
    fn test_reversed_axis_flips_translation() {
        let mut root = RootAxes::standard();
        root.upward = AxisDof::reversed(2);
        let markers = RigidMarkers::new(root, vec![]).with_cg([0.0, 0.0, 0.5]);
        let mut q = vec![0.0; 6];
        q[2] = 1.0;

        let positions = markers.evaluate(&q);
        assert_eq!(positions.len(), 1);
        assert_relative_eq!(positions.z[0], -0.5, epsilon = 1e-12);
    }
}
