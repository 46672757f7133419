use airborne::{RigidMarkers, SimulationSettings, TakeoffParameters};
use dynamics::{ConstantInertia, GRAVITY};
use serde::{Deserialize, Serialize};
use simcore::{LagrangianModel, RootAxes};
use trajectory::JointNode;

/// Everything needed for one run, as read from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub model: LagrangianModel,
    pub joints: Vec<JointNode>,
    pub inertia: ConstantInertia,
    pub markers: RigidMarkers,
    pub takeoff: TakeoffParameters,
    #[serde(default)]
    pub settings: SimulationSettings,
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_output() -> String {
    "flight.csv".to_string()
}

impl Scenario {
    /// Back somersault from the floor with both arms swinging.
    pub fn demo() -> Self {
        let model = LagrangianModel::with_standard_root(2).with_heights(vec![0.0, 0.0, 1.0]);
        let inertia = ConstantInertia::diagonal(&[65.0, 65.0, 65.0, 11.0, 10.5, 1.6, 0.9, 0.9])
            .with_coupling(3, 6, 0.35)
            .with_coupling(3, 7, 0.35)
            .with_coupling(5, 6, 0.05)
            .with_coupling(5, 7, -0.05)
            .with_gravity(2, 65.0, GRAVITY);
        let joints = vec![
            JointNode::quintic(6, vec![0.0, 0.3, 0.9, 1.3], vec![3.0, 0.5, 0.5, 3.0]),
            JointNode::cubic_spline(7, vec![3.0, 1.0, 0.4, 0.4, 1.0, 3.0], vec![0.0, 0.0]),
        ];

        Scenario {
            markers: RigidMarkers::stretched_body(RootAxes::standard()).with_cg([0.0, 0.0, 0.1]),
            model,
            joints,
            inertia,
            takeoff: TakeoffParameters::default()
                .with_somersault_speed(-1.1)
                .with_vertical_speed(4.6)
                .with_anteroposterior_speed(-0.4)
                .with_condition(1),
            settings: SimulationSettings::default().with_duration(1.3),
            output: default_output(),
        }
    }
}
