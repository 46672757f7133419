//! One airborne simulation call: take-off state, integration, contact scan.

use dynamics::{ShortDynamics, TrackingGains, TrackingMode};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use simcore::{
    ConfigError, DofConvention, DormandPrince, DormandPrinceConfig, DynamicsModel, Integrator, LagrangianModel,
    MarkerEvaluator, OutputTable, SimContext, SimResult, SimulationMode, SimulationOutput,
};
use trajectory::{JointNode, TrajectorySet};

use crate::contact::{find_contact, kept_samples};
use crate::initial::initial_state;
use crate::takeoff::{PlayMode, TakeoffParameters, checks_contact};

/// Per-run settings besides the model and take-off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Flight duration (s). The integration runs one sample step further.
    pub duration: f64,
    pub play_mode: PlayMode,
    pub mode: SimulationMode,
    pub gains: TrackingGains,
    pub tracking: TrackingMode,
    pub integrator: DormandPrinceConfig,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            duration: 1.0,
            play_mode: PlayMode::Normal,
            mode: SimulationMode::Offline,
            gains: TrackingGains::default(),
            tracking: TrackingMode::Servo,
            integrator: DormandPrinceConfig::default(),
        }
    }
}

impl SimulationSettings {
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_play_mode(mut self, play_mode: PlayMode) -> Self {
        self.play_mode = play_mode;
        self
    }

    pub fn with_mode(mut self, mode: SimulationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_gains(mut self, gains: TrackingGains) -> Self {
        self.gains = gains;
        self
    }

    pub fn with_tracking(mut self, tracking: TrackingMode) -> Self {
        self.tracking = tracking;
        self
    }

    pub fn with_integrator(mut self, integrator: DormandPrinceConfig) -> Self {
        self.integrator = integrator;
        self
    }
}

/// The body, its collaborators and the run settings. Holds no state between
/// calls to [`Simulation::run`].
#[derive(Debug, Clone)]
pub struct Simulation<D, C, M> {
    pub model: LagrangianModel,
    pub nodes: Vec<JointNode>,
    pub dynamics: D,
    pub convention: C,
    pub markers: M,
    pub settings: SimulationSettings,
}

impl<D, C, M> Simulation<D, C, M>
where
    D: DynamicsModel,
    C: DofConvention,
    M: MarkerEvaluator,
{
    pub fn new(model: LagrangianModel, nodes: Vec<JointNode>, dynamics: D, convention: C, markers: M) -> Self {
        Simulation {
            model,
            nodes,
            dynamics,
            convention,
            markers,
            settings: SimulationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SimulationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Simulates the flight from `takeoff`. The table stops at the first
    /// sample touching the ground, that sample included.
    pub fn run(&self, takeoff: &TakeoffParameters) -> SimResult<SimulationOutput> {
        let settings = &self.settings;
        if settings.mode != SimulationMode::Offline {
            return Err(ConfigError::UnsupportedMode(settings.mode).into());
        }

        let trajectories = TrajectorySet::new(&self.model, &self.nodes, settings.duration)?;
        let rhs = ShortDynamics::new(&self.model, &trajectories, &self.dynamics, &self.convention)?
            .with_gains(settings.gains)
            .with_mode(settings.tracking);
        let initial = initial_state(&self.model, &trajectories, &self.markers, takeoff)?;

        let ctx = SimContext::new(self.model.dt, settings.duration);
        info!(
            "simulating {} s of flight, {} DOFs, condition {}",
            ctx.duration, self.model.dof_count, takeoff.condition
        );

        let solution = DormandPrince::new(settings.integrator).solve(&rhs, &ctx, &initial.augmented())?;
        let n = self.model.dof_count;
        let positions: Vec<Vec<f64>> = solution.states.iter().map(|x| x[..n].to_vec()).collect();
        let table = OutputTable::from_samples(n, &positions, ctx.dt);
        let total_samples = table.len();

        let contact_index = if checks_contact(takeoff.condition, settings.play_mode) {
            find_contact(&table, &self.markers)
        } else {
            debug!("contact scan skipped");
            None
        };
        let used_samples = kept_samples(total_samples, contact_index);

        match contact_index {
            Some(k) => info!("ground contact at t = {:.3} s, keeping {used_samples} of {total_samples} samples", table.time(k)),
            None => info!("no ground contact, {total_samples} samples"),
        }

        Ok(SimulationOutput {
            table: table.truncated(used_samples),
            used_samples,
            total_samples,
            contact_index,
        })
    }
}
