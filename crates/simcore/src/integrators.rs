use std::cell::RefCell;

use log::debug;
use ode_solvers::dop_shared::OutputType;
use ode_solvers::{DVector, Dopri5, System};
use serde::{Deserialize, Serialize};

use crate::error::{NumericalFailure, SimError, SimResult};
use crate::traits::SimContext;

/// First-order system `dx/dt = f(t, x)` whose evaluation may fail.
pub trait OdeSystem {
    /// Length of the state vector.
    fn dimension(&self) -> usize;

    /// Writes `f(t, x)` into `dx`.
    fn derivative(&self, t: f64, x: &[f64], dx: &mut [f64]) -> SimResult<()>;
}

/// A generic integration strategy trait.
pub trait Integrator {
    /// Integrates from `y0` at `t = 0` over `[0, ctx.t_end()]` and returns the
    /// solution sampled every `ctx.dt`.
    fn solve<S: OdeSystem>(&self, system: &S, ctx: &SimContext, y0: &[f64]) -> SimResult<SampledSolution>;
}

/// States at `0, dt, 2 dt, ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledSolution {
    pub times: Vec<f64>,
    pub states: Vec<Vec<f64>>,
}

impl SampledSolution {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Tolerances and limits of the adaptive solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DormandPrinceConfig {
    pub rtol: f64,
    pub atol: f64,
    /// First trial step; `None` uses the sample step.
    pub initial_step: Option<f64>,
    pub max_steps: u32,
}

impl Default for DormandPrinceConfig {
    fn default() -> Self {
        DormandPrinceConfig {
            rtol: 1e-6,
            atol: 1e-6,
            initial_step: None,
            max_steps: 100_000,
        }
    }
}

impl DormandPrinceConfig {
    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = Some(step);
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Adaptive Dormand-Prince 5(4) with dense output, resampled on the
/// `dt` grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct DormandPrince {
    pub config: DormandPrinceConfig,
}

impl DormandPrince {
    pub fn new(config: DormandPrinceConfig) -> Self {
        DormandPrince { config }
    }
}

/// Dense output points further than this fraction of `dt` from a grid time
/// are ignored.
const GRID_TOLERANCE: f64 = 1e-6;

// ode_solvers systems cannot fail, so the first error is parked here and the
// solver is told to stop from `solout`.
struct Bridge<'a, S> {
    system: &'a S,
    failure: &'a RefCell<Option<SimError>>,
}

impl<S: OdeSystem> System<f64, DVector<f64>> for Bridge<'_, S> {
    fn system(&self, t: f64, y: &DVector<f64>, dy: &mut DVector<f64>) {
        if self.failure.borrow().is_some() {
            dy.fill(0.0);
            return;
        }
        if let Err(err) = self.system.derivative(t, y.as_slice(), dy.as_mut_slice()) {
            dy.fill(0.0);
            *self.failure.borrow_mut() = Some(err);
        }
    }

    fn solout(&mut self, _t: f64, _y: &DVector<f64>, _dy: &DVector<f64>) -> bool {
        self.failure.borrow().is_some()
    }
}

impl Integrator for DormandPrince {
    fn solve<S: OdeSystem>(&self, system: &S, ctx: &SimContext, y0: &[f64]) -> SimResult<SampledSolution> {
        let dt = ctx.dt;
        let samples = ctx.sample_count();
        if y0.len() != system.dimension() {
            return Err(NumericalFailure::DimensionMismatch {
                quantity: "initial state",
                expected: system.dimension(),
                actual: y0.len(),
            }
            .into());
        }

        // Integrate half a step past the horizon so the last grid time is an
        // interior dense-output point.
        let x_end = ctx.t_end() + 0.5 * dt;
        let h0 = self.config.initial_step.unwrap_or(dt);
        let failure = RefCell::new(None);
        let bridge = Bridge { system, failure: &failure };

        let mut stepper = Dopri5::from_param(
            bridge,
            0.0,
            x_end,
            dt,
            DVector::from_column_slice(y0),
            self.config.rtol,
            self.config.atol,
            0.9,
            0.04,
            0.2,
            10.0,
            x_end,
            h0,
            self.config.max_steps,
            1000,
            OutputType::Dense,
        );

        let outcome = stepper.integrate();
        if let Some(err) = failure.borrow_mut().take() {
            return Err(err);
        }
        let stats = outcome.map_err(|err| NumericalFailure::Integration {
            reason: format!("{err:?}"),
        })?;
        debug!(
            "dopri5: {} evaluations, {} accepted, {} rejected steps",
            stats.num_eval, stats.accepted_steps, stats.rejected_steps
        );

        let mut slots: Vec<Option<Vec<f64>>> = vec![None; samples];
        slots[0] = Some(y0.to_vec());
        for (x, y) in stepper.x_out().iter().zip(stepper.y_out().iter()) {
            let k = (x / dt).round();
            if k < 0.0 || (x - k * dt).abs() > GRID_TOLERANCE * dt {
                continue;
            }
            let k = k as usize;
            if k < samples && slots[k].is_none() {
                slots[k] = Some(y.as_slice().to_vec());
            }
        }

        let mut times = Vec::with_capacity(samples);
        let mut states = Vec::with_capacity(samples);
        for (k, slot) in slots.into_iter().enumerate() {
            let t = k as f64 * dt;
            let state = slot.ok_or_else(|| NumericalFailure::Integration {
                reason: format!("no dense output at sample {k} (t = {t})"),
            })?;
            if state.iter().any(|v| !v.is_finite()) {
                return Err(NumericalFailure::NonFinite { quantity: "state", t }.into());
            }
            times.push(t);
            states.push(state);
        }

        Ok(SampledSolution { times, states })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    /// Constant gravity on a point mass: x'' = -g.
    struct Ballistic {
        g: f64,
    }

    impl OdeSystem for Ballistic {
        fn dimension(&self) -> usize {
            2
        }

        fn derivative(&self, _t: f64, x: &[f64], dx: &mut [f64]) -> SimResult<()> {
            dx[0] = x[1];
            dx[1] = -self.g;
            Ok(())
        }
    }

    /// Fails once time passes `at`.
    struct FailsLate {
        at: f64,
    }

    impl OdeSystem for FailsLate {
        fn dimension(&self) -> usize {
            1
        }

        fn derivative(&self, t: f64, _x: &[f64], dx: &mut [f64]) -> SimResult<()> {
            if t > self.at {
                return Err(ConfigError::NoRootDof.into());
            }
            dx[0] = 1.0;
            Ok(())
        }
    }

    #[test]
    fn test_samples_on_fixed_grid() {
        let ctx = SimContext::new(0.1, 1.0);
        let solution = DormandPrince::default()
            .solve(&Ballistic { g: 9.81 }, &ctx, &[0.0, 5.0])
            .unwrap();

        assert_eq!(solution.len(), 12);
        for (k, t) in solution.times.iter().enumerate() {
            assert!((t - k as f64 * 0.1).abs() < 1e-12);
        }
        assert_eq!(solution.states[0], vec![0.0, 5.0]);
    }

    #[test]
    fn test_last_sample_within_horizon() {
        // Horizon 1.038 is not a multiple of the step.
        let ctx = SimContext::new(0.03, 1.008);
        let solution = DormandPrince::default()
            .solve(&Ballistic { g: 0.0 }, &ctx, &[0.0, 1.0])
            .unwrap();

        assert_eq!(solution.len(), 35);
        let last = solution.times[solution.len() - 1];
        assert!((last - 1.02).abs() < 1e-12);
        assert!(last <= ctx.t_end());
        assert!((solution.states[34][0] - 1.02).abs() < 1e-9);
    }

    #[test]
    fn test_ballistic_matches_closed_form() {
        let ctx = SimContext::new(0.05, 1.0);
        let solution = DormandPrince::default()
            .solve(&Ballistic { g: 9.81 }, &ctx, &[1.0, 3.0])
            .unwrap();

        for (t, state) in solution.times.iter().zip(&solution.states) {
            let expected = 1.0 + 3.0 * t - 0.5 * 9.81 * t * t;
            assert!((state[0] - expected).abs() < 1e-6, "t = {t}: {} vs {expected}", state[0]);
            assert!((state[1] - (3.0 - 9.81 * t)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rhs_failure_is_propagated() {
        let ctx = SimContext::new(0.1, 1.0);
        let result = DormandPrince::default().solve(&FailsLate { at: 0.5 }, &ctx, &[0.0]);
        assert_eq!(result, Err(SimError::Config(ConfigError::NoRootDof)));
    }

    #[test]
    fn test_initial_state_dimension_checked() {
        let ctx = SimContext::new(0.1, 1.0);
        let result = DormandPrince::default().solve(&Ballistic { g: 1.0 }, &ctx, &[0.0]);
        assert!(matches!(
            result,
            Err(SimError::Numerical(NumericalFailure::DimensionMismatch { expected: 2, actual: 1, .. }))
        ));
    }
}
