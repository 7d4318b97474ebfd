//! Fixed-step integration of the model.
//!
//! Two explicit schemes are available. Classical fourth order Runge-Kutta is the default;
//! forward Euler is kept for comparison and for reproducing coarse trajectories. Both use
//! the same step for the whole run, and the state is recorded after every step.
//!
//! Values are never clamped. If a stiff parameter set or a too-large step pushes a
//! compartment below zero, above one, or to NaN, the value is recorded as computed and a
//! warning is logged once per run.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::cancel::CancellationToken;
use crate::compartment::State;
use crate::error::CocircError;
use crate::log::{debug, warn};
use crate::model::EpidemicModel;
use crate::series::TimeSeries;

/// Default step, one day.
pub const DEFAULT_STEP: f64 = 1.0;

/// Number of steps between two checks of the cancellation token.
pub const CANCEL_CHECK_INTERVAL: usize = 256;

/// Upper bound on the number of steps of a single run.
pub const MAX_STEPS: usize = 100_000_000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
)]
pub enum Method {
    #[serde(rename = "euler")]
    #[strum(serialize = "euler")]
    Euler,
    #[default]
    #[serde(rename = "rk4")]
    #[strum(serialize = "rk4")]
    RungeKutta4,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Integrator {
    pub step: f64,
    pub method: Method,
}

impl Default for Integrator {
    fn default() -> Self {
        Integrator {
            step: DEFAULT_STEP,
            method: Method::default(),
        }
    }
}

impl Integrator {
    #[must_use]
    pub fn new(step: f64, method: Method) -> Self {
        Integrator { step, method }
    }

    /// Number of steps needed to reach `horizon`, i.e. `floor(horizon / step)`. A quotient
    /// within a few ulps below a whole number counts as that number, so a horizon that is a
    /// multiple of a decimal step such as 0.1 is reached.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::ConfigError` if the step is not a positive finite number, the
    /// horizon is negative or not finite, or the run would exceed [`MAX_STEPS`].
    pub fn num_steps(&self, horizon: f64) -> Result<usize, CocircError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(CocircError::ConfigError(format!(
                "step must be a positive finite number, got {}",
                self.step
            )));
        }
        if !(horizon.is_finite() && horizon >= 0.0) {
            return Err(CocircError::ConfigError(format!(
                "horizon must be a finite number >= 0, got {horizon}"
            )));
        }
        let ratio = horizon / self.step;
        let steps = (ratio + ratio * 4.0 * f64::EPSILON).floor();
        if steps > MAX_STEPS as f64 {
            return Err(CocircError::ConfigError(format!(
                "a horizon of {horizon} with step {} needs more than {MAX_STEPS} steps",
                self.step
            )));
        }
        Ok(steps as usize)
    }

    /// Advances `state` from `t` by one step.
    #[must_use]
    pub fn advance(&self, model: &EpidemicModel, t: f64, state: &State) -> State {
        let dt = self.step;
        match self.method {
            Method::Euler => state.add_scaled(dt, &model.rhs(t, state)),
            Method::RungeKutta4 => {
                let k1 = model.rhs(t, state);
                let k2 = model.rhs(t + 0.5 * dt, &state.add_scaled(0.5 * dt, &k1));
                let k3 = model.rhs(t + 0.5 * dt, &state.add_scaled(0.5 * dt, &k2));
                let k4 = model.rhs(t + dt, &state.add_scaled(dt, &k3));
                let mut next = *state;
                for i in 0..next.0.len() {
                    next.0[i] += (dt / 6.0) * (k1.0[i] + 2.0 * k2.0[i] + 2.0 * k3.0[i] + k4.0[i]);
                }
                next
            }
        }
    }

    /// Integrates `model` from `initial` at `t = 0` up to `horizon`.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::ConfigError` for an unusable step or horizon.
    pub fn run(
        &self,
        model: &EpidemicModel,
        initial: State,
        horizon: f64,
    ) -> Result<TimeSeries, CocircError> {
        self.run_cancellable(model, initial, horizon, &CancellationToken::new())
    }

    /// Like [`run`](Self::run), but gives up as soon as `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::Cancelled` if the token was cancelled before the run finished,
    /// and `CocircError::ConfigError` for an unusable step or horizon.
    pub fn run_cancellable(
        &self,
        model: &EpidemicModel,
        initial: State,
        horizon: f64,
        token: &CancellationToken,
    ) -> Result<TimeSeries, CocircError> {
        let steps = self.num_steps(horizon)?;
        debug!(
            "integrating {} steps of {} with {} up to t = {}",
            steps, self.step, self.method, horizon
        );

        let mut series = TimeSeries::with_capacity(self.step, self.method, steps + 1);
        let mut warned = warn_if_out_of_range(false, 0.0, &initial);
        let mut state = initial;
        series.push(0.0, state);

        for n in 0..steps {
            if n % CANCEL_CHECK_INTERVAL == 0 && token.is_cancelled() {
                debug!("run cancelled after {} of {} steps", n, steps);
                return Err(CocircError::Cancelled);
            }
            let t = n as f64 * self.step;
            state = self.advance(model, t, &state);
            let t_next = (n + 1) as f64 * self.step;
            warned = warn_if_out_of_range(warned, t_next, &state);
            series.push(t_next, state);
        }

        debug!("run finished with {} samples", series.len());
        Ok(series)
    }
}

/// Logs the first out of range value of a run. Returns whether a warning has been emitted.
fn warn_if_out_of_range(warned: bool, t: f64, state: &State) -> bool {
    if warned {
        return true;
    }
    match state.first_out_of_range() {
        Some(compartment) => {
            warn!(
                "{} left [0, 1] at t = {}: {}",
                compartment, t, state[compartment]
            );
            true
        }
        None => false,
    }
}
