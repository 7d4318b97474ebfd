//! Scenario files for batch runs.
//!
//! A scenario is a JSON document describing one run: the parameters that differ from the
//! defaults, the initial state, the integration settings and, optionally, the forcing
//! functions and display options.
//!
//! ```json
//! {
//!     "parameters": { "beta_1": 0.3, "sigma_1": 0.5 },
//!     "initial_state": { "SS": 0.999, "IS": 0.001 },
//!     "horizon": 3600,
//!     "step": 1,
//!     "method": "rk4",
//!     "contact": {
//!         "initial": 1.0,
//!         "changes": [{ "center": 2160, "half_width": 100, "target": 0.2 }]
//!     },
//!     "output": { "stride": 10, "time_scale": 360 }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::compartment::{Compartment, State};
use crate::error::CocircError;
use crate::extract::ExtractOptions;
use crate::forcing::ForcingFunction;
use crate::integrator::{Integrator, Method, DEFAULT_STEP};
use crate::model::{Driver, EpidemicModel};
use crate::numeric::{almost_eq, MASS_TOLERANCE};
use crate::parameters::ModelParameters;

/// Ten years of 360 days.
pub const DEFAULT_HORIZON: f64 = 3600.0;

fn default_horizon() -> f64 {
    DEFAULT_HORIZON
}

fn default_step() -> f64 {
    DEFAULT_STEP
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub parameters: ModelParameters,
    /// Fractions by compartment name. Compartments that are not listed start empty.
    pub initial_state: BTreeMap<Compartment, f64>,
    #[serde(default = "default_horizon")]
    pub horizon: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default)]
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ForcingFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influx_1: Option<ForcingFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influx_2: Option<ForcingFunction>,
    #[serde(default)]
    pub output: ExtractOptions,
}

impl Scenario {
    /// Reads and validates a scenario file.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IoError` if the file cannot be opened,
    /// `CocircError::JsonError` if it is not a valid scenario, and the errors of
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Scenario, CocircError> {
        let file = File::open(path)?;
        let scenario: Scenario = serde_json::from_reader(BufReader::new(file))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// # Errors
    ///
    /// Returns `CocircError::JsonError` if `json` is not a valid scenario, and the errors of
    /// [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Scenario, CocircError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks parameters, initial state and integration settings.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::ParameterError` for an out of range parameter and
    /// `CocircError::ConfigError` for an unusable initial state, step, horizon or output
    /// setting.
    pub fn validate(&self) -> Result<(), CocircError> {
        self.parameters.validate()?;
        validate_initial_state(&self.initial_state())?;
        self.integrator().num_steps(self.horizon)?;
        self.output.validate()
    }

    #[must_use]
    pub fn initial_state(&self) -> State {
        let mut state = State::default();
        for (&compartment, &value) in &self.initial_state {
            state[compartment] = value;
        }
        state
    }

    #[must_use]
    pub fn integrator(&self) -> Integrator {
        Integrator::new(self.step, self.method)
    }

    /// The model described by the scenario. Missing forcing functions keep the neutral
    /// defaults.
    #[must_use]
    pub fn model(&self) -> EpidemicModel {
        let mut model = EpidemicModel::new(self.parameters);
        for (driver, forcing) in [
            (Driver::Contact, &self.contact),
            (Driver::Influx1, &self.influx_1),
            (Driver::Influx2, &self.influx_2),
        ] {
            if let Some(forcing) = forcing {
                *model.driver_mut(driver) = forcing.clone();
            }
        }
        model
    }
}

/// Checks that every compartment is a finite non-negative fraction and that they sum to 1.
///
/// # Errors
///
/// Returns `CocircError::ConfigError` naming the first problem found.
pub fn validate_initial_state(state: &State) -> Result<(), CocircError> {
    for compartment in Compartment::iter() {
        let value = state[compartment];
        if !(value.is_finite() && value >= 0.0) {
            return Err(CocircError::ConfigError(format!(
                "initial value of {compartment} must be a finite number >= 0, got {value}"
            )));
        }
    }
    let total = state.total();
    if !almost_eq(total, 1.0, MASS_TOLERANCE) {
        return Err(CocircError::ConfigError(format!(
            "initial state must sum to 1, got {total}"
        )));
    }
    Ok(())
}
