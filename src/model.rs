//! The two-disease SIRS model.
//!
//! Each disease follows S → I → R → S independently of the other disease's status, with
//! three couplings between them:
//!
//! * people who are not susceptible to the other disease (infectious with it or recovered
//!   from it) are protected by the cross-immunity fraction `σ`;
//! * both diseases share the exogenous contact modulator `k(t)`, scaled per disease by `κ`;
//! * people cut their contacts as prevalence rises (behavioral feedback), which makes the
//!   contact rate a function of the current state.
//!
//! The force of infection of disease `i` at time `t` is
//!
//! ```text
//! λ_i = β_i · (1 + κ_i (k(t) − 1)) · (1 + ν_i cos(2π (t − d0_i) / 360))
//!           · (c_i · prevalence_i + Φ_i(t) / 1000)
//! c_i = k_min + (1 − k_min) · relief(θ_i · prevalence_i)
//! ```
//!
//! where `relief` is the normalized softplus curve from [`behavioral_relief`]. The influx
//! `Φ_i` is given per thousand and acts as imported infectious pressure, so it moves people
//! between compartments without adding mass.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::compartment::{Compartment, Disease, State, Status};
use crate::forcing::ForcingFunction;
use crate::numeric::ln_1p_exp;
use crate::parameters::ModelParameters;

/// Length of the seasonal cycle, in time units (days).
pub const SEASON_LENGTH: f64 = 360.0;

/// Influx values are per thousand of the population.
pub const INFLUX_SCALE: f64 = 1000.0;

/// The exogenous drivers of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
pub enum Driver {
    /// Contact modulator `k(t)`.
    #[strum(serialize = "k_t")]
    Contact,
    /// External influx of disease 1, `Φ1(t)`.
    #[strum(serialize = "Phi_1_t")]
    Influx1,
    /// External influx of disease 2, `Φ2(t)`.
    #[strum(serialize = "Phi_2_t")]
    Influx2,
}

impl Driver {
    #[must_use]
    pub fn influx(disease: Disease) -> Driver {
        match disease {
            Disease::One => Driver::Influx1,
            Disease::Two => Driver::Influx2,
        }
    }
}

/// Values of the three drivers at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForcingValues {
    pub contact: f64,
    pub influx: [f64; 2],
}

impl Default for ForcingValues {
    /// No lockdown, no importation.
    fn default() -> Self {
        ForcingValues {
            contact: 1.0,
            influx: [0.0, 0.0],
        }
    }
}

/// Fraction of normal contacts kept at perceived risk `risk`, given the threshold and the
/// shape parameter of the softplus curve.
///
/// The curve is `softplus(h_thres − risk) / softplus(h_thres)` with
/// `softplus(x) = ε ln(1 + e^{x/ε})`. It is exactly 1 at zero risk, decreases strictly with
/// risk, and tends to 0 once risk is well past the threshold.
#[must_use]
pub fn behavioral_relief(risk: f64, h_thres: f64, epsilon: f64) -> f64 {
    ln_1p_exp((h_thres - risk) / epsilon) / ln_1p_exp(h_thres / epsilon)
}

/// Seasonal transmission multiplier, largest on day `d0`.
#[must_use]
pub fn seasonality(nu: f64, d0: f64, t: f64) -> f64 {
    1.0 + nu * (2.0 * std::f64::consts::PI * (t - d0) / SEASON_LENGTH).cos()
}

/// A parameter set together with the three forcing functions that drive it.
///
/// The model is read-only while it is integrated; every evaluation is a pure function of
/// its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpidemicModel {
    pub parameters: ModelParameters,
    pub contact: ForcingFunction,
    pub influx_1: ForcingFunction,
    pub influx_2: ForcingFunction,
}

impl Default for EpidemicModel {
    fn default() -> Self {
        EpidemicModel::new(ModelParameters::default())
    }
}

impl EpidemicModel {
    /// A model with unit contacts and no importation.
    #[must_use]
    pub fn new(parameters: ModelParameters) -> Self {
        EpidemicModel {
            parameters,
            contact: ForcingFunction::constant(1.0),
            influx_1: ForcingFunction::constant(0.0),
            influx_2: ForcingFunction::constant(0.0),
        }
    }

    #[must_use]
    pub fn driver(&self, driver: Driver) -> &ForcingFunction {
        match driver {
            Driver::Contact => &self.contact,
            Driver::Influx1 => &self.influx_1,
            Driver::Influx2 => &self.influx_2,
        }
    }

    pub fn driver_mut(&mut self, driver: Driver) -> &mut ForcingFunction {
        match driver {
            Driver::Contact => &mut self.contact,
            Driver::Influx1 => &mut self.influx_1,
            Driver::Influx2 => &mut self.influx_2,
        }
    }

    #[must_use]
    pub fn with_driver(mut self, driver: Driver, forcing: ForcingFunction) -> Self {
        *self.driver_mut(driver) = forcing;
        self
    }

    /// Evaluates the three forcing functions at `t`.
    #[must_use]
    pub fn forcing_at(&self, t: f64) -> ForcingValues {
        ForcingValues {
            contact: self.contact.evaluate(t),
            influx: [self.influx_1.evaluate(t), self.influx_2.evaluate(t)],
        }
    }

    /// Contact multiplier from behavioral feedback for `disease`, in `[k_min, 1]` for a
    /// state with non-negative prevalence.
    #[must_use]
    pub fn contact_multiplier(&self, disease: Disease, state: &State) -> f64 {
        let p = &self.parameters;
        let risk = p.disease(disease).theta * state.prevalence(disease);
        p.k_min + (1.0 - p.k_min) * behavioral_relief(risk, p.h_thres, p.epsilon)
    }

    /// Force of infection of `disease` on a fully susceptible person.
    #[must_use]
    pub fn force_of_infection(
        &self,
        disease: Disease,
        t: f64,
        state: &State,
        forcing: ForcingValues,
    ) -> f64 {
        let dp = self.parameters.disease(disease);
        let exogenous = 1.0 + dp.kappa * (forcing.contact - 1.0);
        let seasonal = seasonality(dp.nu, dp.d0, t);
        let pressure = self.contact_multiplier(disease, state) * state.prevalence(disease)
            + forcing.influx[disease.index()] / INFLUX_SCALE;
        dp.beta * exogenous * seasonal * pressure
    }

    /// Time derivative of `state` at `t`, given the driver values at `t`.
    #[must_use]
    pub fn derivatives(&self, t: f64, state: &State, forcing: ForcingValues) -> State {
        let mut rate = State::default();
        for disease in Disease::iter() {
            let dp = self.parameters.disease(disease);
            let lambda = self.force_of_infection(disease, t, state, forcing);
            for from in Compartment::iter() {
                let (to_status, per_capita) = match from.status(disease) {
                    Status::Susceptible => {
                        let protected = from.status(disease.other()) != Status::Susceptible;
                        let sigma = if protected { dp.sigma } else { 0.0 };
                        (Status::Infectious, (1.0 - sigma) * lambda)
                    }
                    Status::Infectious => (Status::Recovered, dp.gamma),
                    Status::Recovered => (Status::Susceptible, dp.omega),
                };
                let flow = per_capita * state[from];
                rate[from] -= flow;
                rate[from.with_status(disease, to_status)] += flow;
            }
        }
        rate
    }

    /// Right-hand side of the ODE: [`derivatives`](Self::derivatives) with the forcing
    /// functions evaluated at `t`.
    #[must_use]
    pub fn rhs(&self, t: f64, state: &State) -> State {
        self.derivatives(t, state, self.forcing_at(t))
    }

    /// `β / γ` for `disease`.
    #[must_use]
    pub fn basic_reproduction_number(&self, disease: Disease) -> f64 {
        let dp = self.parameters.disease(disease);
        dp.beta / dp.gamma
    }

    /// Prevalence at the endemic equilibrium of `disease` on its own, without forcing,
    /// seasonality, feedback or the other disease. Zero when `R0 <= 1`.
    #[must_use]
    pub fn endemic_prevalence(&self, disease: Disease) -> f64 {
        let dp = self.parameters.disease(disease);
        let r0 = self.basic_reproduction_number(disease);
        if r0 <= 1.0 {
            return 0.0;
        }
        dp.omega * (1.0 - 1.0 / r0) / (dp.gamma + dp.omega)
    }
}
