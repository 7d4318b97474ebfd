//! Handle-based access to models, forcing functions and results.
//!
//! A front end never owns the numerical objects directly. It asks a [`Session`] for a
//! model or a forcing function and gets back a small copyable handle, then mutates the
//! object through the session. Model and forcing handles stay valid for the lifetime of the
//! session. A series handle stays valid until the series is released with
//! [`Session::release_series`]; released slots are never reused.
//!
//! A model refers to its forcing functions by handle, so a forcing function edited after
//! it was bound is picked up by the next run. Every run integrates a snapshot of the model
//! taken when the run starts; later edits never reach a run in progress.
//!
//! ```
//! use cocirc::session::Session;
//! use cocirc::model::Driver;
//!
//! let mut session = Session::new();
//! let model = session.new_model();
//! session.set_parameter(model, "beta_1", 0.4).unwrap();
//!
//! let lockdown = session.new_forcing(1.0);
//! session.add_change(lockdown, 100.0, 10.0, 0.3).unwrap();
//! session.set_forcing(model, Driver::Contact, lockdown).unwrap();
//!
//! let mut initial = [0.0; 9];
//! initial[0] = 0.999;
//! initial[3] = 0.001;
//! let series = session.run(model, initial, 1.0, 200.0).unwrap();
//! assert_eq!(session.series(series).unwrap().len(), 201);
//! ```

use std::str::FromStr;

use crate::cancel::{CancellationToken, RunCoordinator, RunTicket};
use crate::compartment::{State, NUM_COMPARTMENTS};
use crate::error::CocircError;
use crate::forcing::{ChangeId, EventId, ForcingFunction};
use crate::integrator::{Integrator, Method};
use crate::log::trace;
use crate::model::{Driver, EpidemicModel};
use crate::parameters::ModelParameters;
use crate::series::TimeSeries;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            #[must_use]
            pub fn index(self) -> usize {
                self.0
            }

            fn missing(self) -> CocircError {
                CocircError::IndexError {
                    kind: $kind,
                    index: self.0,
                }
            }
        }
    };
}

define_handle!(
    /// Refers to a model owned by a [`Session`].
    ModelHandle,
    "model"
);
define_handle!(
    /// Refers to a forcing function owned by a [`Session`].
    ForcingHandle,
    "forcing function"
);
define_handle!(
    /// Refers to the result of a run.
    SeriesHandle,
    "series"
);

#[derive(Debug, Clone, Default)]
struct ModelEntry {
    parameters: ModelParameters,
    drivers: [Option<ForcingHandle>; 3],
}

fn driver_slot(driver: Driver) -> usize {
    match driver {
        Driver::Contact => 0,
        Driver::Influx1 => 1,
        Driver::Influx2 => 2,
    }
}

#[derive(Debug, Default)]
pub struct Session {
    models: Vec<ModelEntry>,
    forcings: Vec<ForcingFunction>,
    series: Vec<Option<TimeSeries>>,
    method: Method,
    coordinator: RunCoordinator,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Session::default()
    }

    /// Integration scheme used by [`run`](Self::run).
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    // Models

    /// Creates a model with default parameters and no forcing bound.
    pub fn new_model(&mut self) -> ModelHandle {
        self.models.push(ModelEntry::default());
        ModelHandle(self.models.len() - 1)
    }

    fn model_entry(&self, handle: ModelHandle) -> Result<&ModelEntry, CocircError> {
        self.models.get(handle.0).ok_or_else(|| handle.missing())
    }

    fn model_entry_mut(&mut self, handle: ModelHandle) -> Result<&mut ModelEntry, CocircError> {
        self.models.get_mut(handle.0).ok_or_else(|| handle.missing())
    }

    /// Sets a parameter by name, e.g. `"beta_1"` or `"k_min"`.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle and
    /// `CocircError::ParameterError` for an unknown name or an out of range value. The
    /// parameter is left unchanged on error.
    pub fn set_parameter(
        &mut self,
        handle: ModelHandle,
        name: &str,
        value: f64,
    ) -> Result<(), CocircError> {
        self.model_entry_mut(handle)?
            .parameters
            .set_by_name(name, value)
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle and
    /// `CocircError::ParameterError` for an unknown name.
    pub fn parameter(&self, handle: ModelHandle, name: &str) -> Result<f64, CocircError> {
        self.model_entry(handle)?.parameters.get_by_name(name)
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle.
    pub fn parameters(&self, handle: ModelHandle) -> Result<&ModelParameters, CocircError> {
        Ok(&self.model_entry(handle)?.parameters)
    }

    /// Replaces all parameters of a model after validating them.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle and
    /// `CocircError::ParameterError` if a value is out of range.
    pub fn set_parameters(
        &mut self,
        handle: ModelHandle,
        parameters: ModelParameters,
    ) -> Result<(), CocircError> {
        parameters.validate()?;
        self.model_entry_mut(handle)?.parameters = parameters;
        Ok(())
    }

    /// Binds a forcing function to one of the model's drivers.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IndexError` if either handle is unknown.
    pub fn set_forcing(
        &mut self,
        handle: ModelHandle,
        driver: Driver,
        forcing: ForcingHandle,
    ) -> Result<(), CocircError> {
        self.forcing(forcing)?;
        self.model_entry_mut(handle)?.drivers[driver_slot(driver)] = Some(forcing);
        Ok(())
    }

    /// Same as [`set_forcing`](Self::set_forcing), with the driver given by name
    /// (`"k_t"`, `"Phi_1_t"` or `"Phi_2_t"`).
    ///
    /// # Errors
    ///
    /// Returns `CocircError::ParameterError` for an unknown driver name and
    /// `CocircError::IndexError` if either handle is unknown.
    pub fn set_forcing_by_name(
        &mut self,
        handle: ModelHandle,
        driver: &str,
        forcing: ForcingHandle,
    ) -> Result<(), CocircError> {
        let driver = Driver::from_str(driver)
            .map_err(|_| CocircError::ParameterError(format!("unknown driver '{driver}'")))?;
        self.set_forcing(handle, driver, forcing)
    }

    /// The forcing function bound to `driver`, if any.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle.
    pub fn bound_forcing(
        &self,
        handle: ModelHandle,
        driver: Driver,
    ) -> Result<Option<ForcingHandle>, CocircError> {
        Ok(self.model_entry(handle)?.drivers[driver_slot(driver)])
    }

    /// The model as it would be integrated right now. Unbound drivers keep the neutral
    /// forcing of [`EpidemicModel::new`].
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle.
    pub fn snapshot(&self, handle: ModelHandle) -> Result<EpidemicModel, CocircError> {
        let entry = self.model_entry(handle)?;
        let mut model = EpidemicModel::new(entry.parameters);
        for driver in [Driver::Contact, Driver::Influx1, Driver::Influx2] {
            if let Some(forcing) = entry.drivers[driver_slot(driver)] {
                *model.driver_mut(driver) = self.forcing(forcing)?.clone();
            }
        }
        Ok(model)
    }

    // Forcing functions

    pub fn new_forcing(&mut self, initial: f64) -> ForcingHandle {
        self.forcings.push(ForcingFunction::new(initial));
        ForcingHandle(self.forcings.len() - 1)
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle.
    pub fn forcing(&self, handle: ForcingHandle) -> Result<&ForcingFunction, CocircError> {
        self.forcings.get(handle.0).ok_or_else(|| handle.missing())
    }

    fn forcing_mut(&mut self, handle: ForcingHandle) -> Result<&mut ForcingFunction, CocircError> {
        self.forcings.get_mut(handle.0).ok_or_else(|| handle.missing())
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle.
    pub fn set_initial(&mut self, handle: ForcingHandle, initial: f64) -> Result<(), CocircError> {
        self.forcing_mut(handle)?.set_initial(initial);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle.
    pub fn add_change(
        &mut self,
        handle: ForcingHandle,
        center: f64,
        half_width: f64,
        target: f64,
    ) -> Result<ChangeId, CocircError> {
        Ok(self
            .forcing_mut(handle)?
            .add_change_segment(center, half_width, target))
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle or change segment.
    pub fn update_change(
        &mut self,
        handle: ForcingHandle,
        id: ChangeId,
        center: f64,
        half_width: f64,
        target: f64,
    ) -> Result<(), CocircError> {
        self.forcing_mut(handle)?
            .update_change_segment(id, center, half_width, target)
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle.
    pub fn add_event(
        &mut self,
        handle: ForcingHandle,
        mean: f64,
        spread: f64,
        amplitude: f64,
    ) -> Result<EventId, CocircError> {
        Ok(self
            .forcing_mut(handle)?
            .add_event_pulse(mean, spread, amplitude))
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle or event pulse.
    pub fn update_event(
        &mut self,
        handle: ForcingHandle,
        id: EventId,
        mean: f64,
        spread: f64,
        amplitude: f64,
    ) -> Result<(), CocircError> {
        self.forcing_mut(handle)?
            .update_event_pulse(id, mean, spread, amplitude)
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle.
    pub fn evaluate(&self, handle: ForcingHandle, t: f64) -> Result<f64, CocircError> {
        Ok(self.forcing(handle)?.evaluate(t))
    }

    // Runs

    /// Integrates a snapshot of `model` from `initial` with the session's method and stores
    /// the result.
    ///
    /// The initial state is taken as given; values outside `[0, 1]` are integrated and
    /// reported like any other overshoot.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown handle and
    /// `CocircError::ConfigError` for an unusable step or horizon.
    pub fn run(
        &mut self,
        model: ModelHandle,
        initial: [f64; NUM_COMPARTMENTS],
        step: f64,
        horizon: f64,
    ) -> Result<SeriesHandle, CocircError> {
        let ticket = self.coordinator.begin();
        self.run_with_ticket(model, initial, step, horizon, &ticket)
    }

    /// Starts a run request for work that happens outside the session. Starting a request
    /// cancels the token of the previous one.
    pub fn begin_run(&self) -> RunTicket {
        self.coordinator.begin()
    }

    /// Runs under `ticket` and stores the result only if no newer request was started in
    /// the meantime.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::Cancelled` if the ticket was superseded, otherwise the errors
    /// of [`run`](Self::run).
    pub fn run_with_ticket(
        &mut self,
        model: ModelHandle,
        initial: [f64; NUM_COMPARTMENTS],
        step: f64,
        horizon: f64,
        ticket: &RunTicket,
    ) -> Result<SeriesHandle, CocircError> {
        let snapshot = self.snapshot(model)?;
        let series = self.integrate(&snapshot, initial, step, horizon, &ticket.token)?;
        if !self.coordinator.is_current(ticket) {
            trace!("discarding result of superseded run {}", ticket.generation);
            return Err(CocircError::Cancelled);
        }
        Ok(self.store(series))
    }

    fn integrate(
        &self,
        model: &EpidemicModel,
        initial: [f64; NUM_COMPARTMENTS],
        step: f64,
        horizon: f64,
        token: &CancellationToken,
    ) -> Result<TimeSeries, CocircError> {
        Integrator::new(step, self.method).run_cancellable(
            model,
            State::new(initial),
            horizon,
            token,
        )
    }

    /// Keeps a series computed elsewhere, e.g. on a worker thread.
    pub fn store(&mut self, series: TimeSeries) -> SeriesHandle {
        self.series.push(Some(series));
        SeriesHandle(self.series.len() - 1)
    }

    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown or released handle.
    pub fn series(&self, handle: SeriesHandle) -> Result<&TimeSeries, CocircError> {
        self.series
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| handle.missing())
    }

    /// Hands a stored series back to the caller and frees its slot in the session. Other
    /// series handles are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IndexError` for an unknown or already released handle.
    pub fn release_series(&mut self, handle: SeriesHandle) -> Result<TimeSeries, CocircError> {
        let series = self
            .series
            .get_mut(handle.0)
            .and_then(Option::take)
            .ok_or_else(|| handle.missing())?;
        trace!("released series {}", handle.0);
        Ok(series)
    }

    /// Number of series currently held by the session.
    #[must_use]
    pub fn stored_series(&self) -> usize {
        self.series.iter().filter(|series| series.is_some()).count()
    }
}
