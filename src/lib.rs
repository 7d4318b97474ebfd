//! Two co-circulating diseases on a nine-compartment SIRS model
//!
//! `cocirc` integrates a deterministic model of two diseases spreading through the same
//! population. Each person is susceptible, infectious or recovered with respect to each
//! disease, which splits the population into nine [`Compartment`]s. The diseases interact
//! through cross-immunity and through shared contact behavior, and the model is driven by
//! three editable [`ForcingFunction`]s: a contact modulator `k(t)` and an external influx
//! `Φ(t)` for each disease.
//!
//! The crate is organized around a few pieces:
//! * [`ForcingFunction`]: a time-varying scalar built from smooth change segments and
//!   Gaussian event pulses, addressed by stable ids so a UI can edit them in place.
//! * [`EpidemicModel`]: the parameters and the right-hand side of the ODE, including the
//!   behavioral feedback that lowers contacts when prevalence is high.
//! * [`Integrator`]: fixed-step Runge-Kutta or Euler integration into a [`TimeSeries`].
//! * [`extract`](extract::extract): subsampling and rescaling for charts.
//! * [`Session`]: handle-based access to all of the above for front ends.
//!
//! Batch runs are described by a JSON [`Scenario`] and executed by the `cocirc` binary,
//! which writes the results as CSV (see [`runner`] and [`report`]).
pub mod cancel;
pub mod compartment;
pub mod error;
pub mod extract;
pub mod forcing;
pub mod integrator;
pub mod log;
pub mod macros;
pub mod model;
pub mod numeric;
pub mod parameters;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod series;
pub mod session;

pub use cancel::{CancellationToken, RunCoordinator};
pub use compartment::{Compartment, Disease, State};
pub use error::CocircError;
pub use extract::{DisplaySeries, ExtractOptions, Point};
pub use forcing::{ChangeId, EventId, ForcingFunction};
pub use integrator::{Integrator, Method};
pub use model::{Driver, EpidemicModel};
pub use parameters::{ModelParameters, ParameterName};
pub use scenario::Scenario;
pub use series::TimeSeries;
pub use session::{ForcingHandle, ModelHandle, SeriesHandle, Session};

pub use crate::log::{debug, error, info, trace, warn};
