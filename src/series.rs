//! The output of one integration run.

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::compartment::{Compartment, Disease, State};
use crate::integrator::Method;

/// Generates one accessor per compartment, named after it in lower case.
macro_rules! compartment_accessors {
    ($($compartment:ident),* $(,)?) => {
        ::paste::paste! {
            $(
                #[doc = concat!(
                    "Values of the `",
                    stringify!($compartment),
                    "` compartment, aligned with [`TimeSeries::time`]."
                )]
                #[must_use]
                pub fn [<$compartment:lower>](&self) -> Vec<f64> {
                    self.compartment(Compartment::$compartment)
                }
            )*
        }
    };
}

/// States sampled at every step of a fixed-step run, from `t = 0` to the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    step: f64,
    method: Method,
    times: Vec<f64>,
    states: Vec<State>,
}

/// One row of a compartment report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[allow(non_snake_case)]
pub struct SampleRecord {
    pub t: f64,
    pub SS: f64,
    pub SI: f64,
    pub SR: f64,
    pub IS: f64,
    pub II: f64,
    pub IR: f64,
    pub RS: f64,
    pub RI: f64,
    pub RR: f64,
}

impl SampleRecord {
    #[must_use]
    pub fn new(t: f64, state: &State) -> Self {
        use Compartment as C;
        SampleRecord {
            t,
            SS: state[C::SS],
            SI: state[C::SI],
            SR: state[C::SR],
            IS: state[C::IS],
            II: state[C::II],
            IR: state[C::IR],
            RS: state[C::RS],
            RI: state[C::RI],
            RR: state[C::RR],
        }
    }
}

impl TimeSeries {
    pub(crate) fn with_capacity(step: f64, method: Method, capacity: usize) -> Self {
        TimeSeries {
            step,
            method,
            times: Vec::with_capacity(capacity),
            states: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, t: f64, state: State) {
        self.times.push(t);
        self.states.push(state);
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The last sample, if any.
    #[must_use]
    pub fn last(&self) -> Option<(f64, &State)> {
        Some((*self.times.last()?, self.states.last()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &State)> + '_ {
        self.times.iter().copied().zip(self.states.iter())
    }

    #[must_use]
    pub fn compartment(&self, compartment: Compartment) -> Vec<f64> {
        self.states.iter().map(|s| s[compartment]).collect()
    }

    compartment_accessors!(SS, SI, SR, IS, II, IR, RS, RI, RR);

    /// Fraction infectious with `disease` at each sample.
    #[must_use]
    pub fn prevalence(&self, disease: Disease) -> Vec<f64> {
        self.states.iter().map(|s| s.prevalence(disease)).collect()
    }

    /// Total population mass at each sample.
    #[must_use]
    pub fn totals(&self) -> Vec<f64> {
        self.states.iter().map(State::total).collect()
    }

    /// Largest deviation of the total mass from its initial value.
    #[must_use]
    pub fn max_mass_drift(&self) -> f64 {
        let Some(first) = self.states.first() else {
            return 0.0;
        };
        let initial = first.total();
        self.states
            .iter()
            .map(|s| (s.total() - initial).abs())
            .fold(0.0, f64::max)
    }

    /// Index and compartment of the first value that is NaN or outside `[0, 1]`.
    #[must_use]
    pub fn first_out_of_range(&self) -> Option<(usize, Compartment)> {
        self.states
            .iter()
            .enumerate()
            .find_map(|(i, s)| s.first_out_of_range().map(|c| (i, c)))
    }

    pub fn records(&self) -> impl Iterator<Item = SampleRecord> + '_ {
        self.iter().map(|(t, s)| SampleRecord::new(t, s))
    }

    /// Column names in report order.
    #[must_use]
    pub fn column_names() -> Vec<&'static str> {
        std::iter::once("t")
            .chain(Compartment::iter().map(<&'static str>::from))
            .collect()
    }
}
