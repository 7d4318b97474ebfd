//! The nine joint compartments of the two-disease model.
//!
//! A person is Susceptible, Infectious or Recovered with respect to each of the two
//! diseases independently, so the population splits into the cross product of the two
//! status sets. Compartments are named by two letters, the first for disease 1 and the
//! second for disease 2: `SI` holds people susceptible to disease 1 and infectious with
//! disease 2. The order SS, SI, SR, IS, II, IR, RS, RI, RR is the layout of [`State`].

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Number of joint compartments.
pub const NUM_COMPARTMENTS: usize = Compartment::COUNT;

/// Infection status with respect to a single disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Status {
    Susceptible,
    Infectious,
    Recovered,
}

/// One of the two co-circulating diseases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum Disease {
    #[strum(to_string = "disease 1")]
    One,
    #[strum(to_string = "disease 2")]
    Two,
}

impl Disease {
    /// Zero based position, used to index per-disease arrays.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Disease::One => 0,
            Disease::Two => 1,
        }
    }

    #[must_use]
    pub fn other(self) -> Disease {
        match self {
            Disease::One => Disease::Two,
            Disease::Two => Disease::One,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    EnumCount,
    Display,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum Compartment {
    SS,
    SI,
    SR,
    IS,
    II,
    IR,
    RS,
    RI,
    RR,
}

impl Compartment {
    /// Position in [`State`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The compartment holding people with the given status for each disease.
    #[must_use]
    pub fn from_statuses(disease_1: Status, disease_2: Status) -> Compartment {
        use Status::{Infectious as I, Recovered as R, Susceptible as S};
        match (disease_1, disease_2) {
            (S, S) => Compartment::SS,
            (S, I) => Compartment::SI,
            (S, R) => Compartment::SR,
            (I, S) => Compartment::IS,
            (I, I) => Compartment::II,
            (I, R) => Compartment::IR,
            (R, S) => Compartment::RS,
            (R, I) => Compartment::RI,
            (R, R) => Compartment::RR,
        }
    }

    /// Status of people in this compartment with respect to `disease`.
    #[must_use]
    pub fn status(self, disease: Disease) -> Status {
        let letter = match disease {
            Disease::One => self.index() / 3,
            Disease::Two => self.index() % 3,
        };
        match letter {
            0 => Status::Susceptible,
            1 => Status::Infectious,
            _ => Status::Recovered,
        }
    }

    /// The compartment reached when this compartment's status for `disease` becomes `status`.
    #[must_use]
    pub fn with_status(self, disease: Disease, status: Status) -> Compartment {
        match disease {
            Disease::One => Compartment::from_statuses(status, self.status(Disease::Two)),
            Disease::Two => Compartment::from_statuses(self.status(Disease::One), status),
        }
    }

    /// Human readable label, e.g. "Susceptible - Infectious".
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Compartment::SS => "Susceptible - Susceptible",
            Compartment::SI => "Susceptible - Infectious",
            Compartment::SR => "Susceptible - Recovered",
            Compartment::IS => "Infectious - Susceptible",
            Compartment::II => "Infectious - Infectious",
            Compartment::IR => "Infectious - Recovered",
            Compartment::RS => "Recovered - Susceptible",
            Compartment::RI => "Recovered - Infectious",
            Compartment::RR => "Recovered - Recovered",
        }
    }
}

/// Population fractions for the nine compartments, in [`Compartment`] order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct State(pub [f64; NUM_COMPARTMENTS]);

impl State {
    #[must_use]
    pub fn new(values: [f64; NUM_COMPARTMENTS]) -> Self {
        State(values)
    }

    /// Everyone susceptible to both diseases except the given infectious fractions, which are
    /// placed in `IS` and `SI`.
    #[must_use]
    pub fn seeded(infectious_1: f64, infectious_2: f64) -> Self {
        let mut state = State::default();
        state[Compartment::SS] = 1.0 - infectious_1 - infectious_2;
        state[Compartment::IS] = infectious_1;
        state[Compartment::SI] = infectious_2;
        state
    }

    #[must_use]
    pub fn values(&self) -> &[f64; NUM_COMPARTMENTS] {
        &self.0
    }

    /// Fraction of the population infectious with `disease`, regardless of the other
    /// disease's status.
    #[must_use]
    pub fn prevalence(&self, disease: Disease) -> f64 {
        self.sum_where(disease, Status::Infectious)
    }

    /// Sum of the compartments whose status for `disease` is `status`.
    #[must_use]
    pub fn sum_where(&self, disease: Disease, status: Status) -> f64 {
        Compartment::iter()
            .filter(|c| c.status(disease) == status)
            .map(|c| self[c])
            .sum()
    }

    /// Total population mass. One for a well formed state.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }

    /// First compartment whose value is NaN or outside `[0, 1]`.
    #[must_use]
    pub fn first_out_of_range(&self) -> Option<Compartment> {
        Compartment::iter().find(|&c| !crate::numeric::is_fraction(self[c]))
    }

    /// `self + scale * rate`, the building block of the explicit integration schemes.
    #[must_use]
    pub fn add_scaled(&self, scale: f64, rate: &State) -> State {
        let mut out = *self;
        for (y, dy) in out.0.iter_mut().zip(rate.0.iter()) {
            *y += scale * dy;
        }
        out
    }
}

impl From<[f64; NUM_COMPARTMENTS]> for State {
    fn from(values: [f64; NUM_COMPARTMENTS]) -> Self {
        State(values)
    }
}

impl Index<Compartment> for State {
    type Output = f64;
    fn index(&self, compartment: Compartment) -> &f64 {
        &self.0[compartment.index()]
    }
}

impl IndexMut<Compartment> for State {
    fn index_mut(&mut self, compartment: Compartment) -> &mut f64 {
        &mut self.0[compartment.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn statuses_round_trip_through_compartments() {
        for c in Compartment::iter() {
            let rebuilt =
                Compartment::from_statuses(c.status(Disease::One), c.status(Disease::Two));
            assert_eq!(rebuilt, c);
        }
    }

    #[test]
    fn compartment_names_parse() {
        assert_eq!(Compartment::from_str("RI").unwrap(), Compartment::RI);
        assert!(Compartment::from_str("XX").is_err());
        assert_eq!(Compartment::IR.to_string(), "IR");
        assert_eq!(Compartment::IR.label(), "Infectious - Recovered");
    }

    #[test]
    fn prevalence_sums_infectious_compartments() {
        let state = State::new([0.1, 0.2, 0.0, 0.05, 0.01, 0.04, 0.3, 0.1, 0.2]);
        // IS + II + IR
        assert!((state.prevalence(Disease::One) - 0.10).abs() < 1e-12);
        // SI + II + RI
        assert!((state.prevalence(Disease::Two) - 0.31).abs() < 1e-12);
        assert!((state.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn seeded_state_sums_to_one() {
        let state = State::seeded(0.001, 0.002);
        assert!((state.total() - 1.0).abs() < 1e-15);
        assert_eq!(state[Compartment::IS], 0.001);
        assert_eq!(state[Compartment::SI], 0.002);
    }

    #[test]
    fn out_of_range_detection() {
        let mut state = State::seeded(0.0, 0.0);
        assert_eq!(state.first_out_of_range(), None);
        state[Compartment::RR] = -1e-9;
        assert_eq!(state.first_out_of_range(), Some(Compartment::RR));
        state[Compartment::SI] = f64::NAN;
        assert_eq!(state.first_out_of_range(), Some(Compartment::SI));
        assert!(!state.is_finite());
    }

    #[test]
    fn add_scaled_is_axpy() {
        let y = State::seeded(0.0, 0.0);
        let mut rate = State::default();
        rate[Compartment::SS] = -1.0;
        rate[Compartment::IS] = 1.0;
        let next = y.add_scaled(0.5, &rate);
        assert_eq!(next[Compartment::SS], 0.5);
        assert_eq!(next[Compartment::IS], 0.5);
    }
}
