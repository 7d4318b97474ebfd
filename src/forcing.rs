//! Time-dependent forcing functions.
//!
//! A [`ForcingFunction`] is a scalar function of time used to drive the model from
//! outside: the contact modulator `k(t)` and the per-disease influx `Φ1(t)`, `Φ2(t)`.
//! It is built from a starting value plus two kinds of primitives:
//!
//! * A *change segment* `(center, half_width, target)` moves the running value to `target`
//!   with a smooth step that starts at `center - half_width` and is complete at
//!   `center + half_width`. Segments are chained: the value a segment starts from is the
//!   target of the previous segment, or [`ForcingFunction::initial`] for the first one.
//! * An *event pulse* `(mean, spread, amplitude)` adds a Gaussian bump of height `amplitude`
//!   centered at `mean`. Pulses are independent of each other and of the segment chain.
//!
//! Every primitive is at least twice continuously differentiable so the right-hand side of
//! the ODE stays smooth. Overlapping primitives simply add up.
//!
//! ```
//! use cocirc::forcing::ForcingFunction;
//!
//! // A lockdown halving contacts around day 100, plus a short importation spike.
//! let mut k = ForcingFunction::new(1.0);
//! k.add_change_segment(100.0, 7.0, 0.5);
//! let spike = k.add_event_pulse(30.0, 2.0, 0.25);
//! assert_eq!(k.evaluate(0.0), 1.0);
//! assert!((k.evaluate(200.0) - 0.5).abs() < 1e-12);
//! k.update_event_pulse(spike, 40.0, 2.0, 0.25).unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CocircError;

/// Smallest half-width or spread used when evaluating a primitive. Narrower primitives are
/// widened to this value so a zero width never divides by zero.
pub const MIN_WIDTH: f64 = 1e-3;

/// Handle to a change segment, valid for the lifetime of the function that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId(pub usize);

/// Handle to an event pulse, valid for the lifetime of the function that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeSegment {
    pub center: f64,
    pub half_width: f64,
    pub target: f64,
}

impl ChangeSegment {
    /// Progress of the transition at time `t`, from 0 before the segment to 1 after it.
    #[must_use]
    pub fn progress(&self, t: f64) -> f64 {
        let half_width = self.half_width.max(MIN_WIDTH);
        let u = (t - self.center + half_width) / (2.0 * half_width);
        smootherstep(u)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventPulse {
    pub mean: f64,
    pub spread: f64,
    pub amplitude: f64,
}

impl EventPulse {
    /// Contribution of the pulse at time `t`.
    #[must_use]
    pub fn value(&self, t: f64) -> f64 {
        let spread = self.spread.max(MIN_WIDTH);
        let z = (t - self.mean) / spread;
        self.amplitude * (-0.5 * z * z).exp()
    }
}

/// Quintic smooth step on `[0, 1]`, clamped outside. First and second derivatives vanish
/// at both ends.
fn smootherstep(u: f64) -> f64 {
    if u <= 0.0 {
        0.0
    } else if u >= 1.0 {
        1.0
    } else {
        u * u * u * (u * (u * 6.0 - 15.0) + 10.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingFunction {
    initial: f64,
    #[serde(default)]
    changes: Vec<ChangeSegment>,
    #[serde(default)]
    events: Vec<EventPulse>,
}

impl ForcingFunction {
    #[must_use]
    pub fn new(initial: f64) -> Self {
        ForcingFunction {
            initial,
            changes: Vec::new(),
            events: Vec::new(),
        }
    }

    /// A function that is `value` everywhere.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        ForcingFunction::new(value)
    }

    /// The value before the first change segment starts.
    #[must_use]
    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn set_initial(&mut self, initial: f64) {
        self.initial = initial;
    }

    #[must_use]
    pub fn change_segments(&self) -> &[ChangeSegment] {
        &self.changes
    }

    #[must_use]
    pub fn event_pulses(&self) -> &[EventPulse] {
        &self.events
    }

    /// Returns the value of the function at time `t`.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        let mut value = self.initial;
        let mut from = self.initial;
        for segment in &self.changes {
            value += (segment.target - from) * segment.progress(t);
            from = segment.target;
        }
        value + self.events.iter().map(|e| e.value(t)).sum::<f64>()
    }

    /// Evaluates the function at each of `times`.
    pub fn sample<I>(&self, times: I) -> Vec<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        times.into_iter().map(|t| self.evaluate(t)).collect()
    }

    pub fn add_change_segment(&mut self, center: f64, half_width: f64, target: f64) -> ChangeId {
        self.changes.push(ChangeSegment {
            center,
            half_width,
            target,
        });
        ChangeId(self.changes.len() - 1)
    }

    /// Replaces the fields of an existing change segment in place.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IndexError` if `id` was not issued by this function.
    pub fn update_change_segment(
        &mut self,
        id: ChangeId,
        center: f64,
        half_width: f64,
        target: f64,
    ) -> Result<(), CocircError> {
        let segment = self
            .changes
            .get_mut(id.0)
            .ok_or(CocircError::IndexError {
                kind: "change segment",
                index: id.0,
            })?;
        *segment = ChangeSegment {
            center,
            half_width,
            target,
        };
        Ok(())
    }

    pub fn add_event_pulse(&mut self, mean: f64, spread: f64, amplitude: f64) -> EventId {
        self.events.push(EventPulse {
            mean,
            spread,
            amplitude,
        });
        EventId(self.events.len() - 1)
    }

    /// Replaces the fields of an existing event pulse in place.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::IndexError` if `id` was not issued by this function.
    pub fn update_event_pulse(
        &mut self,
        id: EventId,
        mean: f64,
        spread: f64,
        amplitude: f64,
    ) -> Result<(), CocircError> {
        let pulse = self.events.get_mut(id.0).ok_or(CocircError::IndexError {
            kind: "event pulse",
            index: id.0,
        })?;
        *pulse = EventPulse {
            mean,
            spread,
            amplitude,
        };
        Ok(())
    }
}

impl Default for ForcingFunction {
    fn default() -> Self {
        ForcingFunction::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;

    fn lockdown() -> ForcingFunction {
        let mut f = ForcingFunction::new(1.0);
        f.add_change_segment(50.0, 5.0, 0.2);
        f
    }

    #[test]
    fn constant_without_primitives() {
        let f = ForcingFunction::constant(0.7);
        for t in [-1e6, 0.0, 3.5, 1e6] {
            assert_eq!(f.evaluate(t), 0.7);
        }
    }

    #[test]
    fn change_segment_is_monotonic_and_settles() {
        let f = lockdown();
        let mut previous = f.evaluate(45.0);
        assert_almost_eq!(previous, 1.0, 1e-12);
        let mut t = 45.0;
        while t <= 55.0 {
            let value = f.evaluate(t);
            assert!(value <= previous, "not monotonic at t={t}");
            assert!((0.2..=1.0).contains(&value));
            previous = value;
            t += 0.1;
        }
        assert_almost_eq!(f.evaluate(55.0), 0.2, 1e-12);
        for t in [0.0, 20.0, 39.9] {
            assert_almost_eq!(f.evaluate(t), 1.0, 1e-9);
        }
        for t in [60.1, 100.0, 3600.0] {
            assert_almost_eq!(f.evaluate(t), 0.2, 1e-9);
        }
        assert_almost_eq!(f.evaluate(50.0), 0.6, 1e-12);
    }

    #[test]
    fn change_segment_is_continuous() {
        let f = lockdown();
        let h = 1e-6;
        for t in [44.999, 45.0, 47.3, 50.0, 54.9, 55.0, 55.001] {
            assert!((f.evaluate(t + h) - f.evaluate(t - h)).abs() < 1e-5);
        }
    }

    #[test]
    fn segments_chain_from_previous_target() {
        let mut f = ForcingFunction::new(1.0);
        f.add_change_segment(10.0, 2.0, 0.5);
        f.add_change_segment(30.0, 2.0, 0.8);
        assert_almost_eq!(f.evaluate(0.0), 1.0, 1e-12);
        assert_almost_eq!(f.evaluate(20.0), 0.5, 1e-12);
        assert_almost_eq!(f.evaluate(40.0), 0.8, 1e-12);

        // Changing the initial value only shifts the part before the first segment.
        f.set_initial(2.0);
        assert_almost_eq!(f.evaluate(0.0), 2.0, 1e-12);
        assert_almost_eq!(f.evaluate(20.0), 0.5, 1e-12);
    }

    #[test]
    fn overlapping_segments_add_linearly() {
        let mut f = ForcingFunction::new(0.0);
        f.add_change_segment(10.0, 5.0, 1.0);
        f.add_change_segment(10.0, 5.0, 3.0);
        // Both halfway: 0.5 * (1 - 0) + 0.5 * (3 - 1)
        assert_almost_eq!(f.evaluate(10.0), 1.5, 1e-12);
        assert_almost_eq!(f.evaluate(20.0), 3.0, 1e-12);
    }

    #[test]
    fn event_pulse_peaks_and_decays() {
        let mut f = ForcingFunction::new(1.0);
        f.add_event_pulse(2160.0, 200.0, -0.8);
        assert_almost_eq!(f.evaluate(2160.0), 0.2, 1e-12);
        assert!(f.evaluate(2000.0) > 0.2 && f.evaluate(2000.0) < 1.0);
        assert_almost_eq!(f.evaluate(0.0), 1.0, 1e-9);
        assert_almost_eq!(
            f.evaluate(2160.0 - 123.0),
            f.evaluate(2160.0 + 123.0),
            1e-12
        );
    }

    #[test]
    fn pulses_add_on_top_of_segments() {
        let mut f = lockdown();
        f.add_event_pulse(100.0, 3.0, 0.5);
        f.add_event_pulse(100.0, 3.0, 0.25);
        assert_almost_eq!(f.evaluate(100.0), 0.2 + 0.75, 1e-12);
    }

    #[test]
    fn zero_width_primitives_are_finite() {
        let mut f = ForcingFunction::new(1.0);
        f.add_change_segment(10.0, 0.0, 0.0);
        f.add_event_pulse(20.0, 0.0, 0.5);
        for t in [9.0, 10.0, 11.0, 19.999, 20.0, 20.001] {
            assert!(f.evaluate(t).is_finite());
        }
        assert_eq!(f.evaluate(9.0), 1.0);
        assert_eq!(f.evaluate(11.0), 0.0);
        assert_almost_eq!(f.evaluate(20.0), 0.5, 1e-12);
    }

    #[test]
    fn update_is_in_place_and_idempotent() {
        let mut f = ForcingFunction::new(1.0);
        let first = f.add_change_segment(10.0, 2.0, 0.5);
        let second = f.add_change_segment(30.0, 2.0, 0.8);
        assert_eq!((first, second), (ChangeId(0), ChangeId(1)));

        f.update_change_segment(first, 12.0, 3.0, 0.4).unwrap();
        let after_once: Vec<f64> = f.sample((0..60).map(f64::from));
        f.update_change_segment(first, 12.0, 3.0, 0.4).unwrap();
        let after_twice: Vec<f64> = f.sample((0..60).map(f64::from));
        assert_eq!(after_once, after_twice);

        assert_eq!(f.change_segments().len(), 2);
        assert_eq!(f.change_segments()[1].target, 0.8);
    }

    #[test]
    fn updating_unknown_index_fails_and_leaves_function_unchanged() {
        let mut f = lockdown();
        let before = f.clone();
        let err = f.update_change_segment(ChangeId(1), 0.0, 1.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            CocircError::IndexError {
                kind: "change segment",
                index: 1
            }
        ));
        let err = f.update_event_pulse(EventId(0), 0.0, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, CocircError::IndexError { index: 0, .. }));
        assert_eq!(f, before);
    }

    #[test]
    fn deserializes_with_missing_lists() {
        let f: ForcingFunction = serde_json::from_str(r#"{"initial": 0.5}"#).unwrap();
        assert_eq!(f, ForcingFunction::new(0.5));
        let f: ForcingFunction = serde_json::from_str(
            r#"{"initial": 1.0, "changes": [{"center": 50.0, "half_width": 5.0, "target": 0.2}]}"#,
        )
        .unwrap();
        assert_eq!(f, lockdown());
    }
}
