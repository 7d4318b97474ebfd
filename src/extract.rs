//! Display series for charting.
//!
//! Charts do not need every step of a run, and they plot time in years with prevalence per
//! thousand. [`extract`] keeps every `stride`-th sample and rescales it; nothing else is
//! transformed.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::compartment::{Compartment, Disease, NUM_COMPARTMENTS};
use crate::error::CocircError;
use crate::series::TimeSeries;

/// Prevalence is reported per thousand.
pub const CASES_SCALE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractOptions {
    /// Keep samples whose index is a multiple of `stride`.
    pub stride: usize,
    /// Divisor applied to time, 360 turns days into years.
    pub time_scale: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            stride: 10,
            time_scale: 360.0,
        }
    }
}

impl ExtractOptions {
    /// # Errors
    ///
    /// Returns `CocircError::ConfigError` for a zero stride or a non-positive time scale.
    pub fn validate(&self) -> Result<(), CocircError> {
        if self.stride == 0 {
            return Err(CocircError::ConfigError("stride must be at least 1".to_string()));
        }
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(CocircError::ConfigError(format!(
                "time scale must be a positive finite number, got {}",
                self.time_scale
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplaySeries {
    /// Prevalence per thousand, one series per disease.
    pub new_cases: [Vec<Point>; 2],
    /// Raw fractions, in [`Compartment`] order.
    pub compartments: [Vec<Point>; NUM_COMPARTMENTS],
}

impl DisplaySeries {
    #[must_use]
    pub fn new_cases(&self, disease: Disease) -> &[Point] {
        &self.new_cases[disease.index()]
    }

    #[must_use]
    pub fn compartment(&self, compartment: Compartment) -> &[Point] {
        &self.compartments[compartment.index()]
    }

    /// Number of kept samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.new_cases[0].len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Subsamples and rescales `series`.
///
/// # Errors
///
/// Returns `CocircError::ConfigError` if `options` are invalid.
pub fn extract(
    series: &TimeSeries,
    options: &ExtractOptions,
) -> Result<DisplaySeries, CocircError> {
    options.validate()?;
    let mut display = DisplaySeries::default();
    for (t, state) in series.iter().step_by(options.stride) {
        let x = t / options.time_scale;
        for disease in Disease::iter() {
            display.new_cases[disease.index()].push(Point {
                x,
                y: state.prevalence(disease) * CASES_SCALE,
            });
        }
        for compartment in Compartment::iter() {
            display.compartments[compartment.index()].push(Point {
                x,
                y: state[compartment],
            });
        }
    }
    Ok(display)
}
