//! The rate parameters of the two-disease model.
//!
//! [`ModelParameters`] is a plain record with one named field per parameter. Every field also
//! has a stable string name (see [`ParameterName`]) so callers that only know names, such as a
//! UI binding or a scenario file, can address it without reflection. Range checks live here
//! rather than in the model: the model evaluates whatever it is given.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::compartment::Disease;
use crate::error::CocircError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelParameters {
    /// Transmission rate.
    pub beta_1: f64,
    pub beta_2: f64,
    /// Recovery rate.
    pub gamma_1: f64,
    pub gamma_2: f64,
    /// Rate at which immunity wanes.
    pub omega_1: f64,
    pub omega_2: f64,
    /// Cross-immunity: the fraction by which recovery from the other disease reduces
    /// susceptibility to this one.
    pub sigma_1: f64,
    pub sigma_2: f64,
    /// Amplitude of seasonal transmission.
    pub nu_1: f64,
    pub nu_2: f64,
    /// Day of the year at which seasonal transmission peaks.
    pub d0_1: f64,
    pub d0_2: f64,
    /// Weight of the perceived risk from each disease.
    pub theta_1: f64,
    pub theta_2: f64,
    /// Contact rate that remains when perceived risk is very high.
    pub k_min: f64,
    /// How strongly `k(t)` acts on each disease.
    pub kappa_1: f64,
    pub kappa_2: f64,
    /// Prevalence at which perceived risk starts to bite.
    pub h_thres: f64,
    /// Sharpness of the perceived-risk curve around `h_thres`.
    pub epsilon: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        ModelParameters {
            beta_1: 0.30,
            beta_2: 0.25,
            gamma_1: 0.10,
            gamma_2: 0.10,
            omega_1: 1.0 / 360.0,
            omega_2: 1.0 / 360.0,
            sigma_1: 0.0,
            sigma_2: 0.0,
            nu_1: 0.2,
            nu_2: 0.2,
            d0_1: 0.0,
            d0_2: 0.0,
            theta_1: 1.0,
            theta_2: 1.0,
            k_min: 0.5,
            kappa_1: 1.0,
            kappa_2: 0.5,
            h_thres: 0.01,
            epsilon: 0.002,
        }
    }
}

/// The parameters that belong to a single disease.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiseaseParameters {
    pub beta: f64,
    pub gamma: f64,
    pub omega: f64,
    pub sigma: f64,
    pub nu: f64,
    pub d0: f64,
    pub theta: f64,
    pub kappa: f64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, IntoStaticStr,
)]
pub enum ParameterName {
    #[strum(serialize = "beta_1")]
    Beta1,
    #[strum(serialize = "beta_2")]
    Beta2,
    #[strum(serialize = "gamma_1")]
    Gamma1,
    #[strum(serialize = "gamma_2")]
    Gamma2,
    #[strum(serialize = "omega_1")]
    Omega1,
    #[strum(serialize = "omega_2")]
    Omega2,
    #[strum(serialize = "sigma_1")]
    Sigma1,
    #[strum(serialize = "sigma_2")]
    Sigma2,
    #[strum(serialize = "nu_1")]
    Nu1,
    #[strum(serialize = "nu_2")]
    Nu2,
    #[strum(serialize = "d0_1")]
    SeasonalPeak1,
    #[strum(serialize = "d0_2")]
    SeasonalPeak2,
    #[strum(serialize = "theta_1")]
    Theta1,
    #[strum(serialize = "theta_2")]
    Theta2,
    #[strum(serialize = "k_min")]
    KMin,
    #[strum(serialize = "kappa_1")]
    Kappa1,
    #[strum(serialize = "kappa_2")]
    Kappa2,
    #[strum(serialize = "h_thres")]
    HThres,
    #[strum(serialize = "epsilon")]
    Epsilon,
}

/// Accepted values for a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bounds {
    NonNegative,
    Positive,
    Fraction,
    Finite,
}

impl Bounds {
    fn contains(self, value: f64) -> bool {
        match self {
            Bounds::NonNegative => value.is_finite() && value >= 0.0,
            Bounds::Positive => value.is_finite() && value > 0.0,
            Bounds::Fraction => (0.0..=1.0).contains(&value),
            Bounds::Finite => value.is_finite(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Bounds::NonNegative => "a finite value >= 0",
            Bounds::Positive => "a finite value > 0",
            Bounds::Fraction => "a value in [0, 1]",
            Bounds::Finite => "a finite value",
        }
    }
}

impl ParameterName {
    fn bounds(self) -> Bounds {
        use ParameterName::*;
        match self {
            Beta1 | Beta2 | Gamma1 | Gamma2 | Omega1 | Omega2 | Theta1 | Theta2 => {
                Bounds::NonNegative
            }
            Sigma1 | Sigma2 | Nu1 | Nu2 | KMin | Kappa1 | Kappa2 => Bounds::Fraction,
            SeasonalPeak1 | SeasonalPeak2 => Bounds::Finite,
            HThres | Epsilon => Bounds::Positive,
        }
    }

    /// Checks `value` against the accepted range of this parameter.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::ParameterError` naming the parameter and its range.
    pub fn check(self, value: f64) -> Result<(), CocircError> {
        let bounds = self.bounds();
        if bounds.contains(value) {
            Ok(())
        } else {
            Err(CocircError::ParameterError(format!(
                "{self} must be {}, got {value}",
                bounds.describe()
            )))
        }
    }
}

impl ModelParameters {
    #[must_use]
    pub fn get(&self, name: ParameterName) -> f64 {
        *self.field(name)
    }

    /// Sets a parameter after checking its range. The record is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::ParameterError` if `value` is out of range.
    pub fn set(&mut self, name: ParameterName, value: f64) -> Result<(), CocircError> {
        name.check(value)?;
        *self.field_mut(name) = value;
        Ok(())
    }

    /// Looks a parameter up by its string name, e.g. `"beta_1"`.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::ParameterError` if there is no parameter with that name.
    pub fn get_by_name(&self, name: &str) -> Result<f64, CocircError> {
        Ok(self.get(parse_name(name)?))
    }

    /// Sets a parameter by its string name, e.g. `"beta_1"`.
    ///
    /// # Errors
    ///
    /// Returns `CocircError::ParameterError` for an unknown name or an out of range value.
    pub fn set_by_name(&mut self, name: &str, value: f64) -> Result<(), CocircError> {
        self.set(parse_name(name)?, value)
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns the error for the first out of range parameter.
    pub fn validate(&self) -> Result<(), CocircError> {
        for name in ParameterName::iter() {
            name.check(self.get(name))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn disease(&self, disease: Disease) -> DiseaseParameters {
        match disease {
            Disease::One => DiseaseParameters {
                beta: self.beta_1,
                gamma: self.gamma_1,
                omega: self.omega_1,
                sigma: self.sigma_1,
                nu: self.nu_1,
                d0: self.d0_1,
                theta: self.theta_1,
                kappa: self.kappa_1,
            },
            Disease::Two => DiseaseParameters {
                beta: self.beta_2,
                gamma: self.gamma_2,
                omega: self.omega_2,
                sigma: self.sigma_2,
                nu: self.nu_2,
                d0: self.d0_2,
                theta: self.theta_2,
                kappa: self.kappa_2,
            },
        }
    }

    fn field(&self, name: ParameterName) -> &f64 {
        use ParameterName::*;
        match name {
            Beta1 => &self.beta_1,
            Beta2 => &self.beta_2,
            Gamma1 => &self.gamma_1,
            Gamma2 => &self.gamma_2,
            Omega1 => &self.omega_1,
            Omega2 => &self.omega_2,
            Sigma1 => &self.sigma_1,
            Sigma2 => &self.sigma_2,
            Nu1 => &self.nu_1,
            Nu2 => &self.nu_2,
            SeasonalPeak1 => &self.d0_1,
            SeasonalPeak2 => &self.d0_2,
            Theta1 => &self.theta_1,
            Theta2 => &self.theta_2,
            KMin => &self.k_min,
            Kappa1 => &self.kappa_1,
            Kappa2 => &self.kappa_2,
            HThres => &self.h_thres,
            Epsilon => &self.epsilon,
        }
    }

    fn field_mut(&mut self, name: ParameterName) -> &mut f64 {
        use ParameterName::*;
        match name {
            Beta1 => &mut self.beta_1,
            Beta2 => &mut self.beta_2,
            Gamma1 => &mut self.gamma_1,
            Gamma2 => &mut self.gamma_2,
            Omega1 => &mut self.omega_1,
            Omega2 => &mut self.omega_2,
            Sigma1 => &mut self.sigma_1,
            Sigma2 => &mut self.sigma_2,
            Nu1 => &mut self.nu_1,
            Nu2 => &mut self.nu_2,
            SeasonalPeak1 => &mut self.d0_1,
            SeasonalPeak2 => &mut self.d0_2,
            Theta1 => &mut self.theta_1,
            Theta2 => &mut self.theta_2,
            KMin => &mut self.k_min,
            Kappa1 => &mut self.kappa_1,
            Kappa2 => &mut self.kappa_2,
            HThres => &mut self.h_thres,
            Epsilon => &mut self.epsilon,
        }
    }
}

fn parse_name(name: &str) -> Result<ParameterName, CocircError> {
    ParameterName::from_str(name)
        .map_err(|_| CocircError::ParameterError(format!("unknown parameter {name:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ModelParameters::default().validate().unwrap();
    }

    #[test]
    fn names_round_trip() {
        let mut params = ModelParameters::default();
        for (i, name) in ParameterName::iter().enumerate() {
            let as_str: &'static str = name.into();
            assert_eq!(ParameterName::from_str(as_str).unwrap(), name);
            // Every name maps to its own field.
            let value = 0.01 * (i + 1) as f64;
            params.set(name, value).unwrap();
            assert_eq!(params.get_by_name(as_str).unwrap(), value);
        }
    }

    #[test]
    fn set_by_name_updates_field() {
        let mut params = ModelParameters::default();
        params.set_by_name("beta_2", 0.42).unwrap();
        params.set_by_name("d0_1", 90.0).unwrap();
        assert_eq!(params.beta_2, 0.42);
        assert_eq!(params.d0_1, 90.0);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut params = ModelParameters::default();
        let err = params.set_by_name("beta_3", 0.1).unwrap_err();
        assert!(matches!(err, CocircError::ParameterError(ref m) if m.contains("beta_3")));
    }

    #[test]
    fn out_of_range_value_is_rejected_and_not_stored() {
        let mut params = ModelParameters::default();
        assert!(params.set(ParameterName::Sigma1, 1.5).is_err());
        assert!(params.set(ParameterName::Gamma2, -0.1).is_err());
        assert!(params.set(ParameterName::Epsilon, 0.0).is_err());
        assert!(params.set(ParameterName::Beta1, f64::NAN).is_err());
        assert_eq!(params, ModelParameters::default());
    }

    #[test]
    fn validate_catches_direct_field_writes() {
        let params = ModelParameters {
            k_min: 2.0,
            ..ModelParameters::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, CocircError::ParameterError(ref m) if m.contains("k_min")));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params: ModelParameters =
            serde_json::from_str(r#"{"beta_1": 0.5, "sigma_2": 0.3}"#).unwrap();
        assert_eq!(params.beta_1, 0.5);
        assert_eq!(params.sigma_2, 0.3);
        assert_eq!(params.gamma_1, ModelParameters::default().gamma_1);
        assert!(serde_json::from_str::<ModelParameters>(r#"{"bogus": 1.0}"#).is_err());
    }

    #[test]
    fn per_disease_view() {
        let params = ModelParameters::default();
        let two = params.disease(Disease::Two);
        assert_eq!(two.beta, 0.25);
        assert_eq!(two.kappa, 0.5);
    }
}
