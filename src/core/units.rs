use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_YEAR: u32 = 365;
pub const SECONDS_PER_DAY: u32 = SECONDS_PER_HOUR * HOURS_PER_DAY;

pub(crate) const KELVIN_OFFSET: f64 = 273.15;
/// Cell temperature at standard test conditions, in K.
pub const STC_CELL_TEMPERATURE: f64 = 298.15;

pub fn celsius_to_kelvin(temp_c: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_c < -KELVIN_OFFSET {
        Err(BelowAbsoluteZeroError::from_c(temp_c))
    } else {
        Ok(temp_c + KELVIN_OFFSET)
    }
}

pub fn kelvin_to_celsius(temp_k: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_k < 0.0 {
        Err(BelowAbsoluteZeroError::from_k(temp_k))
    } else {
        Ok(temp_k - KELVIN_OFFSET)
    }
}

#[derive(Debug, Error)]
#[error("A temperature of {k}ºK/{}ºC was encountered, which is less than absolute zero", k - 273.15)]
pub struct BelowAbsoluteZeroError {
    k: f64,
}

impl BelowAbsoluteZeroError {
    fn from_k(k: f64) -> Self {
        Self { k }
    }

    fn from_c(c: f64) -> Self {
        Self { k: c + KELVIN_OFFSET }
    }
}

/// Array tilt from horizontal, in degrees. 0 is a flat module; 90 (vertical) is excluded
/// because the row pitch collapses to zero there.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tilt(f64);

impl Tilt {
    pub fn new(degrees: f64) -> Result<Self, TiltError> {
        if !degrees.is_finite() || !(0. ..90.).contains(&degrees) {
            return Err(TiltError::OutOfRange(degrees));
        }

        Ok(Self(degrees))
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }

    pub fn radians(&self) -> f64 {
        self.0.to_radians()
    }
}

impl Display for Tilt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for Tilt {
    type Error = TiltError;

    fn try_from(degrees: f64) -> Result<Self, Self::Error> {
        Self::new(degrees)
    }
}

impl From<Tilt> for f64 {
    fn from(tilt: Tilt) -> Self {
        tilt.0
    }
}

impl FromStr for Tilt {
    type Err = TiltError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let degrees = trimmed
            .parse::<f64>()
            .map_err(|_| TiltError::NotANumber(trimmed.to_string()))?;
        Self::new(degrees)
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TiltError {
    #[error("Tilt must be at least 0 and less than 90 degrees, got {0}")]
    OutOfRange(f64),
    #[error("Tilt must be a bare number of degrees, got {0:?}")]
    NotANumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_do_correct_temperature_conversions() {
        assert_eq!(
            celsius_to_kelvin(20.0).unwrap(),
            293.15,
            "incorrect conversion of Celsius to Kelvin"
        );
        assert_eq!(
            kelvin_to_celsius(5.0).unwrap(),
            -268.15,
            "incorrect conversion to Kelvin to Celsius"
        );
        for i in -10..80 {
            assert_eq!(
                kelvin_to_celsius(celsius_to_kelvin(i as f64).unwrap()).unwrap(),
                i as f64,
                "round trip temperature conversion (C to K to C) failed to return orig value"
            );
        }
    }

    #[rstest]
    fn should_reject_temperatures_below_absolute_zero() {
        assert!(celsius_to_kelvin(-300.).is_err());
        assert!(kelvin_to_celsius(-1.).is_err());
    }

    mod tilt {
        use super::*;
        use pretty_assertions::assert_eq;

        #[rstest]
        #[case("40", 40.)]
        #[case("20.5\n", 20.5)]
        #[case("  0 ", 0.)]
        fn test_tilt_parses_bare_degrees(#[case] text: &str, #[case] expected: f64) {
            assert_eq!(text.parse::<Tilt>().unwrap().degrees(), expected);
        }

        #[rstest]
        #[case(-1.)]
        #[case(90.)]
        #[case(f64::NAN)]
        fn test_tilt_out_of_range(#[case] degrees: f64) {
            assert!(matches!(Tilt::new(degrees), Err(TiltError::OutOfRange(_))));
        }

        #[rstest]
        fn test_tilt_rejects_unit_suffix() {
            assert_eq!(
                "40[deg]".parse::<Tilt>(),
                Err(TiltError::NotANumber("40[deg]".to_string()))
            );
        }

        #[rstest]
        fn test_tilt_radians() {
            approx::assert_relative_eq!(
                Tilt::new(45.).unwrap().radians(),
                std::f64::consts::FRAC_PI_4,
                max_relative = 1e-12
            );
        }
    }
}
