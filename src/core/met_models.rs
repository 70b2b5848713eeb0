//! Closed-form models used to derive the sky temperature, ground temperature and projected
//! sun elevation channels of the meteorological history from typical-year weather data.
//!
//! Sky and ground models follow Slauch, Deceglie, Silverman and Ferry, "Spectrally-selective
//! mirrors with combined optical and thermal benefit for photovoltaic module thermal
//! management", ACS Photonics (2018), with coefficients fitted in Golden, CO.

use crate::core::units::KELVIN_OFFSET;
use crate::errors::AngleTableError;
use interp::interp;
use itertools::Itertools;
use std::f64::consts::PI;

/// Water vapour pressure in Pa from the dew point in deg C (Tetens), over water at or above
/// freezing and over ice below it.
pub fn vapour_pressure(dew_point: f64) -> f64 {
    if dew_point >= 0. {
        610.78 * ((17.27 * dew_point) / (dew_point + 237.3)).exp()
    } else {
        610.78 * ((21.875 * dew_point) / (dew_point + 265.5)).exp()
    }
}

/// Ratio of global horizontal to extraterrestrial horizontal irradiance. Night-time samples,
/// where the ratio is undefined, count as clear.
pub fn clearness_index(ghi: f64, extraterrestrial: f64) -> f64 {
    let index = ghi / extraterrestrial;
    if index.is_finite() {
        index
    } else {
        1.
    }
}

/// Effective sky temperature in K.
///
/// Arguments:
/// * `dew_point` - in deg C
/// * `clearness_index` - see [`clearness_index`]
/// * `ambient_temperature` - in deg C
pub fn sky_temperature(dew_point: f64, clearness_index: f64, ambient_temperature: f64) -> f64 {
    const A: [f64; 4] = [76.56, 10.59, 4.557, 0.4437];

    A[0] + A[1] * vapour_pressure(dew_point).ln() - A[2] * clearness_index
        + A[3] * (ambient_temperature + KELVIN_OFFSET)
}

/// Ground surface temperature in K from ambient temperature (deg C) and global horizontal
/// irradiance (W/m2).
pub fn ground_temperature(ambient_temperature: f64, ghi: f64) -> f64 {
    ambient_temperature - 1.362 + 1.287e-2 * ghi + KELVIN_OFFSET
}

/// Sun elevation projected into the plane containing the vertical and the module normal, for
/// a fixed-tilt array. All angles in radians. The result lies in [0, pi]: 0 with the sun
/// behind the horizon, pi/2 with the sun in the plane of the rows.
pub fn projected_sun_elevation(elevation: f64, azimuth: f64, array_azimuth: f64) -> f64 {
    elevation
        .tan()
        .atan2(-(azimuth + (PI - array_azimuth)).cos())
        .clamp(0., PI)
}

/// Hemispherical average of `y(theta)`, with `theta` the zenith angle in degrees, weighted by
/// `sin(theta)` and integrated with the trapezium rule on a 1 degree grid from 0 to 90.
/// Values outside the sampled angles are extrapolated linearly.
pub fn hemispherical_average(theta: &[f64], y: &[f64]) -> Result<f64, AngleTableError> {
    check_angle_table(theta, y)?;

    let grid: Vec<f64> = (0..=90).map(f64::from).collect();
    let values: Vec<f64> = grid
        .iter()
        .map(|&angle| interpolate_or_extrapolate(theta, y, angle))
        .collect();
    let radians: Vec<f64> = grid.iter().map(|angle| angle.to_radians()).collect();

    let weighted: Vec<f64> = values
        .iter()
        .zip(&radians)
        .map(|(value, angle)| value * angle.sin())
        .collect();
    let weights: Vec<f64> = radians.iter().map(|angle| angle.sin()).collect();

    Ok(trapezium(&weighted, &radians) / trapezium(&weights, &radians))
}

/// A usable angle table has at least two strictly increasing finite angles and one finite
/// value per angle.
pub fn check_angle_table(theta: &[f64], y: &[f64]) -> Result<(), AngleTableError> {
    if theta.len() < 2 {
        return Err(AngleTableError::TooFewAngles { found: theta.len() });
    }
    if y.len() != theta.len() {
        return Err(AngleTableError::MismatchedLengths {
            angles: theta.len(),
            values: y.len(),
        });
    }
    if let Some((&angle, _)) = theta
        .iter()
        .zip(y)
        .find(|(angle, value)| !(angle.is_finite() && value.is_finite()))
    {
        return Err(AngleTableError::NonFiniteEntry { angle });
    }
    if let Some((&previous, &current)) = theta
        .iter()
        .tuple_windows()
        .find(|(previous, current)| current <= previous)
    {
        return Err(AngleTableError::NonIncreasingAngle { previous, current });
    }

    Ok(())
}

/// Linear interpolation inside the table and linear extrapolation from the two end points
/// outside it. The table must have passed [`check_angle_table`].
pub(crate) fn interpolate_or_extrapolate(theta: &[f64], y: &[f64], angle: f64) -> f64 {
    let last = theta.len() - 1;
    let line_through = |i: usize, j: usize| {
        y[i] + (y[j] - y[i]) * (angle - theta[i]) / (theta[j] - theta[i])
    };

    if angle < theta[0] {
        line_through(0, 1)
    } else if angle > theta[last] {
        line_through(last - 1, last)
    } else {
        interp(theta, y, angle)
    }
}

fn trapezium(y: &[f64], x: &[f64]) -> f64 {
    y.iter()
        .zip(x)
        .tuple_windows()
        .map(|((y0, x0), (y1, x1))| 0.5 * (y0 + y1) * (x1 - x0))
        .sum()
}
