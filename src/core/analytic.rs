use crate::core::geometry::ArrayGeometry;
use crate::core::met_history::{MetChannel, MetSource};
use serde::Serialize;
use std::f64::consts::PI;

/// A closed-form function of declared arguments, passed to the engine as an expression and
/// re-evaluated there at solve time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyticFunction {
    pub label: String,
    pub name: String,
    pub args: Vec<String>,
    pub arg_units: Vec<String>,
    pub fun_unit: Option<String>,
    pub expr: String,
}

pub const SHADE_EXPRESSION: &str = "if(elevation_projected(t)>0, \
    (mod(x+hAboveGround*cot(pi - elevation_projected(t)),rowPitch)>0\
    &&mod(x+hAboveGround*cot(pi - elevation_projected(t)),rowPitch)\
    +hModule*cot(pi - elevation_projected(t))*sin(tilt)<hModule*cos(tilt)), 1)";

pub const GROUND_TEMPERATURE_EXPRESSION: &str =
    "if(shade(x, t) && (temp(t) < temp_ground(t)), temp(t), temp_ground(t))";

impl AnalyticFunction {
    pub fn shade() -> Self {
        Self {
            label: "shade function".to_string(),
            name: "shade".to_string(),
            args: vec!["x".to_string(), "t".to_string()],
            arg_units: vec!["m".to_string(), "s".to_string()],
            fun_unit: None,
            expr: SHADE_EXPRESSION.to_string(),
        }
    }

    pub fn ground_temperature() -> Self {
        Self {
            label: "ground temperature".to_string(),
            name: "temp_ground_striped".to_string(),
            args: vec!["x".to_string(), "t".to_string()],
            arg_units: vec!["m".to_string(), "s".to_string()],
            fun_unit: Some("K".to_string()),
            expr: GROUND_TEMPERATURE_EXPRESSION.to_string(),
        }
    }
}

/// Whether ground position `x` (m) lies in the shadow of a module row at time `t` (s).
///
/// With the sun at or below the horizon of the module's plane of rotation, the whole ground
/// counts as shaded. Otherwise the module's shadow is projected onto the ground and repeated
/// every row pitch; `mod` is the Euclidean remainder so negative `x` wraps the same way.
pub fn shade(geometry: &ArrayGeometry, met: &impl MetSource, x: f64, t: f64) -> bool {
    let elevation = met.value(MetChannel::ElevationProjected, t);
    if elevation <= 0. {
        return true;
    }

    let cot = 1. / (PI - elevation).tan();
    let offset = (x + geometry.h_above_ground * cot).rem_euclid(geometry.row_pitch);

    offset > 0. && offset + geometry.h_module * cot * geometry.tilt.sin() < geometry.footprint()
}

/// Shaded ground that is warmer than the air takes the air temperature; everywhere else the
/// measured ground surface temperature applies.
pub fn select_ground_temperature(shaded: bool, ambient: f64, ground: f64) -> f64 {
    if shaded && ambient < ground {
        ambient
    } else {
        ground
    }
}

/// Ground surface temperature (K) at position `x` (m) and time `t` (s).
pub fn temp_ground_striped(geometry: &ArrayGeometry, met: &impl MetSource, x: f64, t: f64) -> f64 {
    select_ground_temperature(
        shade(geometry, met, x, t),
        met.value(MetChannel::Temp, t),
        met.value(MetChannel::TempGround, t),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::Tilt;
    use pretty_assertions::assert_eq;
    use rstest::*;

    struct ConstantMet {
        temp: f64,
        temp_ground: f64,
        elevation: f64,
    }

    impl MetSource for ConstantMet {
        fn value(&self, channel: MetChannel, _t: f64) -> f64 {
            match channel {
                MetChannel::Temp => self.temp,
                MetChannel::TempGround => self.temp_ground,
                MetChannel::ElevationProjected => self.elevation,
                _ => 0.,
            }
        }
    }

    #[fixture]
    fn array_geometry() -> ArrayGeometry {
        ArrayGeometry::new(Tilt::new(20.).unwrap(), 1., 0.5, 0.0045)
    }

    fn sun_at(elevation: f64) -> ConstantMet {
        ConstantMet {
            temp: 280.,
            temp_ground: 290.,
            elevation,
        }
    }

    fn x_grid() -> impl Iterator<Item = f64> {
        (0..400).map(|i| -5. + 0.025 * i as f64 + 0.0013)
    }

    #[rstest]
    #[case(true, 280., 290., 280.)]
    #[case(true, 295., 290., 290.)]
    #[case(false, 280., 290., 290.)]
    #[case(false, 295., 290., 290.)]
    fn test_select_ground_temperature(
        #[case] shaded: bool,
        #[case] ambient: f64,
        #[case] ground: f64,
        #[case] expected: f64,
    ) {
        assert_eq!(select_ground_temperature(shaded, ambient, ground), expected);
    }

    #[rstest]
    #[case(0.)]
    #[case(-0.2)]
    fn test_everything_shaded_with_sun_down(array_geometry: ArrayGeometry, #[case] elevation: f64) {
        let met = sun_at(elevation);

        assert!(x_grid().all(|x| shade(&array_geometry, &met, x, 0.)));
    }

    #[rstest]
    #[case(0.6)]
    #[case(1.2)]
    #[case(2.0)]
    fn test_shade_repeats_every_row_pitch(array_geometry: ArrayGeometry, #[case] elevation: f64) {
        let met = sun_at(elevation);

        for x in x_grid() {
            assert_eq!(
                shade(&array_geometry, &met, x, 0.),
                shade(&array_geometry, &met, x + array_geometry.row_pitch, 0.),
                "x = {x}"
            );
        }
    }

    #[rstest]
    fn test_shadow_is_striped(array_geometry: ArrayGeometry) {
        let met = sun_at(0.6);

        assert!(shade(&array_geometry, &met, 0., 0.));
        assert!(!shade(&array_geometry, &met, 0.3, 0.));
        assert!(!shade(&array_geometry, &met, 0.6, 0.));
        assert!(shade(&array_geometry, &met, 0.9, 0.));
    }

    #[rstest]
    fn test_temp_ground_striped_follows_shadow(array_geometry: ArrayGeometry) {
        let met = sun_at(0.6);

        assert_eq!(temp_ground_striped(&array_geometry, &met, 0., 0.), 280.);
        assert_eq!(temp_ground_striped(&array_geometry, &met, 0.3, 0.), 290.);
    }

    #[rstest]
    fn test_ground_temperature_function_calls_shade() {
        let function = AnalyticFunction::ground_temperature();

        assert_eq!(function.args, vec!["x", "t"]);
        assert_eq!(function.fun_unit.as_deref(), Some("K"));
        assert!(function.expr.starts_with("if(shade(x, t)"));
    }
}
