use crate::core::units::STC_CELL_TEMPERATURE;
use serde::Serialize;

/// Electrical output of the cell layer, as the engine evaluates it at every time step. The
/// cell temperature enters through the domain average `aveop1(T)`, which closes the loop
/// between the power sink and the heat equation.
pub const POWER_EXPRESSION: &str = "poai(t*1[1/s])*current_factor(t*1[1/s])\
    *(efficiencyElectricalSTC*(1+efficiencyElectricalTempCo[1/K]*(aveop1(T)-298.15[K])))";

/// A named expression variable defined on the model component.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub expression: String,
    pub description: String,
}

impl Variable {
    pub fn power() -> Self {
        Self {
            name: "power".to_string(),
            expression: POWER_EXPRESSION.to_string(),
            description: "electrical power drawn from the cell layer".to_string(),
        }
    }
}

/// Electrical power in W/m2 from plane-of-array irradiance and the spatially averaged cell
/// temperature.
///
/// Arguments:
/// * `poai` - plane-of-array irradiance, in W/m2
/// * `current_factor` - per-timestep derating of the electrical current
/// * `efficiency_stc` - module efficiency at standard test conditions
/// * `temp_coefficient` - relative change in efficiency per K, usually negative
/// * `cell_temperature` - average cell temperature, in K
pub fn electrical_power(
    poai: f64,
    current_factor: f64,
    efficiency_stc: f64,
    temp_coefficient: f64,
    cell_temperature: f64,
) -> f64 {
    poai * current_factor
        * efficiency_stc
        * (1. + temp_coefficient * (cell_temperature - STC_CELL_TEMPERATURE))
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ElectricalModel {
    pub efficiency_stc: f64,
    pub temp_coefficient: f64,
}

impl ElectricalModel {
    pub fn power(&self, poai: f64, current_factor: f64, cell_temperature: f64) -> f64 {
        electrical_power(
            poai,
            current_factor,
            self.efficiency_stc,
            self.temp_coefficient,
            cell_temperature,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[rstest]
    fn test_power_at_ten_kelvin_above_stc() {
        assert_relative_eq!(
            electrical_power(1000., 1.0, 0.171, -0.0039, 308.15),
            164.331,
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn test_power_at_stc_is_nameplate() {
        let model = ElectricalModel {
            efficiency_stc: 0.171,
            temp_coefficient: -0.0039,
        };

        assert_relative_eq!(model.power(1000., 1.0, 298.15), 171.);
        assert_relative_eq!(model.power(1000., 0.5, 298.15), 85.5);
        assert_eq!(model.power(0., 1.0, 320.), 0.);
    }

    #[rstest]
    fn test_power_expression_references_cell_average() {
        let variable = Variable::power();

        assert!(variable.expression.contains("aveop1(T)-298.15[K]"));
        assert!(variable
            .expression
            .starts_with("poai(t*1[1/s])*current_factor(t*1[1/s])*"));
    }
}
