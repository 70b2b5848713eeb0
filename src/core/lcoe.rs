//! Levelised cost of energy by discounted cash flow, with simple cost inputs.

use serde::{Deserialize, Serialize};
use serde_valid::Validate;

/// Balance-of-system costs for the chosen system type and location.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BosCosts {
    /// $/W
    #[validate(minimum = 0.)]
    pub power: f64,
    /// $/m2
    #[validate(minimum = 0.)]
    pub area: f64,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct LcoeInputs {
    /// $/m2
    #[validate(minimum = 0.)]
    pub cost_module: f64,
    /// $/kW/year
    #[validate(minimum = 0.)]
    pub cost_om: f64,
    /// %/year
    #[validate(minimum = 0.)]
    #[validate(maximum = 100.)]
    pub degradation_rate: f64,
    /// %
    #[validate(exclusive_minimum = -100.)]
    pub discount_rate: f64,
    /// kWh/kW/year, i.e. equivalent full-power hours
    #[validate(minimum = 0.)]
    pub energy_yield: f64,
    /// years
    #[validate(minimum = 1)]
    pub service_life: u32,
    /// %
    #[validate(exclusive_minimum = 0.)]
    #[validate(maximum = 100.)]
    pub efficiency: f64,
    #[validate]
    pub bos: BosCosts,
}

impl Default for LcoeInputs {
    fn default() -> Self {
        Self {
            cost_module: 1.15 * 58.78,
            cost_om: 15.40,
            degradation_rate: 0.36,
            discount_rate: 6.3,
            energy_yield: 1475.,
            service_life: 25,
            efficiency: 19.,
            bos: BosCosts {
                power: 0.,
                area: 0.,
            },
        }
    }
}

impl LcoeInputs {
    /// Cost in $/W spent in `year`: the installation in year 0, operation and maintenance
    /// after that.
    fn cost(&self, year: u32) -> f64 {
        if year == 0 {
            (self.cost_module + self.bos.area) / (10. * self.efficiency) + self.bos.power
        } else {
            self.cost_om / 1000.
        }
    }

    /// Energy in kWh/W delivered in `year`, degrading from the first year of operation.
    fn energy(&self, year: u32) -> f64 {
        if year == 0 {
            return 0.;
        }
        let remaining = (1. - self.degradation_rate / 100.).powi(year as i32 - 1);

        (self.energy_yield / 1000. * remaining).max(0.)
    }

    /// Levelised cost in $/kWh over the service life.
    pub fn lcoe(&self) -> f64 {
        let discount = |year: u32| (1. + self.discount_rate / 100.).powi(year as i32);
        let (total_cost, total_energy) = (0..=self.service_life).fold(
            (0., 0.),
            |(cost, energy), year| {
                (
                    cost + self.cost(year) / discount(year),
                    energy + self.energy(year) / discount(year),
                )
            },
        );

        total_cost / total_energy
    }

    /// The same system with the first-year yield taken from a simulation, in kWh/kW.
    pub fn with_energy_yield(self, energy_yield: f64) -> Self {
        Self {
            energy_yield,
            ..self
        }
    }
}
