use crate::core::met_history::{MetChannel, MetSource};
use crate::core::power::ElectricalModel;
use crate::core::results::{POWER_OUTPUT_KEY, TEMPERATURE_OUTPUT_KEY};
use crate::core::units::{kelvin_to_celsius, SECONDS_PER_HOUR};
use crate::errors::PostprocessingError;
use crate::output::Output;
use crate::solver::Solution;
use csv::WriterBuilder;
use itertools::Itertools;
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info};

/// Headline figures from one solved year.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ResultsSummary {
    /// deg C
    pub mean_cell_temperature: f64,
    /// deg C
    pub max_cell_temperature: f64,
    /// Wh/m2 over the solved period
    pub energy: f64,
    /// kWh per kW of nameplate capacity
    pub specific_yield: f64,
}

/// Cell temperature and electrical power at each solution time.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultsTable {
    pub times: Vec<f64>,
    /// deg C
    pub cell_temperature: Vec<f64>,
    /// W/m2
    pub power: Vec<f64>,
}

impl ResultsTable {
    pub fn from_solution(
        solution: &Solution,
        met: &impl MetSource,
        electrical: &ElectricalModel,
    ) -> Result<Self, PostprocessingError> {
        let cell_temperature = solution
            .cell_temperature
            .iter()
            .map(|&temp| kelvin_to_celsius(temp))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PostprocessingError::new(e.into()))?;

        let power = solution
            .times
            .iter()
            .zip(&solution.cell_temperature)
            .map(|(&t, &temp)| {
                electrical.power(
                    met.value(MetChannel::Poai, t),
                    met.value(MetChannel::CurrentFactor, t),
                    temp,
                )
            })
            .collect();

        Ok(Self {
            times: solution.times.clone(),
            cell_temperature,
            power,
        })
    }

    pub fn summary(&self, electrical: &ElectricalModel) -> ResultsSummary {
        let count = self.cell_temperature.len().max(1) as f64;
        let mean_cell_temperature = self.cell_temperature.iter().sum::<f64>() / count;
        let max_cell_temperature = self
            .cell_temperature
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        // trapezium rule, W/m2 * s -> Wh/m2
        let energy = self
            .times
            .iter()
            .zip(&self.power)
            .tuple_windows()
            .map(|((t0, p0), (t1, p1))| 0.5 * (p0 + p1) * (t1 - t0))
            .sum::<f64>()
            / SECONDS_PER_HOUR as f64;

        ResultsSummary {
            mean_cell_temperature,
            max_cell_temperature,
            energy,
            // nameplate is 1000 W/m2 at the STC efficiency
            specific_yield: energy / (1000. * electrical.efficiency_stc),
        }
    }
}

/// Write the temperature and power tables and return the summary of the run.
pub fn write_results(
    solution: &Solution,
    met: &impl MetSource,
    electrical: &ElectricalModel,
    output: &impl Output,
) -> Result<ResultsSummary, PostprocessingError> {
    let table = ResultsTable::from_solution(solution, met, electrical)?;

    if !output.is_noop() {
        write_series(
            output.writer_for_key(TEMPERATURE_OUTPUT_KEY, "csv")?,
            ("cell temperature", "[degC]"),
            &table.times,
            &table.cell_temperature,
        )?;
        write_series(
            output.writer_for_key(POWER_OUTPUT_KEY, "csv")?,
            ("power", "[W/m2]"),
            &table.times,
            &table.power,
        )?;
        debug!("wrote {} result rows", table.times.len());
    }

    let summary = table.summary(electrical);
    info!(
        "mean cell temperature {:.1} degC, yield {:.0} kWh/kW",
        summary.mean_cell_temperature, summary.specific_yield
    );

    Ok(summary)
}

fn write_series(
    writer: impl Write,
    (heading, unit): (&str, &str),
    times: &[f64],
    values: &[f64],
) -> anyhow::Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record(["time", heading])?;
    writer.write_record(["[s]", unit])?;
    for (time, value) in times.iter().zip(values) {
        writer.write_record([time.to_string(), value.to_string()])?;
    }
    writer.flush()?;

    Ok(())
}
