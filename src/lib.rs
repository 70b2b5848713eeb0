pub mod core;
pub mod errors;
pub mod input;
pub mod met_input;
pub mod output;
pub mod postprocess;
pub mod read_met_file;
pub mod solver;

#[cfg(test)]
mod tests;

use crate::core::met_history::{MetHistory, MetSource};
use crate::core::model::{assemble_model, ModelDescription, ModelInputs};
use crate::core::power::ElectricalModel;
use crate::core::study::SolverConfig;
use crate::errors::{PostprocessingError, PvthermError, SolveError};
use crate::input::{read_tilt_file, InputPaths, RunConfig};
use crate::output::Output;
use crate::postprocess::{write_results, ResultsSummary};
use crate::read_met_file::met_history_from_file;
use crate::solver::SolverBackend;
use anyhow::anyhow;
use std::io::{BufWriter, Write};
use tracing::{info, warn};

/// Output key for the serialized model description.
pub const DESCRIPTION_OUTPUT_KEY: &str = "Description";

#[derive(Debug)]
pub struct ProjectOutcome {
    pub model: ModelDescription,
    /// absent when no solver backend was available
    pub summary: Option<ResultsSummary>,
    /// $/kWh, when cost inputs were configured and the model was solved
    pub lcoe: Option<f64>,
}

/// Load the side-channel inputs and assemble the model for them, without a study.
pub fn assemble_project(
    paths: &InputPaths,
    config: &RunConfig,
) -> Result<(ModelDescription, MetHistory), PvthermError> {
    let tilt = read_tilt_file(&paths.tilt_file)?;
    let met_history = met_history_from_file(&paths.met_history)?;

    let module = &config.module;
    let inputs = ModelInputs {
        parameters: module.parameter_table(tilt, &config.extra_parameters)?,
        array: module.array_geometry(tilt),
        met_history: paths.met_history.clone(),
    };

    Ok((assemble_model(&inputs)?, met_history))
}

/// Attach the transient study described by `solver` to an assembled model, write the
/// description out, solve it and post-process the cell temperature into the temperature and
/// power tables. Returns the studied model along with the summary.
pub fn run_study(
    model: ModelDescription,
    solver: &SolverConfig,
    met: &impl MetSource,
    electrical: &ElectricalModel,
    backend: &impl SolverBackend,
    output: &impl Output,
) -> Result<(ModelDescription, ResultsSummary), PvthermError> {
    let model = model.with_study(solver.clone())?;
    let output_count = model
        .study
        .as_ref()
        .map_or(0, |study| study.output_count);
    if !output.is_noop() {
        write_description(&model, output).map_err(PostprocessingError::new)?;
    }

    let solution = backend.solve(&model).map_err(SolveError::new)?;
    if solution.is_empty() {
        return Err(SolveError::new(anyhow!("solver backend returned no output times")).into());
    }
    if solution.len() != output_count {
        warn!(
            "solver backend returned {} output times, the study asked for {output_count}",
            solution.len()
        );
    }

    let summary = write_results(&solution, met, electrical, output)?;

    Ok((model, summary))
}

/// Assemble the model from the files in `paths`, then study it when a backend is given. Without
/// a backend the model is written out with its study attached and nothing is solved.
pub fn run_project(
    paths: &InputPaths,
    config: &RunConfig,
    backend: Option<&impl SolverBackend>,
    output: &impl Output,
) -> Result<ProjectOutcome, PvthermError> {
    let (model, met_history) = assemble_project(paths, config)?;

    let Some(backend) = backend else {
        let model = model.with_study(config.solver.clone())?;
        if !output.is_noop() {
            write_description(&model, output).map_err(PostprocessingError::new)?;
        }
        info!("no solver backend configured; stopping after model assembly");
        return Ok(ProjectOutcome {
            model,
            summary: None,
            lcoe: None,
        });
    };

    let electrical = config.module.electrical_model();
    let (model, summary) = run_study(
        model,
        &config.solver,
        &met_history,
        &electrical,
        backend,
        output,
    )?;
    let lcoe = config
        .lcoe
        .map(|costs| costs.with_energy_yield(summary.specific_yield).lcoe());
    if let Some(lcoe) = lcoe {
        info!("levelised cost of energy {lcoe:.4} $/kWh");
    }

    Ok(ProjectOutcome {
        model,
        summary: Some(summary),
        lcoe,
    })
}

fn write_description(model: &ModelDescription, output: &impl Output) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(output.writer_for_key(DESCRIPTION_OUTPUT_KEY, "json")?);
    serde_json::to_writer_pretty(&mut writer, model)?;
    writer.flush()?;

    Ok(())
}
