use crate::core::model::ModelDescription;
use anyhow::{bail, Context};
use csv::ReaderBuilder as CsvReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const MODEL_FILE_NAME: &str = "model.json";
const SOLUTION_FILE_NAME: &str = "solution.csv";

/// Cell temperature history of a solved model.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// s
    pub times: Vec<f64>,
    /// surface average over the cell layer, K
    pub cell_temperature: Vec<f64>,
}

impl Solution {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Something that can mesh and solve a model description.
pub trait SolverBackend: Debug {
    fn solve(&self, model: &ModelDescription) -> anyhow::Result<Solution>;
}

/// An external program that reads a model description and writes a solution.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    pub program: PathBuf,
    /// passed before the model and solution paths
    #[serde(default)]
    pub args: Vec<String>,
}

/// Runs `program [args..] <model.json> <solution.csv>` in a working directory and reads the
/// solution back.
#[derive(Clone, Debug)]
pub struct CommandBackend {
    config: BackendConfig,
    work_dir: PathBuf,
}

impl CommandBackend {
    pub fn new(config: BackendConfig, work_dir: PathBuf) -> Self {
        Self { config, work_dir }
    }
}

impl SolverBackend for CommandBackend {
    fn solve(&self, model: &ModelDescription) -> anyhow::Result<Solution> {
        let model_path = self.work_dir.join(MODEL_FILE_NAME);
        let solution_path = self.work_dir.join(SOLUTION_FILE_NAME);

        let model_file = File::create(&model_path)
            .with_context(|| format!("creating {}", model_path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(model_file), model)?;
        debug!("wrote model description to {}", model_path.display());

        info!("running solver backend {}", self.config.program.display());
        let status = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(&model_path)
            .arg(&solution_path)
            .current_dir(&self.work_dir)
            .status()
            .with_context(|| format!("starting {}", self.config.program.display()))?;
        if !status.success() {
            bail!(
                "{} exited with {status}",
                self.config.program.display()
            );
        }

        solution_from_file(&solution_path)
    }
}

pub fn solution_from_file(path: &Path) -> anyhow::Result<Solution> {
    let file = File::open(path).with_context(|| format!("opening solution {}", path.display()))?;

    solution_from_reader(BufReader::new(file))
        .with_context(|| format!("reading solution {}", path.display()))
}

/// Two columns: time in s and cell temperature in K. A header row is allowed.
pub fn solution_from_reader(file: impl Read) -> anyhow::Result<Solution> {
    let mut reader = CsvReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut solution = Solution {
        times: vec![],
        cell_temperature: vec![],
    };
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let fields = (record.get(0), record.get(1));
        let (Some(time), Some(temperature)) = fields else {
            bail!("row {} has {} columns, expected 2", i + 1, record.len());
        };
        match (time.parse::<f64>(), temperature.parse::<f64>()) {
            (Ok(time), Ok(temperature)) => {
                if !(time.is_finite() && temperature.is_finite()) {
                    bail!("row {} holds a non-finite value: {time}, {temperature}", i + 1);
                }
                if let Some(&previous) = solution.times.last() {
                    if time <= previous {
                        bail!(
                            "row {} has time {time}, which does not follow {previous}",
                            i + 1
                        );
                    }
                }
                solution.times.push(time);
                solution.cell_temperature.push(temperature);
            }
            _ if i == 0 => continue,
            _ => bail!("row {} is not numeric: {time:?}, {temperature:?}", i + 1),
        }
    }

    Ok(solution)
}
