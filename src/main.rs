extern crate pvtherm;

use clap::Parser;
use pvtherm::input::{run_config_from_file, InputPaths, RunConfig};
use pvtherm::output::FileOutput;
use pvtherm::run_project;
use pvtherm::solver::CommandBackend;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct PvthermArgs {
    /// Directory holding TOMCAT_tilt.txt and TOMCAT_input.csv [default: the executable's directory]
    #[arg(long, short)]
    base_dir: Option<PathBuf>,
    /// JSON run configuration overriding module properties, solver settings and costs
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Where ModelOutput_* files are written [default: the base directory]
    #[arg(long, short)]
    output_dir: Option<PathBuf>,
    /// Write the model description and stop before solving
    #[arg(long, short, default_value_t = false)]
    assemble_only: bool,
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = PvthermArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let paths = match args.base_dir {
        Some(dir) => InputPaths::in_directory(dir),
        None => InputPaths::beside_executable()?,
    };
    let config = match args.config {
        Some(path) => run_config_from_file(&path)?,
        None => RunConfig::default(),
    };
    let output_dir = args.output_dir.unwrap_or_else(|| paths.base_dir.clone());
    let output = FileOutput::in_directory(output_dir.clone());

    let backend = match (&config.backend, args.assemble_only) {
        (_, true) => None,
        (Some(backend_config), false) => {
            Some(CommandBackend::new(backend_config.clone(), output_dir))
        }
        (None, false) => {
            warn!("no solver backend in the run configuration; only the model description will be written");
            None
        }
    };

    let outcome = run_project(&paths, &config, backend.as_ref(), &output)?;

    if let Some(summary) = outcome.summary {
        println!(
            "Mean cell temperature: {:.2} degC",
            summary.mean_cell_temperature
        );
        println!(
            "Max cell temperature: {:.2} degC",
            summary.max_cell_temperature
        );
        println!("Energy: {:.1} Wh/m2", summary.energy);
        println!("Specific yield: {:.1} kWh/kW", summary.specific_yield);
    }
    if let Some(lcoe) = outcome.lcoe {
        println!("LCOE: {lcoe:.4} $/kWh");
    }

    Ok(())
}
