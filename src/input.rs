use crate::core::geometry::{ArrayGeometry, DomainId};
use crate::core::lcoe::LcoeInputs;
use crate::core::parameters::{Parameter, ParameterTable};
use crate::core::power::ElectricalModel;
use crate::core::study::SolverConfig;
use crate::core::units::Tilt;
use crate::errors::{InputError, ModelError};
use crate::solver::BackendConfig;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::info;

pub const TILT_FILE_NAME: &str = "TOMCAT_tilt.txt";
pub const MET_HISTORY_FILE_NAME: &str = "TOMCAT_input.csv";

/// Where the side-channel inputs live. By default both sit next to the running executable.
#[derive(Clone, Debug, PartialEq)]
pub struct InputPaths {
    pub base_dir: PathBuf,
    pub tilt_file: PathBuf,
    pub met_history: PathBuf,
}

impl InputPaths {
    pub fn in_directory(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            tilt_file: base_dir.join(TILT_FILE_NAME),
            met_history: base_dir.join(MET_HISTORY_FILE_NAME),
            base_dir,
        }
    }

    pub fn beside_executable() -> anyhow::Result<Self> {
        let executable = std::env::current_exe()?;
        let base_dir = executable
            .parent()
            .ok_or_else(|| anyhow::anyhow!("executable {} has no parent directory", executable.display()))?;

        Ok(Self::in_directory(base_dir))
    }
}

/// Read the array tilt in degrees from the first line of `path`.
pub fn read_tilt_file(path: &Path) -> Result<Tilt, InputError> {
    let contents = fs::read_to_string(path).map_err(|source| InputError::TiltFileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let first_line = contents.lines().next().unwrap_or_default().trim();
    if first_line.is_empty() {
        return Err(InputError::TiltFileEmpty {
            path: path.to_path_buf(),
        });
    }

    let tilt = first_line
        .parse::<Tilt>()
        .map_err(|source| InputError::InvalidTilt {
            path: path.to_path_buf(),
            source,
        })?;
    info!("array tilt {tilt} degrees from {}", path.display());

    Ok(tilt)
}

/// Thermal properties of one laminate layer, in SI units.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LayerProperties {
    /// m
    #[validate(exclusive_minimum = 0.)]
    pub thickness: f64,
    /// W/(m.K)
    #[validate(exclusive_minimum = 0.)]
    pub conductivity: f64,
    /// kg/m3
    #[validate(exclusive_minimum = 0.)]
    pub density: f64,
    /// J/(kg.K)
    #[validate(exclusive_minimum = 0.)]
    pub specific_heat: f64,
}

impl LayerProperties {
    const fn new(thickness: f64, conductivity: f64, density: f64, specific_heat: f64) -> Self {
        Self {
            thickness,
            conductivity,
            density,
            specific_heat,
        }
    }
}

/// Physical and geometric constants of the module and its surroundings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleProperties {
    #[validate]
    pub front_sheet: LayerProperties,
    #[validate]
    pub front_encapsulant: LayerProperties,
    #[validate]
    pub cell: LayerProperties,
    #[validate]
    pub back_encapsulant: LayerProperties,
    #[validate]
    pub back_sheet: LayerProperties,
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub eps_front_sheet: f64,
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub eps_back_sheet: f64,
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub eps_ground: f64,
    /// height of the lower edge above the ground, m
    #[validate(exclusive_minimum = 0.)]
    pub h_above_ground: f64,
    /// slant height along the tilted surface, m
    #[validate(exclusive_minimum = 0.)]
    pub h_module: f64,
    /// scales the slant height to the convection length of a tilted plate
    #[validate(exclusive_minimum = 0.)]
    pub convection_length_factor: f64,
    #[validate(exclusive_minimum = 0.)]
    #[validate(maximum = 1.)]
    pub efficiency_stc: f64,
    /// 1/K
    pub efficiency_temp_coefficient: f64,
    /// fraction of front irradiance reaching the back surface
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub irrad_back_fraction: f64,
    /// solar-weighted absorptivity of the back sheet
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub abs_back_sheet: f64,
}

impl Default for ModuleProperties {
    /// Low-iron glass front sheet, EVA encapsulant, crystalline silicon cells and a polymer back
    /// sheet, 1 m slant height mounted 0.5 m above concrete.
    fn default() -> Self {
        Self {
            front_sheet: LayerProperties::new(3.2e-3, 1., 2500., 720.),
            front_encapsulant: LayerProperties::new(0.4e-3, 0.26, 960., 2090.),
            cell: LayerProperties::new(150e-6, 148., 2330., 677.),
            back_encapsulant: LayerProperties::new(0.4e-3, 0.26, 960., 2090.),
            back_sheet: LayerProperties::new(300e-6, 0.26, 1200., 1250.),
            eps_front_sheet: 0.88,
            eps_back_sheet: 0.87,
            eps_ground: 0.88,
            h_above_ground: 0.5,
            h_module: 1.,
            convection_length_factor: 0.56,
            efficiency_stc: 0.171,
            efficiency_temp_coefficient: -0.0039,
            irrad_back_fraction: 0.1,
            abs_back_sheet: 0.33,
        }
    }
}

impl ModuleProperties {
    pub fn layer(&self, domain: DomainId) -> &LayerProperties {
        match domain {
            DomainId::FrontSheet => &self.front_sheet,
            DomainId::FrontEncapsulant => &self.front_encapsulant,
            DomainId::Cell => &self.cell,
            DomainId::BackEncapsulant => &self.back_encapsulant,
            DomainId::BackSheet => &self.back_sheet,
        }
    }

    pub fn thk_module(&self) -> f64 {
        DomainId::iter()
            .map(|domain| self.layer(domain).thickness)
            .sum()
    }

    pub fn array_geometry(&self, tilt: Tilt) -> ArrayGeometry {
        ArrayGeometry::new(tilt, self.h_module, self.h_above_ground, self.thk_module())
    }

    pub fn electrical_model(&self) -> ElectricalModel {
        ElectricalModel {
            efficiency_stc: self.efficiency_stc,
            temp_coefficient: self.efficiency_temp_coefficient,
        }
    }

    /// The parameter table for an array at `tilt`, followed by any `extra` definitions, which
    /// may be given in any order and may refer to the standard parameters.
    pub fn parameter_table(
        &self,
        tilt: Tilt,
        extra: &[Parameter],
    ) -> Result<ParameterTable, ModelError> {
        let mut table = ParameterTable::new();

        for domain in DomainId::iter() {
            table.define(Parameter::new(
                domain.thickness_parameter(),
                quantity(self.layer(domain).thickness, "m"),
                Some(format!("{domain:?} thickness").as_str()),
            ))?;
        }
        let layer_sum = DomainId::iter()
            .rev()
            .map(|domain| domain.thickness_parameter())
            .collect::<Vec<_>>()
            .join("+");
        table.define(Parameter::new(
            "thkModule",
            layer_sum,
            Some("total laminate thickness"),
        ))?;

        for domain in DomainId::iter() {
            table.define(Parameter::new(
                &format!("k{domain:?}"),
                quantity(self.layer(domain).conductivity, "W/m/K"),
                Some(format!("{domain:?} thermal conductivity").as_str()),
            ))?;
        }

        for (name, value, description) in [
            ("epsFrontSheet", self.eps_front_sheet, "front sheet thermal emissivity"),
            ("epsBackSheet", self.eps_back_sheet, "back sheet thermal emissivity"),
            ("epsGround", self.eps_ground, "ground thermal emissivity"),
        ] {
            table.define(Parameter::new(name, value.to_string(), Some(description)))?;
        }

        table.define(Parameter::new(
            "tilt",
            format!("{tilt}[deg]"),
            Some("array tilt from horizontal"),
        ))?;
        table.define(Parameter::new(
            "hAboveGround",
            quantity(self.h_above_ground, "m"),
            Some("height of bottom edge above ground"),
        ))?;
        table.define(Parameter::new(
            "hModule",
            quantity(self.h_module, "m"),
            Some("slant height of the module"),
        ))?;
        table.define(Parameter::new(
            "convectionLengthFactor",
            self.convection_length_factor.to_string(),
            Some("correction from flat plate to tilted module convection length"),
        ))?;
        table.define(Parameter::new(
            "rowPitch",
            "2*hModule*cos(tilt)",
            Some("tilt-dependent row spacing"),
        ))?;
        table.define(Parameter::new(
            "efficiencyElectricalSTC",
            self.efficiency_stc.to_string(),
            Some("module efficiency at standard test conditions"),
        ))?;
        table.define(Parameter::new(
            "efficiencyElectricalTempCo",
            self.efficiency_temp_coefficient.to_string(),
            Some("temperature coefficient of efficiency, in 1/K"),
        ))?;

        for domain in DomainId::iter() {
            table.define(Parameter::new(
                &format!("density{domain:?}"),
                quantity(self.layer(domain).density, "kg/m^3"),
                None,
            ))?;
        }
        for domain in DomainId::iter() {
            table.define(Parameter::new(
                &format!("specificHeat{domain:?}"),
                quantity(self.layer(domain).specific_heat, "J/kg/K"),
                None,
            ))?;
        }

        table.define(Parameter::new(
            "irradBackFraction",
            self.irrad_back_fraction.to_string(),
            Some("fraction of front irradiance falling on the back surface"),
        ))?;
        table.define(Parameter::new(
            "absBackSheet",
            self.abs_back_sheet.to_string(),
            Some("solar-weighted absorptivity of the back sheet"),
        ))?;

        table.extend_unordered(extra.iter().cloned())?;

        Ok(table)
    }
}

fn quantity(value: f64, unit: &str) -> String {
    format!("{value}[{unit}]")
}

/// Optional JSON configuration for a run. Every section has defaults.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    #[validate]
    pub module: ModuleProperties,
    /// appended to the parameter table, for use by custom expressions
    pub extra_parameters: Vec<Parameter>,
    #[validate]
    pub solver: SolverConfig,
    pub backend: Option<BackendConfig>,
    #[validate]
    pub lcoe: Option<LcoeInputs>,
}

pub fn run_config_from_reader(json: impl Read) -> Result<RunConfig, InputError> {
    let config: RunConfig = serde_json::from_reader(json)?;
    config
        .validate()
        .map_err(|errors| InputError::ConfigOutOfRange(errors.to_string()))?;
    config
        .solver
        .times
        .check_len()
        .map_err(|e| InputError::ConfigOutOfRange(e.to_string()))?;

    Ok(config)
}

pub fn run_config_from_file(path: &Path) -> Result<RunConfig, InputError> {
    let file = File::open(path).map_err(|source| InputError::ConfigUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    run_config_from_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pvtherm-input-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[rstest]
    fn test_default_paths() {
        let paths = InputPaths::in_directory("/data/run");

        assert_eq!(paths.tilt_file, PathBuf::from("/data/run/TOMCAT_tilt.txt"));
        assert_eq!(paths.met_history, PathBuf::from("/data/run/TOMCAT_input.csv"));
    }

    #[rstest]
    fn test_read_tilt_file() {
        let dir = scratch_dir("tilt");
        let path = dir.join(TILT_FILE_NAME);
        fs::write(&path, "40.0\nignored").unwrap();

        assert_eq!(read_tilt_file(&path).unwrap().degrees(), 40.);
    }

    #[rstest]
    fn test_missing_tilt_file_is_an_error_naming_the_file() {
        let path = scratch_dir("missing-tilt").join("absent_tilt.txt");
        let error = read_tilt_file(&path).unwrap_err();

        assert!(matches!(error, InputError::TiltFileUnreadable { .. }));
        let message = error.to_string();
        assert!(message.contains("absent_tilt.txt"));
        assert!(message.contains("tilt in degrees"));
    }

    #[rstest]
    #[case("", "is empty")]
    #[case("forty", "does not hold a usable tilt")]
    #[case("95", "does not hold a usable tilt")]
    fn test_bad_tilt_file(#[case] contents: &str, #[case] message: &str) {
        let dir = scratch_dir(&format!("bad-tilt-{}", contents.len()));
        let path = dir.join(TILT_FILE_NAME);
        fs::write(&path, contents).unwrap();

        assert!(read_tilt_file(&path).unwrap_err().to_string().contains(message));
    }

    #[rstest]
    fn test_default_module_thickness() {
        assert_relative_eq!(ModuleProperties::default().thk_module(), 4.45e-3, max_relative = 1e-12);
    }

    #[rstest]
    fn test_parameter_table_in_dependency_order() {
        let table = ModuleProperties::default()
            .parameter_table(Tilt::new(40.).unwrap(), &[])
            .unwrap();

        assert_eq!(table.get("thkFrontSheet").unwrap().expression, "0.0032[m]");
        assert_eq!(
            table.get("thkModule").unwrap().expression,
            "thkBackSheet+thkBackEncapsulant+thkCell+thkFrontEncapsulant+thkFrontSheet"
        );
        assert_eq!(table.get("tilt").unwrap().expression, "40[deg]");
        assert_eq!(table.get("rowPitch").unwrap().expression, "2*hModule*cos(tilt)");
        assert_eq!(table.get("kCell").unwrap().expression, "148[W/m/K]");
        assert_eq!(table.get("densityBackSheet").unwrap().expression, "1200[kg/m^3]");
        assert_eq!(table.len(), 33);
    }

    #[rstest]
    fn test_extra_parameters_may_refer_to_standard_ones() {
        let table = ModuleProperties::default()
            .parameter_table(
                Tilt::new(20.).unwrap(),
                &[Parameter::new("groundCoverageRatio", "hModule/rowPitch", None)],
            )
            .unwrap();

        assert!(table.get("groundCoverageRatio").is_some());
    }

    #[rstest]
    fn test_extra_parameter_cannot_redefine_standard_one() {
        let result = ModuleProperties::default()
            .parameter_table(Tilt::new(20.).unwrap(), &[Parameter::new("tilt", "10[deg]", None)]);

        assert_eq!(result.unwrap_err(), ModelError::DuplicateParameter("tilt".to_string()));
    }

    #[rstest]
    fn test_empty_run_config_is_all_defaults() {
        let config = run_config_from_reader(Cursor::new("{}")).unwrap();

        assert_eq!(config, RunConfig::default());
    }

    #[rstest]
    fn test_run_config_overrides() {
        let json = r#"{
            "module": {"h_module": 2.0, "cell": {"thickness": 180e-6, "conductivity": 148, "density": 2330, "specific_heat": 677}},
            "solver": {"times": {"start": 0, "step": 600, "end": 86400}},
            "backend": {"program": "/opt/solver/run", "args": ["--batch"]}
        }"#;
        let config = run_config_from_reader(Cursor::new(json)).unwrap();

        assert_eq!(config.module.h_module, 2.);
        assert_eq!(config.module.cell.thickness, 180e-6);
        assert_eq!(config.module.eps_ground, 0.88);
        assert_eq!(config.solver.times.len(), 145);
        assert_eq!(config.backend.unwrap().args, vec!["--batch"]);
    }

    #[rstest]
    fn test_run_config_rejects_unknown_field() {
        assert!(matches!(
            run_config_from_reader(Cursor::new(r#"{"modul": {}}"#)),
            Err(InputError::ConfigMalformed(_))
        ));
    }

    #[rstest]
    fn test_run_config_rejects_out_of_range_value() {
        assert!(matches!(
            run_config_from_reader(Cursor::new(r#"{"module": {"eps_ground": 1.2}}"#)),
            Err(InputError::ConfigOutOfRange(_))
        ));
    }

    #[rstest]
    fn test_run_config_rejects_unbounded_output_times() {
        let json = r#"{"solver": {"times": {"start": 0, "step": 1e-3, "end": 31536000}}}"#;

        assert!(matches!(
            run_config_from_reader(Cursor::new(json)),
            Err(InputError::ConfigOutOfRange(message)) if message.contains("output times")
        ));
    }
}
