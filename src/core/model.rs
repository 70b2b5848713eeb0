use crate::core::analytic::AnalyticFunction;
use crate::core::couplings::{build_couplings, Couplings};
use crate::core::geometry::{build_geometry, ArrayGeometry, GeometryBuild, Handle};
use crate::core::materials::{assign_materials, Material};
use crate::core::mesh::{plan_mesh, MeshPlan};
use crate::core::met_history::InterpolationFunction;
use crate::core::parameters::{unresolved_symbols, ParameterTable};
use crate::core::physics::{assemble_physics, Physics};
use crate::core::power::Variable;
use crate::core::results::{request_results, ResultRequest};
use crate::core::study::{SolverConfig, TransientStudy};
use crate::errors::ModelError;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Fields and operators the engine defines for the solved model: the temperature field, time,
/// coordinates, boundary normals and the radiation interface's flux and radiosity.
const ENGINE_SYMBOLS: [&str; 8] = ["T", "t", "x", "y", "nx", "ny", "rad.rflux", "rad.J"];

/// Everything the model is assembled from.
#[derive(Clone, Debug)]
pub struct ModelInputs {
    pub parameters: ParameterTable,
    pub array: ArrayGeometry,
    pub met_history: PathBuf,
}

#[derive(Clone, Debug, Serialize)]
pub struct Functions {
    pub interpolation: InterpolationFunction,
    pub analytic: Vec<AnalyticFunction>,
}

/// The complete, immutable description of the model handed to the engine.
#[derive(Clone, Debug, Serialize)]
pub struct ModelDescription {
    pub parameters: ParameterTable,
    pub functions: Functions,
    pub variables: Vec<Variable>,
    pub geometry: GeometryBuild,
    pub materials: Vec<Material>,
    pub couplings: Couplings,
    pub physics: Physics,
    pub mesh: MeshPlan,
    pub study: Option<TransientStudy>,
    pub results: Vec<ResultRequest>,
}

/// Build geometry, physics and mesh directives for the array described by `inputs`.
pub fn assemble_model(inputs: &ModelInputs) -> Result<ModelDescription, ModelError> {
    inputs.array.check_clearance()?;

    let couplings = build_couplings();
    let physics = assemble_physics(&couplings)?;

    let model = ModelDescription {
        parameters: inputs.parameters.clone(),
        functions: Functions {
            interpolation: InterpolationFunction::met_history(inputs.met_history.clone()),
            analytic: vec![
                AnalyticFunction::ground_temperature(),
                AnalyticFunction::shade(),
            ],
        },
        variables: vec![Variable::power()],
        geometry: build_geometry(),
        materials: assign_materials(),
        couplings,
        physics,
        mesh: plan_mesh(),
        study: None,
        results: request_results(),
    };
    model.validate()?;

    info!(
        "assembled model with {} parameters, {} geometry features and {} diffuse surfaces",
        model.parameters.len(),
        model.geometry.features().len(),
        model.physics.radiation.surfaces.len()
    );

    Ok(model)
}

impl ModelDescription {
    /// The same model with a transient study attached.
    pub fn with_study(self, config: SolverConfig) -> Result<Self, ModelError> {
        let study = TransientStudy::new(config)?;
        debug!(
            "attached transient study over {} with {} outputs",
            study.times, study.output_count
        );

        Ok(Self {
            study: Some(study),
            ..self
        })
    }

    /// Check that every handle resolves against the geometry build and that every expression
    /// only mentions names the engine will know.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (owner, handle) in self.handles() {
            if self.geometry.resolve(handle).is_none() {
                return Err(ModelError::UnknownHandle {
                    owner,
                    handle: handle.to_string(),
                });
            }
        }

        let parameters_only = |symbol: &str| self.parameters.contains(symbol);
        for feature in self.geometry.features() {
            for expression in feature.expressions() {
                let owner = format!("Geometry feature {}", feature.label());
                check_expression(&owner, expression, parameters_only)?;
            }
        }
        for material in &self.materials {
            for expression in material.properties.expressions() {
                let owner = format!("Material {}", material.label);
                check_expression(&owner, expression, parameters_only)?;
            }
        }

        let in_scope = |symbol: &str| self.in_scope(symbol);
        for function in &self.functions.analytic {
            let owner = format!("Function {}", function.name);
            check_expression(&owner, &function.expr, in_scope)?;
        }
        for variable in &self.variables {
            let owner = format!("Variable {}", variable.name);
            check_expression(&owner, &variable.expression, in_scope)?;
        }
        let expressions = self
            .physics
            .expressions()
            .into_iter()
            .chain(self.mesh.expressions())
            .chain(self.results.iter().flat_map(|request| {
                request
                    .expressions()
                    .into_iter()
                    .map(|expression| ("Result request".to_string(), expression))
            }));
        for (owner, expression) in expressions {
            check_expression(&owner, expression, in_scope)?;
        }

        Ok(())
    }

    fn handles(&self) -> Vec<(String, Handle)> {
        self.materials
            .iter()
            .map(|material| (format!("Material {}", material.label), material.selection))
            .chain(self.couplings.handles())
            .chain(self.physics.handles())
            .chain(self.mesh.handles())
            .chain(self.results.iter().flat_map(|request| {
                request
                    .handles()
                    .into_iter()
                    .map(|handle| ("Result request".to_string(), handle))
            }))
            .collect()
    }

    fn in_scope(&self, symbol: &str) -> bool {
        self.parameters.contains(symbol)
            || ENGINE_SYMBOLS.contains(&symbol)
            || self
                .functions
                .interpolation
                .function_names()
                .any(|name| name == symbol)
            || self
                .functions
                .analytic
                .iter()
                .any(|function| function.name == symbol)
            || self.variables.iter().any(|variable| variable.name == symbol)
            || self.couplings.operator_names().any(|name| name == symbol)
    }
}

fn check_expression(
    owner: &str,
    expression: &str,
    known: impl Fn(&str) -> bool,
) -> Result<(), ModelError> {
    match unresolved_symbols(expression, known).first() {
        Some(symbol) => Err(ModelError::UnresolvedSymbol {
            owner: owner.to_string(),
            symbol: symbol.to_string(),
        }),
        None => Ok(()),
    }
}
