use crate::core::couplings::Couplings;
use crate::core::geometry::{BoundaryId, DomainId, Handle};
use crate::errors::ModelError;
use serde::Serialize;

/// Time argument of the meteorological functions; `t` carries units of s, the functions take a
/// dimensionless elapsed time.
const T_ARG: &str = "t*1[1/s]";

fn met(function: &str) -> String {
    format!("{function}({T_ARG})")
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum HeatTransferFeature {
    /// Inward heat flux `q0` in W/m2.
    HeatFlux {
        label: String,
        selection: Vec<BoundaryId>,
        q0: String,
    },
    /// Forced convection to air over a plate of characteristic length `length`.
    ExternalForcedConvection {
        label: String,
        selection: Vec<BoundaryId>,
        length: String,
        velocity: String,
        external_temperature: String,
    },
    /// Volumetric heat source `q0` in W/m3.
    HeatSource {
        label: String,
        selection: DomainId,
        q0: String,
    },
}

impl HeatTransferFeature {
    fn label(&self) -> &str {
        match self {
            HeatTransferFeature::HeatFlux { label, .. }
            | HeatTransferFeature::ExternalForcedConvection { label, .. }
            | HeatTransferFeature::HeatSource { label, .. } => label,
        }
    }

    fn handles(&self) -> Vec<Handle> {
        match self {
            HeatTransferFeature::HeatFlux { selection, .. }
            | HeatTransferFeature::ExternalForcedConvection { selection, .. } => {
                selection.iter().map(|&boundary| Handle::from(boundary)).collect()
            }
            HeatTransferFeature::HeatSource { selection, .. } => vec![Handle::from(*selection)],
        }
    }

    fn expressions(&self) -> Vec<&str> {
        match self {
            HeatTransferFeature::HeatFlux { q0, .. }
            | HeatTransferFeature::HeatSource { q0, .. } => vec![q0.as_str()],
            HeatTransferFeature::ExternalForcedConvection {
                length,
                velocity,
                external_temperature,
                ..
            } => vec![
                length.as_str(),
                velocity.as_str(),
                external_temperature.as_str(),
            ],
        }
    }
}

/// Conduction in the laminate layers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatTransferInterface {
    pub selection: Vec<DomainId>,
    pub initial_temperature: String,
    pub features: Vec<HeatTransferFeature>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum RadiationDirection {
    /// along the boundary normal
    Positive,
    Negative,
}

/// A grey diffuse surface in the radiation enclosure. Without a `surface_temperature` the
/// surface radiates at the solved temperature; without an `emissivity` it takes the
/// emissivity of its surface material.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiffuseSurface {
    pub label: String,
    pub selection: Vec<BoundaryId>,
    pub direction: RadiationDirection,
    pub ambient_temperature: String,
    pub emissivity: Option<String>,
    pub surface_temperature: Option<String>,
}

impl DiffuseSurface {
    fn expressions(&self) -> Vec<&str> {
        std::iter::once(self.ambient_temperature.as_str())
            .chain(self.emissivity.as_deref())
            .chain(self.surface_temperature.as_deref())
            .collect()
    }
}

/// Surface-to-surface longwave exchange between the module, the ground and the neighbouring
/// rows, with the sky as ambient.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RadiationInterface {
    pub selection: Vec<BoundaryId>,
    pub opaque: Vec<DomainId>,
    pub surfaces: Vec<DiffuseSurface>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Physics {
    pub heat_transfer: HeatTransferInterface,
    pub radiation: RadiationInterface,
}

impl Physics {
    pub fn handles(&self) -> Vec<(String, Handle)> {
        let heat_transfer = self
            .heat_transfer
            .selection
            .iter()
            .map(|&domain| ("Heat transfer interface".to_string(), Handle::from(domain)))
            .chain(self.heat_transfer.features.iter().flat_map(|feature| {
                let owner = format!("Heat transfer feature {}", feature.label());
                feature
                    .handles()
                    .into_iter()
                    .map(move |handle| (owner.clone(), handle))
            }));

        let radiation = self
            .radiation
            .selection
            .iter()
            .map(|&boundary| ("Radiation interface".to_string(), Handle::from(boundary)))
            .chain(
                self.radiation
                    .opaque
                    .iter()
                    .map(|&domain| ("Radiation opacity".to_string(), Handle::from(domain))),
            )
            .chain(self.radiation.surfaces.iter().flat_map(|surface| {
                let owner = format!("Diffuse surface {}", surface.label);
                surface
                    .selection
                    .iter()
                    .map(move |&boundary| (owner.clone(), Handle::from(boundary)))
            }));

        heat_transfer.chain(radiation).collect()
    }

    pub fn expressions(&self) -> Vec<(String, &str)> {
        let mut expressions = vec![(
            "Initial temperature".to_string(),
            self.heat_transfer.initial_temperature.as_str(),
        )];
        for feature in &self.heat_transfer.features {
            let owner = format!("Heat transfer feature {}", feature.label());
            expressions.extend(
                feature
                    .expressions()
                    .into_iter()
                    .map(|expression| (owner.clone(), expression)),
            );
        }
        for surface in &self.radiation.surfaces {
            let owner = format!("Diffuse surface {}", surface.label);
            expressions.extend(
                surface
                    .expressions()
                    .into_iter()
                    .map(|expression| (owner.clone(), expression)),
            );
        }

        expressions
    }
}

const MODULE_FACES: [BoundaryId; 2] = [BoundaryId::ModuleFront, BoundaryId::ModuleBack];

/// Attach conduction over the laminate and the radiation enclosure around it. The row surfaces
/// take their temperature from the coupling that maps the module face onto them.
pub fn assemble_physics(couplings: &Couplings) -> Result<Physics, ModelError> {
    let heat_source = |label: &str, selection: DomainId, q0: String| HeatTransferFeature::HeatSource {
        label: label.to_string(),
        selection,
        q0,
    };

    let heat_transfer = HeatTransferInterface {
        selection: DomainId::laminate(),
        initial_temperature: met("temp"),
        features: vec![
            HeatTransferFeature::HeatFlux {
                label: "radiation flux".to_string(),
                selection: MODULE_FACES.to_vec(),
                q0: "rad.rflux".to_string(),
            },
            HeatTransferFeature::ExternalForcedConvection {
                label: "convection flux".to_string(),
                selection: MODULE_FACES.to_vec(),
                length: "hModule*convectionLengthFactor".to_string(),
                velocity: met("wind_speed"),
                external_temperature: met("temp"),
            },
            heat_source(
                "absorption in cell",
                DomainId::Cell,
                format!("({} - power)/thkCell", met("abs_cell")),
            ),
            heat_source(
                "absorption in front sheet",
                DomainId::FrontSheet,
                format!("{}/thkFrontSheet", met("abs_glass")),
            ),
            heat_source(
                "absorption in front encapsulant",
                DomainId::FrontEncapsulant,
                format!("{}/thkFrontEncapsulant", met("abs_encapsulant")),
            ),
            heat_source(
                "absorption in back encapsulant",
                DomainId::BackEncapsulant,
                "0".to_string(),
            ),
            heat_source("absorption in back sheet", DomainId::BackSheet, "0".to_string()),
            HeatTransferFeature::HeatFlux {
                label: "incident rear irradiance".to_string(),
                selection: vec![BoundaryId::ModuleBack],
                q0: format!("irradBackFraction*{}*absBackSheet", met("poai")),
            },
        ],
    };

    let mut surfaces = vec![
        DiffuseSurface {
            label: "module surface".to_string(),
            selection: MODULE_FACES.to_vec(),
            direction: RadiationDirection::Positive,
            ambient_temperature: met("temp_sky"),
            emissivity: None,
            surface_temperature: None,
        },
        DiffuseSurface {
            label: "ground".to_string(),
            selection: vec![BoundaryId::Ground],
            direction: RadiationDirection::Positive,
            ambient_temperature: met("temp_sky"),
            emissivity: None,
            surface_temperature: Some("temp_ground_striped(x, t)".to_string()),
        },
    ];
    for (label, boundary, direction, emissivity) in [
        (
            "back of previous row",
            BoundaryId::PreviousRowBack,
            RadiationDirection::Negative,
            "epsBackSheet",
        ),
        (
            "front of next row",
            BoundaryId::NextRowFront,
            RadiationDirection::Positive,
            "epsFrontSheet",
        ),
        (
            "back of next row",
            BoundaryId::NextRowBack,
            RadiationDirection::Negative,
            "epsBackSheet",
        ),
        (
            "front of previous row",
            BoundaryId::PreviousRowFront,
            RadiationDirection::Positive,
            "epsFrontSheet",
        ),
    ] {
        let similarity = couplings
            .feeding(boundary)
            .ok_or_else(|| ModelError::UnknownHandle {
                owner: format!("Diffuse surface {label}"),
                handle: format!("coupling onto {}", Handle::from(boundary)),
            })?;
        surfaces.push(DiffuseSurface {
            label: label.to_string(),
            selection: vec![boundary],
            direction,
            ambient_temperature: met("temp_sky"),
            emissivity: Some(emissivity.to_string()),
            surface_temperature: Some(format!("{}(T)", similarity.tag)),
        });
    }

    let radiation = RadiationInterface {
        selection: vec![
            BoundaryId::Ground,
            BoundaryId::PreviousRowFront,
            BoundaryId::PreviousRowBack,
            BoundaryId::ModuleFront,
            BoundaryId::ModuleBack,
            BoundaryId::NextRowFront,
            BoundaryId::NextRowBack,
        ],
        opaque: DomainId::laminate(),
        surfaces,
    };

    Ok(Physics {
        heat_transfer,
        radiation,
    })
}
