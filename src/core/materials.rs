use crate::core::geometry::{BoundaryId, DomainId, Handle};
use serde::Serialize;
use strum::IntoEnumIterator;

/// Thermal properties of a laminate layer, or the emissivity of a radiating surface. Values
/// are parameter names or expressions.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum MaterialProperties {
    Solid {
        /// row-major 3x3 conductivity tensor
        thermal_conductivity: [String; 9],
        density: String,
        heat_capacity: String,
    },
    Surface {
        emissivity: String,
    },
}

impl MaterialProperties {
    pub fn expressions(&self) -> Vec<&str> {
        match self {
            MaterialProperties::Solid {
                thermal_conductivity,
                density,
                heat_capacity,
            } => thermal_conductivity
                .iter()
                .chain([density, heat_capacity])
                .map(String::as_str)
                .collect(),
            MaterialProperties::Surface { emissivity } => vec![emissivity.as_str()],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Material {
    pub label: String,
    pub selection: Handle,
    pub properties: MaterialProperties,
}

/// Conductivity tensor of an isotropic material: `k` on the diagonal, zero elsewhere.
pub fn isotropic(k: &str) -> [String; 9] {
    std::array::from_fn(|i| {
        if i % 4 == 0 {
            k.to_string()
        } else {
            "0".to_string()
        }
    })
}

/// One solid per laminate layer, then the emissivities of the ground and the two module faces.
pub fn assign_materials() -> Vec<Material> {
    let solids = DomainId::iter().map(|domain| {
        let layer = format!("{domain:?}");
        Material {
            label: layer.clone(),
            selection: domain.into(),
            properties: MaterialProperties::Solid {
                thermal_conductivity: isotropic(&format!("k{layer}")),
                density: format!("density{layer}"),
                heat_capacity: format!("specificHeat{layer}"),
            },
        }
    });

    let surfaces = [
        ("GroundSurface", BoundaryId::Ground, "epsGround"),
        ("FrontSurface", BoundaryId::ModuleFront, "epsFrontSheet"),
        ("BackSurface", BoundaryId::ModuleBack, "epsBackSheet"),
    ]
    .into_iter()
    .map(|(label, boundary, emissivity)| Material {
        label: label.to_string(),
        selection: boundary.into(),
        properties: MaterialProperties::Surface {
            emissivity: emissivity.to_string(),
        },
    });

    solids.chain(surfaces).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_isotropic_tensor() {
        assert_eq!(
            isotropic("kCell"),
            ["kCell", "0", "0", "0", "kCell", "0", "0", "0", "kCell"].map(String::from)
        );
    }

    #[rstest]
    fn test_every_layer_gets_a_solid() {
        let materials = assign_materials();

        assert_eq!(materials.len(), 8);
        let cell = materials
            .iter()
            .find(|material| material.selection == Handle::Domain(DomainId::Cell))
            .unwrap();
        assert_eq!(
            cell.properties,
            MaterialProperties::Solid {
                thermal_conductivity: isotropic("kCell"),
                density: "densityCell".to_string(),
                heat_capacity: "specificHeatCell".to_string(),
            }
        );
    }

    #[rstest]
    fn test_surface_emissivities() {
        let materials = assign_materials();
        let emissivity_of = |boundary: BoundaryId| {
            materials
                .iter()
                .find(|material| material.selection == Handle::Boundary(boundary))
                .map(|material| material.properties.expressions())
        };

        assert_eq!(emissivity_of(BoundaryId::Ground), Some(vec!["epsGround"]));
        assert_eq!(
            emissivity_of(BoundaryId::ModuleFront),
            Some(vec!["epsFrontSheet"])
        );
        assert_eq!(
            emissivity_of(BoundaryId::ModuleBack),
            Some(vec!["epsBackSheet"])
        );
    }
}
