use crate::core::geometry::{BoundaryId, DomainId, Handle};
use serde::Serialize;

/// Maps a field on `source` onto the geometrically matching `destination`, so the neighbouring
/// rows can radiate at the modelled module's own surface temperature without being meshed as
/// thermal domains.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoundarySimilarity {
    pub tag: String,
    pub label: String,
    pub source: BoundaryId,
    pub destination: BoundaryId,
}

/// Spatial average of a field over a domain.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AverageOperator {
    pub tag: String,
    pub selection: DomainId,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Couplings {
    pub similarities: Vec<BoundarySimilarity>,
    pub cell_average: AverageOperator,
}

impl Couplings {
    /// Names the couplings make available to expressions, e.g. `bndsim1(T)` or `aveop1(T)`.
    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.similarities
            .iter()
            .map(|similarity| similarity.tag.as_str())
            .chain(std::iter::once(self.cell_average.tag.as_str()))
    }

    pub fn handles(&self) -> Vec<(String, Handle)> {
        let mut handles = vec![];
        for similarity in &self.similarities {
            let owner = format!("Coupling {}", similarity.tag);
            handles.push((owner.clone(), similarity.source.into()));
            handles.push((owner, similarity.destination.into()));
        }
        handles.push((
            format!("Coupling {}", self.cell_average.tag),
            self.cell_average.selection.into(),
        ));

        handles
    }

    /// The similarity feeding the given neighbouring-row surface.
    pub fn feeding(&self, destination: BoundaryId) -> Option<&BoundarySimilarity> {
        self.similarities
            .iter()
            .find(|similarity| similarity.destination == destination)
    }
}

pub fn build_couplings() -> Couplings {
    let similarities = [
        (
            "back surface to previous row",
            BoundaryId::ModuleBack,
            BoundaryId::PreviousRowBack,
        ),
        (
            "front surface to next row",
            BoundaryId::ModuleFront,
            BoundaryId::NextRowFront,
        ),
        (
            "back surface to next row",
            BoundaryId::ModuleBack,
            BoundaryId::NextRowBack,
        ),
        (
            "front surface to previous row",
            BoundaryId::ModuleFront,
            BoundaryId::PreviousRowFront,
        ),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (label, source, destination))| BoundarySimilarity {
        tag: format!("bndsim{}", i + 1),
        label: label.to_string(),
        source,
        destination,
    })
    .collect();

    Couplings {
        similarities,
        cell_average: AverageOperator {
            tag: "aveop1".to_string(),
            selection: DomainId::Cell,
        },
    }
}
