use crate::core::geometry::{BoundaryId, DomainId, Handle};
use serde::Serialize;

/// Directives for the engine's mesher. Nothing here generates a mesh.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum MeshDirective {
    /// Edge mesh with a maximum element size.
    Edge {
        selection: Vec<BoundaryId>,
        hmax: String,
    },
    /// Structured quadrilateral mesh.
    Mapped {
        selection: Vec<DomainId>,
        hmax: String,
        distributions: Vec<Distribution>,
    },
    /// Copy the edge mesh of `source` onto each destination so the coupled surfaces match
    /// node for node.
    CopyEdge {
        source: BoundaryId,
        destinations: Vec<BoundaryId>,
    },
}

/// A fixed number of elements along the selected edges.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Distribution {
    pub selection: Vec<BoundaryId>,
    pub elements: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeshPlan {
    pub directives: Vec<MeshDirective>,
}

impl MeshPlan {
    pub fn handles(&self) -> Vec<(String, Handle)> {
        let mut handles = vec![];
        for (i, directive) in self.directives.iter().enumerate() {
            let owner = format!("Mesh directive {}", i + 1);
            let mut push = |handle: Handle| handles.push((owner.clone(), handle));
            match directive {
                MeshDirective::Edge { selection, .. } => {
                    selection.iter().for_each(|&b| push(b.into()));
                }
                MeshDirective::Mapped {
                    selection,
                    distributions,
                    ..
                } => {
                    selection.iter().for_each(|&d| push(d.into()));
                    distributions
                        .iter()
                        .flat_map(|distribution| &distribution.selection)
                        .for_each(|&b| push(b.into()));
                }
                MeshDirective::CopyEdge {
                    source,
                    destinations,
                } => {
                    push((*source).into());
                    destinations.iter().for_each(|&b| push(b.into()));
                }
            }
        }

        handles
    }

    pub fn expressions(&self) -> Vec<(String, &str)> {
        self.directives
            .iter()
            .enumerate()
            .filter_map(|(i, directive)| match directive {
                MeshDirective::Edge { hmax, .. } | MeshDirective::Mapped { hmax, .. } => {
                    Some((format!("Mesh directive {}", i + 1), hmax.as_str()))
                }
                MeshDirective::CopyEdge { .. } => None,
            })
            .collect()
    }
}

pub fn plan_mesh() -> MeshPlan {
    MeshPlan {
        directives: vec![
            MeshDirective::Edge {
                selection: vec![BoundaryId::Ground],
                hmax: "hModule/6".to_string(),
            },
            MeshDirective::Mapped {
                selection: DomainId::laminate(),
                hmax: "100[mm]".to_string(),
                distributions: vec![Distribution {
                    selection: vec![BoundaryId::LaminateLowerEnds],
                    elements: 2,
                }],
            },
            MeshDirective::CopyEdge {
                source: BoundaryId::ModuleBack,
                destinations: vec![BoundaryId::PreviousRowBack, BoundaryId::NextRowBack],
            },
            MeshDirective::CopyEdge {
                source: BoundaryId::ModuleFront,
                destinations: vec![BoundaryId::PreviousRowFront, BoundaryId::NextRowFront],
            },
        ],
    }
}
