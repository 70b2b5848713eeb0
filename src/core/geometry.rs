use crate::core::units::Tilt;
use crate::errors::ModelError;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use strum::{EnumIter, IntoEnumIterator};
use tracing::debug;

/// The ground line runs from -GROUND_HALF_WIDTH to +GROUND_HALF_WIDTH, in m.
pub const GROUND_HALF_WIDTH: f64 = 10.;

/// Center-to-center spacing between rows for a module of slant height `h_module` (m).
pub fn row_pitch(h_module: f64, tilt: Tilt) -> f64 {
    2. * h_module * tilt.radians().cos()
}

/// Numeric view of the array cross-section, used wherever the model needs to evaluate
/// geometry outside the engine (shading, clearance checks, tests).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArrayGeometry {
    /// radians
    pub tilt: f64,
    pub h_module: f64,
    pub h_above_ground: f64,
    pub thk_module: f64,
    pub row_pitch: f64,
}

impl ArrayGeometry {
    pub fn new(tilt: Tilt, h_module: f64, h_above_ground: f64, thk_module: f64) -> Self {
        Self {
            tilt: tilt.radians(),
            h_module,
            h_above_ground,
            thk_module,
            row_pitch: row_pitch(h_module, tilt),
        }
    }

    /// Horizontal extent of one module.
    pub fn footprint(&self) -> f64 {
        self.h_module * self.tilt.cos()
    }

    /// The line of a module face in the row `row_offset` rows away (0 is the modelled module,
    /// -1 the previous row, +1 the next).
    pub fn face_line(&self, row_offset: i32, face: Face) -> Segment {
        let (nx, ny) = match face {
            Face::Back => (0., 0.),
            Face::Front => (
                -self.thk_module * self.tilt.sin(),
                self.thk_module * self.tilt.cos(),
            ),
        };
        let x0 = row_offset as f64 * self.row_pitch + nx;
        let y0 = self.h_above_ground + ny;

        Segment {
            start: (x0, y0),
            end: (
                x0 + self.h_module * self.tilt.cos(),
                y0 + self.h_module * self.tilt.sin(),
            ),
        }
    }

    /// Both neighbouring rows have to sit on the ground line.
    pub fn check_clearance(&self) -> Result<(), ModelError> {
        let reach = [
            self.face_line(-1, Face::Front).start.0.abs(),
            self.face_line(-1, Face::Back).start.0.abs(),
            self.face_line(1, Face::Back).end.0.abs(),
            self.face_line(1, Face::Front).end.0.abs(),
        ]
        .into_iter()
        .fold(0., f64::max);

        if reach > GROUND_HALF_WIDTH {
            return Err(ModelError::RowsBeyondGround {
                reach,
                half_width: GROUND_HALF_WIDTH,
            });
        }
        debug!(
            "rows reach {reach:.3} m with a pitch of {:.3} m",
            self.row_pitch
        );

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Face {
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: (f64, f64),
    pub end: (f64, f64),
}

#[derive(Clone, Copy, Debug, EnumIter, Eq, Hash, PartialEq, Serialize)]
pub enum DomainId {
    FrontSheet,
    FrontEncapsulant,
    Cell,
    BackEncapsulant,
    BackSheet,
}

impl DomainId {
    pub fn laminate() -> Vec<DomainId> {
        DomainId::iter().collect()
    }

    /// Parameter holding the thickness of this layer.
    pub(crate) fn thickness_parameter(&self) -> &'static str {
        match self {
            DomainId::FrontSheet => "thkFrontSheet",
            DomainId::FrontEncapsulant => "thkFrontEncapsulant",
            DomainId::Cell => "thkCell",
            DomainId::BackEncapsulant => "thkBackEncapsulant",
            DomainId::BackSheet => "thkBackSheet",
        }
    }
}

#[derive(Clone, Copy, Debug, EnumIter, Eq, Hash, PartialEq, Serialize)]
pub enum BoundaryId {
    ModuleFront,
    ModuleBack,
    /// the short edges of every layer at the lower end of the laminate
    LaminateLowerEnds,
    Ground,
    PreviousRowBack,
    PreviousRowFront,
    NextRowBack,
    NextRowFront,
}

/// A named piece of the built geometry. Later stages refer to geometry only through these.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name")]
pub enum Handle {
    Domain(DomainId),
    Boundary(BoundaryId),
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Handle::Domain(domain) => write!(f, "domain {domain:?}"),
            Handle::Boundary(boundary) => write!(f, "boundary {boundary:?}"),
        }
    }
}

impl From<DomainId> for Handle {
    fn from(domain: DomainId) -> Self {
        Handle::Domain(domain)
    }
}

impl From<BoundaryId> for Handle {
    fn from(boundary: BoundaryId) -> Self {
        Handle::Boundary(boundary)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub thickness: String,
}

/// A 2-D primitive with coordinates given as expressions over the parameter table.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GeometryFeature {
    LayeredRectangle {
        label: String,
        position: [String; 2],
        rotation: String,
        size: [String; 2],
        /// listed from the top (front) face down
        layers: Vec<Layer>,
    },
    LineSegment {
        label: String,
        start: [String; 2],
        end: [String; 2],
    },
    Polygon {
        label: String,
        x: Vec<String>,
        y: Vec<String>,
    },
}

impl GeometryFeature {
    pub fn label(&self) -> &str {
        match self {
            GeometryFeature::LayeredRectangle { label, .. }
            | GeometryFeature::LineSegment { label, .. }
            | GeometryFeature::Polygon { label, .. } => label,
        }
    }

    pub fn expressions(&self) -> Vec<&str> {
        match self {
            GeometryFeature::LayeredRectangle {
                position,
                rotation,
                size,
                layers,
                ..
            } => position
                .iter()
                .chain(size.iter())
                .chain(std::iter::once(rotation))
                .chain(layers.iter().map(|layer| &layer.thickness))
                .map(String::as_str)
                .collect(),
            GeometryFeature::LineSegment { start, end, .. } => {
                start.iter().chain(end.iter()).map(String::as_str).collect()
            }
            GeometryFeature::Polygon { x, y, .. } => {
                x.iter().chain(y.iter()).map(String::as_str).collect()
            }
        }
    }
}

/// Where a handle came from: which feature, and which part of it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedEntity {
    pub handle: Handle,
    pub feature: String,
    pub part: String,
}

/// The ordered feature list together with the handles it produces.
#[derive(Clone, Debug, Serialize)]
pub struct GeometryBuild {
    features: Vec<GeometryFeature>,
    entities: Vec<ResolvedEntity>,
}

impl GeometryBuild {
    pub fn features(&self) -> &[GeometryFeature] {
        &self.features
    }

    pub fn entities(&self) -> &[ResolvedEntity] {
        &self.entities
    }

    pub fn resolve(&self, handle: Handle) -> Option<&ResolvedEntity> {
        self.entities.iter().find(|entity| entity.handle == handle)
    }

    #[cfg(test)]
    pub(crate) fn without(self, handle: Handle) -> Self {
        Self {
            entities: self
                .entities
                .into_iter()
                .filter(|entity| entity.handle != handle)
                .collect(),
            ..self
        }
    }

    fn push_feature(&mut self, feature: GeometryFeature, parts: Vec<(Handle, &str)>) {
        let label = feature.label().to_string();
        self.entities
            .extend(parts.into_iter().map(|(handle, part)| ResolvedEntity {
                handle,
                feature: label.clone(),
                part: part.to_string(),
            }));
        self.features.push(feature);
    }
}

const LAMINATE_LABEL: &str = "module laminate";

/// Emit the module cross-section, the ground line and the four neighbouring-row surfaces.
pub fn build_geometry() -> GeometryBuild {
    let mut build = GeometryBuild {
        features: vec![],
        entities: vec![],
    };

    let layers = DomainId::iter()
        .map(|domain| Layer {
            name: format!("{domain:?}"),
            thickness: domain.thickness_parameter().to_string(),
        })
        .collect();
    let mut laminate_parts: Vec<(Handle, &str)> = DomainId::iter()
        .map(|domain| (domain.into(), "layer"))
        .collect();
    laminate_parts.extend([
        (BoundaryId::ModuleFront.into(), "top edge"),
        (BoundaryId::ModuleBack.into(), "bottom edge"),
        (BoundaryId::LaminateLowerEnds.into(), "layer edges at x = 0"),
    ]);
    build.push_feature(
        GeometryFeature::LayeredRectangle {
            label: LAMINATE_LABEL.to_string(),
            position: ["0".into(), "hAboveGround".into()],
            rotation: "tilt".into(),
            size: ["hModule".into(), "thkModule".into()],
            layers,
        },
        laminate_parts,
    );

    build.push_feature(
        GeometryFeature::LineSegment {
            label: "ground".into(),
            start: [format!("-{GROUND_HALF_WIDTH}[m]"), "0".into()],
            end: [format!("{GROUND_HALF_WIDTH}[m]"), "0".into()],
        },
        vec![(BoundaryId::Ground.into(), "segment")],
    );

    for (label, boundary, offset, face) in [
        ("back of previous row", BoundaryId::PreviousRowBack, "-rowPitch", Face::Back),
        ("front of previous row", BoundaryId::PreviousRowFront, "-rowPitch", Face::Front),
        ("back of next row", BoundaryId::NextRowBack, "rowPitch", Face::Back),
        ("front of next row", BoundaryId::NextRowFront, "rowPitch", Face::Front),
    ] {
        build.push_feature(row_surface(label, offset, face), vec![(boundary.into(), "polyline")]);
    }

    build
}

fn row_surface(label: &str, offset: &str, face: Face) -> GeometryFeature {
    let (dx, dy) = match face {
        Face::Back => ("", ""),
        Face::Front => ("-thkModule*sin(tilt)", "+thkModule*cos(tilt)"),
    };

    GeometryFeature::Polygon {
        label: label.to_string(),
        x: vec![
            format!("{offset}{dx}"),
            format!("{offset}+hModule*cos(tilt){dx}"),
        ],
        y: vec![
            format!("hAboveGround{dy}"),
            format!("hAboveGround+hModule*sin(tilt){dy}"),
        ],
    }
}
