use crate::core::geometry::{BoundaryId, DomainId, Handle};
use serde::Serialize;

pub const TEMPERATURE_OUTPUT_KEY: &str = "Temperature";
pub const POWER_OUTPUT_KEY: &str = "Power";

/// Evaluations and exports the engine performs after the solve.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ResultRequest {
    /// Average of `expression` over a domain at every output time, saved as a table.
    SurfaceAverage {
        label: String,
        selection: DomainId,
        expression: String,
        unit: String,
        output_key: String,
    },
    /// Value of a global expression at every output time, saved as a table.
    GlobalEvaluation {
        label: String,
        expression: String,
        unit: String,
        output_key: String,
    },
    /// Value at a point in the cross-section.
    PointEvaluation {
        label: String,
        x: String,
        y: String,
        expression: String,
    },
    PlotGroup {
        label: String,
        surface_unit: String,
        /// outgoing and incoming radiative flux, drawn as arrows
        arrows: Vec<[String; 2]>,
        line_selection: BoundaryId,
        line_expression: String,
    },
    Animation {
        plot: String,
        all_frames: bool,
    },
}

impl ResultRequest {
    pub fn handles(&self) -> Vec<Handle> {
        match self {
            ResultRequest::SurfaceAverage { selection, .. } => vec![(*selection).into()],
            ResultRequest::PlotGroup { line_selection, .. } => vec![(*line_selection).into()],
            _ => vec![],
        }
    }

    pub fn expressions(&self) -> Vec<&str> {
        match self {
            ResultRequest::SurfaceAverage { expression, .. }
            | ResultRequest::GlobalEvaluation { expression, .. } => vec![expression.as_str()],
            ResultRequest::PointEvaluation {
                x, y, expression, ..
            } => vec![x.as_str(), y.as_str(), expression.as_str()],
            ResultRequest::PlotGroup {
                arrows,
                line_expression,
                ..
            } => arrows
                .iter()
                .flatten()
                .chain(std::iter::once(line_expression))
                .map(String::as_str)
                .collect(),
            ResultRequest::Animation { .. } => vec![],
        }
    }
}

const PLOT_LABEL: &str = "temperature and radiation";

pub fn request_results() -> Vec<ResultRequest> {
    vec![
        ResultRequest::SurfaceAverage {
            label: "cell temperature".to_string(),
            selection: DomainId::Cell,
            expression: "T".to_string(),
            unit: "degC".to_string(),
            output_key: TEMPERATURE_OUTPUT_KEY.to_string(),
        },
        ResultRequest::GlobalEvaluation {
            label: "power".to_string(),
            expression: "power".to_string(),
            unit: "1".to_string(),
            output_key: POWER_OUTPUT_KEY.to_string(),
        },
        ResultRequest::PointEvaluation {
            label: "module centre".to_string(),
            x: "hModule*cos(tilt)/2".to_string(),
            y: "hModule*sin(tilt)/2+hAboveGround".to_string(),
            expression: "T".to_string(),
        },
        ResultRequest::PlotGroup {
            label: PLOT_LABEL.to_string(),
            surface_unit: "degC".to_string(),
            arrows: ["(rad.rflux>0)", "(rad.rflux<0)"]
                .map(|sign| {
                    [
                        format!("-rad.rflux*nx*{sign}"),
                        format!("-rad.rflux*ny*{sign}"),
                    ]
                })
                .to_vec(),
            line_selection: BoundaryId::Ground,
            line_expression: "temp_ground_striped(x,t)".to_string(),
        },
        ResultRequest::Animation {
            plot: PLOT_LABEL.to_string(),
            all_frames: true,
        },
    ]
}
