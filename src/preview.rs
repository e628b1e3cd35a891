//! What a handler wants drawn on top of the scene right now. Everything is in
//! canvas space; `render.rs` maps it through the screen CTM.

use kurbo::Point;
use serde::Serialize;
use crate::config::Configuration;
use crate::data::BrushForm;
use crate::transform::Projection;
use crate::types::ShapeType;

#[derive(Serialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PreviewShape {
    pub shape_type: ShapeType,
    pub points: Vec<Point>,
    pub closed: bool,
    pub control_points: bool,
    pub fill_opacity: f64,
}

impl PreviewShape {
    pub fn outline(shape_type: ShapeType, points: Vec<Point>, closed: bool) -> Self {
        PreviewShape { shape_type, points, closed, control_points: true, fill_opacity: 0.0 }
    }
}

#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SizeReadout {
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BrushMarker {
    pub center: Point,
    pub size: f64,
    pub form: BrushForm,
    pub color: String,
    pub erasing: bool,
}

#[derive(Serialize, Clone, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub shapes: Vec<PreviewShape>,
    pub crosshair: Option<Point>,
    pub size_readout: Option<SizeReadout>,
    /// Alternatives the user must pick from, e.g. after an ambiguous polygon split.
    pub candidates: Vec<Vec<Point>>,
    pub brush_marker: Option<BrushMarker>,
    pub stroke_width: f64,
    pub control_point_radius: f64,
}

impl Preview {
    pub fn new(projection: &Projection, config: &Configuration) -> Self {
        Preview {
            stroke_width: projection.stroke_width(),
            control_point_radius: projection.screen_length(config.control_points_size),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
            && self.crosshair.is_none()
            && self.size_readout.is_none()
            && self.candidates.is_empty()
            && self.brush_marker.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::types::Size;

    #[test]
    fn visuals_scale_inversely_with_zoom() {
        let mut geometry = Geometry::new(Size::new(100.0, 100.0), 0.0);
        geometry.scale = 2.0;
        let preview = Preview::new(&Projection::new(geometry), &Configuration::default());
        assert_eq!(preview.stroke_width, 0.625);
        assert_eq!(preview.control_point_radius, 2.5);
        assert!(preview.is_empty());
    }
}
