//! Completion callbacks the host registers once at construction.
//!
//! A `None` result always means the gesture was cancelled or produced nothing
//! usable; it is never an error.

use serde::{Serialize, Deserialize};
use crate::data::DrawData;
use crate::types::{ObjectState, ShapeType};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DrawnShape {
    pub shape_type: ShapeType,
    pub points: Vec<f64>,
    pub rotation: f64,
    #[serde(default)]
    pub elements: Vec<DrawnShape>,
    #[serde(rename = "labelID", default)]
    pub label_id: Option<u32>,
    /// Set when an existing object was redrawn.
    #[serde(rename = "clientID", default)]
    pub client_id: Option<u32>,
}

impl DrawnShape {
    pub fn new(shape_type: ShapeType, points: Vec<f64>) -> Self {
        DrawnShape { shape_type, points, rotation: 0.0, elements: Vec::new(), label_id: None, client_id: None }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InteractionShape {
    pub shape_type: ShapeType,
    pub points: Vec<f64>,
    /// Right-click points are negative.
    pub positive: bool,
}

/// Which mask tools currently have no effect.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolsBlockerState {
    pub eraser: bool,
    pub polygon_minus: bool,
}

pub trait CanvasObserver {
    fn on_draw_done(
        &self,
        _result: Option<DrawnShape>,
        _duration_ms: f64,
        _continue_drawing: bool,
        _prev: Option<&DrawData>,
    ) {
    }

    fn on_edit_done(&self, _state: Option<&ObjectState>, _points: Option<Vec<f64>>, _rotation: Option<f64>) {}

    fn on_slice_done(&self, _state: Option<&ObjectState>, _results: Option<[Vec<f64>; 2]>, _duration_ms: f64) {}

    /// Ask the host for the current contour of `state` in image coordinates; the
    /// answer comes back through `contour_ready(request_id, ...)`.
    fn on_contour_requested(&self, _request_id: u64, _state: &ObjectState) {}

    fn on_interaction(&self, _shapes: Option<&[InteractionShape]>, _updated: bool, _done: bool) {}

    fn on_merge_done(&self, _ids: Option<Vec<u32>>, _duration_ms: f64) {}

    fn on_split_done(&self, _id: Option<u32>, _duration_ms: f64) {}

    fn on_group_done(&self, _ids: Option<Vec<u32>>, _duration_ms: f64) {}

    fn on_tools_blocker_changed(&self, _state: ToolsBlockerState) {}
}

pub struct NoopObserver;

impl CanvasObserver for NoopObserver {}
