//! Records through which the host starts and stops each mode.

use serde::{Serialize, Deserialize};
use crate::consts::{DEFAULT_BRUSH_SIZE, DEFAULT_MASK_COLOR, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::types::{CuboidDrawingMethod, ObjectState, RectDrawingMethod, ShapeType};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BrushToolType {
    #[default]
    Brush,
    Eraser,
    PolygonPlus,
    PolygonMinus,
}

impl BrushToolType {
    pub fn is_polygon(&self) -> bool {
        matches!(self, BrushToolType::PolygonPlus | BrushToolType::PolygonMinus)
    }

    pub fn is_subtractive(&self) -> bool {
        matches!(self, BrushToolType::Eraser | BrushToolType::PolygonMinus)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrushForm {
    #[default]
    Circle,
    Square,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct BrushTool {
    #[serde(rename = "type")]
    pub tool_type: BrushToolType,
    pub size: f64,
    pub form: BrushForm,
    /// `#rrggbb`.
    pub color: String,
}

impl Default for BrushTool {
    fn default() -> Self {
        let [r, g, b] = DEFAULT_MASK_COLOR;
        BrushTool {
            tool_type: BrushToolType::Brush,
            size: DEFAULT_BRUSH_SIZE,
            form: BrushForm::Circle,
            color: format!("#{:02x}{:02x}{:02x}", r, g, b),
        }
    }
}

impl BrushTool {
    pub fn clamped_size(&self) -> f64 {
        if self.size.is_finite() { self.size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE) } else { DEFAULT_BRUSH_SIZE }
    }

    /// Parsed colour, falling back to the default mask colour on malformed input.
    pub fn rgb(&self) -> [u8; 3] {
        let hex = self.color.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return DEFAULT_MASK_COLOR;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match (channel(0), channel(2), channel(4)) {
            (Some(r), Some(g), Some(b)) => [r, g, b],
            _ => DEFAULT_MASK_COLOR,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SkeletonNode {
    #[serde(rename = "labelID")]
    pub label_id: Option<u32>,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DrawData {
    pub enabled: bool,
    pub shape_type: Option<ShapeType>,
    pub number_of_points: Option<usize>,
    pub rect_drawing_method: Option<RectDrawingMethod>,
    pub cuboid_drawing_method: Option<CuboidDrawingMethod>,
    /// Object to paste at the cursor instead of drawing from scratch.
    pub initial_state: Option<ObjectState>,
    pub crosshair: Option<bool>,
    pub brush_tool: Option<BrushTool>,
    /// Client id of an object being redrawn in place.
    pub redraw: Option<u32>,
    pub skeleton_template: Option<Vec<SkeletonNode>>,
}

impl DrawData {
    pub fn shape(shape_type: ShapeType) -> Self {
        DrawData { enabled: true, shape_type: Some(shape_type), ..Default::default() }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct EditData {
    pub enabled: bool,
    pub state: Option<ObjectState>,
    #[serde(rename = "pointID")]
    pub point_id: Option<usize>,
    pub brush_tool: Option<BrushTool>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SliceData {
    pub enabled: bool,
    #[serde(rename = "clientID")]
    pub client_id: Option<u32>,
    /// The object to cut; without it the handler waits for one to be picked.
    pub state: Option<ObjectState>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionData {
    pub enabled: bool,
    pub shape_type: Option<ShapeType>,
    pub crosshair: Option<bool>,
    pub min_pos_vertices: Option<usize>,
    pub min_neg_vertices: Option<usize>,
    pub start_with_box: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(default)]
pub struct MergeData {
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(default)]
pub struct SplitData {
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(default)]
pub struct GroupData {
    pub enabled: bool,
}
