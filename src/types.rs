use serde::{Serialize, Deserialize};
use std::fmt;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rectangle,
    Polygon,
    Polyline,
    Points,
    Ellipse,
    Cuboid,
    Skeleton,
    Mask,
}

impl ShapeType {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Polygon => "polygon",
            ShapeType::Polyline => "polyline",
            ShapeType::Points => "points",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Cuboid => "cuboid",
            ShapeType::Skeleton => "skeleton",
            ShapeType::Mask => "mask",
        }
    }

    pub fn is_polyshape(&self) -> bool {
        matches!(self, ShapeType::Polygon | ShapeType::Polyline | ShapeType::Points)
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum RectDrawingMethod {
    #[default]
    Classic,
    ExtremePoints,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum CuboidDrawingMethod {
    #[default]
    Classic,
    CornerPoints,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// Axis-aligned box in both corner form and origin/size form.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct WrappingBox {
    pub xtl: f64,
    pub ytl: f64,
    pub xbr: f64,
    pub ybr: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WrappingBox {
    pub fn from_corners(xtl: f64, ytl: f64, xbr: f64, ybr: f64) -> Self {
        WrappingBox { xtl, ytl, xbr, ybr, x: xtl, y: ytl, width: xbr - xtl, height: ybr - ytl }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// An existing annotation handed in by the host, coordinates in image space.
///
/// `points` follows the per-kind layout: `[xtl, ytl, xbr, ybr]` for rectangles,
/// `[cx, cy, rightX, topY]` for ellipses, 8 vertices for cuboids, a flat vertex
/// list for polyshapes and run-length counts plus `[left, top, right, bottom]` for masks.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ObjectState {
    #[serde(rename = "clientID", default)]
    pub client_id: Option<u32>,
    pub shape_type: ShapeType,
    #[serde(default)]
    pub points: Vec<f64>,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub elements: Vec<ObjectState>,
    #[serde(rename = "labelID", default)]
    pub label_id: Option<u32>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub lock: bool,
}

impl ObjectState {
    pub fn new(shape_type: ShapeType, points: Vec<f64>) -> Self {
        ObjectState {
            client_id: None,
            shape_type,
            points,
            rotation: 0.0,
            elements: Vec::new(),
            label_id: None,
            hidden: false,
            lock: false,
        }
    }

    pub fn with_client_id(mut self, id: u32) -> Self {
        self.client_id = Some(id);
        self
    }
}
