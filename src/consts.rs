//! Thresholds and visual constants shared by every handler.

/// Minimum bounding-box area (px²) a rectangle, polygon or box-cuboid must cover.
pub const AREA_THRESHOLD: f64 = 9.0;
/// Minimum bbox width or height (px) of a polyline.
pub const SIZE_THRESHOLD: f64 = 3.0;
/// Minimum length (px) of a cuboid edge reconstructed from clicks.
pub const MIN_EDGE_LENGTH: f64 = 3.0;

pub const BASE_STROKE_WIDTH: f64 = 1.25;
pub const BASE_POINT_SIZE: f64 = 4.0;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

/// Perturbation applied to a line end when two cuboid lines are exactly parallel.
pub const CUBOID_EPSILON: f64 = 0.001;
pub const CUBOID_NUDGE_ATTEMPTS: usize = 4;
/// Offset applied to dorsal edges built by pure translation so the side faces converge.
pub const CUBOID_DORSAL_NUDGE: f64 = 0.1;
/// Depth vectors within this many degrees of vertical use the height-based reconstruction.
pub const CUBOID_VERTICAL_TOLERANCE_DEG: f64 = 1.0;
/// Share of a drawn box given to the cuboid depth when a cuboid is drawn by box.
pub const CUBOID_BOX_DEPTH_RATIO: f64 = 0.2;

/// Distance (client px) below which a pointer-up counts as a click rather than a drag.
pub const CLICK_TOLERANCE: f64 = 1.0;

pub const DEFAULT_BRUSH_SIZE: f64 = 10.0;
pub const MIN_BRUSH_SIZE: f64 = 1.0;
pub const MAX_BRUSH_SIZE: f64 = 256.0;
pub const DEFAULT_MASK_COLOR: [u8; 3] = [0xff, 0x00, 0x00];
