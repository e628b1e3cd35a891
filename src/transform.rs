//! Conversions between client, canvas and image coordinates.
//!
//! * client: device pixels reported by pointer events
//! * canvas: the rendering surface, image space shifted by the geometry offset
//! * image: source raster pixels, origin top-left

use kurbo::{Affine, Point, Vec2};
use crate::consts::BASE_STROKE_WIDTH;
use crate::geometry::Geometry;
use crate::types::WrappingBox;

pub fn to_canvas_space(offset: f64, points: &[Point]) -> Vec<Point> {
    let shift = Vec2::new(offset, offset);
    points.iter().map(|p| *p + shift).collect()
}

pub fn from_canvas_space(offset: f64, points: &[Point]) -> Vec<Point> {
    let shift = Vec2::new(offset, offset);
    points.iter().map(|p| *p - shift).collect()
}

/// Client → canvas through the inverse of the screen CTM.
pub fn client_to_canvas(ctm: Affine, points: &[Point]) -> Vec<Point> {
    let inverse = ctm.inverse();
    points.iter().map(|p| inverse * *p).collect()
}

pub fn canvas_to_client(ctm: Affine, points: &[Point]) -> Vec<Point> {
    points.iter().map(|p| ctm * *p).collect()
}

pub fn compute_wrapping_box(points: &[Point], margin: f64) -> WrappingBox {
    let mut xtl = f64::INFINITY;
    let mut ytl = f64::INFINITY;
    let mut xbr = f64::NEG_INFINITY;
    let mut ybr = f64::NEG_INFINITY;
    for p in points {
        xtl = xtl.min(p.x);
        ytl = ytl.min(p.y);
        xbr = xbr.max(p.x);
        ybr = ybr.max(p.y);
    }
    if points.is_empty() {
        return WrappingBox::default();
    }
    WrappingBox::from_corners(xtl - margin, ytl - margin, xbr + margin, ybr + margin)
}

/// Rotate `points` by `angle` degrees (clockwise on screen) about `(cx, cy)`.
pub fn rotate_2d_points(cx: f64, cy: f64, angle: f64, points: &[Point]) -> Vec<Point> {
    let (sin, cos) = angle.to_radians().sin_cos();
    points
        .iter()
        .map(|p| {
            let dx = p.x - cx;
            let dy = p.y - cy;
            Point::new(cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
        })
        .collect()
}

pub fn normalize_rotation(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

pub fn to_points(flat: &[f64]) -> Vec<Point> {
    flat.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect()
}

pub fn to_flat(points: &[Point]) -> Vec<f64> {
    let mut flat = Vec::with_capacity(points.len() * 2);
    for p in points {
        flat.push(p.x);
        flat.push(p.y);
    }
    flat
}

/// Everything a handler needs to place a pointer event: the geometry plus the
/// cached screen CTM and its inverse.
#[derive(Clone, Debug)]
pub struct Projection {
    geometry: Geometry,
    ctm: Affine,
    inverse: Affine,
}

impl Default for Projection {
    fn default() -> Self {
        Projection::new(Geometry::default())
    }
}

impl Projection {
    pub fn new(geometry: Geometry) -> Self {
        let ctm = geometry.screen_ctm();
        Projection::with_ctm(geometry, ctm)
    }

    /// Use a CTM measured by the host instead of the one derived from the geometry.
    pub fn with_ctm(geometry: Geometry, ctm: Affine) -> Self {
        Projection { geometry, ctm, inverse: ctm.inverse() }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn ctm(&self) -> Affine {
        self.ctm
    }

    pub fn offset(&self) -> f64 {
        self.geometry.offset
    }

    pub fn scale(&self) -> f64 {
        self.geometry.scale
    }

    pub fn client_to_canvas(&self, client: Point) -> Point {
        self.inverse * client
    }

    pub fn canvas_to_client(&self, canvas: Point) -> Point {
        self.ctm * canvas
    }

    pub fn canvas_to_image(&self, canvas: Point) -> Point {
        canvas - Vec2::new(self.geometry.offset, self.geometry.offset)
    }

    pub fn image_to_canvas(&self, image: Point) -> Point {
        image + Vec2::new(self.geometry.offset, self.geometry.offset)
    }

    pub fn client_to_image(&self, client: Point) -> Point {
        self.canvas_to_image(self.client_to_canvas(client))
    }

    /// Stroke width in canvas units that renders as the base width on screen.
    pub fn stroke_width(&self) -> f64 {
        BASE_STROKE_WIDTH / self.geometry.scale
    }

    /// Screen-constant length expressed in canvas units.
    pub fn screen_length(&self, px: f64) -> f64 {
        px / self.geometry.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size;
    use proptest::prelude::*;

    #[test]
    fn wrapping_box_with_margin() {
        let pts = [Point::new(10.0, 5.0), Point::new(-2.0, 7.0), Point::new(4.0, 20.0)];
        let b = compute_wrapping_box(&pts, 1.0);
        assert_eq!((b.xtl, b.ytl, b.xbr, b.ybr), (-3.0, 4.0, 11.0, 21.0));
        assert_eq!((b.x, b.y, b.width, b.height), (-3.0, 4.0, 14.0, 17.0));
    }

    #[test]
    fn rotation_about_pivot() {
        let rotated = rotate_2d_points(10.0, 10.0, 90.0, &[Point::new(20.0, 10.0)]);
        assert!((rotated[0] - Point::new(10.0, 20.0)).hypot() < 1e-9);
        assert_eq!(normalize_rotation(-90.0), 270.0);
        assert_eq!(normalize_rotation(720.0), 0.0);
    }

    #[test]
    fn projection_chains_ctm_and_offset() {
        let mut geometry = Geometry::new(Size::new(100.0, 100.0), 10.0);
        geometry.left = 50.0;
        geometry.top = 30.0;
        let projection = Projection::new(geometry);
        let client = projection.canvas_to_client(Point::new(10.0, 10.0));
        assert_eq!(client, Point::new(60.0, 40.0));
        assert_eq!(projection.client_to_image(client), Point::new(0.0, 0.0));
    }

    fn grid_points() -> impl Strategy<Value = Vec<Point>> {
        prop::collection::vec((-4000i32..4000, -4000i32..4000), 0..32).prop_map(|v| {
            v.into_iter().map(|(x, y)| Point::new(x as f64 / 4.0, y as f64 / 4.0)).collect()
        })
    }

    proptest! {
        #[test]
        fn canvas_space_round_trip_is_exact(points in grid_points(), offset in 0u32..2000) {
            let offset = offset as f64;
            let back = from_canvas_space(offset, &to_canvas_space(offset, &points));
            prop_assert_eq!(back, points);
        }

        #[test]
        fn client_round_trip_within_epsilon(
            points in grid_points(),
            scale in 0.1f64..10.0,
            quarter in 0u8..4,
            left in -500.0f64..500.0,
            top in -500.0f64..500.0,
        ) {
            let mut geometry = Geometry::new(Size::new(800.0, 600.0), 25.0);
            geometry.scale = scale;
            geometry.angle = quarter as f64 * 90.0;
            geometry.left = left;
            geometry.top = top;
            let ctm = geometry.screen_ctm();
            let back = client_to_canvas(ctm, &canvas_to_client(ctm, &points));
            for (a, b) in back.iter().zip(points.iter()) {
                prop_assert!((*a - *b).hypot() < 1e-6);
            }
        }
    }
}
