//! Viewport state: image/canvas sizes plus the pan, zoom and rotation that map
//! canvas space onto the client surface.

use kurbo::{Affine, Point};
use serde::{Serialize, Deserialize};
use crate::consts::{MAX_ZOOM, MIN_ZOOM};
use crate::types::Size;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Geometry {
    pub image: Size,
    pub canvas: Size,
    pub grid: Size,
    pub top: f64,
    pub left: f64,
    pub scale: f64,
    /// Padding between the image origin and the canvas origin, in px.
    pub offset: f64,
    /// Clockwise rotation in degrees, one of 0, 90, 180, 270.
    pub angle: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            image: Size::default(),
            canvas: Size::default(),
            grid: Size::new(100.0, 100.0),
            top: 0.0,
            left: 0.0,
            scale: 1.0,
            offset: 0.0,
            angle: 0.0,
        }
    }
}

impl Geometry {
    pub fn new(image: Size, offset: f64) -> Self {
        let mut geometry = Geometry::default();
        geometry.set_image(image, offset);
        geometry
    }

    pub fn set_image(&mut self, image: Size, offset: f64) {
        self.image = image;
        self.offset = offset;
        self.canvas = Size::new(image.width + offset * 2.0, image.height + offset * 2.0);
    }

    /// Clamp scale and snap angle; applied to every geometry the host pushes in.
    pub fn normalized(mut self) -> Self {
        self.scale = clamp_scale(self.scale);
        self.angle = snap_angle(self.angle);
        self
    }

    /// Affine transform taking canvas coordinates to client coordinates. The canvas is
    /// placed at `(left, top)` and scaled and rotated about its centre.
    pub fn screen_ctm(&self) -> Affine {
        let cx = self.canvas.width / 2.0;
        let cy = self.canvas.height / 2.0;
        Affine::translate((self.left + cx, self.top + cy))
            * Affine::rotate(self.angle.to_radians())
            * Affine::scale(self.scale)
            * Affine::translate((-cx, -cy))
    }

    /// Multiply the scale by `factor`, keeping the canvas point under `anchor` (client) fixed.
    pub fn zoom(&mut self, anchor: Point, factor: f64) {
        let pinned = self.screen_ctm().inverse() * anchor;
        self.scale = clamp_scale(self.scale * factor);
        let moved = self.screen_ctm() * pinned;
        self.left += anchor.x - moved.x;
        self.top += anchor.y - moved.y;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.top += dy;
    }

    pub fn fit(&mut self, container: Size) {
        if self.image.width <= 0.0 || self.image.height <= 0.0 {
            return;
        }
        let quarter_turn = (self.angle / 90.0).round() as i64 % 2 != 0;
        let scale = if quarter_turn {
            (container.width / self.image.height).min(container.height / self.image.width)
        } else {
            (container.width / self.image.width).min(container.height / self.image.height)
        };
        self.scale = clamp_scale(scale);
        self.top = container.height / 2.0 - self.canvas.height / 2.0;
        self.left = container.width / 2.0 - self.canvas.width / 2.0;
    }

    pub fn rotate(&mut self, clockwise: bool) {
        let step = if clockwise { 90.0 } else { -90.0 };
        self.angle = snap_angle(self.angle + step);
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() { scale.clamp(MIN_ZOOM, MAX_ZOOM) } else { 1.0 }
}

fn snap_angle(angle: f64) -> f64 {
    let quarters = (angle / 90.0).round().rem_euclid(4.0);
    quarters * 90.0
}
