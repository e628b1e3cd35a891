use std::io::Cursor;
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use kurbo::Point;
use crate::data::BrushForm;
use crate::error::{CanvasError, Result};
use crate::math::point_in_polygon;
use crate::rle::{self, RleMask};

/// How a stroke combines with what is already painted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Composite {
    /// Painted pixels become (or stay) foreground; overlapping strokes merge.
    Union,
    DestinationOut,
}

/// Off-screen RGBA raster in image coordinates. Alpha is binary: 0 outside, 255 inside.
#[derive(Clone, Debug)]
pub struct MaskRaster {
    image: RgbaImage,
    color: [u8; 3],
}

impl MaskRaster {
    pub fn new(width: u32, height: u32, color: [u8; 3]) -> Self {
        MaskRaster { image: RgbaImage::new(width.max(1), height.max(1)), color }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn set_color(&mut self, color: [u8; 3]) {
        self.color = color;
        for pixel in self.image.pixels_mut().filter(|p| p[3] != 0) {
            *pixel = Rgba([color[0], color[1], color[2], 255]);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.image.pixels().all(|p| p[3] == 0)
    }

    pub fn foreground_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p[3] != 0).count()
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.image.get_pixel(x, y)[3] != 0
    }

    /// Composite every pixel of the inclusive box whose centre satisfies `covered`.
    fn paint(&mut self, bounds: (f64, f64, f64, f64), composite: Composite, covered: impl Fn(Point) -> bool) {
        let (x0, y0, x1, y1) = bounds;
        let max_x = self.width() as f64 - 1.0;
        let max_y = self.height() as f64 - 1.0;
        if x1 < 0.0 || y1 < 0.0 || x0 > max_x + 1.0 || y0 > max_y + 1.0 {
            return;
        }
        let (x0, x1) = (x0.floor().max(0.0) as u32, x1.ceil().min(max_x) as u32);
        let (y0, y1) = (y0.floor().max(0.0) as u32, y1.ceil().min(max_y) as u32);
        let value = match composite {
            Composite::Union => Rgba([self.color[0], self.color[1], self.color[2], 255]),
            Composite::DestinationOut => Rgba([0, 0, 0, 0]),
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                if covered(Point::new(x as f64 + 0.5, y as f64 + 0.5)) {
                    self.image.put_pixel(x, y, value);
                }
            }
        }
    }

    pub fn stamp(&mut self, center: Point, size: f64, form: BrushForm, composite: Composite) {
        let r = size / 2.0;
        let bounds = (center.x - r, center.y - r, center.x + r, center.y + r);
        match form {
            BrushForm::Circle => self.paint(bounds, composite, |p| p.distance(center) <= r),
            BrushForm::Square => {
                self.paint(bounds, composite, |p| (p.x - center.x).abs() <= r && (p.y - center.y).abs() <= r)
            }
        }
    }

    /// Stamp at `to`, filling the gap from `from` with intermediate stamps spaced half a
    /// brush apart when the pointer jumped farther than that.
    pub fn stroke(&mut self, from: Point, to: Point, size: f64, form: BrushForm, composite: Composite) {
        let spacing = (size / 2.0).max(0.5);
        let distance = from.distance(to);
        if distance > spacing {
            let steps = (distance / spacing).ceil() as usize;
            for i in 1..steps {
                let t = i as f64 / steps as f64;
                self.stamp(from.lerp(to, t), size, form, composite);
            }
        }
        self.stamp(to, size, form, composite);
    }

    pub fn fill_polygon(&mut self, polygon: &[Point], composite: Composite) {
        if polygon.len() < 3 {
            return;
        }
        let (mut x0, mut y0, mut x1, mut y1) = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in polygon {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        self.paint((x0, y0, x1, y1), composite, |p| point_in_polygon(p, polygon));
    }

    /// Copy keeping only the foreground whose pixel centres fall inside `polygon`.
    pub fn clipped(&self, polygon: &[Point]) -> MaskRaster {
        let mut clipped = self.clone();
        for (x, y, pixel) in clipped.image.enumerate_pixels_mut() {
            if pixel[3] != 0 && !point_in_polygon(Point::new(x as f64 + 0.5, y as f64 + 0.5), polygon) {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
        clipped
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Paint a decoded mask at its box; anything outside the raster is dropped.
    pub fn load(&mut self, mask: &RleMask) -> Result<()> {
        let alpha = mask.decode()?;
        let width = mask.width();
        let value = Rgba([self.color[0], self.color[1], self.color[2], 255]);
        for (i, _) in alpha.iter().enumerate().filter(|(_, a)| **a != 0) {
            let x = mask.left + (i % width) as u32;
            let y = mask.top + (i / width) as u32;
            if x < self.width() && y < self.height() {
                self.image.put_pixel(x, y, value);
            }
        }
        Ok(())
    }

    /// Tight bounding box of the foreground, inclusive; `None` when nothing is painted.
    pub fn bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in self.image.enumerate_pixels() {
            if pixel[3] == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
            });
        }
        bounds
    }

    pub fn encode(&self) -> Option<RleMask> {
        let (left, top, right, bottom) = self.bounds()?;
        let mut alpha = Vec::with_capacity(((right - left + 1) * (bottom - top + 1)) as usize);
        for y in top..=bottom {
            for x in left..=right {
                alpha.push(self.image.get_pixel(x, y)[3]);
            }
        }
        Some(RleMask { counts: rle::encode(&alpha), left, top, right, bottom })
    }

    pub fn to_data_url(&self) -> Result<String> {
        let mut png_bytes = Vec::new();
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut Cursor::new(&mut png_bytes), ImageOutputFormat::Png)
            .map_err(|e| CanvasError::InvalidData(format!("png encoding failed: {}", e)))?;
        Ok(format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png_bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 3] = [255, 0, 0];

    #[test]
    fn circle_stamp_covers_pixel_centres() {
        let mut raster = MaskRaster::new(200, 200, RED);
        raster.stamp(Point::new(100.0, 100.0), 10.0, BrushForm::Circle, Composite::Union);
        assert_eq!(raster.foreground_pixels(), 80);
        assert_eq!(raster.bounds(), Some((95, 95, 104, 104)));
    }

    #[test]
    fn overlapping_union_strokes_merge() {
        let mut raster = MaskRaster::new(50, 50, RED);
        raster.stamp(Point::new(20.0, 20.0), 6.0, BrushForm::Square, Composite::Union);
        raster.stamp(Point::new(20.0, 20.0), 6.0, BrushForm::Square, Composite::Union);
        assert_eq!(raster.foreground_pixels(), 36);
        raster.stamp(Point::new(20.0, 20.0), 2.0, BrushForm::Square, Composite::DestinationOut);
        assert_eq!(raster.foreground_pixels(), 32);
    }

    #[test]
    fn fast_strokes_leave_no_gaps() {
        let mut raster = MaskRaster::new(100, 20, RED);
        raster.stroke(Point::new(5.0, 10.0), Point::new(95.0, 10.0), 4.0, BrushForm::Circle, Composite::Union);
        assert!((5..95).all(|x| raster.is_set(x, 9)));
    }

    #[test]
    fn polygon_fill_and_encode_round_trip() {
        let mut raster = MaskRaster::new(40, 40, RED);
        let square = [Point::new(10.0, 10.0), Point::new(20.0, 10.0), Point::new(20.0, 20.0), Point::new(10.0, 20.0)];
        raster.fill_polygon(&square, Composite::Union);
        let mask = raster.encode().unwrap();
        assert_eq!((mask.left, mask.top, mask.right, mask.bottom), (10, 10, 19, 19));
        assert_eq!(mask.foreground_pixels(), 100);

        let mut copy = MaskRaster::new(40, 40, RED);
        copy.load(&mask).unwrap();
        assert_eq!(copy.encode(), Some(mask));
    }

    #[test]
    fn clipping_keeps_inside_only() {
        let mut raster = MaskRaster::new(40, 40, RED);
        raster.fill_polygon(&[Point::new(0.0, 0.0), Point::new(40.0, 0.0), Point::new(40.0, 40.0), Point::new(0.0, 40.0)], Composite::Union);
        let half = raster.clipped(&[Point::new(0.0, 0.0), Point::new(20.0, 0.0), Point::new(20.0, 40.0), Point::new(0.0, 40.0)]);
        assert_eq!(half.foreground_pixels(), 800);
        assert!(MaskRaster::new(4, 4, RED).encode().is_none());
    }

    #[test]
    fn snapshot_is_png_data_url() {
        let raster = MaskRaster::new(4, 4, RED);
        assert!(raster.to_data_url().unwrap().starts_with("data:image/png;base64,"));
    }
}
