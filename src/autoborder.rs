//! Snapping of new polygon/polyline vertices onto the contours of other objects.

use kurbo::Point;
use crate::math::polyline_length;

#[derive(Clone, Debug, Default)]
pub struct Autoborder {
    /// Closed contours of other objects in image space, keyed by client id.
    contours: Vec<(u32, Vec<Point>)>,
    last: Option<(usize, usize)>,
}

impl Autoborder {
    pub fn set_contours(&mut self, contours: Vec<(u32, Vec<Point>)>) {
        self.contours = contours;
        self.last = None;
    }

    pub fn contours(&self) -> &[(u32, Vec<Point>)] {
        &self.contours
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    fn nearest(&self, p: Point, radius: f64) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, f64)> = None;
        for (ci, (_, contour)) in self.contours.iter().enumerate() {
            for (vi, v) in contour.iter().enumerate() {
                let d = v.distance(p);
                if d <= radius && best.map_or(true, |(_, _, bd)| d < bd) {
                    best = Some((ci, vi, d));
                }
            }
        }
        best.map(|(ci, vi, _)| (ci, vi))
    }

    /// Vertices to append for a click at `p`. A click near a contour vertex snaps to it;
    /// a second snapped click on the same contour also brings along every contour vertex
    /// between the two, walking the shorter way round.
    pub fn snap(&mut self, p: Point, radius: f64) -> Vec<Point> {
        let Some((ci, k)) = self.nearest(p, radius) else {
            self.last = None;
            return vec![p];
        };
        let contour = &self.contours[ci].1;
        let result = match self.last {
            Some((lc, j)) if lc == ci && j != k => {
                let n = contour.len();
                let forward: Vec<Point> = (1..=(k + n - j) % n).map(|s| contour[(j + s) % n]).collect();
                let backward: Vec<Point> = (1..=(j + n - k) % n).map(|s| contour[(j + n - s) % n]).collect();
                let length = |path: &[Point]| {
                    let mut full = vec![contour[j]];
                    full.extend_from_slice(path);
                    polyline_length(&full, false)
                };
                if length(&forward) <= length(&backward) { forward } else { backward }
            }
            _ => vec![contour[k]],
        };
        self.last = Some((ci, k));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 20.0),
            Point::new(0.0, 20.0),
        ]
    }

    #[test]
    fn far_click_is_kept() {
        let mut autoborder = Autoborder::default();
        autoborder.set_contours(vec![(1, square())]);
        assert_eq!(autoborder.snap(Point::new(50.0, 50.0), 3.0), vec![Point::new(50.0, 50.0)]);
    }

    #[test]
    fn second_snap_walks_shorter_arc() {
        let mut autoborder = Autoborder::default();
        autoborder.set_contours(vec![(1, square())]);
        assert_eq!(autoborder.snap(Point::new(1.0, 1.0), 3.0), vec![Point::new(0.0, 0.0)]);
        let run = autoborder.snap(Point::new(19.0, 1.0), 3.0);
        assert_eq!(run, vec![Point::new(10.0, 0.0), Point::new(20.0, 0.0)]);
        let back = autoborder.snap(Point::new(1.0, 19.0), 3.0);
        assert_eq!(back, vec![Point::new(20.0, 20.0), Point::new(0.0, 20.0)]);
    }
}
