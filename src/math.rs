//! Stateless 2D primitives shared by the handlers.

use kurbo::{Point, Vec2};

const EPSILON: f64 = 1e-9;

/// Intersection of the infinite lines `p1p2` and `p3p4`. `None` when either line
/// has zero length or the lines are parallel.
pub fn intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    if d1.hypot() < EPSILON || d2.hypot() < EPSILON {
        return None;
    }
    let det = d1.cross(d2);
    if det.abs() < EPSILON {
        return None;
    }
    let t = (p3 - p1).cross(d2) / det;
    let hit = p1 + d1 * t;
    if hit.x.is_finite() && hit.y.is_finite() { Some(hit) } else { None }
}

pub fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.cross(s);
    if denom.abs() < EPSILON {
        return None;
    }
    let qp = b1 - a1;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (-EPSILON..=1.0 + EPSILON).contains(&t) && (-EPSILON..=1.0 + EPSILON).contains(&u) {
        Some(a1 + r * t)
    } else {
        None
    }
}

pub fn closest_point_on_segment(p: Point, a: Point, b: Point) -> Point {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq < EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Shoelace area, positive for clockwise order in screen coordinates (y down).
pub fn signed_area(polygon: &[Point]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Area-weighted centroid; falls back to the vertex mean for degenerate polygons.
pub fn polygon_centroid(polygon: &[Point]) -> Point {
    if polygon.is_empty() {
        return Point::ZERO;
    }
    let area = signed_area(polygon);
    if area.abs() < EPSILON {
        let sum = polygon.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
        return (sum / polygon.len() as f64).to_point();
    }
    let n = polygon.len();
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    Point::new(cx / (6.0 * area), cy / (6.0 * area))
}

pub fn polyline_length(points: &[Point], closed: bool) -> f64 {
    let mut length: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    if closed && points.len() > 2 {
        length += points[points.len() - 1].distance(points[0]);
    }
    length
}

pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[derive(Clone, Copy, Debug)]
enum FrameSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl FrameSide {
    fn is_inside(self, p: Point, width: f64, height: f64) -> bool {
        match self {
            FrameSide::Left => p.x >= 0.0,
            FrameSide::Right => p.x <= width,
            FrameSide::Top => p.y >= 0.0,
            FrameSide::Bottom => p.y <= height,
        }
    }

    /// Crossing of segment `ab` with this side's boundary line; `a` and `b` lie on
    /// opposite sides so the denominator is never zero.
    fn crossing(self, a: Point, b: Point, width: f64, height: f64) -> Point {
        match self {
            FrameSide::Left | FrameSide::Right => {
                let x = if matches!(self, FrameSide::Left) { 0.0 } else { width };
                let t = (x - a.x) / (b.x - a.x);
                Point::new(x, a.y + t * (b.y - a.y))
            }
            FrameSide::Top | FrameSide::Bottom => {
                let y = if matches!(self, FrameSide::Top) { 0.0 } else { height };
                let t = (y - a.y) / (b.y - a.y);
                Point::new(a.x + t * (b.x - a.x), y)
            }
        }
    }
}

fn clip_side(points: &[Point], closed: bool, side: FrameSide, width: f64, height: f64) -> Vec<Point> {
    let mut output = Vec::with_capacity(points.len() + 4);
    if points.is_empty() {
        return output;
    }
    let inside = |p: Point| side.is_inside(p, width, height);
    let mut visit = |prev: Point, cur: Point, output: &mut Vec<Point>| {
        if inside(cur) {
            if !inside(prev) {
                output.push(side.crossing(prev, cur, width, height));
            }
            output.push(cur);
        } else if inside(prev) {
            output.push(side.crossing(prev, cur, width, height));
        }
    };
    if closed {
        let mut prev = points[points.len() - 1];
        for &cur in points {
            visit(prev, cur, &mut output);
            prev = cur;
        }
    } else {
        if inside(points[0]) {
            output.push(points[0]);
        }
        for pair in points.windows(2) {
            visit(pair[0], pair[1], &mut output);
        }
    }
    output
}

/// Clip a polygon (`closed`) or polyline against the frame `[0, width] x [0, height]`,
/// splicing boundary crossings in place of the parts that fall outside.
pub fn crop_to_frame(points: &[Point], closed: bool, width: f64, height: f64) -> Vec<Point> {
    let mut result = points.to_vec();
    for side in [FrameSide::Left, FrameSide::Right, FrameSide::Top, FrameSide::Bottom] {
        result = clip_side(&result, closed, side, width, height);
    }
    result.dedup_by(|b, a| a.distance(*b) < EPSILON);
    if closed && result.len() > 1 && result[0].distance(result[result.len() - 1]) < EPSILON {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn line_intersection_and_degenerate_inputs() {
        let hit = intersection(p(0.0, 0.0), p(10.0, 10.0), p(0.0, 10.0), p(10.0, 0.0)).unwrap();
        assert!((hit - p(5.0, 5.0)).hypot() < 1e-9);
        assert!(intersection(p(0.0, 0.0), p(10.0, 0.0), p(0.0, 5.0), p(10.0, 5.0)).is_none());
        assert!(intersection(p(1.0, 1.0), p(1.0, 1.0), p(0.0, 5.0), p(10.0, 5.0)).is_none());
    }

    #[test]
    fn segments_must_overlap() {
        assert!(segment_intersection(p(0.0, 0.0), p(4.0, 4.0), p(0.0, 4.0), p(4.0, 0.0)).is_some());
        assert!(segment_intersection(p(0.0, 0.0), p(1.0, 1.0), p(0.0, 4.0), p(4.0, 0.0)).is_none());
    }

    #[test]
    fn closest_point_is_clamped() {
        assert_eq!(closest_point_on_segment(p(5.0, 3.0), p(0.0, 0.0), p(10.0, 0.0)), p(5.0, 0.0));
        assert_eq!(closest_point_on_segment(p(-5.0, 3.0), p(0.0, 0.0), p(10.0, 0.0)), p(0.0, 0.0));
    }

    #[test]
    fn centroid_of_square() {
        let square = [p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)];
        assert!((polygon_centroid(&square) - p(2.0, 2.0)).hypot() < 1e-9);
        assert_eq!(polyline_length(&square, true), 16.0);
        assert!(point_in_polygon(p(1.0, 1.0), &square));
        assert!(!point_in_polygon(p(5.0, 1.0), &square));
    }

    #[test]
    fn polygon_crossing_frame_is_spliced() {
        let triangle = [p(-10.0, 10.0), p(50.0, 10.0), p(50.0, 50.0)];
        let cropped = crop_to_frame(&triangle, true, 100.0, 100.0);
        assert!(cropped.iter().all(|q| q.x >= 0.0 && q.y >= 0.0));
        assert!(cropped.contains(&p(0.0, 10.0)));
        assert_eq!(cropped.len(), 4);
    }

    #[test]
    fn polyline_keeps_open_topology() {
        let line = [p(10.0, 10.0), p(150.0, 10.0)];
        let cropped = crop_to_frame(&line, false, 100.0, 100.0);
        assert_eq!(cropped, vec![p(10.0, 10.0), p(100.0, 10.0)]);
    }

    #[test]
    fn shape_inside_frame_is_untouched() {
        let square = [p(1.0, 1.0), p(9.0, 1.0), p(9.0, 9.0), p(1.0, 9.0)];
        assert_eq!(crop_to_frame(&square, true, 100.0, 100.0), square.to_vec());
    }
}
