use kurbo::Point;
use crate::data::SkeletonNode;
use crate::error::{CanvasError, Result};
use crate::transform::compute_wrapping_box;

/// Skeleton nodes normalised to the unit square of their own bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct SkeletonTemplate {
    nodes: Vec<(Option<u32>, Point)>,
}

impl SkeletonTemplate {
    pub fn from_nodes(nodes: &[SkeletonNode]) -> Result<Self> {
        if nodes.is_empty() {
            return Err(CanvasError::InvalidData("skeleton template has no nodes".into()));
        }
        let raw: Vec<Point> = nodes.iter().map(|n| Point::new(n.x, n.y)).collect();
        let bbox = compute_wrapping_box(&raw, 0.0);
        let unit = |v: f64, origin: f64, extent: f64| if extent > 0.0 { (v - origin) / extent } else { 0.5 };
        let nodes = nodes
            .iter()
            .zip(raw)
            .map(|(node, p)| (node.label_id, Point::new(unit(p.x, bbox.x, bbox.width), unit(p.y, bbox.y, bbox.height))))
            .collect();
        Ok(SkeletonTemplate { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node positions interpolated into the box spanned by `a` and `b`.
    pub fn place(&self, a: Point, b: Point) -> Vec<(Option<u32>, Point)> {
        let (x0, y0) = (a.x.min(b.x), a.y.min(b.y));
        let (w, h) = ((a.x - b.x).abs(), (a.y - b.y).abs());
        self.nodes
            .iter()
            .map(|&(label, u)| (label, Point::new(x0 + u.x * w, y0 + u.y * h)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(label: u32, x: f64, y: f64) -> SkeletonNode {
        SkeletonNode { label_id: Some(label), x, y }
    }

    #[test]
    fn nodes_follow_the_box() {
        let template = SkeletonTemplate::from_nodes(&[node(1, 10.0, 10.0), node(2, 30.0, 50.0), node(3, 20.0, 30.0)]).unwrap();
        let placed = template.place(Point::new(100.0, 200.0), Point::new(0.0, 0.0));
        assert_eq!(placed[0], (Some(1), Point::new(0.0, 0.0)));
        assert_eq!(placed[1], (Some(2), Point::new(100.0, 200.0)));
        assert_eq!(placed[2], (Some(3), Point::new(50.0, 100.0)));
    }

    #[test]
    fn flat_template_centres_on_degenerate_axis() {
        let template = SkeletonTemplate::from_nodes(&[node(1, 0.0, 5.0), node(2, 10.0, 5.0)]).unwrap();
        let placed = template.place(Point::new(0.0, 0.0), Point::new(20.0, 20.0));
        assert_eq!(placed[1].1, Point::new(20.0, 10.0));
        assert!(SkeletonTemplate::from_nodes(&[]).is_err());
    }
}
