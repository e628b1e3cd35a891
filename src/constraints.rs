use std::f64::consts::PI;
use crate::consts::{AREA_THRESHOLD, SIZE_THRESHOLD};
use crate::transform::{compute_wrapping_box, to_points};
use crate::types::{ShapeType, WrappingBox};

/// Commit-time validity of a shape. `points` is the flat wire list in image space;
/// `bbox` may be passed when the caller already has it. All thresholds are inclusive.
pub fn check_constraint(shape_type: ShapeType, points: &[f64], bbox: Option<&WrappingBox>) -> bool {
    let computed;
    let bbox = match bbox {
        Some(b) => b,
        None => {
            computed = compute_wrapping_box(&to_points(points), 0.0);
            &computed
        }
    };
    let vertices = points.len() / 2;
    match shape_type {
        ShapeType::Rectangle => vertices >= 2 && bbox.area() >= AREA_THRESHOLD,
        ShapeType::Polygon => vertices >= 3 && bbox.area() >= AREA_THRESHOLD,
        ShapeType::Polyline => {
            vertices >= 2 && (bbox.width >= SIZE_THRESHOLD || bbox.height >= SIZE_THRESHOLD)
        }
        ShapeType::Points => {
            points.len() > 2 || (points.len() == 2 && (points[0] != 0.0 || points[1] != 0.0))
        }
        ShapeType::Ellipse => {
            if points.len() != 4 {
                return false;
            }
            let rx = (points[2] - points[0]).abs();
            let ry = (points[1] - points[3]).abs();
            PI * rx * ry >= AREA_THRESHOLD
        }
        ShapeType::Cuboid => match vertices {
            4 | 8 => true,
            2 => bbox.area() >= AREA_THRESHOLD,
            _ => false,
        },
        ShapeType::Skeleton => bbox.width >= 1.0 || bbox.height >= 1.0,
        ShapeType::Mask => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_area_boundary_is_inclusive() {
        assert!(check_constraint(ShapeType::Rectangle, &[0.0, 0.0, 3.0, 3.0], None));
        assert!(!check_constraint(ShapeType::Rectangle, &[0.0, 0.0, 2.99, 2.99], None));
    }

    #[test]
    fn polygon_needs_three_vertices() {
        assert!(!check_constraint(ShapeType::Polygon, &[0.0, 0.0, 100.0, 100.0], None));
        assert!(check_constraint(ShapeType::Polygon, &[0.0, 0.0, 10.0, 0.0, 10.0, 10.0], None));
        assert!(!check_constraint(ShapeType::Polygon, &[0.0, 0.0, 2.0, 0.0, 2.0, 2.0], None));
    }

    #[test]
    fn polyline_needs_one_long_side() {
        assert!(check_constraint(ShapeType::Polyline, &[0.0, 0.0, 3.0, 0.0], None));
        assert!(!check_constraint(ShapeType::Polyline, &[0.0, 0.0, 2.0, 2.0], None));
        assert!(!check_constraint(ShapeType::Polyline, &[0.0, 0.0], None));
    }

    #[test]
    fn single_point_must_not_be_origin() {
        assert!(!check_constraint(ShapeType::Points, &[0.0, 0.0], None));
        assert!(check_constraint(ShapeType::Points, &[0.0, 1.0], None));
        assert!(check_constraint(ShapeType::Points, &[0.0, 0.0, 0.0, 0.0], None));
        assert!(!check_constraint(ShapeType::Points, &[], None));
    }

    #[test]
    fn ellipse_uses_true_area() {
        assert!(check_constraint(ShapeType::Ellipse, &[10.0, 10.0, 12.0, 8.0], None));
        assert!(!check_constraint(ShapeType::Ellipse, &[10.0, 10.0, 11.0, 8.0], None));
    }

    #[test]
    fn cuboid_point_counts() {
        assert!(check_constraint(ShapeType::Cuboid, &[0.0; 8], None));
        assert!(check_constraint(ShapeType::Cuboid, &[0.0; 16], None));
        assert!(!check_constraint(ShapeType::Cuboid, &[0.0; 12], None));
        assert!(check_constraint(ShapeType::Cuboid, &[0.0, 0.0, 3.0, 3.0], None));
        assert!(!check_constraint(ShapeType::Cuboid, &[0.0, 0.0, 1.0, 3.0], None));
    }

    #[test]
    fn skeleton_bbox_and_explicit_box() {
        assert!(!check_constraint(ShapeType::Skeleton, &[5.0, 5.0, 5.5, 5.5], None));
        let bbox = WrappingBox::from_corners(0.0, 0.0, 1.0, 0.0);
        assert!(check_constraint(ShapeType::Skeleton, &[5.0, 5.0], Some(&bbox)));
    }
}
