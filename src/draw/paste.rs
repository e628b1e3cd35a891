use kurbo::{Point, Vec2};
use crate::observer::DrawnShape;
use crate::transform::{compute_wrapping_box, to_points};
use crate::types::{ObjectState, ShapeType};

fn shift_flat(points: &[f64], delta: Vec2) -> Vec<f64> {
    points
        .chunks_exact(2)
        .flat_map(|c| [c[0] + delta.x, c[1] + delta.y])
        .collect()
}

fn all_points(state: &ObjectState) -> Vec<Point> {
    if state.shape_type == ShapeType::Skeleton && !state.elements.is_empty() {
        state.elements.iter().flat_map(|e| to_points(&e.points)).collect()
    } else {
        to_points(&state.points)
    }
}

/// Floating copy of an existing vector object; its bounding-box centre follows the cursor.
#[derive(Clone, Debug)]
pub struct PasteCollector {
    state: ObjectState,
    anchor: Point,
    cursor: Option<Point>,
}

impl PasteCollector {
    pub fn new(state: ObjectState) -> Self {
        let bbox = compute_wrapping_box(&all_points(&state), 0.0);
        let anchor = Point::new(bbox.x + bbox.width / 2.0, bbox.y + bbox.height / 2.0);
        PasteCollector { state, anchor, cursor: None }
    }

    pub fn shape_type(&self) -> ShapeType {
        self.state.shape_type
    }

    pub fn pointer_move(&mut self, image: Point) {
        self.cursor = Some(image);
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn place(&self, image: Point) -> DrawnShape {
        let delta = image - self.anchor;
        let elements = self
            .state
            .elements
            .iter()
            .map(|e| DrawnShape {
                label_id: e.label_id,
                ..DrawnShape::new(e.shape_type, shift_flat(&e.points, delta))
            })
            .collect::<Vec<_>>();
        let points = if self.state.shape_type == ShapeType::Skeleton && !elements.is_empty() {
            elements.iter().flat_map(|e| e.points.iter().copied()).collect()
        } else {
            shift_flat(&self.state.points, delta)
        };
        DrawnShape {
            shape_type: self.state.shape_type,
            points,
            rotation: self.state.rotation,
            elements,
            label_id: self.state.label_id,
            client_id: None,
        }
    }

    pub fn preview(&self) -> Option<DrawnShape> {
        self.cursor.map(|c| self.place(c))
    }
}
