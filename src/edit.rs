//! Vertex editing of polygons, polylines and point sets: a new line drawn from one
//! vertex either re-enters the shape at another vertex or extends it.

use std::rc::Rc;
use kurbo::Point;
use crate::autoborder::Autoborder;
use crate::canvas::Mode;
use crate::config::Configuration;
use crate::draw::finalize_points;
use crate::draw::polyshape::PolyshapeCollector;
use crate::data::EditData;
use crate::error::{CanvasError, Result};
use crate::events::{Clock, KeyEvent, MouseButton, PointerEvent};
use crate::math::{point_in_polygon, polyline_length, signed_area};
use crate::observer::CanvasObserver;
use crate::preview::{Preview, PreviewShape};
use crate::transform::{compute_wrapping_box, rotate_2d_points, to_points, Projection};
use crate::types::{ObjectState, ShapeType};

/// The two polygons a re-entering line can produce, each with the original arc it keeps.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitCandidates {
    pub polygons: [Vec<Point>; 2],
    kept_arcs: [Vec<Point>; 2],
}

impl SplitCandidates {
    /// `line` runs from `original[start]` through the new vertices; the closing vertex
    /// `original[end]` is appended here. `None` when either side has fewer than 3 vertices.
    pub fn new(original: &[Point], start: usize, end: usize, line: &[Point]) -> Option<Self> {
        let n = original.len();
        if n < 3 || start >= n || end >= n || start == end {
            return None;
        }
        let mut head = line.to_vec();
        head.push(original[end]);
        let forward: Vec<usize> = (1..(start + n - end) % n).map(|i| (end + i) % n).collect();
        let backward: Vec<usize> = (1..(end + n - start) % n).map(|i| (end + n - i) % n).collect();
        let build = |arc: &[usize]| {
            let mut polygon = head.clone();
            polygon.extend(arc.iter().map(|&i| original[i]));
            let mut kept = vec![original[end]];
            kept.extend(arc.iter().map(|&i| original[i]));
            kept.push(original[start]);
            (polygon, kept)
        };
        let (a, arc_a) = build(&forward);
        let (b, arc_b) = build(&backward);
        if a.len() < 3 || b.len() < 3 {
            return None;
        }
        Some(SplitCandidates { polygons: [a, b], kept_arcs: [arc_a, arc_b] })
    }

    /// The candidate that replaces the shorter original arc: its kept arc beats the
    /// other on both vertex count and length. `None` when neither dominates.
    pub fn intelligent_choice(&self) -> Option<usize> {
        let stats = |arc: &Vec<Point>| (arc.len(), polyline_length(arc, false));
        let (a, b) = (stats(&self.kept_arcs[0]), stats(&self.kept_arcs[1]));
        if a.0 > b.0 && a.1 > b.1 {
            Some(0)
        } else if b.0 > a.0 && b.1 > a.1 {
            Some(1)
        } else {
            None
        }
    }

    /// Candidate under `p`; the smaller one wins when they overlap.
    pub fn pick(&self, p: Point) -> Option<usize> {
        let hits: Vec<usize> = (0..2).filter(|&i| point_in_polygon(p, &self.polygons[i])).collect();
        hits.into_iter()
            .min_by(|&i, &j| signed_area(&self.polygons[i]).abs().total_cmp(&signed_area(&self.polygons[j]).abs()))
    }
}

enum Phase {
    Drawing,
    Choosing(SplitCandidates),
}

struct EditSession {
    state: ObjectState,
    /// Displayed vertices in image space, rotation already applied.
    original: Vec<Point>,
    start: usize,
    line: PolyshapeCollector,
    phase: Phase,
    started_at: f64,
}

impl EditSession {
    fn rotation_result(&self) -> Option<f64> {
        (self.state.rotation != 0.0).then_some(0.0)
    }
}

pub struct EditHandler {
    observer: Rc<dyn CanvasObserver>,
    clock: Rc<dyn Clock>,
    projection: Projection,
    config: Configuration,
    autoborder: Autoborder,
    session: Option<EditSession>,
}

/// Vertices as displayed: rotated about the bounding-box centre.
pub(crate) fn displayed_points(state: &ObjectState) -> Vec<Point> {
    let points = to_points(&state.points);
    if state.rotation == 0.0 {
        return points;
    }
    let bbox = compute_wrapping_box(&points, 0.0);
    rotate_2d_points(bbox.x + bbox.width / 2.0, bbox.y + bbox.height / 2.0, state.rotation, &points)
}

impl EditHandler {
    pub fn new(observer: Rc<dyn CanvasObserver>, clock: Rc<dyn Clock>) -> Self {
        EditHandler {
            observer,
            clock,
            projection: Projection::default(),
            config: Configuration::default(),
            autoborder: Autoborder::default(),
            session: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn transform(&mut self, projection: &Projection) {
        self.projection = projection.clone();
    }

    pub fn configurate(&mut self, config: &Configuration) {
        self.config = config.clone();
    }

    pub fn set_autoborder_contours(&mut self, contours: Vec<(u32, Vec<Point>)>) {
        self.autoborder.set_contours(contours);
    }

    /// Start editing at `pointID`, or with `enabled: false` finish the edit in progress.
    pub fn edit(&mut self, data: EditData, projection: &Projection) -> Result<()> {
        self.projection = projection.clone();
        if !data.enabled {
            self.finish();
            return Ok(());
        }
        if self.session.is_some() {
            return Err(CanvasError::ModeConflict { active: Mode::Edit, requested: Mode::Edit });
        }
        let state = data.state.ok_or(CanvasError::MissingField("state"))?;
        if !state.shape_type.is_polyshape() {
            return Err(CanvasError::UnsupportedShape { mode: Mode::Edit, shape: state.shape_type });
        }
        let original = displayed_points(&state);
        if original.is_empty() {
            return Err(CanvasError::InvalidData("object has no points".into()));
        }
        let start = match (state.shape_type, data.point_id) {
            (ShapeType::Points, id) => id.unwrap_or(original.len() - 1).min(original.len() - 1),
            (_, Some(id)) if id < original.len() => id,
            (_, Some(id)) => return Err(CanvasError::InvalidData(format!("no vertex {}", id))),
            (_, None) => return Err(CanvasError::MissingField("pointID")),
        };
        let mut line = PolyshapeCollector::new(None);
        let anchor = self.projection.canvas_to_client(self.projection.image_to_canvas(original[start]));
        line.add(original[start], anchor);
        log::debug!("edit started: {} at vertex {}", state.shape_type, start);
        self.autoborder.reset();
        self.session = Some(EditSession {
            state,
            original,
            start,
            line,
            phase: Phase::Drawing,
            started_at: self.clock.now_ms(),
        });
        Ok(())
    }

    /// Abandon the edit; the object is left untouched. A no-op when idle.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("edit cancelled");
            self.observer.on_edit_done(Some(&session.state), None, None);
        }
    }

    fn commit(&mut self, points: Option<Vec<Point>>) {
        let Some(session) = self.session.take() else {
            return;
        };
        let frame = self.projection.geometry().image;
        let shape_type = session.state.shape_type;
        let flat = points.and_then(|p| finalize_points(shape_type, &p, frame, shape_type != ShapeType::Points));
        log::debug!(
            "edit finished after {:.0}ms ({})",
            self.clock.now_ms() - session.started_at,
            if flat.is_some() { "applied" } else { "nothing" }
        );
        let rotation = flat.as_ref().and_then(|_| session.rotation_result());
        self.observer.on_edit_done(Some(&session.state), flat, rotation);
    }

    /// Result of finishing without re-entering the shape.
    fn finish(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let added = &session.line.points()[1..];
        let original = &session.original;
        let start = session.start;
        let points = match (&session.phase, session.state.shape_type) {
            (Phase::Choosing(_), _) | (_, ShapeType::Polygon) => None,
            _ if added.is_empty() => None,
            (_, ShapeType::Points) => Some(original.iter().chain(added).copied().collect()),
            (_, _) if start == original.len() - 1 => Some(original.iter().chain(added).copied().collect()),
            (_, _) if start == 0 => {
                let mut points: Vec<Point> = added.iter().rev().copied().collect();
                points.extend_from_slice(original);
                Some(points)
            }
            _ => Some(original[..=start].iter().chain(added).copied().collect()),
        };
        self.commit(points);
    }

    pub fn choose_candidate(&mut self, index: usize) -> bool {
        let polygon = match self.session.as_ref().map(|s| &s.phase) {
            Some(Phase::Choosing(candidates)) if index < 2 => candidates.polygons[index].clone(),
            _ => return false,
        };
        self.commit(Some(polygon));
        true
    }

    fn vertex_at(&self, p: Point) -> Option<usize> {
        let session = self.session.as_ref()?;
        let radius = self.projection.screen_length(self.config.control_points_size);
        session
            .original
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.distance(p)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    fn reenter(&mut self, end: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let line = session.line.points().to_vec();
        let original = &session.original;
        let start = session.start;
        match session.state.shape_type {
            ShapeType::Polygon => {
                let Some(candidates) = SplitCandidates::new(original, start, end, &line) else {
                    log::warn!("split would leave a side with fewer than 3 vertices, aborting edit");
                    self.cancel();
                    return;
                };
                let choice = if self.config.intelligent_polygon_crop { candidates.intelligent_choice() } else { None };
                match choice {
                    Some(i) => {
                        let polygon = candidates.polygons[i].clone();
                        self.commit(Some(polygon));
                    }
                    None => session.phase = Phase::Choosing(candidates),
                }
            }
            ShapeType::Polyline => {
                let interior = &line[1..];
                let points: Vec<Point> = if start < end {
                    original[..=start].iter().chain(interior).chain(&original[end..]).copied().collect()
                } else {
                    original[..=end]
                        .iter()
                        .chain(interior.iter().rev())
                        .chain(&original[start..])
                        .copied()
                        .collect()
                };
                self.commit(Some(points));
            }
            _ => {}
        }
    }

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        let image = self.projection.client_to_image(event.client());
        let vertex = self.vertex_at(image);
        let snapping = self.config.autoborders;
        let radius = self.projection.screen_length(self.config.control_points_size * 2.0);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Phase::Choosing(candidates) = &session.phase {
            if event.button == MouseButton::Left {
                if let Some(i) = candidates.pick(image) {
                    self.choose_candidate(i);
                }
            }
            return;
        }
        match event.button {
            MouseButton::Left => match vertex {
                Some(v) if v == session.start => {}
                Some(v) if session.state.shape_type != ShapeType::Points => self.reenter(v),
                _ => {
                    if snapping && session.state.shape_type == ShapeType::Polygon {
                        let run = self.autoborder.snap(image, radius);
                        session.line.extend(&run, event.client());
                    } else {
                        session.line.add(image, event.client());
                    }
                }
            },
            MouseButton::Right => {
                if session.line.len() > 1 {
                    session.line.undo();
                    self.autoborder.reset();
                }
            }
            _ => {}
        }
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        let image = self.projection.client_to_image(event.client());
        let threshold = self.config.slide_threshold;
        if let Some(session) = self.session.as_mut() {
            if event.shift_key && matches!(session.phase, Phase::Drawing) {
                session.line.slide(image, event.client(), threshold);
            } else {
                session.line.pointer_move(image);
            }
        }
    }

    pub fn key_down(&mut self, event: &KeyEvent) {
        if event.key == "Enter" {
            self.finish();
        }
    }

    pub fn preview(&self) -> Preview {
        let mut preview = Preview::new(&self.projection, &self.config);
        let Some(session) = self.session.as_ref() else {
            return preview;
        };
        let to_canvas = |points: &[Point]| -> Vec<Point> {
            points.iter().map(|p| self.projection.image_to_canvas(*p)).collect()
        };
        let shape_type = session.state.shape_type;
        if !self.config.hide_edited_object {
            preview.shapes.push(PreviewShape {
                control_points: true,
                fill_opacity: self.config.selected_shape_opacity,
                ..PreviewShape::outline(shape_type, to_canvas(&session.original), shape_type == ShapeType::Polygon)
            });
        }
        match &session.phase {
            Phase::Drawing => {
                let line_type = if shape_type == ShapeType::Points { ShapeType::Points } else { ShapeType::Polyline };
                preview.shapes.push(PreviewShape::outline(line_type, to_canvas(&session.line.with_cursor()), false));
            }
            Phase::Choosing(candidates) => {
                preview.candidates = candidates.polygons.iter().map(|p| to_canvas(p)).collect();
            }
        }
        preview
    }
}
