//! Cutting a polygon or a mask in two with a clicked polyline.

use std::rc::Rc;
use kurbo::Point;
use crate::canvas::Mode;
use crate::config::Configuration;
use crate::constraints::check_constraint;
use crate::data::SliceData;
use crate::edit::displayed_points;
use crate::error::{CanvasError, Result};
use crate::events::{Clock, MouseButton, PointerEvent, RequestTracker};
use crate::masks::raster::MaskRaster;
use crate::math::{point_in_polygon, segment_intersection};
use crate::observer::CanvasObserver;
use crate::preview::{Preview, PreviewShape};
use crate::rle::RleMask;
use crate::transform::{to_flat, Projection};
use crate::types::{ObjectState, ShapeType};

const SAME_HIT: f64 = 1e-6;

/// Where the cut line crossed the contour: the point and the index of the contour edge
/// `contour[edge] -> contour[edge + 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContourHit {
    pub point: Point,
    pub edge: usize,
}

/// Every crossing of segment `a -> b` with the closed contour, duplicates at shared
/// vertices merged.
pub fn contour_hits(contour: &[Point], a: Point, b: Point) -> Vec<ContourHit> {
    let n = contour.len();
    let mut hits: Vec<ContourHit> = Vec::new();
    for edge in 0..n {
        if let Some(point) = segment_intersection(a, b, contour[edge], contour[(edge + 1) % n]) {
            if hits.iter().all(|h| h.point.distance(point) > SAME_HIT) {
                hits.push(ContourHit { point, edge });
            }
        }
    }
    hits
}

/// Split `contour` along a cut entering at `first`, running through `interior` and
/// leaving at `second`.
pub fn slice_contour(contour: &[Point], first: ContourHit, interior: &[Point], second: ContourHit) -> [Vec<Point>; 2] {
    let n = contour.len();
    let (a, b) = (first.edge, second.edge);
    // contour[from + 1] ..= contour[to], wrapping
    let arc = |from: usize, to: usize| -> Vec<Point> {
        let count = (to + n - from) % n;
        (1..=count).map(|i| contour[(from + i) % n]).collect()
    };
    let reversed: Vec<Point> = interior.iter().rev().copied().collect();

    if a != b {
        let mut one = vec![first.point];
        one.extend_from_slice(interior);
        one.push(second.point);
        one.extend(arc(b, a));

        let mut other = vec![second.point];
        other.extend_from_slice(&reversed);
        other.push(first.point);
        other.extend(arc(a, b));
        return [one, other];
    }

    let mut pocket = vec![first.point];
    pocket.extend_from_slice(interior);
    pocket.push(second.point);

    // Everything but the pocket: walk the contour from the far end of the cut edge round
    // to its start, then back along the cut from the nearer crossing.
    let start = contour[a];
    let mut rest: Vec<Point> = (1..=n).map(|i| contour[(a + i) % n]).collect();
    if first.point.distance(start) <= second.point.distance(start) {
        rest.push(first.point);
        rest.extend_from_slice(interior);
        rest.push(second.point);
    } else {
        rest.push(second.point);
        rest.extend_from_slice(&reversed);
        rest.push(first.point);
    }
    [pocket, rest]
}

enum Phase {
    Picking,
    /// Waiting for the host to answer a contour request.
    AwaitingContour,
    Cutting { contour: Vec<Point> },
}

struct SliceSession {
    state: Option<ObjectState>,
    phase: Phase,
    line: Vec<Point>,
    /// First crossing and the index of the first line point after it.
    entry: Option<(ContourHit, usize)>,
    cursor: Option<Point>,
    started_at: f64,
}

pub struct SliceHandler {
    observer: Rc<dyn CanvasObserver>,
    clock: Rc<dyn Clock>,
    projection: Projection,
    config: Configuration,
    session: Option<SliceSession>,
    contours: RequestTracker,
}

impl SliceHandler {
    pub fn new(observer: Rc<dyn CanvasObserver>, clock: Rc<dyn Clock>) -> Self {
        SliceHandler {
            observer,
            clock,
            projection: Projection::default(),
            config: Configuration::default(),
            session: None,
            contours: RequestTracker::default(),
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

    pub fn slice(&mut self, data: SliceData, projection: &Projection) -> Result<()> {
        self.projection = projection.clone();
        if !data.enabled {
            self.cancel();
            return Ok(());
        }
        if self.session.is_some() {
            return Err(CanvasError::ModeConflict { active: Mode::Slice, requested: Mode::Slice });
        }
        self.session = Some(SliceSession {
            state: None,
            phase: Phase::Picking,
            line: Vec::new(),
            entry: None,
            cursor: None,
            started_at: self.clock.now_ms(),
        });
        if let Some(mut state) = data.state {
            if state.client_id.is_none() {
                state.client_id = data.client_id;
            }
            if let Err(e) = self.pick(state) {
                self.session = None;
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn pick(&mut self, state: ObjectState) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if !matches!(session.phase, Phase::Picking) {
            return Ok(());
        }
        match state.shape_type {
            ShapeType::Polygon => {
                let contour = displayed_points(&state);
                if contour.len() < 3 {
                    return Err(CanvasError::InvalidData("polygon has fewer than 3 vertices".into()));
                }
                session.phase = Phase::Cutting { contour };
            }
            ShapeType::Mask => {
                RleMask::from_points(&state.points)?;
                let id = self.contours.issue();
                session.phase = Phase::AwaitingContour;
                self.observer.on_contour_requested(id, &state);
            }
            shape => return Err(CanvasError::UnsupportedShape { mode: Mode::Slice, shape }),
        }
        log::debug!("slicing {}", state.shape_type);
        session.state = Some(state);
        Ok(())
    }

    /// The host's answer to a contour request. Stale answers are dropped.
    pub fn contour_ready(&mut self, request_id: u64, contour: Vec<Point>) -> bool {
        if !self.contours.complete(request_id) {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !matches!(session.phase, Phase::AwaitingContour) {
            return false;
        }
        if contour.len() < 3 {
            log::warn!("contour with {} vertices cannot be sliced", contour.len());
            self.cancel();
            return false;
        }
        session.phase = Phase::Cutting { contour };
        true
    }

    pub fn cancel(&mut self) {
        self.contours.invalidate();
        if let Some(session) = self.session.take() {
            log::debug!("slice cancelled");
            self.observer.on_slice_done(None, None, self.clock.now_ms() - session.started_at);
        }
    }

    fn add_point(&mut self, p: Point) -> Option<(ContourHit, Vec<Point>, ContourHit, Vec<Point>)> {
        let session = self.session.as_mut()?;
        let Phase::Cutting { contour } = &session.phase else {
            return None;
        };
        let Some(&last) = session.line.last() else {
            // the cut has to enter the shape from outside
            if point_in_polygon(p, contour) {
                log::warn!("cut line has to start outside the shape, point rejected");
                return None;
            }
            session.line.push(p);
            return None;
        };
        if last.distance(p) < SAME_HIT {
            return None;
        }
        let crosses_itself = session
            .line
            .windows(2)
            .take(session.line.len().saturating_sub(2))
            .any(|w| segment_intersection(w[0], w[1], last, p).is_some());
        if crosses_itself {
            log::warn!("cut line may not cross itself, point rejected");
            return None;
        }
        let hits = contour_hits(contour, last, p);
        match (hits.as_slice(), session.entry) {
            ([], _) => {
                session.line.push(p);
                None
            }
            ([hit], None) => {
                session.line.push(p);
                session.entry = Some((*hit, session.line.len() - 1));
                None
            }
            ([hit], Some((entry, index))) => {
                let interior = session.line[index..].to_vec();
                Some((entry, interior, *hit, contour.clone()))
            }
            _ => {
                log::warn!("cut segment crosses the contour {} times, point rejected", hits.len());
                None
            }
        }
    }

    fn finish(&mut self, first: ContourHit, interior: Vec<Point>, second: ContourHit, contour: Vec<Point>) {
        let Some(session) = self.session.take() else {
            return;
        };
        let duration = self.clock.now_ms() - session.started_at;
        let Some(state) = session.state else {
            return;
        };
        let pieces = slice_contour(&contour, first, &interior, second);
        let results = match state.shape_type {
            ShapeType::Mask => self.cut_mask(&state, &pieces),
            _ => {
                let [a, b] = pieces.map(|piece| to_flat(&piece));
                let valid = check_constraint(ShapeType::Polygon, &a, None) && check_constraint(ShapeType::Polygon, &b, None);
                valid.then_some([a, b])
            }
        };
        log::debug!("slice finished ({})", if results.is_some() { "two parts" } else { "nothing" });
        self.observer.on_slice_done(Some(&state), results, duration);
    }

    fn cut_mask(&self, state: &ObjectState, pieces: &[Vec<Point>; 2]) -> Option<[Vec<f64>; 2]> {
        let mask = RleMask::from_points(&state.points).ok()?;
        let frame = self.projection.geometry().image;
        let width = (frame.width.ceil() as u32).max(mask.right + 1);
        let height = (frame.height.ceil() as u32).max(mask.bottom + 1);
        let mut raster = MaskRaster::new(width, height, [255, 255, 255]);
        raster.load(&mask).ok()?;
        let a = raster.clipped(&pieces[0]).encode()?;
        let b = raster.clipped(&pieces[1]).encode()?;
        Some([a.to_points(), b.to_points()])
    }

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        let image = self.projection.client_to_image(event.client());
        match event.button {
            MouseButton::Left => {
                if let Some((first, interior, second, contour)) = self.add_point(image) {
                    self.finish(first, interior, second, contour);
                }
            }
            MouseButton::Right => {
                if let Some(session) = self.session.as_mut() {
                    session.line.pop();
                    if matches!(session.entry, Some((_, index)) if index >= session.line.len()) {
                        session.entry = None;
                    }
                }
            }
            _ => {}
        }
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        let image = self.projection.client_to_image(event.client());
        if let Some(session) = self.session.as_mut() {
            session.cursor = Some(image);
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
        if let Phase::Cutting { contour } = &session.phase {
            preview.shapes.push(PreviewShape::outline(ShapeType::Polygon, to_canvas(contour), true));
        }
        let mut line = session.line.clone();
        line.extend(session.cursor.filter(|_| !session.line.is_empty()));
        if !line.is_empty() {
            preview.shapes.push(PreviewShape {
                control_points: true,
                ..PreviewShape::outline(ShapeType::Polyline, to_canvas(&line), false)
            });
        }
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use crate::events::ManualClock;
    use crate::geometry::Geometry;
    use crate::math::signed_area;
    use crate::transform::to_points;
    use crate::types::Size;

    #[derive(Default)]
    struct Recorder {
        sliced: RefCell<Vec<Option<[Vec<f64>; 2]>>>,
    }

    impl CanvasObserver for Recorder {
        fn on_slice_done(&self, _state: Option<&ObjectState>, results: Option<[Vec<f64>; 2]>, _duration_ms: f64) {
            self.sliced.borrow_mut().push(results);
        }
    }

    fn cutting_square() -> (Rc<Recorder>, SliceHandler) {
        let recorder = Rc::new(Recorder::default());
        let mut handler = SliceHandler::new(recorder.clone(), Rc::new(ManualClock::new()));
        let projection = Projection::new(Geometry::new(Size::new(200.0, 200.0), 0.0));
        let state = ObjectState::new(ShapeType::Polygon, vec![20.0, 20.0, 80.0, 20.0, 80.0, 80.0, 20.0, 80.0]);
        let data = SliceData { enabled: true, client_id: Some(1), state: Some(state) };
        handler.slice(data, &projection).unwrap();
        (recorder, handler)
    }

    fn line_len(handler: &SliceHandler) -> usize {
        handler.session.as_ref().map_or(0, |s| s.line.len())
    }

    fn square() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0), Point::new(0.0, 10.0)]
    }

    #[test]
    fn straight_cut_through_opposite_edges() {
        let contour = square();
        let first = ContourHit { point: Point::new(5.0, 0.0), edge: 0 };
        let second = ContourHit { point: Point::new(5.0, 10.0), edge: 2 };
        let [a, b] = slice_contour(&contour, first, &[Point::new(5.0, 5.0)], second);
        assert_eq!(
            a,
            vec![Point::new(5.0, 0.0), Point::new(5.0, 5.0), Point::new(5.0, 10.0), Point::new(0.0, 10.0), Point::new(0.0, 0.0)]
        );
        assert_eq!(
            b,
            vec![Point::new(5.0, 10.0), Point::new(5.0, 5.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
        );
    }

    #[test]
    fn cut_on_one_edge_makes_a_pocket() {
        let contour = square();
        let first = ContourHit { point: Point::new(7.0, 0.0), edge: 0 };
        let second = ContourHit { point: Point::new(3.0, 0.0), edge: 0 };
        let [pocket, rest] = slice_contour(&contour, first, &[Point::new(5.0, 4.0)], second);
        assert_eq!(pocket.len(), 3);
        assert_eq!(rest.len(), 7);
        assert_eq!(rest[4], Point::new(3.0, 0.0));
        assert_eq!(rest[6], Point::new(7.0, 0.0));
    }

    #[test]
    fn hits_through_a_vertex_are_merged() {
        let hits = contour_hits(&square(), Point::new(-5.0, -5.0), Point::new(5.0, 5.0));
        assert_eq!(hits.len(), 1);
        assert!(hits[0].point.distance(Point::ZERO) < 1e-9);
    }

    #[test]
    fn cut_starting_inside_is_refused() {
        let (recorder, mut handler) = cutting_square();
        handler.pointer_down(&PointerEvent::left(50.0, 50.0));
        assert_eq!(line_len(&handler), 0);
        for (x, y) in [(50.0, 0.0), (100.0, 0.0), (100.0, 50.0), (60.0, 50.0)] {
            handler.pointer_down(&PointerEvent::left(x, y));
        }
        assert!(recorder.sliced.borrow().is_empty());
        handler.pointer_down(&PointerEvent::left(60.0, 100.0));

        let sliced = recorder.sliced.borrow();
        let [a, b] = sliced[0].clone().unwrap();
        let (a, b) = (to_points(&a), to_points(&b));
        let inside = |p: &Point| (20.0..=80.0).contains(&p.x) && (20.0..=80.0).contains(&p.y);
        assert!(a.iter().all(inside) && b.iter().all(inside));
        let total = signed_area(&a).abs() + signed_area(&b).abs();
        assert!((total - 3600.0).abs() < 1e-6);
    }

    #[test]
    fn point_crossing_the_cut_line_is_rejected() {
        let (recorder, mut handler) = cutting_square();
        for (x, y) in [(0.0, 50.0), (15.0, 40.0), (15.0, 60.0)] {
            handler.pointer_down(&PointerEvent::left(x, y));
        }
        assert_eq!(line_len(&handler), 3);
        handler.pointer_down(&PointerEvent::left(5.0, 30.0));
        assert_eq!(line_len(&handler), 3);
        assert!(recorder.sliced.borrow().is_empty());
        assert!(handler.is_active());
    }

    #[test]
    fn segment_crossing_the_contour_twice_is_rejected() {
        let (recorder, mut handler) = cutting_square();
        handler.pointer_down(&PointerEvent::left(0.0, 50.0));
        handler.pointer_down(&PointerEvent::left(100.0, 50.0));
        assert_eq!(line_len(&handler), 1);
        assert!(recorder.sliced.borrow().is_empty());
        handler.pointer_down(&PointerEvent::left(50.0, 50.0));
        assert_eq!(line_len(&handler), 2);
    }
}
