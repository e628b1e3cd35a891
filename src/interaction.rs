//! Input collection for assistive tools: an optional bounding box followed by
//! positive and negative points, reported after every change.

use std::rc::Rc;
use kurbo::Point;
use crate::canvas::Mode;
use crate::config::Configuration;
use crate::consts::CLICK_TOLERANCE;
use crate::data::InteractionData;
use crate::draw::boxes::BoxCollector;
use crate::error::{CanvasError, Result};
use crate::events::{Clock, KeyEvent, MouseButton, PointerEvent};
use crate::observer::{CanvasObserver, InteractionShape};
use crate::preview::{Preview, PreviewShape};
use crate::transform::Projection;
use crate::types::ShapeType;

struct InteractionSession {
    data: InteractionData,
    shape_type: ShapeType,
    shapes: Vec<InteractionShape>,
    /// Collecting the leading box; `None` once it is drawn or when none is wanted.
    collector: Option<BoxCollector>,
    cursor: Option<Point>,
    started_at: f64,
}

impl InteractionSession {
    fn count(&self, positive: bool) -> usize {
        self.shapes
            .iter()
            .filter(|s| s.shape_type == ShapeType::Points && s.positive == positive)
            .count()
    }

    fn has_enough(&self) -> bool {
        if self.shape_type == ShapeType::Rectangle {
            return !self.shapes.is_empty();
        }
        let min_pos = self.data.min_pos_vertices.unwrap_or(1);
        let min_neg = self.data.min_neg_vertices.unwrap_or(0);
        self.count(true) >= min_pos && self.count(false) >= min_neg
    }
}

pub struct InteractionHandler {
    observer: Rc<dyn CanvasObserver>,
    clock: Rc<dyn Clock>,
    projection: Projection,
    config: Configuration,
    session: Option<InteractionSession>,
}

impl InteractionHandler {
    pub fn new(observer: Rc<dyn CanvasObserver>, clock: Rc<dyn Clock>) -> Self {
        InteractionHandler {
            observer,
            clock,
            projection: Projection::default(),
            config: Configuration::default(),
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

    pub fn interact(&mut self, data: InteractionData, projection: &Projection) -> Result<()> {
        self.projection = projection.clone();
        if !data.enabled {
            self.finish();
            return Ok(());
        }
        if self.session.is_some() {
            return Err(CanvasError::ModeConflict { active: Mode::Interact, requested: Mode::Interact });
        }
        let shape_type = data.shape_type.ok_or(CanvasError::MissingField("shapeType"))?;
        if !matches!(shape_type, ShapeType::Rectangle | ShapeType::Points) {
            return Err(CanvasError::UnsupportedShape { mode: Mode::Interact, shape: shape_type });
        }
        let wants_box = shape_type == ShapeType::Rectangle || data.start_with_box;
        log::debug!("interaction started: {}{}", shape_type, if data.start_with_box { " with box" } else { "" });
        self.session = Some(InteractionSession {
            data,
            shape_type,
            shapes: Vec::new(),
            collector: wants_box.then(BoxCollector::default),
            cursor: None,
            started_at: self.clock.now_ms(),
        });
        Ok(())
    }

    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            log::debug!("interaction cancelled");
            self.observer.on_interaction(None, false, true);
        }
    }

    fn finish(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        log::debug!("interaction finished after {:.0}ms", self.clock.now_ms() - session.started_at);
        let shapes = session.has_enough().then_some(session.shapes.as_slice());
        self.observer.on_interaction(shapes, false, true);
    }

    fn report(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.has_enough() {
            self.observer.on_interaction(Some(&session.shapes), true, false);
        }
    }

    fn box_done(&mut self, a: Point, b: Point) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let (a, b) = (self.projection.canvas_to_image(a), self.projection.canvas_to_image(b));
        let points = vec![a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y)];
        session.shapes.push(InteractionShape { shape_type: ShapeType::Rectangle, points, positive: true });
        session.collector = None;
        if session.shape_type == ShapeType::Rectangle {
            self.finish();
        } else {
            self.report();
        }
    }

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        let canvas = self.projection.client_to_canvas(event.client());
        let image = self.projection.canvas_to_image(canvas);
        let radius = self.projection.screen_length(self.config.control_points_size);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(collector) = session.collector.as_mut() {
            if event.button == MouseButton::Left {
                if let Some((a, b)) = collector.pointer_down(canvas) {
                    self.box_done(a, b);
                }
            }
            return;
        }
        let positive = match event.button {
            MouseButton::Left => true,
            MouseButton::Right => false,
            _ => return,
        };
        if event.ctrl_key {
            let hit = session.shapes.iter().position(|s| {
                s.shape_type == ShapeType::Points && Point::new(s.points[0], s.points[1]).distance(image) <= radius
            });
            match hit {
                Some(index) => {
                    session.shapes.remove(index);
                }
                None => return,
            }
        } else {
            session.shapes.push(InteractionShape {
                shape_type: ShapeType::Points,
                points: vec![image.x, image.y],
                positive,
            });
        }
        self.report();
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        let canvas = self.projection.client_to_canvas(event.client());
        if let Some(session) = self.session.as_mut() {
            session.cursor = Some(canvas);
            if let Some(collector) = session.collector.as_mut() {
                collector.pointer_move(canvas);
            }
        }
    }

    pub fn pointer_up(&mut self, event: &PointerEvent) {
        let canvas = self.projection.client_to_canvas(event.client());
        let tolerance = self.projection.screen_length(CLICK_TOLERANCE);
        let done = self
            .session
            .as_mut()
            .and_then(|s| s.collector.as_mut())
            .and_then(|c| c.pointer_up(canvas, tolerance));
        if let Some((a, b)) = done {
            self.box_done(a, b);
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
        if session.data.crosshair.unwrap_or(false) {
            preview.crosshair = session.cursor;
        }
        if let Some((tl, br)) = session.collector.as_ref().and_then(|c| c.rubber_band()) {
            let corners = vec![tl, Point::new(br.x, tl.y), br, Point::new(tl.x, br.y)];
            preview.shapes.push(PreviewShape { control_points: false, ..PreviewShape::outline(ShapeType::Rectangle, corners, true) });
        }
        for positive in [true, false] {
            let points: Vec<Point> = session
                .shapes
                .iter()
                .filter(|s| s.shape_type == ShapeType::Points && s.positive == positive)
                .map(|s| self.projection.image_to_canvas(Point::new(s.points[0], s.points[1])))
                .collect();
            if !points.is_empty() {
                preview.shapes.push(PreviewShape {
                    fill_opacity: if positive { 1.0 } else { 0.0 },
                    ..PreviewShape::outline(ShapeType::Points, points, false)
                });
            }
        }
        preview
    }
}
