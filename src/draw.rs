//! Vector shape drawing: one session per started draw, torn down on commit or cancel.

pub mod boxes;
pub mod paste;
pub mod polyshape;
pub mod skeleton;

use std::rc::Rc;
use kurbo::Point;
use crate::autoborder::Autoborder;
use crate::canvas::Mode;
use crate::config::Configuration;
use crate::consts::CLICK_TOLERANCE;
use crate::constraints::check_constraint;
use crate::cuboid::{cuboid_from_4_points, CuboidModel};
use crate::data::DrawData;
use crate::error::{CanvasError, Result};
use crate::events::{Clock, KeyEvent, MouseButton, PointerEvent};
use crate::math::crop_to_frame;
use crate::observer::{CanvasObserver, DrawnShape};
use crate::preview::{Preview, PreviewShape, SizeReadout};
use crate::transform::{compute_wrapping_box, to_flat, to_points, Projection};
use crate::types::{CuboidDrawingMethod, RectDrawingMethod, ShapeType, Size};
use self::boxes::BoxCollector;
use self::paste::PasteCollector;
use self::polyshape::PolyshapeCollector;
use self::skeleton::SkeletonTemplate;

/// What a pointer press completed, resolved once the session borrow is released.
enum Step {
    Box((Point, Point)),
    Poly(Vec<Point>),
    Paste(Point),
}

enum Collector {
    Box(BoxCollector),
    Poly(PolyshapeCollector),
    Paste(PasteCollector),
}

struct DrawSession {
    data: DrawData,
    shape_type: ShapeType,
    collector: Collector,
    template: Option<SkeletonTemplate>,
    started_at: f64,
    crosshair: bool,
    cursor: Option<Point>,
    /// Ctrl held: a successful commit starts the next instance right away.
    ctrl: bool,
}

impl DrawSession {
    fn start(data: DrawData, now: f64) -> Result<Self> {
        let (shape_type, collector) = match &data.initial_state {
            Some(state) if state.shape_type == ShapeType::Mask => {
                return Err(CanvasError::UnsupportedShape { mode: Mode::Draw, shape: ShapeType::Mask });
            }
            Some(state) => (state.shape_type, Collector::Paste(PasteCollector::new(state.clone()))),
            None => {
                let shape_type = data.shape_type.ok_or(CanvasError::MissingField("shapeType"))?;
                let collector = match shape_type {
                    ShapeType::Rectangle => match data.rect_drawing_method.unwrap_or_default() {
                        RectDrawingMethod::Classic => Collector::Box(BoxCollector::default()),
                        RectDrawingMethod::ExtremePoints => Collector::Poly(PolyshapeCollector::new(Some(4))),
                    },
                    ShapeType::Cuboid => match data.cuboid_drawing_method.unwrap_or_default() {
                        CuboidDrawingMethod::Classic => Collector::Box(BoxCollector::default()),
                        CuboidDrawingMethod::CornerPoints => Collector::Poly(PolyshapeCollector::new(Some(4))),
                    },
                    ShapeType::Ellipse | ShapeType::Skeleton => Collector::Box(BoxCollector::default()),
                    ShapeType::Polygon | ShapeType::Polyline | ShapeType::Points => {
                        Collector::Poly(PolyshapeCollector::new(data.number_of_points))
                    }
                    ShapeType::Mask => {
                        return Err(CanvasError::UnsupportedShape { mode: Mode::Draw, shape: shape_type });
                    }
                };
                (shape_type, collector)
            }
        };
        let template = if shape_type == ShapeType::Skeleton && data.initial_state.is_none() {
            let nodes = data.skeleton_template.as_deref().ok_or(CanvasError::MissingField("skeletonTemplate"))?;
            Some(SkeletonTemplate::from_nodes(nodes)?)
        } else {
            None
        };
        Ok(DrawSession {
            crosshair: data.crosshair.unwrap_or(false),
            data,
            shape_type,
            collector,
            template,
            started_at: now,
            cursor: None,
            ctrl: false,
        })
    }

    /// Same shape kind again, keeping the modifiers the user is still holding.
    fn restart(&self, now: f64) -> Result<Self> {
        let mut next = DrawSession::start(self.data.clone(), now)?;
        next.ctrl = self.ctrl;
        next.cursor = self.cursor;
        Ok(next)
    }
}

fn normalized_box(a: Point, b: Point) -> (Point, Point) {
    (Point::new(a.x.min(b.x), a.y.min(b.y)), Point::new(a.x.max(b.x), a.y.max(b.y)))
}

fn clamp_to_frame(p: Point, frame: Size) -> Point {
    Point::new(p.x.clamp(0.0, frame.width.max(0.0)), p.y.clamp(0.0, frame.height.max(0.0)))
}

/// Ellipse wire form `[cx, cy, rightX, topY]` from its bounding box.
fn ellipse_from_box(tl: Point, br: Point) -> Vec<f64> {
    let (cx, cy) = ((tl.x + br.x) / 2.0, (tl.y + br.y) / 2.0);
    vec![cx, cy, br.x, tl.y]
}

/// Crop a finished shape to the image frame, then validate it. Points are in image space.
pub(crate) fn finalize_points(shape_type: ShapeType, points: &[Point], frame: Size, crop: bool) -> Option<Vec<f64>> {
    let flat = match shape_type {
        ShapeType::Rectangle | ShapeType::Ellipse => {
            let bbox = compute_wrapping_box(points, 0.0);
            let (mut tl, mut br) = (Point::new(bbox.xtl, bbox.ytl), Point::new(bbox.xbr, bbox.ybr));
            if crop {
                tl = clamp_to_frame(tl, frame);
                br = clamp_to_frame(br, frame);
            }
            if shape_type == ShapeType::Rectangle {
                vec![tl.x, tl.y, br.x, br.y]
            } else {
                ellipse_from_box(tl, br)
            }
        }
        ShapeType::Polygon | ShapeType::Polyline if crop => {
            let closed = shape_type == ShapeType::Polygon;
            to_flat(&crop_to_frame(points, closed, frame.width, frame.height))
        }
        ShapeType::Cuboid => {
            let flat = to_flat(points);
            if !check_constraint(ShapeType::Cuboid, &flat, None) {
                return None;
            }
            return match points {
                [a, b] => {
                    let (tl, br) = normalized_box(*a, *b);
                    Some(CuboidModel::from_box(tl.x, tl.y, br.x, br.y).to_flat())
                }
                [p0, p1, p2, p3] => cuboid_from_4_points(&[*p0, *p1, *p2, *p3]).map(|m| m.to_flat()),
                _ => Some(flat),
            };
        }
        _ => to_flat(points),
    };
    if check_constraint(shape_type, &flat, None) {
        Some(flat)
    } else {
        log::debug!("{} rejected by size constraint", shape_type);
        None
    }
}

pub struct DrawHandler {
    observer: Rc<dyn CanvasObserver>,
    clock: Rc<dyn Clock>,
    projection: Projection,
    config: Configuration,
    autoborder: Autoborder,
    session: Option<DrawSession>,
}

impl DrawHandler {
    pub fn new(observer: Rc<dyn CanvasObserver>, clock: Rc<dyn Clock>) -> Self {
        DrawHandler {
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

    /// Start drawing, or with `enabled: false` finish the shape in progress.
    pub fn draw(&mut self, data: DrawData, projection: &Projection) -> Result<()> {
        self.projection = projection.clone();
        if !data.enabled {
            self.finish();
            return Ok(());
        }
        if self.session.is_some() {
            return Err(CanvasError::ModeConflict { active: Mode::Draw, requested: Mode::Draw });
        }
        let session = DrawSession::start(data, self.clock.now_ms())?;
        log::debug!("draw started: {}", session.shape_type);
        self.autoborder.reset();
        self.session = Some(session);
        Ok(())
    }

    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("draw cancelled: {}", session.shape_type);
            let duration = self.clock.now_ms() - session.started_at;
            self.observer.on_draw_done(None, duration, false, None);
        }
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

    fn image_frame(&self) -> Size {
        self.projection.geometry().image
    }

    fn finish(&mut self) {
        let points = match self.session.as_mut().map(|s| &mut s.collector) {
            None => return,
            Some(Collector::Poly(collector)) => Some(collector.take()),
            Some(_) => None,
        };
        let result = points.and_then(|points| self.build_poly(points));
        self.commit(result);
    }

    fn commit(&mut self, result: Option<DrawnShape>) {
        let Some(session) = self.session.take() else {
            return;
        };
        let now = self.clock.now_ms();
        let duration = now - session.started_at;
        let result = result.map(|mut shape| {
            shape.client_id = session.data.redraw;
            shape
        });
        match result {
            Some(shape) if session.ctrl => {
                log::debug!("draw committed, continuing: {}", session.shape_type);
                self.session = session.restart(now).ok();
                self.observer.on_draw_done(Some(shape), duration, true, Some(&session.data));
            }
            result => {
                log::debug!("draw finished: {} ({})", session.shape_type, if result.is_some() { "shape" } else { "nothing" });
                self.observer.on_draw_done(result, duration, false, None);
            }
        }
    }

    fn build_box(&self, a: Point, b: Point) -> Option<DrawnShape> {
        let session = self.session.as_ref()?;
        let a = self.projection.canvas_to_image(a);
        let b = self.projection.canvas_to_image(b);
        let frame = self.image_frame();
        if session.shape_type == ShapeType::Skeleton {
            let template = session.template.as_ref()?;
            let (mut tl, mut br) = normalized_box(a, b);
            tl = clamp_to_frame(tl, frame);
            br = clamp_to_frame(br, frame);
            let bbox = compute_wrapping_box(&[tl, br], 0.0);
            if !check_constraint(ShapeType::Skeleton, &[], Some(&bbox)) {
                return None;
            }
            let elements: Vec<DrawnShape> = template
                .place(tl, br)
                .into_iter()
                .map(|(label_id, p)| DrawnShape { label_id, ..DrawnShape::new(ShapeType::Points, vec![p.x, p.y]) })
                .collect();
            let points = elements.iter().flat_map(|e| e.points.iter().copied()).collect();
            return Some(DrawnShape { elements, ..DrawnShape::new(ShapeType::Skeleton, points) });
        }
        finalize_points(session.shape_type, &[a, b], frame, true)
            .map(|points| DrawnShape::new(session.shape_type, points))
    }

    fn build_poly(&self, points: Vec<Point>) -> Option<DrawnShape> {
        let session = self.session.as_ref()?;
        let image: Vec<Point> = points.iter().map(|p| self.projection.canvas_to_image(*p)).collect();
        let crop = session.shape_type != ShapeType::Points;
        finalize_points(session.shape_type, &image, self.image_frame(), crop)
            .map(|flat| DrawnShape::new(session.shape_type, flat))
    }

    fn build_paste(&self, at: Point) -> Option<DrawnShape> {
        let session = self.session.as_ref()?;
        let Collector::Paste(paste) = &session.collector else {
            return None;
        };
        let mut shape = paste.place(self.projection.canvas_to_image(at));
        let crop = !session.ctrl;
        match shape.shape_type {
            ShapeType::Skeleton => {
                let bbox = compute_wrapping_box(&to_points(&shape.points), 0.0);
                check_constraint(ShapeType::Skeleton, &shape.points, Some(&bbox)).then_some(shape)
            }
            ShapeType::Rectangle | ShapeType::Polygon | ShapeType::Polyline | ShapeType::Ellipse if crop => {
                let points = if shape.shape_type == ShapeType::Ellipse {
                    let (cx, cy) = (shape.points[0], shape.points[1]);
                    let (rx, ry) = ((shape.points[2] - cx).abs(), (cy - shape.points[3]).abs());
                    vec![Point::new(cx - rx, cy - ry), Point::new(cx + rx, cy + ry)]
                } else {
                    to_points(&shape.points)
                };
                shape.points = finalize_points(shape.shape_type, &points, self.image_frame(), true)?;
                Some(shape)
            }
            _ => check_constraint(shape.shape_type, &shape.points, None).then_some(shape),
        }
    }

    fn snapping(&self) -> bool {
        self.config.autoborders
            && self
                .session
                .as_ref()
                .is_some_and(|s| matches!(s.shape_type, ShapeType::Polygon | ShapeType::Polyline) && matches!(s.collector, Collector::Poly(_)))
    }

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        let canvas = self.projection.client_to_canvas(event.client());
        let snapping = self.snapping();
        let radius = self.projection.screen_length(self.config.control_points_size * 2.0);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.cursor = Some(canvas);
        session.ctrl = event.ctrl_key;
        let step = match (&mut session.collector, event.button) {
            (Collector::Box(collector), MouseButton::Left) => collector.pointer_down(canvas).map(Step::Box),
            (Collector::Poly(collector), MouseButton::Left) => {
                let complete = if snapping {
                    let image = self.projection.canvas_to_image(canvas);
                    let run: Vec<Point> = self
                        .autoborder
                        .snap(image, radius)
                        .into_iter()
                        .map(|p| self.projection.image_to_canvas(p))
                        .collect();
                    collector.extend(&run, event.client())
                } else {
                    collector.add(canvas, event.client())
                };
                complete.then(|| Step::Poly(collector.take()))
            }
            (Collector::Poly(collector), MouseButton::Right) => {
                collector.undo();
                self.autoborder.reset();
                None
            }
            (Collector::Paste(_), MouseButton::Left) => Some(Step::Paste(canvas)),
            _ => None,
        };
        let result = match step {
            None => return,
            Some(Step::Box((a, b))) => self.build_box(a, b),
            Some(Step::Poly(points)) => self.build_poly(points),
            Some(Step::Paste(at)) => self.build_paste(at),
        };
        self.commit(result);
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        let canvas = self.projection.client_to_canvas(event.client());
        let threshold = self.config.slide_threshold;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.cursor = Some(canvas);
        let completed = match &mut session.collector {
            Collector::Box(collector) => {
                collector.pointer_move(canvas);
                false
            }
            Collector::Poly(collector) if event.shift_key => collector.slide(canvas, event.client(), threshold),
            Collector::Poly(collector) => {
                collector.pointer_move(canvas);
                false
            }
            Collector::Paste(paste) => {
                paste.pointer_move(self.projection.canvas_to_image(canvas));
                false
            }
        };
        if completed {
            self.finish();
        }
    }

    pub fn pointer_up(&mut self, event: &PointerEvent) {
        if event.button != MouseButton::Left {
            return;
        }
        let canvas = self.projection.client_to_canvas(event.client());
        let tolerance = self.projection.screen_length(CLICK_TOLERANCE);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.ctrl = event.ctrl_key;
        let corners = match &mut session.collector {
            Collector::Box(collector) => collector.pointer_up(canvas, tolerance),
            _ => None,
        };
        if let Some((a, b)) = corners {
            let result = self.build_box(a, b);
            self.commit(result);
        }
    }

    pub fn key_down(&mut self, event: &KeyEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event.key.as_str() {
            "Control" => session.ctrl = true,
            "Enter" if matches!(session.collector, Collector::Poly(_)) => self.finish(),
            _ => {}
        }
    }

    pub fn key_up(&mut self, event: &KeyEvent) {
        if let Some(session) = self.session.as_mut() {
            if event.key == "Control" {
                session.ctrl = false;
            }
        }
    }

    pub fn preview(&self) -> Preview {
        let mut preview = Preview::new(&self.projection, &self.config);
        let Some(session) = self.session.as_ref() else {
            return preview;
        };
        if session.crosshair {
            preview.crosshair = session.cursor;
        }
        match &session.collector {
            Collector::Box(collector) => {
                if let Some((tl, br)) = collector.rubber_band() {
                    preview.size_readout = Some(SizeReadout {
                        position: br,
                        width: br.x - tl.x,
                        height: br.y - tl.y,
                    });
                    preview.shapes.extend(self.box_preview(session, tl, br));
                }
            }
            Collector::Poly(collector) => {
                match session.shape_type {
                    ShapeType::Rectangle | ShapeType::Cuboid | ShapeType::Points => {
                        preview.shapes.push(PreviewShape::outline(ShapeType::Points, collector.points().to_vec(), false));
                    }
                    shape_type => {
                        let closed = shape_type == ShapeType::Polygon;
                        preview.shapes.push(PreviewShape::outline(shape_type, collector.with_cursor(), closed));
                    }
                }
            }
            Collector::Paste(paste) => {
                if let Some(shape) = paste.preview() {
                    let points = to_points(&shape.points).into_iter().map(|p| self.projection.image_to_canvas(p)).collect();
                    let closed = !matches!(shape.shape_type, ShapeType::Polyline | ShapeType::Points | ShapeType::Skeleton);
                    preview.shapes.push(PreviewShape { fill_opacity: self.config.shape_opacity, ..PreviewShape::outline(shape.shape_type, points, closed) });
                }
            }
        }
        preview
    }

    fn box_preview(&self, session: &DrawSession, tl: Point, br: Point) -> Vec<PreviewShape> {
        match session.shape_type {
            ShapeType::Ellipse => {
                let flat = ellipse_from_box(tl, br);
                vec![PreviewShape::outline(ShapeType::Ellipse, to_points(&flat), true)]
            }
            ShapeType::Cuboid => {
                let model = CuboidModel::from_box(tl.x, tl.y, br.x, br.y);
                vec![PreviewShape::outline(ShapeType::Cuboid, model.points().to_vec(), true)]
            }
            ShapeType::Skeleton => {
                let mut shapes = vec![PreviewShape { control_points: false, ..PreviewShape::outline(ShapeType::Rectangle, rect_corners(tl, br), true) }];
                if let Some(template) = &session.template {
                    let nodes = template.place(tl, br).into_iter().map(|(_, p)| p).collect();
                    shapes.push(PreviewShape::outline(ShapeType::Points, nodes, false));
                }
                shapes
            }
            shape_type => vec![PreviewShape::outline(shape_type, rect_corners(tl, br), true)],
        }
    }
}

fn rect_corners(tl: Point, br: Point) -> Vec<Point> {
    vec![tl, Point::new(br.x, tl.y), br, Point::new(tl.x, br.y)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use crate::events::ManualClock;
    use crate::geometry::Geometry;

    #[derive(Default)]
    struct Recorder {
        done: RefCell<Vec<(Option<DrawnShape>, f64, bool)>>,
    }

    impl CanvasObserver for Recorder {
        fn on_draw_done(&self, result: Option<DrawnShape>, duration: f64, cont: bool, _prev: Option<&DrawData>) {
            self.done.borrow_mut().push((result, duration, cont));
        }
    }

    fn handler() -> (DrawHandler, Rc<Recorder>, Rc<ManualClock>, Projection) {
        let recorder = Rc::new(Recorder::default());
        let clock = Rc::new(ManualClock::new());
        let projection = Projection::new(Geometry::new(Size::new(200.0, 100.0), 10.0));
        let mut handler = DrawHandler::new(recorder.clone(), clock.clone());
        handler.transform(&projection);
        (handler, recorder, clock, projection)
    }

    fn click(handler: &mut DrawHandler, projection: &Projection, x: f64, y: f64) {
        let client = projection.canvas_to_client(Point::new(x, y));
        handler.pointer_down(&PointerEvent::left(client.x, client.y));
        handler.pointer_up(&PointerEvent::left(client.x, client.y));
    }

    #[test]
    fn ellipse_from_two_clicks() {
        let (mut handler, recorder, clock, projection) = handler();
        handler.draw(DrawData::shape(ShapeType::Ellipse), &projection).unwrap();
        click(&mut handler, &projection, 20.0, 20.0);
        clock.advance(40.0);
        click(&mut handler, &projection, 40.0, 30.0);
        let done = recorder.done.borrow();
        let (shape, duration, cont) = done[0].clone();
        assert_eq!(shape.unwrap().points, vec![20.0, 15.0, 30.0, 10.0]);
        assert_eq!(duration, 40.0);
        assert!(!cont);
        assert!(!handler.is_active());
    }

    #[test]
    fn polygon_with_fixed_count_is_cropped() {
        let (mut handler, recorder, _, projection) = handler();
        let data = DrawData { number_of_points: Some(3), ..DrawData::shape(ShapeType::Polygon) };
        handler.draw(data, &projection).unwrap();
        click(&mut handler, &projection, 0.0, 20.0);
        click(&mut handler, &projection, 60.0, 20.0);
        click(&mut handler, &projection, 60.0, 60.0);
        let done = recorder.done.borrow();
        let points = done[0].0.clone().unwrap().points;
        assert!(points.iter().all(|&v| v >= 0.0));
        assert_eq!(points.len(), 8);
    }

    #[test]
    fn right_click_undoes_and_finish_commits() {
        let (mut handler, recorder, _, projection) = handler();
        handler.draw(DrawData::shape(ShapeType::Polyline), &projection).unwrap();
        click(&mut handler, &projection, 20.0, 20.0);
        click(&mut handler, &projection, 60.0, 20.0);
        let client = projection.canvas_to_client(Point::new(90.0, 20.0));
        handler.pointer_down(&PointerEvent::left(client.x, client.y));
        handler.pointer_down(&PointerEvent::right(client.x, client.y));
        handler.draw(DrawData::default(), &projection).unwrap();
        let done = recorder.done.borrow();
        assert_eq!(done[0].0.clone().unwrap().points, vec![10.0, 10.0, 50.0, 10.0]);
    }

    #[test]
    fn tiny_rectangle_is_a_cancel() {
        let (mut handler, recorder, _, projection) = handler();
        handler.draw(DrawData::shape(ShapeType::Rectangle), &projection).unwrap();
        click(&mut handler, &projection, 20.0, 20.0);
        click(&mut handler, &projection, 22.0, 22.0);
        assert_eq!(recorder.done.borrow()[0].0, None);
    }

    #[test]
    fn ctrl_commit_continues_drawing() {
        let (mut handler, recorder, _, projection) = handler();
        handler.draw(DrawData::shape(ShapeType::Rectangle), &projection).unwrap();
        click(&mut handler, &projection, 20.0, 20.0);
        handler.key_down(&KeyEvent::new("Control"));
        let end = projection.canvas_to_client(Point::new(60.0, 60.0));
        let mut event = PointerEvent::left(end.x, end.y);
        event.ctrl_key = true;
        handler.pointer_down(&event);
        assert!(recorder.done.borrow()[0].2);
        assert!(handler.is_active());
        handler.cancel();
        handler.cancel();
        assert_eq!(recorder.done.borrow().len(), 2);
    }

    #[test]
    fn extreme_points_give_bounding_box() {
        let (mut handler, recorder, _, projection) = handler();
        let data = DrawData { rect_drawing_method: Some(RectDrawingMethod::ExtremePoints), ..DrawData::shape(ShapeType::Rectangle) };
        handler.draw(data, &projection).unwrap();
        for (x, y) in [(30.0, 40.0), (50.0, 20.0), (70.0, 40.0), (50.0, 60.0)] {
            click(&mut handler, &projection, x, y);
        }
        assert_eq!(recorder.done.borrow()[0].0.clone().unwrap().points, vec![20.0, 10.0, 60.0, 50.0]);
    }

    #[test]
    fn mask_and_missing_shape_are_rejected() {
        let (mut handler, _, _, projection) = handler();
        assert!(matches!(
            handler.draw(DrawData::shape(ShapeType::Mask), &projection),
            Err(CanvasError::UnsupportedShape { .. })
        ));
        assert!(matches!(
            handler.draw(DrawData { enabled: true, ..Default::default() }, &projection),
            Err(CanvasError::MissingField("shapeType"))
        ));
        assert!(matches!(
            handler.draw(DrawData::shape(ShapeType::Skeleton), &projection),
            Err(CanvasError::MissingField("skeletonTemplate"))
        ));
    }

    #[test]
    fn enter_closes_polyshapes_only() {
        let (mut handler, recorder, _, projection) = handler();
        handler.draw(DrawData::shape(ShapeType::Rectangle), &projection).unwrap();
        handler.key_down(&KeyEvent::new("Enter"));
        assert!(handler.is_active());
        handler.cancel();

        handler.draw(DrawData::shape(ShapeType::Polyline), &projection).unwrap();
        click(&mut handler, &projection, 20.0, 20.0);
        click(&mut handler, &projection, 60.0, 20.0);
        handler.key_down(&KeyEvent::new("Enter"));
        let done = recorder.done.borrow();
        assert_eq!(done[1].0.clone().unwrap().points, vec![10.0, 10.0, 50.0, 10.0]);
        assert!(!handler.is_active());
    }
}
