//! Pixel mask drawing, editing and insertion on top of an off-screen raster.

pub mod raster;

use std::rc::Rc;
use kurbo::Point;
use crate::canvas::Mode;
use crate::config::Configuration;
use crate::consts::{MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::data::{BrushTool, BrushToolType, DrawData, EditData};
use crate::draw::polyshape::PolyshapeCollector;
use crate::error::{CanvasError, Result};
use crate::events::{Clock, KeyEvent, MouseButton, PointerEvent, RequestTracker};
use crate::observer::{CanvasObserver, DrawnShape, ToolsBlockerState};
use crate::preview::{BrushMarker, Preview, PreviewShape};
use crate::rle::RleMask;
use crate::transform::Projection;
use crate::types::{ObjectState, ShapeType};
use self::raster::{Composite, MaskRaster};

enum MaskSessionKind {
    Draw(DrawData),
    Edit(ObjectState),
    /// A copy of an existing mask floating under the cursor until placed.
    Insert { data: DrawData, mask: RleMask },
}

struct MaskSession {
    kind: MaskSessionKind,
    raster: MaskRaster,
    tool: BrushTool,
    started_at: f64,
    /// Image space.
    cursor: Option<Point>,
    last_stamp: Option<Point>,
    /// Client x and brush size at the start of an alt-drag resize.
    resize: Option<(f64, f64)>,
    polygon: PolyshapeCollector,
    ctrl: bool,
}

impl MaskSession {
    fn new(kind: MaskSessionKind, raster: MaskRaster, tool: BrushTool, now: f64) -> Self {
        MaskSession {
            kind,
            raster,
            tool,
            started_at: now,
            cursor: None,
            last_stamp: None,
            resize: None,
            polygon: PolyshapeCollector::new(None),
            ctrl: false,
        }
    }

    fn composite(&self) -> Composite {
        if self.tool.tool_type.is_subtractive() { Composite::DestinationOut } else { Composite::Union }
    }

    fn set_tool(&mut self, tool: BrushTool) {
        if tool.tool_type.is_polygon() != self.tool.tool_type.is_polygon() {
            self.polygon = PolyshapeCollector::new(None);
        }
        self.raster.set_color(tool.rgb());
        self.tool = tool;
    }

    /// Top-left corner of the floating copy when centred on the cursor.
    fn insertion_origin(mask: &RleMask, cursor: Point) -> (u32, u32) {
        let left = (cursor.x - mask.width() as f64 / 2.0).round().max(0.0);
        let top = (cursor.y - mask.height() as f64 / 2.0).round().max(0.0);
        (left as u32, top as u32)
    }
}

pub struct MaskHandler {
    observer: Rc<dyn CanvasObserver>,
    clock: Rc<dyn Clock>,
    projection: Projection,
    config: Configuration,
    session: Option<MaskSession>,
    blocker: ToolsBlockerState,
    snapshots: RequestTracker,
}

impl MaskHandler {
    pub fn new(observer: Rc<dyn CanvasObserver>, clock: Rc<dyn Clock>) -> Self {
        MaskHandler {
            observer,
            clock,
            projection: Projection::default(),
            config: Configuration::default(),
            session: None,
            blocker: ToolsBlockerState::default(),
            snapshots: RequestTracker::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.session.as_ref().map(|s| match s.kind {
            MaskSessionKind::Edit(_) => Mode::Edit,
            _ => Mode::Draw,
        })
    }

    pub fn transform(&mut self, projection: &Projection) {
        self.projection = projection.clone();
    }

    pub fn configurate(&mut self, config: &Configuration) {
        self.config = config.clone();
    }

    pub fn tools_blocker_state(&self) -> ToolsBlockerState {
        self.blocker
    }

    fn new_raster(&self, tool: &BrushTool) -> MaskRaster {
        let image = self.projection.geometry().image;
        MaskRaster::new(image.width.max(0.0).ceil() as u32, image.height.max(0.0).ceil() as u32, tool.rgb())
    }

    /// Start a mask draw. While a draw is running, a call with a new brush tool just
    /// switches tools; `enabled: false` finishes.
    pub fn draw(&mut self, data: DrawData, projection: &Projection) -> Result<()> {
        self.projection = projection.clone();
        if !data.enabled {
            self.finish();
            return Ok(());
        }
        if let Some(session) = self.session.as_mut() {
            return match (&session.kind, data.brush_tool) {
                (MaskSessionKind::Draw(_), Some(tool)) => {
                    session.set_tool(tool);
                    Ok(())
                }
                _ => Err(CanvasError::ModeConflict { active: Mode::Draw, requested: Mode::Draw }),
            };
        }
        let tool = data.brush_tool.clone().unwrap_or_default();
        let raster = self.new_raster(&tool);
        let kind = match &data.initial_state {
            Some(state) if state.shape_type == ShapeType::Mask => {
                let mask = RleMask::from_points(&state.points)?;
                MaskSessionKind::Insert { data, mask }
            }
            Some(state) => {
                return Err(CanvasError::UnsupportedShape { mode: Mode::Draw, shape: state.shape_type });
            }
            None => MaskSessionKind::Draw(data),
        };
        log::debug!("mask draw started");
        self.session = Some(MaskSession::new(kind, raster, tool, self.clock.now_ms()));
        self.update_blocker();
        Ok(())
    }

    /// Open an existing mask for painting; `enabled: false` commits it.
    pub fn edit(&mut self, data: EditData, projection: &Projection) -> Result<()> {
        self.projection = projection.clone();
        if !data.enabled {
            self.finish();
            return Ok(());
        }
        if let Some(session) = self.session.as_mut() {
            return match (&session.kind, data.brush_tool) {
                (MaskSessionKind::Edit(_), Some(tool)) => {
                    session.set_tool(tool);
                    Ok(())
                }
                _ => Err(CanvasError::ModeConflict { active: Mode::Edit, requested: Mode::Edit }),
            };
        }
        let state = data.state.ok_or(CanvasError::MissingField("state"))?;
        if state.shape_type != ShapeType::Mask {
            return Err(CanvasError::UnsupportedShape { mode: Mode::Edit, shape: state.shape_type });
        }
        let mask = RleMask::from_points(&state.points)?;
        let tool = data.brush_tool.unwrap_or_default();
        let mut raster = self.new_raster(&tool);
        raster.load(&mask)?;
        log::debug!("mask edit started");
        self.session = Some(MaskSession::new(MaskSessionKind::Edit(state), raster, tool, self.clock.now_ms()));
        self.update_blocker();
        Ok(())
    }

    pub fn cancel(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        log::debug!("mask session cancelled");
        self.snapshots.invalidate();
        self.update_blocker();
        let duration = self.clock.now_ms() - session.started_at;
        match session.kind {
            MaskSessionKind::Edit(state) => self.observer.on_edit_done(Some(&state), None, None),
            _ => self.observer.on_draw_done(None, duration, false, None),
        }
    }

    fn finish(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.snapshots.invalidate();
        self.update_blocker();
        let duration = self.clock.now_ms() - session.started_at;
        let encoded = session.raster.encode();
        match session.kind {
            MaskSessionKind::Draw(data) => {
                let result = encoded.map(|mask| DrawnShape {
                    client_id: data.redraw,
                    ..DrawnShape::new(ShapeType::Mask, mask.to_points())
                });
                log::debug!("mask draw finished (empty: {})", result.is_none());
                self.observer.on_draw_done(result, duration, false, None);
            }
            MaskSessionKind::Edit(state) => {
                let points = encoded.map(|mask| mask.to_points());
                self.observer.on_edit_done(Some(&state), points, None);
            }
            MaskSessionKind::Insert { .. } => self.observer.on_draw_done(None, duration, false, None),
        }
    }

    fn place_insertion(&mut self, at: Point) {
        let Some(session) = self.session.take() else {
            return;
        };
        if !matches!(session.kind, MaskSessionKind::Insert { .. }) {
            self.session = Some(session);
            return;
        }
        let MaskSessionKind::Insert { data, mask } = &session.kind else {
            return;
        };
        let now = self.clock.now_ms();
        let (left, top) = MaskSession::insertion_origin(mask, at);
        let placed = RleMask {
            counts: mask.counts.clone(),
            left,
            top,
            right: left.saturating_add(mask.right - mask.left),
            bottom: top.saturating_add(mask.bottom - mask.top),
        };
        let shape = DrawnShape::new(ShapeType::Mask, placed.to_points());
        let duration = now - session.started_at;
        if session.ctrl {
            let data = data.clone();
            let next = MaskSession {
                started_at: now,
                cursor: session.cursor,
                ctrl: true,
                ..MaskSession::new(
                    MaskSessionKind::Insert { data: data.clone(), mask: mask.clone() },
                    session.raster.clone(),
                    session.tool.clone(),
                    now,
                )
            };
            self.session = Some(next);
            self.observer.on_draw_done(Some(shape), duration, true, Some(&data));
        } else {
            self.update_blocker();
            self.observer.on_draw_done(Some(shape), duration, false, None);
        }
    }

    fn update_blocker(&mut self) {
        let state = match &self.session {
            Some(session) if !matches!(session.kind, MaskSessionKind::Insert { .. }) => {
                let empty = session.raster.is_empty();
                ToolsBlockerState { eraser: empty, polygon_minus: empty }
            }
            _ => ToolsBlockerState::default(),
        };
        if state != self.blocker {
            self.blocker = state;
            self.observer.on_tools_blocker_changed(state);
        }
    }

    fn to_image(&self, event: &PointerEvent) -> Point {
        self.projection.client_to_image(event.client())
    }

    fn close_polygon(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let polygon = session.polygon.take();
        if polygon.len() >= 3 {
            let composite = session.composite();
            session.raster.fill_polygon(&polygon, composite);
        }
        self.update_blocker();
    }

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        let image = self.to_image(event);
        let close_radius = self.projection.screen_length(self.config.control_points_size);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.cursor = Some(image);
        session.ctrl = event.ctrl_key;
        if matches!(session.kind, MaskSessionKind::Insert { .. }) {
            if event.button == MouseButton::Left {
                self.place_insertion(image);
            }
            return;
        }
        match event.button {
            MouseButton::Left if event.alt_key => {
                session.resize = Some((event.client_x, session.tool.size));
            }
            MouseButton::Left if session.tool.tool_type.is_polygon() => {
                let closes = session.polygon.len() >= 3
                    && session.polygon.points()[0].distance(image) <= close_radius;
                if closes {
                    self.close_polygon();
                } else {
                    session.polygon.add(image, event.client());
                }
            }
            MouseButton::Left => {
                let composite = session.composite();
                session.raster.stamp(image, session.tool.clamped_size(), session.tool.form, composite);
                session.last_stamp = Some(image);
            }
            MouseButton::Right if session.tool.tool_type.is_polygon() => {
                session.polygon.undo();
            }
            _ => {}
        }
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        let image = self.to_image(event);
        let step = self.config.brush_size_step;
        let threshold = self.config.slide_threshold;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.cursor = Some(image);
        if let Some((start_x, start_size)) = session.resize {
            let size = start_size + (event.client_x - start_x) * step;
            session.tool.size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE).round();
            return;
        }
        if session.tool.tool_type.is_polygon() {
            if event.shift_key {
                session.polygon.slide(image, event.client(), threshold);
            } else {
                session.polygon.pointer_move(image);
            }
            return;
        }
        if let Some(last) = session.last_stamp {
            let composite = session.composite();
            session.raster.stroke(last, image, session.tool.clamped_size(), session.tool.form, composite);
            session.last_stamp = Some(image);
        }
    }

    pub fn pointer_up(&mut self, _event: &PointerEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let painted = session.last_stamp.take().is_some();
        session.resize = None;
        if painted {
            self.update_blocker();
        }
    }

    pub fn key_down(&mut self, event: &KeyEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event.key.as_str() {
            "Control" => session.ctrl = true,
            "Enter" if session.tool.tool_type.is_polygon() => self.close_polygon(),
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

    /// Encode the raster for display. The returned id must be echoed through
    /// `bitmap_loaded` once the host has decoded the image.
    pub fn snapshot(&mut self) -> Result<Option<(u64, String)>> {
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };
        let url = session.raster.to_data_url()?;
        Ok(Some((self.snapshots.issue(), url)))
    }

    /// True when the bitmap for `id` is still current and may be shown.
    pub fn bitmap_loaded(&mut self, id: u64) -> bool {
        self.session.is_some() && self.snapshots.complete(id)
    }

    pub fn raster(&self) -> Option<&MaskRaster> {
        self.session.as_ref().map(|s| &s.raster)
    }

    pub fn preview(&self) -> Preview {
        let mut preview = Preview::new(&self.projection, &self.config);
        let Some(session) = self.session.as_ref() else {
            return preview;
        };
        let to_canvas = |p: Point| self.projection.image_to_canvas(p);
        match &session.kind {
            MaskSessionKind::Insert { mask, .. } => {
                if let Some(cursor) = session.cursor {
                    let (left, top) = MaskSession::insertion_origin(mask, cursor);
                    let (l, t) = (left as f64, top as f64);
                    let (r, b) = (l + mask.width() as f64, t + mask.height() as f64);
                    let corners = [Point::new(l, t), Point::new(r, t), Point::new(r, b), Point::new(l, b)];
                    preview.shapes.push(PreviewShape {
                        control_points: false,
                        ..PreviewShape::outline(ShapeType::Rectangle, corners.iter().map(|p| to_canvas(*p)).collect(), true)
                    });
                }
            }
            _ if session.tool.tool_type.is_polygon() => {
                let points = session.polygon.with_cursor().into_iter().map(to_canvas).collect();
                preview.shapes.push(PreviewShape::outline(ShapeType::Polygon, points, true));
            }
            _ => {
                preview.brush_marker = session.cursor.map(|c| BrushMarker {
                    center: to_canvas(c),
                    size: session.tool.clamped_size(),
                    form: session.tool.form,
                    color: session.tool.color.clone(),
                    erasing: session.tool.tool_type == BrushToolType::Eraser,
                });
            }
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
    use crate::types::Size;

    #[derive(Default)]
    struct Recorder {
        drawn: RefCell<Vec<Option<DrawnShape>>>,
        edited: RefCell<Vec<Option<Vec<f64>>>>,
        blocker: RefCell<Vec<ToolsBlockerState>>,
    }

    impl CanvasObserver for Recorder {
        fn on_draw_done(&self, result: Option<DrawnShape>, _: f64, _: bool, _: Option<&DrawData>) {
            self.drawn.borrow_mut().push(result);
        }

        fn on_edit_done(&self, _: Option<&ObjectState>, points: Option<Vec<f64>>, _: Option<f64>) {
            self.edited.borrow_mut().push(points);
        }

        fn on_tools_blocker_changed(&self, state: ToolsBlockerState) {
            self.blocker.borrow_mut().push(state);
        }
    }

    fn handler() -> (MaskHandler, Rc<Recorder>, Projection) {
        let recorder = Rc::new(Recorder::default());
        let projection = Projection::new(Geometry::new(Size::new(64.0, 64.0), 0.0));
        let mut handler = MaskHandler::new(recorder.clone(), Rc::new(ManualClock::new()));
        handler.transform(&projection);
        (handler, recorder, projection)
    }

    fn mask_data(tool_type: BrushToolType, size: f64) -> DrawData {
        DrawData {
            brush_tool: Some(BrushTool { tool_type, size, ..Default::default() }),
            ..DrawData::shape(ShapeType::Mask)
        }
    }

    #[test]
    fn blocker_tracks_empty_raster() {
        let (mut handler, recorder, projection) = handler();
        handler.draw(mask_data(BrushToolType::Brush, 4.0), &projection).unwrap();
        assert_eq!(handler.tools_blocker_state(), ToolsBlockerState { eraser: true, polygon_minus: true });
        handler.pointer_down(&PointerEvent::left(10.0, 10.0));
        handler.pointer_up(&PointerEvent::left(10.0, 10.0));
        assert_eq!(handler.tools_blocker_state(), ToolsBlockerState::default());
        assert_eq!(recorder.blocker.borrow().len(), 2);
    }

    #[test]
    fn alt_drag_resizes_without_painting() {
        let (mut handler, recorder, projection) = handler();
        handler.draw(mask_data(BrushToolType::Brush, 10.0), &projection).unwrap();
        let mut event = PointerEvent::left(10.0, 10.0);
        event.alt_key = true;
        handler.pointer_down(&event);
        event.client_x = 30.0;
        handler.pointer_move(&event);
        handler.pointer_up(&event);
        assert!(handler.raster().unwrap().is_empty());
        handler.draw(DrawData::default(), &projection).unwrap();
        assert_eq!(recorder.drawn.borrow()[0], None);
    }

    #[test]
    fn polygon_plus_then_minus() {
        let (mut handler, recorder, projection) = handler();
        handler.draw(mask_data(BrushToolType::PolygonPlus, 4.0), &projection).unwrap();
        for (x, y) in [(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0), (0.0, 0.0)] {
            handler.pointer_down(&PointerEvent::left(x, y));
        }
        assert_eq!(handler.raster().unwrap().foreground_pixels(), 400);
        handler.draw(mask_data(BrushToolType::PolygonMinus, 4.0), &projection).unwrap();
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 20.0), (0.0, 20.0)] {
            handler.pointer_down(&PointerEvent::left(x, y));
        }
        handler.key_down(&KeyEvent::new("Enter"));
        assert_eq!(handler.raster().unwrap().foreground_pixels(), 200);
        handler.draw(DrawData::default(), &projection).unwrap();
        let shape = recorder.drawn.borrow()[0].clone().unwrap();
        let mask = RleMask::from_points(&shape.points).unwrap();
        assert_eq!((mask.left, mask.top, mask.right, mask.bottom), (10, 0, 19, 19));
    }

    #[test]
    fn edit_round_trips_existing_mask() {
        let (mut handler, recorder, projection) = handler();
        let original = RleMask { counts: vec![0, 4], left: 2, top: 3, right: 3, bottom: 4 };
        let state = ObjectState::new(ShapeType::Mask, original.to_points());
        let data = EditData { enabled: true, state: Some(state), ..Default::default() };
        handler.edit(data, &projection).unwrap();
        assert_eq!(handler.mode(), Some(Mode::Edit));
        handler.edit(EditData::default(), &projection).unwrap();
        assert_eq!(recorder.edited.borrow()[0], Some(original.to_points()));
    }

    #[test]
    fn insertion_places_copy_at_cursor() {
        let (mut handler, recorder, projection) = handler();
        let original = RleMask { counts: vec![0, 4], left: 0, top: 0, right: 1, bottom: 1 };
        let data = DrawData {
            initial_state: Some(ObjectState::new(ShapeType::Mask, original.to_points())),
            ..DrawData::shape(ShapeType::Mask)
        };
        handler.draw(data, &projection).unwrap();
        handler.pointer_move(&PointerEvent::left(31.0, 41.0));
        handler.pointer_down(&PointerEvent::left(31.0, 41.0));
        let placed = RleMask::from_points(&recorder.drawn.borrow()[0].clone().unwrap().points).unwrap();
        assert_eq!((placed.left, placed.top), (30, 40));
        assert!(!handler.is_active());
    }

    #[test]
    fn stale_snapshots_are_dropped() {
        let (mut handler, _, projection) = handler();
        handler.draw(mask_data(BrushToolType::Brush, 4.0), &projection).unwrap();
        let (first, _) = handler.snapshot().unwrap().unwrap();
        let (second, url) = handler.snapshot().unwrap().unwrap();
        assert!(url.starts_with("data:image/png"));
        assert!(!handler.bitmap_loaded(first));
        assert!(handler.bitmap_loaded(second));
        let (third, _) = handler.snapshot().unwrap().unwrap();
        handler.cancel();
        assert!(!handler.bitmap_loaded(third));
    }
}
