//! The mode mediator. Owns every handler, lets at most one of them hold a session and
//! forwards input to that one only.

use std::rc::Rc;
use kurbo::{Affine, Point};
use serde::{Serialize, Deserialize};
use crate::config::Configuration;
use crate::data::{DrawData, EditData, GroupData, InteractionData, MergeData, SliceData, SplitData};
use crate::draw::DrawHandler;
use crate::edit::EditHandler;
use crate::error::{CanvasError, Result};
use crate::events::{Clock, KeyEvent, PointerEvent};
use crate::geometry::Geometry;
use crate::interaction::InteractionHandler;
use crate::masks::MaskHandler;
use crate::observer::{CanvasObserver, ToolsBlockerState};
use crate::preview::Preview;
use crate::selection::{ObjectPicker, PickKind};
use crate::slice::SliceHandler;
use crate::transform::Projection;
use crate::types::{ObjectState, ShapeType};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Idle,
    Draw,
    Edit,
    Slice,
    Interact,
    Merge,
    Split,
    Group,
}

pub struct Canvas {
    projection: Projection,
    config: Configuration,
    draw: DrawHandler,
    masks: MaskHandler,
    edit: EditHandler,
    slice: SliceHandler,
    interaction: InteractionHandler,
    picker: ObjectPicker,
}

impl Canvas {
    pub fn new(observer: Rc<dyn CanvasObserver>, clock: Rc<dyn Clock>) -> Self {
        Canvas {
            projection: Projection::default(),
            config: Configuration::default(),
            draw: DrawHandler::new(observer.clone(), clock.clone()),
            masks: MaskHandler::new(observer.clone(), clock.clone()),
            edit: EditHandler::new(observer.clone(), clock.clone()),
            slice: SliceHandler::new(observer.clone(), clock.clone()),
            interaction: InteractionHandler::new(observer.clone(), clock.clone()),
            picker: ObjectPicker::new(observer, clock),
        }
    }

    pub fn mode(&self) -> Mode {
        if let Some(mode) = self.masks.mode() {
            mode
        } else if self.draw.is_active() {
            Mode::Draw
        } else if self.edit.is_active() {
            Mode::Edit
        } else if self.slice.is_active() {
            Mode::Slice
        } else if self.interaction.is_active() {
            Mode::Interact
        } else if let Some(kind) = self.picker.active() {
            kind.mode()
        } else {
            Mode::Idle
        }
    }

    fn ensure_idle(&self, requested: Mode) -> Result<()> {
        match self.mode() {
            Mode::Idle => Ok(()),
            active => Err(CanvasError::ModeConflict { active, requested }),
        }
    }

    pub fn geometry(&self) -> &Geometry {
        self.projection.geometry()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    fn push_projection(&mut self) {
        self.draw.transform(&self.projection);
        self.masks.transform(&self.projection);
        self.edit.transform(&self.projection);
        self.slice.transform(&self.projection);
        self.interaction.transform(&self.projection);
    }

    pub fn transform(&mut self, geometry: Geometry) {
        self.projection = Projection::new(geometry.normalized());
        self.push_projection();
    }

    /// Replace the derived CTM with the one the host measured on the rendered surface.
    pub fn set_ctm(&mut self, ctm: Affine) {
        self.projection = Projection::with_ctm(self.projection.geometry().clone(), ctm);
        self.push_projection();
    }

    pub fn configurate(&mut self, config: Configuration) {
        self.draw.configurate(&config);
        self.masks.configurate(&config);
        self.edit.configurate(&config);
        self.slice.configurate(&config);
        self.interaction.configurate(&config);
        self.config = config;
    }

    pub fn draw(&mut self, data: DrawData) -> Result<()> {
        let mode = self.mode();
        if !data.enabled {
            if mode == Mode::Draw {
                if self.masks.is_active() {
                    self.masks.draw(data, &self.projection)?;
                } else {
                    self.draw.draw(data, &self.projection)?;
                }
            }
            return Ok(());
        }
        if mode == Mode::Draw && self.masks.is_active() && data.brush_tool.is_some() {
            return self.masks.draw(data, &self.projection);
        }
        self.ensure_idle(Mode::Draw)?;
        let shape = data.initial_state.as_ref().map(|s| s.shape_type).or(data.shape_type);
        log::info!("mode: draw {}", shape.map_or("?", |s| s.name()));
        if shape == Some(ShapeType::Mask) {
            self.masks.draw(data, &self.projection)
        } else {
            self.draw.draw(data, &self.projection)
        }
    }

    pub fn edit(&mut self, data: EditData) -> Result<()> {
        let mode = self.mode();
        if !data.enabled {
            if mode == Mode::Edit {
                if self.masks.is_active() {
                    self.masks.edit(data, &self.projection)?;
                } else {
                    self.edit.edit(data, &self.projection)?;
                }
            }
            return Ok(());
        }
        if mode == Mode::Edit && self.masks.is_active() && data.brush_tool.is_some() {
            return self.masks.edit(data, &self.projection);
        }
        self.ensure_idle(Mode::Edit)?;
        log::info!("mode: edit");
        match &data.state {
            Some(state) if state.shape_type == ShapeType::Mask => self.masks.edit(data, &self.projection),
            _ => self.edit.edit(data, &self.projection),
        }
    }

    pub fn slice(&mut self, data: SliceData) -> Result<()> {
        if !data.enabled {
            self.slice.slice(data, &self.projection)?;
            return Ok(());
        }
        self.ensure_idle(Mode::Slice)?;
        log::info!("mode: slice");
        self.slice.slice(data, &self.projection)
    }

    pub fn interact(&mut self, data: InteractionData) -> Result<()> {
        if !data.enabled {
            return self.interaction.interact(data, &self.projection);
        }
        self.ensure_idle(Mode::Interact)?;
        log::info!("mode: interact");
        self.interaction.interact(data, &self.projection)
    }

    fn pick(&mut self, kind: PickKind, enabled: bool) -> Result<()> {
        if enabled {
            self.ensure_idle(kind.mode())?;
            log::info!("mode: {:?}", kind.mode());
        }
        self.picker.toggle(kind, enabled)
    }

    pub fn merge(&mut self, data: MergeData) -> Result<()> {
        self.pick(PickKind::Merge, data.enabled)
    }

    pub fn split(&mut self, data: SplitData) -> Result<()> {
        self.pick(PickKind::Split, data.enabled)
    }

    pub fn group(&mut self, data: GroupData) -> Result<()> {
        self.pick(PickKind::Group, data.enabled)
    }

    /// Cancel whatever is running. Safe to call at any time.
    pub fn cancel(&mut self) {
        if self.mode() != Mode::Idle {
            log::info!("mode: {:?} cancelled", self.mode());
        }
        self.draw.cancel();
        self.masks.cancel();
        self.edit.cancel();
        self.slice.cancel();
        self.interaction.cancel();
        self.picker.cancel();
    }

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        match self.mode() {
            Mode::Draw | Mode::Edit if self.masks.is_active() => self.masks.pointer_down(event),
            Mode::Draw => self.draw.pointer_down(event),
            Mode::Edit => self.edit.pointer_down(event),
            Mode::Slice => self.slice.pointer_down(event),
            Mode::Interact => self.interaction.pointer_down(event),
            _ => {}
        }
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        match self.mode() {
            Mode::Draw | Mode::Edit if self.masks.is_active() => self.masks.pointer_move(event),
            Mode::Draw => self.draw.pointer_move(event),
            Mode::Edit => self.edit.pointer_move(event),
            Mode::Slice => self.slice.pointer_move(event),
            Mode::Interact => self.interaction.pointer_move(event),
            _ => {}
        }
    }

    pub fn pointer_up(&mut self, event: &PointerEvent) {
        match self.mode() {
            Mode::Draw | Mode::Edit if self.masks.is_active() => self.masks.pointer_up(event),
            Mode::Draw => self.draw.pointer_up(event),
            Mode::Interact => self.interaction.pointer_up(event),
            _ => {}
        }
    }

    pub fn key_down(&mut self, event: &KeyEvent) {
        if event.key == "Escape" {
            self.cancel();
            return;
        }
        match self.mode() {
            Mode::Draw | Mode::Edit if self.masks.is_active() => self.masks.key_down(event),
            Mode::Draw => self.draw.key_down(event),
            Mode::Edit => self.edit.key_down(event),
            Mode::Interact => self.interaction.key_down(event),
            _ => {}
        }
    }

    pub fn key_up(&mut self, event: &KeyEvent) {
        if self.masks.is_active() {
            self.masks.key_up(event);
        } else if self.draw.is_active() {
            self.draw.key_up(event);
        }
    }

    pub fn preview(&self) -> Preview {
        match self.mode() {
            Mode::Draw | Mode::Edit if self.masks.is_active() => self.masks.preview(),
            Mode::Draw => self.draw.preview(),
            Mode::Edit => self.edit.preview(),
            Mode::Slice => self.slice.preview(),
            Mode::Interact => self.interaction.preview(),
            _ => Preview::new(&self.projection, &self.config),
        }
    }

    /// Contours of the other objects on the frame, used for autoborder snapping.
    pub fn set_autoborder_contours(&mut self, contours: Vec<(u32, Vec<Point>)>) {
        self.draw.set_autoborder_contours(contours.clone());
        self.edit.set_autoborder_contours(contours);
    }

    pub fn choose_candidate(&mut self, index: usize) -> bool {
        self.edit.choose_candidate(index)
    }

    pub fn pick_slice_object(&mut self, state: ObjectState) -> Result<()> {
        self.slice.pick(state)
    }

    pub fn contour_ready(&mut self, request_id: u64, contour: Vec<Point>) -> bool {
        self.slice.contour_ready(request_id, contour)
    }

    pub fn select_object(&mut self, id: u32) {
        self.picker.select(id);
    }

    pub fn select_in_box(&mut self, states: &[ObjectState], a: Point, b: Point) {
        self.picker.select_in_box(states, a, b);
    }

    pub fn selected_objects(&self) -> &[u32] {
        self.picker.selected()
    }

    pub fn tools_blocker_state(&self) -> ToolsBlockerState {
        self.masks.tools_blocker_state()
    }

    pub fn mask_snapshot(&mut self) -> Result<Option<(u64, String)>> {
        self.masks.snapshot()
    }

    pub fn bitmap_loaded(&mut self, id: u64) -> bool {
        self.masks.bitmap_loaded(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ManualClock;
    use crate::observer::NoopObserver;
    use crate::types::Size;

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new(Rc::new(NoopObserver), Rc::new(ManualClock::new()));
        canvas.transform(Geometry::new(Size::new(100.0, 100.0), 0.0));
        canvas
    }

    #[test]
    fn one_mode_at_a_time() {
        let mut canvas = canvas();
        canvas.draw(DrawData::shape(ShapeType::Rectangle)).unwrap();
        assert_eq!(canvas.mode(), Mode::Draw);
        let err = canvas.merge(MergeData { enabled: true }).unwrap_err();
        assert!(matches!(err, CanvasError::ModeConflict { active: Mode::Draw, requested: Mode::Merge }));
        canvas.cancel();
        assert_eq!(canvas.mode(), Mode::Idle);
        canvas.merge(MergeData { enabled: true }).unwrap();
        assert_eq!(canvas.mode(), Mode::Merge);
    }

    #[test]
    fn masks_count_as_drawing() {
        let mut canvas = canvas();
        canvas.draw(DrawData::shape(ShapeType::Mask)).unwrap();
        assert_eq!(canvas.mode(), Mode::Draw);
        assert!(canvas.preview().brush_marker.is_none());
        canvas.key_down(&KeyEvent::new("Escape"));
        assert_eq!(canvas.mode(), Mode::Idle);
    }

    #[test]
    fn geometry_is_normalized() {
        let mut canvas = canvas();
        let mut geometry = Geometry::new(Size::new(10.0, 10.0), 0.0);
        geometry.scale = 100.0;
        canvas.transform(geometry);
        assert_eq!(canvas.geometry().scale, crate::consts::MAX_ZOOM);
    }
}
