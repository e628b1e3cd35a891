//! Object picking for merge, split and group. Hit testing belongs to the host's scene
//! graph, which reports the id of whatever was clicked.

use std::rc::Rc;
use kurbo::Point;
use crate::canvas::Mode;
use crate::error::{CanvasError, Result};
use crate::events::Clock;
use crate::observer::CanvasObserver;
use crate::transform::{compute_wrapping_box, to_points};
use crate::types::ObjectState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickKind {
    Merge,
    Split,
    Group,
}

impl PickKind {
    pub fn mode(self) -> Mode {
        match self {
            PickKind::Merge => Mode::Merge,
            PickKind::Split => Mode::Split,
            PickKind::Group => Mode::Group,
        }
    }
}

struct PickSession {
    kind: PickKind,
    selected: Vec<u32>,
    started_at: f64,
}

pub struct ObjectPicker {
    observer: Rc<dyn CanvasObserver>,
    clock: Rc<dyn Clock>,
    session: Option<PickSession>,
}

impl ObjectPicker {
    pub fn new(observer: Rc<dyn CanvasObserver>, clock: Rc<dyn Clock>) -> Self {
        ObjectPicker { observer, clock, session: None }
    }

    pub fn active(&self) -> Option<PickKind> {
        self.session.as_ref().map(|s| s.kind)
    }

    pub fn selected(&self) -> &[u32] {
        self.session.as_ref().map_or(&[], |s| s.selected.as_slice())
    }

    /// Start picking, or finish the running `kind` when `enabled` is false.
    pub fn toggle(&mut self, kind: PickKind, enabled: bool) -> Result<()> {
        match (&self.session, enabled) {
            (Some(session), true) => Err(CanvasError::ModeConflict { active: session.kind.mode(), requested: kind.mode() }),
            (None, true) => {
                log::debug!("{:?} started", kind);
                self.session = Some(PickSession { kind, selected: Vec::new(), started_at: self.clock.now_ms() });
                Ok(())
            }
            (Some(session), false) if session.kind == kind => {
                self.finish();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn emit(&self, kind: PickKind, ids: Option<Vec<u32>>, duration: f64) {
        match kind {
            PickKind::Merge => self.observer.on_merge_done(ids, duration),
            PickKind::Group => self.observer.on_group_done(ids, duration),
            PickKind::Split => self.observer.on_split_done(ids.and_then(|ids| ids.first().copied()), duration),
        }
    }

    fn finish(&mut self) {
        if let Some(session) = self.session.take() {
            let ids = (!session.selected.is_empty()).then_some(session.selected);
            self.emit(session.kind, ids, self.clock.now_ms() - session.started_at);
        }
    }

    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("{:?} cancelled", session.kind);
            self.emit(session.kind, None, self.clock.now_ms() - session.started_at);
        }
    }

    /// A click on object `id`. Merge and group toggle its membership; split is done
    /// with the first object clicked.
    pub fn select(&mut self, id: u32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.kind == PickKind::Split {
            session.selected = vec![id];
            self.finish();
            return;
        }
        if let Some(pos) = session.selected.iter().position(|&x| x == id) {
            session.selected.remove(pos);
        } else {
            session.selected.push(id);
        }
    }

    /// Add every visible, unlocked object whose bounding box overlaps the box `a`-`b`
    /// (image space). Only grouping selects by region.
    pub fn select_in_box(&mut self, states: &[ObjectState], a: Point, b: Point) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.kind != PickKind::Group {
            return;
        }
        let (sx, ex) = (a.x.min(b.x), a.x.max(b.x));
        let (sy, ey) = (a.y.min(b.y), a.y.max(b.y));
        for state in states.iter().filter(|s| !s.hidden && !s.lock) {
            let Some(id) = state.client_id else {
                continue;
            };
            let bbox = compute_wrapping_box(&to_points(&state.points), 0.0);
            if bbox.xtl < ex && bbox.xbr > sx && bbox.ytl < ey && bbox.ybr > sy && !session.selected.contains(&id) {
                session.selected.push(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use super::*;
    use crate::events::ManualClock;
    use crate::types::ShapeType;

    #[derive(Default)]
    struct Recorder {
        merged: RefCell<Vec<Option<Vec<u32>>>>,
        split: RefCell<Vec<Option<u32>>>,
    }

    impl CanvasObserver for Recorder {
        fn on_merge_done(&self, ids: Option<Vec<u32>>, _duration_ms: f64) {
            self.merged.borrow_mut().push(ids);
        }

        fn on_split_done(&self, id: Option<u32>, _duration_ms: f64) {
            self.split.borrow_mut().push(id);
        }
    }

    fn picker() -> (Rc<Recorder>, ObjectPicker) {
        let recorder = Rc::new(Recorder::default());
        let picker = ObjectPicker::new(recorder.clone(), Rc::new(ManualClock::new()));
        (recorder, picker)
    }

    #[test]
    fn merge_toggles_membership() {
        let (recorder, mut picker) = picker();
        picker.toggle(PickKind::Merge, true).unwrap();
        picker.select(3);
        picker.select(5);
        picker.select(3);
        picker.toggle(PickKind::Merge, false).unwrap();
        assert_eq!(recorder.merged.borrow().as_slice(), &[Some(vec![5])]);
    }

    #[test]
    fn split_finishes_on_first_pick() {
        let (recorder, mut picker) = picker();
        picker.toggle(PickKind::Split, true).unwrap();
        picker.select(7);
        assert!(picker.active().is_none());
        assert_eq!(recorder.split.borrow().as_slice(), &[Some(7)]);
    }

    #[test]
    fn second_kind_conflicts() {
        let (_, mut picker) = picker();
        picker.toggle(PickKind::Group, true).unwrap();
        assert!(matches!(picker.toggle(PickKind::Merge, true), Err(CanvasError::ModeConflict { .. })));
    }

    #[test]
    fn group_by_region_skips_locked() {
        let (_, mut picker) = picker();
        picker.toggle(PickKind::Group, true).unwrap();
        let mut locked = ObjectState::new(ShapeType::Rectangle, vec![0.0, 0.0, 10.0, 10.0]).with_client_id(2);
        locked.lock = true;
        let states = [
            ObjectState::new(ShapeType::Rectangle, vec![0.0, 0.0, 10.0, 10.0]).with_client_id(1),
            locked,
            ObjectState::new(ShapeType::Rectangle, vec![50.0, 50.0, 60.0, 60.0]).with_client_id(3),
        ];
        picker.select_in_box(&states, Point::new(20.0, 20.0), Point::new(5.0, 5.0));
        assert_eq!(picker.selected(), &[1]);
    }
}
