use std::cell::RefCell;
use std::rc::Rc;
use annotation_canvas::data::DrawData;
use annotation_canvas::events::ManualClock;
use annotation_canvas::observer::{CanvasObserver, DrawnShape, ToolsBlockerState};
use annotation_canvas::{Canvas, Geometry, ObjectState, Size};

#[derive(Default)]
pub struct Recorder {
    pub drawn: RefCell<Vec<(Option<DrawnShape>, bool)>>,
    pub edited: RefCell<Vec<Option<Vec<f64>>>>,
    pub sliced: RefCell<Vec<Option<[Vec<f64>; 2]>>>,
    pub blockers: RefCell<Vec<ToolsBlockerState>>,
}

impl CanvasObserver for Recorder {
    fn on_draw_done(&self, result: Option<DrawnShape>, _duration_ms: f64, continue_drawing: bool, _prev: Option<&DrawData>) {
        self.drawn.borrow_mut().push((result, continue_drawing));
    }

    fn on_edit_done(&self, _state: Option<&ObjectState>, points: Option<Vec<f64>>, _rotation: Option<f64>) {
        self.edited.borrow_mut().push(points);
    }

    fn on_slice_done(&self, _state: Option<&ObjectState>, results: Option<[Vec<f64>; 2]>, _duration_ms: f64) {
        self.sliced.borrow_mut().push(results);
    }

    fn on_tools_blocker_changed(&self, state: ToolsBlockerState) {
        self.blockers.borrow_mut().push(state);
    }
}

/// A canvas showing a `width` x `height` image with the given padding, unscaled and
/// placed at the client origin.
pub fn canvas(width: f64, height: f64, offset: f64) -> (Rc<Recorder>, Canvas) {
    let recorder = Rc::new(Recorder::default());
    let mut canvas = Canvas::new(recorder.clone(), Rc::new(ManualClock::new()));
    canvas.transform(Geometry::new(Size::new(width, height), offset));
    (recorder, canvas)
}
