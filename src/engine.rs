use std::rc::Rc;
use js_sys::{Array, Function, Reflect};
use kurbo::Point;
use log::LevelFilter;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use crate::canvas::Canvas;
use crate::data::DrawData;
use crate::events::{Clock, KeyEvent, PointerEvent};
use crate::geometry::Geometry;
use crate::logger;
use crate::observer::{CanvasObserver, DrawnShape, InteractionShape, ToolsBlockerState};
use crate::types::ObjectState;

pub struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// Completion callbacks looked up once on the object passed to the constructor.
/// Missing callbacks are skipped.
#[derive(Default)]
pub struct JsObserver {
    on_draw_done: Option<Function>,
    on_edit_done: Option<Function>,
    on_slice_done: Option<Function>,
    on_contour_requested: Option<Function>,
    on_interaction: Option<Function>,
    on_merge_done: Option<Function>,
    on_split_done: Option<Function>,
    on_group_done: Option<Function>,
    on_tools_blocker_changed: Option<Function>,
}

fn callback(callbacks: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(callbacks, &JsValue::from_str(name)).ok()?.dyn_into::<Function>().ok()
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).unwrap_or(JsValue::NULL)
}

fn opt_to_js<T: Serialize>(value: Option<T>) -> JsValue {
    value.map_or(JsValue::NULL, |v| to_js(&v))
}

fn invoke(function: &Option<Function>, args: &[JsValue]) {
    let Some(function) = function else {
        return;
    };
    let array: Array = args.iter().collect();
    if let Err(e) = function.apply(&JsValue::NULL, &array) {
        log::error!("callback {} threw: {:?}", function.name(), e);
    }
}

impl JsObserver {
    pub fn from_js(callbacks: &JsValue) -> Self {
        JsObserver {
            on_draw_done: callback(callbacks, "onDrawDone"),
            on_edit_done: callback(callbacks, "onEditDone"),
            on_slice_done: callback(callbacks, "onSliceDone"),
            on_contour_requested: callback(callbacks, "onContourRequested"),
            on_interaction: callback(callbacks, "onInteraction"),
            on_merge_done: callback(callbacks, "onMergeDone"),
            on_split_done: callback(callbacks, "onSplitDone"),
            on_group_done: callback(callbacks, "onGroupDone"),
            on_tools_blocker_changed: callback(callbacks, "onToolsBlockerStateChange"),
        }
    }
}

impl CanvasObserver for JsObserver {
    fn on_draw_done(&self, result: Option<DrawnShape>, duration_ms: f64, continue_drawing: bool, prev: Option<&DrawData>) {
        invoke(
            &self.on_draw_done,
            &[opt_to_js(result), duration_ms.into(), continue_drawing.into(), opt_to_js(prev)],
        );
    }

    fn on_edit_done(&self, state: Option<&ObjectState>, points: Option<Vec<f64>>, rotation: Option<f64>) {
        invoke(&self.on_edit_done, &[opt_to_js(state), opt_to_js(points), opt_to_js(rotation)]);
    }

    fn on_slice_done(&self, state: Option<&ObjectState>, results: Option<[Vec<f64>; 2]>, duration_ms: f64) {
        invoke(&self.on_slice_done, &[opt_to_js(state), opt_to_js(results), duration_ms.into()]);
    }

    fn on_contour_requested(&self, request_id: u64, state: &ObjectState) {
        invoke(&self.on_contour_requested, &[(request_id as f64).into(), to_js(state)]);
    }

    fn on_interaction(&self, shapes: Option<&[InteractionShape]>, updated: bool, done: bool) {
        invoke(&self.on_interaction, &[opt_to_js(shapes), updated.into(), done.into()]);
    }

    fn on_merge_done(&self, ids: Option<Vec<u32>>, duration_ms: f64) {
        invoke(&self.on_merge_done, &[opt_to_js(ids), duration_ms.into()]);
    }

    fn on_split_done(&self, id: Option<u32>, duration_ms: f64) {
        invoke(&self.on_split_done, &[opt_to_js(id), duration_ms.into()]);
    }

    fn on_group_done(&self, ids: Option<Vec<u32>>, duration_ms: f64) {
        invoke(&self.on_group_done, &[opt_to_js(ids), duration_ms.into()]);
    }

    fn on_tools_blocker_changed(&self, state: ToolsBlockerState) {
        invoke(&self.on_tools_blocker_changed, &[to_js(&state)]);
    }
}

#[wasm_bindgen]
pub struct AnnotationEngine {
    pub(crate) canvas: Canvas,
}

#[wasm_bindgen]
impl AnnotationEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(callbacks: JsValue) -> AnnotationEngine {
        console_error_panic_hook::set_once();
        logger::init(LevelFilter::Info);

        let observer: Rc<dyn CanvasObserver> = Rc::new(JsObserver::from_js(&callbacks));
        AnnotationEngine { canvas: Canvas::new(observer, Rc::new(JsClock)) }
    }

    pub fn set_log_level(&self, verbose: bool) {
        logger::init(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    }

    pub fn transform(&mut self, geometry: JsValue) -> Result<(), JsValue> {
        let geometry: Geometry = serde_wasm_bindgen::from_value(geometry)?;
        self.canvas.transform(geometry);
        Ok(())
    }

    /// Use the matrix returned by the rendered element's `getScreenCTM()`.
    pub fn set_screen_ctm(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.canvas.set_ctm(kurbo::Affine::new([a, b, c, d, e, f]));
    }

    pub fn get_mode(&self) -> String {
        serde_json::to_string(&self.canvas.mode()).unwrap_or_else(|_| "\"idle\"".to_string())
    }

    pub fn pointer_down(&mut self, event: JsValue) -> Result<(), JsValue> {
        let event: PointerEvent = serde_wasm_bindgen::from_value(event)?;
        self.canvas.pointer_down(&event);
        Ok(())
    }

    pub fn pointer_move(&mut self, event: JsValue) -> Result<(), JsValue> {
        let event: PointerEvent = serde_wasm_bindgen::from_value(event)?;
        self.canvas.pointer_move(&event);
        Ok(())
    }

    pub fn pointer_up(&mut self, event: JsValue) -> Result<(), JsValue> {
        let event: PointerEvent = serde_wasm_bindgen::from_value(event)?;
        self.canvas.pointer_up(&event);
        Ok(())
    }

    pub fn key_down(&mut self, event: JsValue) -> Result<(), JsValue> {
        let event: KeyEvent = serde_wasm_bindgen::from_value(event)?;
        self.canvas.key_down(&event);
        Ok(())
    }

    pub fn key_up(&mut self, event: JsValue) -> Result<(), JsValue> {
        let event: KeyEvent = serde_wasm_bindgen::from_value(event)?;
        self.canvas.key_up(&event);
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.canvas.cancel();
    }

    pub fn contour_ready(&mut self, request_id: f64, contour: Vec<f64>) -> bool {
        let points = contour.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect();
        self.canvas.contour_ready(request_id as u64, points)
    }

    /// PNG data URL of the mask being painted plus the id to echo to `bitmap_loaded`.
    pub fn mask_snapshot(&mut self) -> Result<JsValue, JsValue> {
        match self.canvas.mask_snapshot() {
            Ok(snapshot) => Ok(to_js(&snapshot)),
            Err(e) => Err(JsValue::from_str(&e.to_string())),
        }
    }

    pub fn bitmap_loaded(&mut self, id: f64) -> bool {
        self.canvas.bitmap_loaded(id as u64)
    }

    pub fn get_preview(&self) -> String {
        serde_json::to_string(&self.canvas.preview()).unwrap_or_else(|_| "{}".to_string())
    }
}
