use kurbo::Point;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use crate::canvas::Canvas;
use crate::config::Configuration;
use crate::data::{DrawData, EditData, GroupData, InteractionData, MergeData, SliceData, SplitData};
use crate::engine::AnnotationEngine;
use crate::error::{CanvasError, Result};
use crate::geometry::Geometry;
use crate::transform::to_points;
use crate::types::{ObjectState, Size};

#[derive(Deserialize)]
struct Command {
    action: String,
    #[serde(default)]
    params: Value,
}

fn params<T: DeserializeOwned>(value: &Value) -> Result<T> {
    Ok(serde_json::from_value(value.clone())?)
}

fn point(value: &Value, key: &str) -> Result<Point> {
    let p = &value[key];
    match (p["x"].as_f64(), p["y"].as_f64()) {
        (Some(x), Some(y)) => Ok(Point::new(x, y)),
        _ => Err(CanvasError::InvalidData(format!("{} must be {{x, y}}", key))),
    }
}

fn ok() -> Value {
    json!({ "success": true })
}

pub fn execute(canvas: &mut Canvas, cmd_json: &str) -> String {
    let result = serde_json::from_str::<Command>(cmd_json)
        .map_err(CanvasError::from)
        .and_then(|cmd| dispatch(canvas, &cmd.action, &cmd.params));
    match result {
        Ok(value) => value.to_string(),
        Err(e) => {
            log::warn!("command failed: {}", e);
            json!({ "error": e.to_string() }).to_string()
        }
    }
}

fn dispatch(canvas: &mut Canvas, action: &str, p: &Value) -> Result<Value> {
    match action {
        "draw" => canvas.draw(params::<DrawData>(p)?).map(|_| ok()),
        "edit" => canvas.edit(params::<EditData>(p)?).map(|_| ok()),
        "slice" => canvas.slice(params::<SliceData>(p)?).map(|_| ok()),
        "interact" => canvas.interact(params::<InteractionData>(p)?).map(|_| ok()),
        "merge" => canvas.merge(params::<MergeData>(p)?).map(|_| ok()),
        "split" => canvas.split(params::<SplitData>(p)?).map(|_| ok()),
        "group" => canvas.group(params::<GroupData>(p)?).map(|_| ok()),
        "cancel" => {
            canvas.cancel();
            Ok(ok())
        }
        "configurate" => {
            canvas.configurate(params::<Configuration>(p)?);
            Ok(ok())
        }
        "transform" => {
            canvas.transform(params::<Geometry>(p)?);
            Ok(ok())
        }
        "set_image" => {
            let size: Size = params(&p["image"])?;
            let offset = p["offset"].as_f64().unwrap_or(0.0);
            let mut geometry = canvas.geometry().clone();
            geometry.set_image(size, offset);
            canvas.transform(geometry);
            Ok(ok())
        }
        "zoom" => {
            let factor = p["factor"].as_f64().ok_or(CanvasError::MissingField("factor"))?;
            let mut geometry = canvas.geometry().clone();
            geometry.zoom(point(p, "anchor")?, factor);
            canvas.transform(geometry);
            Ok(json!({ "success": true, "scale": canvas.geometry().scale }))
        }
        "pan" => {
            let mut geometry = canvas.geometry().clone();
            geometry.pan(p["dx"].as_f64().unwrap_or(0.0), p["dy"].as_f64().unwrap_or(0.0));
            canvas.transform(geometry);
            Ok(ok())
        }
        "fit" => {
            let container: Size = params(p)?;
            let mut geometry = canvas.geometry().clone();
            geometry.fit(container);
            canvas.transform(geometry);
            Ok(json!({ "success": true, "scale": canvas.geometry().scale }))
        }
        "rotate" => {
            let mut geometry = canvas.geometry().clone();
            geometry.rotate(p["clockwise"].as_bool().unwrap_or(true));
            canvas.transform(geometry);
            Ok(json!({ "success": true, "angle": canvas.geometry().angle }))
        }
        "choose_candidate" => {
            let index = p["index"].as_u64().ok_or(CanvasError::MissingField("index"))? as usize;
            Ok(json!({ "success": canvas.choose_candidate(index) }))
        }
        "pick_slice_object" => canvas.pick_slice_object(params::<ObjectState>(p)?).map(|_| ok()),
        "select_object" => {
            let id = p["id"].as_u64().ok_or(CanvasError::MissingField("id"))? as u32;
            canvas.select_object(id);
            Ok(json!({ "success": true, "selected": canvas.selected_objects() }))
        }
        "select_in_box" => {
            let states: Vec<ObjectState> = params(&p["states"])?;
            canvas.select_in_box(&states, point(p, "from")?, point(p, "to")?);
            Ok(json!({ "success": true, "selected": canvas.selected_objects() }))
        }
        "set_autoborder_contours" => {
            #[derive(Deserialize)]
            struct Contour {
                #[serde(rename = "clientID")]
                client_id: u32,
                points: Vec<f64>,
            }
            let contours: Vec<Contour> = params(&p["contours"])?;
            canvas.set_autoborder_contours(contours.into_iter().map(|c| (c.client_id, to_points(&c.points))).collect());
            Ok(ok())
        }
        "get_mode" => Ok(json!({ "mode": canvas.mode() })),
        "get_preview" => Ok(serde_json::to_value(canvas.preview())?),
        "get_configuration" => Ok(serde_json::to_value(canvas.configuration())?),
        "get_tools_blocker_state" => Ok(serde_json::to_value(canvas.tools_blocker_state())?),
        other => Err(CanvasError::InvalidData(format!("unknown action: {}", other))),
    }
}

#[wasm_bindgen]
impl AnnotationEngine {
    pub fn execute_command(&mut self, cmd_json: &str) -> String {
        execute(&mut self.canvas, cmd_json)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use super::*;
    use crate::events::ManualClock;
    use crate::observer::NoopObserver;

    fn canvas() -> Canvas {
        Canvas::new(Rc::new(NoopObserver), Rc::new(ManualClock::new()))
    }

    #[test]
    fn draw_command_starts_a_session() {
        let mut canvas = canvas();
        let out = execute(&mut canvas, r#"{"action": "draw", "params": {"enabled": true, "shapeType": "polygon"}}"#);
        assert_eq!(out, r#"{"success":true}"#);
        let mode = execute(&mut canvas, r#"{"action": "get_mode"}"#);
        assert_eq!(mode, r#"{"mode":"draw"}"#);
    }

    #[test]
    fn conflicts_and_bad_input_are_errors() {
        let mut canvas = canvas();
        execute(&mut canvas, r#"{"action": "merge", "params": {"enabled": true}}"#);
        let out: Value = serde_json::from_str(&execute(&mut canvas, r#"{"action": "group", "params": {"enabled": true}}"#)).unwrap();
        assert!(out["error"].as_str().unwrap().contains("Merge"));
        let out: Value = serde_json::from_str(&execute(&mut canvas, "not json")).unwrap();
        assert!(out["error"].as_str().unwrap().starts_with("invalid JSON"));
        let out: Value = serde_json::from_str(&execute(&mut canvas, r#"{"action": "fly"}"#)).unwrap();
        assert!(out["error"].is_string());
    }

    #[test]
    fn viewport_commands_update_geometry() {
        let mut canvas = canvas();
        execute(&mut canvas, r#"{"action": "set_image", "params": {"image": {"width": 200, "height": 100}, "offset": 10}}"#);
        assert_eq!(canvas.geometry().canvas, Size::new(220.0, 120.0));
        let out: Value = serde_json::from_str(&execute(&mut canvas, r#"{"action": "rotate", "params": {"clockwise": false}}"#)).unwrap();
        assert_eq!(out["angle"], json!(270.0));
    }
}
