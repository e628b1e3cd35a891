use std::f64::consts::PI;
use kurbo::Point;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;
use crate::data::BrushForm;
use crate::engine::AnnotationEngine;
use crate::preview::{Preview, PreviewShape};
use crate::types::ShapeType;

const STROKE: &str = "#4facfe";
const CANDIDATE: &str = "#ffae00";

fn trace(ctx: &CanvasRenderingContext2d, points: &[Point], closed: bool) {
    ctx.begin_path();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            ctx.move_to(p.x, p.y);
        } else {
            ctx.line_to(p.x, p.y);
        }
    }
    if closed {
        ctx.close_path();
    }
}

fn control_points(ctx: &CanvasRenderingContext2d, points: &[Point], radius: f64) -> Result<(), JsValue> {
    ctx.set_fill_style_str("#ffffff");
    for p in points {
        ctx.begin_path();
        ctx.arc(p.x, p.y, radius, 0.0, PI * 2.0)?;
        ctx.fill();
        ctx.stroke();
    }
    Ok(())
}

fn render_shape(ctx: &CanvasRenderingContext2d, shape: &PreviewShape, preview: &Preview) -> Result<(), JsValue> {
    ctx.set_stroke_style_str(STROKE);
    ctx.set_fill_style_str(STROKE);
    match (shape.shape_type, shape.points.as_slice()) {
        (ShapeType::Ellipse, [center, corner]) => {
            ctx.begin_path();
            let (rx, ry) = ((corner.x - center.x).abs(), (corner.y - center.y).abs());
            ctx.ellipse(center.x, center.y, rx, ry, 0.0, 0.0, PI * 2.0)?;
        }
        (ShapeType::Points, points) => {
            ctx.set_global_alpha(shape.fill_opacity.max(0.3));
            for p in points {
                ctx.begin_path();
                ctx.arc(p.x, p.y, preview.control_point_radius, 0.0, PI * 2.0)?;
                ctx.fill();
                ctx.stroke();
            }
            ctx.set_global_alpha(1.0);
            return Ok(());
        }
        (_, points) => trace(ctx, points, shape.closed),
    }
    if shape.fill_opacity > 0.0 {
        ctx.set_global_alpha(shape.fill_opacity);
        ctx.fill();
        ctx.set_global_alpha(1.0);
    }
    ctx.stroke();
    if shape.control_points {
        control_points(ctx, &shape.points, preview.control_point_radius)?;
    }
    Ok(())
}

/// Draw `preview` on a context whose pixels match client coordinates.
pub fn render_preview(ctx: &CanvasRenderingContext2d, preview: &Preview, ctm: kurbo::Affine, bounds: (f64, f64)) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, bounds.0, bounds.1);
    let [a, b, c, d, e, f] = ctm.as_coeffs();
    ctx.set_transform(a, b, c, d, e, f)?;
    ctx.set_line_width(preview.stroke_width);
    ctx.set_line_dash(&js_sys::Array::new())?;

    for shape in &preview.shapes {
        render_shape(ctx, shape, preview)?;
    }

    if !preview.candidates.is_empty() {
        ctx.set_stroke_style_str(CANDIDATE);
        ctx.set_fill_style_str(CANDIDATE);
        for candidate in &preview.candidates {
            trace(ctx, candidate, true);
            ctx.set_global_alpha(0.3);
            ctx.fill();
            ctx.set_global_alpha(1.0);
            ctx.stroke();
        }
    }

    if let Some(marker) = &preview.brush_marker {
        ctx.set_stroke_style_str(if marker.erasing { "#ffffff" } else { marker.color.as_str() });
        ctx.begin_path();
        let r = marker.size / 2.0;
        match marker.form {
            BrushForm::Circle => ctx.arc(marker.center.x, marker.center.y, r, 0.0, PI * 2.0)?,
            BrushForm::Square => ctx.rect(marker.center.x - r, marker.center.y - r, marker.size, marker.size),
        }
        ctx.stroke();
    }

    if let Some(readout) = &preview.size_readout {
        ctx.set_fill_style_str("#ffffff");
        ctx.set_font(&format!("{}px sans-serif", 12.0 * preview.stroke_width));
        ctx.fill_text(&format!("{:.1} x {:.1}", readout.width, readout.height), readout.position.x, readout.position.y)?;
    }

    if let Some(cross) = preview.crosshair {
        let dash = js_sys::Array::new();
        dash.push(&JsValue::from_f64(4.0 * preview.stroke_width));
        ctx.set_line_dash(&dash)?;
        ctx.set_stroke_style_str(STROKE);
        let inverse = ctm.inverse();
        let (tl, br) = (inverse * Point::ZERO, inverse * Point::new(bounds.0, bounds.1));
        ctx.begin_path();
        ctx.move_to(tl.x.min(br.x), cross.y);
        ctx.line_to(tl.x.max(br.x), cross.y);
        ctx.move_to(cross.x, tl.y.min(br.y));
        ctx.line_to(cross.x, tl.y.max(br.y));
        ctx.stroke();
    }

    ctx.restore();
    Ok(())
}

#[wasm_bindgen]
impl AnnotationEngine {
    /// Redraw the interaction overlay for the active mode.
    pub fn render(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) -> Result<(), JsValue> {
        render_preview(ctx, &self.canvas.preview(), self.canvas.projection().ctm(), (width, height))
    }
}
