//! Canvas2D execution of an export plan.
//!
//! The plan itself comes from `rp-render`; this module replays it against
//! a browser canvas: white background, the optional PDF raster stretched
//! to the output size, the regular pass, then highlights composited with
//! `globalCompositeOperation = "multiply"` so overlapping marks darken.

use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use rp_render::{ExportPlan, TextMetrics};

use crate::render2d::draw_annotation;

/// Flatten one page into `ctx`, whose canvas the caller has already sized
/// to `plan.pixel_width` × `plan.pixel_height`. `raster` is the rendered
/// PDF page, typically at screen resolution; it is stretched to fill the
/// output.
pub fn export_page(
    ctx: &CanvasRenderingContext2d,
    plan: &ExportPlan<'_>,
    raster: Option<&HtmlCanvasElement>,
    metrics: &dyn TextMetrics,
) {
    let (w, h) = (plan.pixel_width as f64, plan.pixel_height as f64);
    ctx.save();
    ctx.set_fill_style_str("#FFFFFF");
    ctx.fill_rect(0.0, 0.0, w, h);
    if let Some(canvas) = raster {
        if canvas.width() > 0 && canvas.height() > 0 {
            let _ = ctx.draw_image_with_html_canvas_element_and_dw_and_dh(canvas, 0.0, 0.0, w, h);
        }
    }

    for pass in &plan.passes {
        ctx.save();
        if pass.multiply {
            let _ = ctx.set_global_composite_operation("multiply");
        }
        let _ = ctx.scale(plan.export_scale, plan.export_scale);
        for annotation in &pass.annotations {
            draw_annotation(ctx, annotation, metrics);
        }
        ctx.restore();
    }
    ctx.restore();

    log::debug!(
        "exported {}x{} ({} + {} annotations)",
        plan.pixel_width,
        plan.pixel_height,
        plan.passes[0].annotations.len(),
        plan.passes[1].annotations.len(),
    );
}
