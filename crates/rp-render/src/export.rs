//! Export planning: flattening one page to a raster at print quality.
//!
//! Planning is backend-neutral data. [`paint_export`] executes a plan
//! against Vello; the wasm crate replays the same plan against Canvas2D
//! with `globalCompositeOperation = "multiply"` for the second pass.

use kurbo::{Affine, Rect};
use peniko::{Fill, Mix};
use vello::Scene;

use crate::paint::paint_annotation;
use crate::text::TextMetrics;
use rp_core::model::{Annotation, AnnotationKind, Color};

/// Default oversampling factor on top of the on-screen scale.
pub const DEFAULT_EXPORT_QUALITY: f64 = 2.0;

/// One rendering pass: a slice of the page's annotations plus the blend
/// they composite with.
#[derive(Debug)]
pub struct ExportPass<'a> {
    pub annotations: Vec<&'a Annotation>,
    pub multiply: bool,
}

/// A full export of one page: output dimensions and the two passes.
///
/// Highlights composite with multiply so overlapping marks darken instead
/// of flattening to the top color; everything else renders normally first.
/// Store order is preserved inside each pass.
#[derive(Debug)]
pub struct ExportPlan<'a> {
    pub export_scale: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub passes: [ExportPass<'a>; 2],
}

impl<'a> ExportPlan<'a> {
    /// Plan the export of `page`. `page_width`/`page_height` are the page's
    /// unscaled dimensions; the output raster is `base_scale × quality`
    /// times that.
    pub fn new(
        annotations: &'a [Annotation],
        page: u32,
        base_scale: f64,
        quality: f64,
        page_width: f64,
        page_height: f64,
    ) -> Self {
        let export_scale = base_scale * quality;
        let mut regular = Vec::new();
        let mut highlights = Vec::new();
        for annotation in annotations {
            if annotation.page_number != page || annotation.points.is_empty() {
                continue;
            }
            if annotation.kind == AnnotationKind::Highlight {
                highlights.push(annotation);
            } else {
                regular.push(annotation);
            }
        }
        Self {
            export_scale,
            pixel_width: (page_width * export_scale).round() as u32,
            pixel_height: (page_height * export_scale).round() as u32,
            passes: [
                ExportPass { annotations: regular, multiply: false },
                ExportPass { annotations: highlights, multiply: true },
            ],
        }
    }
}

/// Execute `plan` into a scene: white background, the optional page
/// raster stretched to the output size, then both passes.
pub fn paint_export(
    scene: &mut Scene,
    plan: &ExportPlan<'_>,
    raster: Option<&peniko::Image>,
    metrics: &dyn TextMetrics,
) {
    let full = Rect::new(0.0, 0.0, plan.pixel_width as f64, plan.pixel_height as f64);
    scene.fill(
        Fill::NonZero,
        Affine::IDENTITY,
        crate::paint::vello_color(&Color::WHITE, 1.0),
        None,
        &full,
    );
    if let Some(image) = raster {
        if image.width > 0 && image.height > 0 {
            let sx = plan.pixel_width as f64 / image.width as f64;
            let sy = plan.pixel_height as f64 / image.height as f64;
            scene.draw_image(image, Affine::scale_non_uniform(sx, sy));
        }
    }

    let to_pixels = Affine::scale(plan.export_scale);
    for pass in &plan.passes {
        if pass.multiply {
            scene.push_layer(Mix::Multiply, 1.0, Affine::IDENTITY, &full);
        }
        for annotation in &pass.annotations {
            paint_annotation(scene, annotation, to_pixels, metrics);
        }
        if pass.multiply {
            scene.pop_layer();
        }
    }
    log::trace!(
        "export {}x{} at scale {} ({} + {} annotations)",
        plan.pixel_width,
        plan.pixel_height,
        plan.export_scale,
        plan.passes[0].annotations.len(),
        plan.passes[1].annotations.len(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rp_core::geom::Point;
    use rp_core::model::{AnnotationStyle, Provenance};

    fn who(page: u32) -> Provenance {
        Provenance {
            page_number: page,
            author: "tester".into(),
            at_ms: 0,
        }
    }

    fn rect_on(page: u32) -> Annotation {
        Annotation::shape(
            AnnotationKind::Rectangle,
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            AnnotationStyle::default(),
            &who(page),
        )
    }

    fn highlight_on(page: u32) -> Annotation {
        Annotation::highlight(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            AnnotationStyle::default(),
            &who(page),
        )
    }

    #[test]
    fn highlights_split_into_the_multiply_pass() {
        let annotations = vec![rect_on(1), highlight_on(1), rect_on(1)];
        let plan = ExportPlan::new(&annotations, 1, 1.0, 2.0, 612.0, 792.0);
        assert_eq!(plan.passes[0].annotations.len(), 2);
        assert!(!plan.passes[0].multiply);
        assert_eq!(plan.passes[1].annotations.len(), 1);
        assert!(plan.passes[1].multiply);
        assert_eq!(plan.passes[1].annotations[0].kind, AnnotationKind::Highlight);
    }

    #[test]
    fn pass_order_follows_store_order() {
        let first = rect_on(1);
        let second = rect_on(1);
        let ids = (first.id, second.id);
        let annotations = vec![first, second];
        let plan = ExportPlan::new(&annotations, 1, 1.5, 2.0, 100.0, 100.0);
        assert_eq!(plan.passes[0].annotations[0].id, ids.0);
        assert_eq!(plan.passes[0].annotations[1].id, ids.1);
    }

    #[test]
    fn quality_multiplies_the_on_screen_scale() {
        let annotations: Vec<Annotation> = Vec::new();
        let plan = ExportPlan::new(&annotations, 1, 1.5, 2.0, 612.0, 792.0);
        assert_eq!(plan.export_scale, 3.0);
        assert_eq!(plan.pixel_width, 1836);
        assert_eq!(plan.pixel_height, 2376);
    }

    #[test]
    fn other_pages_and_empty_entries_are_excluded() {
        let mut corrupt = rect_on(1);
        corrupt.points.clear();
        let annotations = vec![rect_on(1), rect_on(2), corrupt];
        let plan = ExportPlan::new(&annotations, 1, 1.0, 1.0, 100.0, 100.0);
        assert_eq!(plan.passes[0].annotations.len(), 1);
        assert_eq!(plan.passes[1].annotations.len(), 0);
    }

    #[test]
    fn fractional_dimensions_round_to_pixels() {
        let annotations: Vec<Annotation> = Vec::new();
        let plan = ExportPlan::new(&annotations, 1, 1.1, 2.0, 595.3, 841.9);
        // 595.3 × 2.2 = 1309.66 → 1310; 841.9 × 2.2 = 1852.18 → 1852.
        assert_eq!(plan.pixel_width, 1310);
        assert_eq!(plan.pixel_height, 1852);
    }
}
