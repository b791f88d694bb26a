pub mod export;
pub mod hit;
pub mod paint;
pub mod resize;
pub mod text;

pub use export::{DEFAULT_EXPORT_QUALITY, ExportPass, ExportPlan, paint_export};
pub use hit::{
    HANDLE_HIT_RADIUS, Handle, SHAPE_HIT_SLOP, annotation_bounds, circle_handle_at, handle_at,
    hit_test_point, in_selection_box, topmost_hit,
};
pub use paint::{Draft, FrameState, Ghost, TextDrag, Transient, paint_page};
pub use resize::{MIN_RESIZE_SIZE, resized_points, valid_resize};
pub use text::{HeuristicMetrics, SELECTION_PADDING, TextMetrics, text_block_size};
