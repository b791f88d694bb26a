pub mod codec;
pub mod geom;
pub mod id;
pub mod model;
pub mod store;

pub use codec::{Snapshot, annotations_from_json, annotations_to_json};
pub use geom::{Bounds, Point, point_in_polygon, segments_intersect};
pub use id::{AnnotationId, DocumentId};
pub use model::*;
pub use store::{AnnotationStore, ChangeEvent, ChangeSource, SubscriberId, Tool};
