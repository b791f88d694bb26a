//! Interchange and snapshot codecs.
//!
//! Two formats, two audiences:
//! - **JSON** is the interchange format: what the embedding application
//!   imports/exports and what the web client's older builds produced. Field
//!   names are locked to that wire shape (`type`, `pageNumber`, `timestamp`,
//!   `userId`, hex color strings).
//! - **MessagePack snapshots** (via `rmp-serde`) are the compact save/load
//!   envelope for session persistence: the annotation list plus a format
//!   version and a saved-at timestamp.
//!
//! Imports are validated before they reach the store. A structurally broken
//! payload is rejected with a reason, never silently repaired — the store
//! must not accumulate annotations that can't be hit-tested or painted.

use crate::model::Annotation;
use serde::{Deserialize, Serialize};

/// Snapshot format version. Bump on breaking envelope changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Persistence envelope around an exported annotation set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    /// Milliseconds timestamp recorded at save time, supplied by the caller.
    pub saved_at_ms: u64,
    pub annotations: Vec<Annotation>,
}

impl Snapshot {
    pub fn new(annotations: Vec<Annotation>, saved_at_ms: u64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at_ms,
            annotations,
        }
    }
}

// ─── JSON interchange ─────────────────────────────────────────────────────

/// Serialize annotations as pretty-printed interchange JSON.
pub fn annotations_to_json(annotations: &[Annotation]) -> Result<String, String> {
    serde_json::to_string_pretty(annotations).map_err(|e| format!("serialize failed: {e}"))
}

/// Parse and validate interchange JSON.
///
/// Unknown kind tags fail the parse outright (serde refuses them); anything
/// that parses is then checked annotation-by-annotation so the error can
/// name the offender.
pub fn annotations_from_json(json: &str) -> Result<Vec<Annotation>, String> {
    let annotations: Vec<Annotation> =
        serde_json::from_str(json).map_err(|e| format!("invalid annotation JSON: {e}"))?;
    validate(&annotations)?;
    Ok(annotations)
}

// ─── Snapshot envelope ────────────────────────────────────────────────────

/// Encode a snapshot with MessagePack.
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, String> {
    rmp_serde::to_vec_named(snapshot).map_err(|e| format!("snapshot encode failed: {e}"))
}

/// Decode and validate a MessagePack snapshot.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, String> {
    let snapshot: Snapshot =
        rmp_serde::from_slice(bytes).map_err(|e| format!("snapshot decode failed: {e}"))?;
    if snapshot.version > SNAPSHOT_VERSION {
        return Err(format!(
            "snapshot version {} is newer than supported version {SNAPSHOT_VERSION}",
            snapshot.version
        ));
    }
    validate(&snapshot.annotations)?;
    Ok(snapshot)
}

// ─── Validation ───────────────────────────────────────────────────────────

/// Structural checks every imported annotation must pass.
fn validate(annotations: &[Annotation]) -> Result<(), String> {
    for (index, annotation) in annotations.iter().enumerate() {
        check(annotation).map_err(|reason| {
            log::warn!("rejecting import: annotation {index} ({:?}): {reason}", annotation.id);
            format!("annotation {index} ({}): {reason}", annotation.id)
        })?;
    }
    Ok(())
}

fn check(annotation: &Annotation) -> Result<(), String> {
    if annotation.points.is_empty() {
        return Err("points must not be empty".into());
    }
    if annotation.page_number == 0 {
        return Err("page number must be at least 1".into());
    }
    for point in &annotation.points {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(format!("non-finite coordinate ({}, {})", point.x, point.y));
        }
    }
    let opacity = annotation.style.opacity;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(format!("opacity {opacity} out of range 0..=1"));
    }
    Ok(())
}
