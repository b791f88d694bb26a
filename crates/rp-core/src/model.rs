//! Core annotation data model.
//!
//! An annotation is a flat value: a kind tag, an ordered point list in
//! unscaled page-space, a self-describing style snapshot, and provenance
//! metadata. Point semantics depend on the kind — two points form the
//! bounding diagonal for most shapes, freehand carries the whole polyline,
//! a committed highlight is a 4-corner polygon, and text/sticky-note/stamp
//! annotations anchor at a single point.
//!
//! Serde field names match the interchange JSON produced by the web client
//! (`type`, `pageNumber`, `timestamp`, `userId`), so exported files round-trip.

use crate::geom::{Bounds, Point};
use crate::id::AnnotationId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::{SmallVec, smallvec};

// ─── Fixed footprints & forced styles ────────────────────────────────────

/// Sticky notes render at a fixed size regardless of content.
pub const STICKY_NOTE_WIDTH: f64 = 200.0;
pub const STICKY_NOTE_HEIGHT: f64 = 150.0;
/// Side length of the folded corner on a sticky note.
pub const STICKY_NOTE_FOLD: f64 = 20.0;

/// Stamps render as a fixed badge anchored at their single point.
pub const STAMP_WIDTH: f64 = 120.0;
pub const STAMP_HEIGHT: f64 = 40.0;

/// Committed highlights ignore the active style for these two fields.
pub const HIGHLIGHT_OPACITY: f64 = 0.3;
pub const HIGHLIGHT_LINE_WIDTH: f64 = 12.0;

// ─── Color ───────────────────────────────────────────────────────────────

/// RGBA color, 4 × f32 in [0.0, 1.0]. Serialized as a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    /// Parse `#RGB`, `#RRGGBB`, or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        let nibble = |i: usize| {
            let v = u8::from_str_radix(hex.get(i..i + 1)?, 16).ok()?;
            Some(v * 17)
        };
        let (r, g, b, a) = match hex.len() {
            3 => (nibble(0)?, nibble(1)?, nibble(2)?, 255),
            6 => (byte(0)?, byte(2)?, byte(4)?, 255),
            8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
            _ => return None,
        };
        Some(Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ))
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let r = (self.r * 255.0).round() as u8;
        let g = (self.g * 255.0).round() as u8;
        let b = (self.b * 255.0).round() as u8;
        let a = (self.a * 255.0).round() as u8;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// Same color with its alpha multiplied by `opacity`.
    pub fn with_opacity(&self, opacity: f64) -> Color {
        Color::rgba(self.r, self.g, self.b, self.a * opacity as f32)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color {s:?}")))
    }
}

// ─── Text options & style ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    pub font_size: f64,
    pub font_family: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            font_family: "Arial".into(),
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

/// Style snapshot attached to every annotation at creation time.
/// Annotations are self-describing: rendering never consults global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationStyle {
    pub color: Color,
    pub line_width: f64,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_options: Option<TextOptions>,
    /// Circle point semantics, fixed at creation: `false` = radius mode
    /// (`points[0]` center, `points[1]` on the circumference), `true` =
    /// diameter mode (the two points are diametrically opposite).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub circle_diameter_mode: bool,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: Color::from_hex("#E53E3E").unwrap_or(Color::BLACK),
            line_width: 2.0,
            opacity: 1.0,
            text_options: None,
            circle_diameter_mode: false,
        }
    }
}

impl AnnotationStyle {
    /// The fixed sticky-note style: yellow, opaque, 14px Arial. User style
    /// is deliberately ignored when a sticky note is created.
    pub fn sticky_note() -> Self {
        Self {
            color: Color::from_hex("#FFD700").unwrap_or(Color::BLACK),
            line_width: 1.0,
            opacity: 1.0,
            text_options: Some(TextOptions::default()),
            circle_diameter_mode: false,
        }
    }

    /// Merge a partial patch into this style, field by field.
    pub fn apply(&mut self, patch: &StylePatch) {
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(width) = patch.line_width {
            self.line_width = width;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity;
        }
        if let Some(ref text) = patch.text_options {
            self.text_options = Some(text.clone());
        }
        if let Some(mode) = patch.circle_diameter_mode {
            self.circle_diameter_mode = mode;
        }
    }
}

/// A partial style update. `set_style` merges rather than replaces, so a
/// color swatch click does not clobber the line width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_options: Option<TextOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle_diameter_mode: Option<bool>,
}

// ─── Annotation kinds ────────────────────────────────────────────────────

/// Closed set of annotation kinds. Hit-testing, resizing, and rendering
/// all dispatch exhaustively on this — no stringly-typed fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    #[serde(rename = "freehand")]
    Freehand,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "rectangle")]
    Rectangle,
    #[serde(rename = "circle")]
    Circle,
    #[serde(rename = "triangle")]
    Triangle,
    #[serde(rename = "star")]
    Star,
    #[serde(rename = "arrow")]
    Arrow,
    #[serde(rename = "doubleArrow")]
    DoubleArrow,
    #[serde(rename = "highlight")]
    Highlight,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "stickyNote")]
    StickyNote,
    #[serde(rename = "stamp")]
    Stamp,
    #[serde(rename = "stampApproved")]
    StampApproved,
    #[serde(rename = "stampRejected")]
    StampRejected,
    #[serde(rename = "stampRevision")]
    StampRevision,
}

impl AnnotationKind {
    pub fn is_stamp(&self) -> bool {
        matches!(
            self,
            Self::Stamp | Self::StampApproved | Self::StampRejected | Self::StampRevision
        )
    }

    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Text | Self::StickyNote)
    }

    /// Kinds that accept two-point resize handles. Freehand paths, highlight
    /// polygons, anchored text, and stamps only move, never resize.
    pub fn resizable(&self) -> bool {
        matches!(
            self,
            Self::Line
                | Self::Rectangle
                | Self::Circle
                | Self::Triangle
                | Self::Star
                | Self::Arrow
                | Self::DoubleArrow
        )
    }

    /// Badge text for stamp kinds.
    pub fn stamp_label(&self) -> Option<&'static str> {
        match self {
            Self::Stamp => Some("STAMP"),
            Self::StampApproved => Some("APPROVED"),
            Self::StampRejected => Some("REJECTED"),
            Self::StampRevision => Some("REVISION"),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freehand => "freehand",
            Self::Line => "line",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Star => "star",
            Self::Arrow => "arrow",
            Self::DoubleArrow => "doubleArrow",
            Self::Highlight => "highlight",
            Self::Text => "text",
            Self::StickyNote => "stickyNote",
            Self::Stamp => "stamp",
            Self::StampApproved => "stampApproved",
            Self::StampRejected => "stampRejected",
            Self::StampRevision => "stampRevision",
        }
    }
}

// ─── Annotation ──────────────────────────────────────────────────────────

/// The central entity: one drawn mark on one page of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub points: SmallVec<[Point; 4]>,
    pub style: AnnotationStyle,
    /// 1-based page this annotation belongs to. Move/resize never change it.
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Creation time in ms since the epoch, supplied by the host.
    #[serde(rename = "timestamp")]
    pub created_at_ms: u64,
    #[serde(rename = "userId")]
    pub author: String,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

/// Provenance shared by every creation helper.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub page_number: u32,
    pub author: String,
    pub at_ms: u64,
}

impl Annotation {
    /// A two-point shape (line, rectangle, circle, triangle, star, arrows).
    pub fn shape(
        kind: AnnotationKind,
        start: Point,
        end: Point,
        style: AnnotationStyle,
        who: &Provenance,
    ) -> Self {
        Self {
            id: AnnotationId::fresh(),
            kind,
            points: smallvec![start, end],
            style,
            page_number: who.page_number,
            text: None,
            created_at_ms: who.at_ms,
            author: who.author.clone(),
            version: 1,
        }
    }

    /// A freehand polyline from the full gesture trace.
    pub fn freehand(points: SmallVec<[Point; 4]>, style: AnnotationStyle, who: &Provenance) -> Self {
        Self {
            id: AnnotationId::fresh(),
            kind: AnnotationKind::Freehand,
            points,
            style,
            page_number: who.page_number,
            text: None,
            created_at_ms: who.at_ms,
            author: who.author.clone(),
            version: 1,
        }
    }

    /// A committed highlight: always the 4-corner polygon of the drag
    /// rectangle, with opacity and line width forced to the highlight
    /// constants no matter what style is active.
    pub fn highlight(start: Point, end: Point, mut style: AnnotationStyle, who: &Provenance) -> Self {
        style.opacity = HIGHLIGHT_OPACITY;
        style.line_width = HIGHLIGHT_LINE_WIDTH;
        Self {
            id: AnnotationId::fresh(),
            kind: AnnotationKind::Highlight,
            points: smallvec![
                Point::new(start.x, start.y),
                Point::new(end.x, start.y),
                Point::new(end.x, end.y),
                Point::new(start.x, end.y),
            ],
            style,
            page_number: who.page_number,
            text: None,
            created_at_ms: who.at_ms,
            author: who.author.clone(),
            version: 1,
        }
    }

    /// A free-text annotation anchored at `anchor` (auto-sized at render).
    pub fn note(anchor: Point, text: String, style: AnnotationStyle, who: &Provenance) -> Self {
        Self {
            id: AnnotationId::fresh(),
            kind: AnnotationKind::Text,
            points: smallvec![anchor],
            style,
            page_number: who.page_number,
            text: Some(text),
            created_at_ms: who.at_ms,
            author: who.author.clone(),
            version: 1,
        }
    }

    /// A sticky note anchored at `anchor`. The active style is ignored —
    /// sticky notes always use the fixed yellow style.
    pub fn sticky(anchor: Point, text: String, who: &Provenance) -> Self {
        Self {
            id: AnnotationId::fresh(),
            kind: AnnotationKind::StickyNote,
            points: smallvec![anchor],
            style: AnnotationStyle::sticky_note(),
            page_number: who.page_number,
            text: Some(text),
            created_at_ms: who.at_ms,
            author: who.author.clone(),
            version: 1,
        }
    }

    /// A stamp badge anchored at its top-left corner.
    pub fn stamp(kind: AnnotationKind, anchor: Point, style: AnnotationStyle, who: &Provenance) -> Self {
        debug_assert!(kind.is_stamp());
        Self {
            id: AnnotationId::fresh(),
            kind,
            points: smallvec![anchor],
            style,
            page_number: who.page_number,
            text: None,
            created_at_ms: who.at_ms,
            author: who.author.clone(),
            version: 1,
        }
    }

    /// Raw bounding box of the point list. `None` for empty points;
    /// fixed footprints (sticky/stamp) and measured text are layered on in
    /// the render crate, which knows about text metrics.
    pub fn point_bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    /// Translate every point by `(dx, dy)`. Page membership never changes.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    /// Circle geometry under the annotation's diameter/radius mode.
    /// `None` when the annotation is not a circle with two points.
    pub fn circle_geometry(&self) -> Option<(Point, f64)> {
        if self.kind != AnnotationKind::Circle || self.points.len() < 2 {
            return None;
        }
        let (a, b) = (self.points[0], self.points[1]);
        if self.style.circle_diameter_mode {
            Some((a.midpoint(b), a.distance_to(b) / 2.0))
        } else {
            Some((a, a.distance_to(b)))
        }
    }
}
