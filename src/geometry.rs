//! Finding geometry normalization.
//!
//! Findings arrive from the analysis backend in several shapes: a YOLO-style
//! `location` array, a `boundingBox` object, or a point sequence under
//! `polygon`, `teeth_mask` or `mask`. This module reduces all of them to a
//! single top-left-origin rectangle.
//!
//! Shapes are tried in a fixed priority order (see [`ShapeSource::ORDER`]).
//! A shape that is present but unusable does not stop the search; the next
//! shape is tried instead. Existing overlays rely on that ordering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum number of entries a point sequence needs before it is considered.
pub const MIN_POINT_ENTRIES: usize = 4;

/// Axis-aligned rectangle with a top-left origin (image pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    /// Create a box from its top-left corner and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a box from its center point and size.
    pub fn from_center(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Center point of the box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Scale the box into another view's coordinate space.
    ///
    /// `sx`/`sy` are the ratios between the displayed and the natural image
    /// size, as computed by the multi-pane viewer for each pane.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Check if a point lies inside the box (edges inclusive).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Compute the scale factor that fits an image into a pane, preserving aspect ratio.
///
/// Returns `None` for empty image dimensions.
pub fn fit_scale(
    image_width: f64,
    image_height: f64,
    pane_width: f64,
    pane_height: f64,
) -> Option<f64> {
    if image_width <= 0.0 || image_height <= 0.0 {
        return None;
    }
    Some((pane_width / image_width).min(pane_height / image_height))
}

/// Tolerant view over a finding payload.
///
/// Every shape field is kept as raw JSON so that any input deserializes;
/// interpretation happens in [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// `[cx, cy, w, h]` center-based location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    /// `{x, y, width|w, height|h}` with a center-based `x`/`y`
    #[serde(rename = "boundingBox", default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teeth_mask: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Value>,
}

impl Finding {
    /// Build a finding from an arbitrary JSON value.
    ///
    /// Non-object values produce an empty finding.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let field = |name: &str| obj.get(name).cloned();
        Self {
            location: field("location"),
            bounding_box: field("boundingBox"),
            polygon: field("polygon"),
            teeth_mask: field("teeth_mask"),
            mask: field("mask"),
        }
    }

    /// Finding with only a `location` array.
    pub fn with_location(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            location: Some(serde_json::json!([cx, cy, w, h])),
            ..Self::default()
        }
    }

    /// Finding with only a point sequence under `polygon`.
    pub fn with_polygon(points: &[(f64, f64)]) -> Self {
        let points: Vec<Value> = points
            .iter()
            .map(|(x, y)| serde_json::json!([x, y]))
            .collect();
        Self {
            polygon: Some(Value::Array(points)),
            ..Self::default()
        }
    }

    /// The point sequence to use, if any: first truthy of `polygon`,
    /// `teeth_mask`, `mask`.
    fn points(&self) -> Option<&Value> {
        [&self.polygon, &self.teeth_mask, &self.mask]
            .into_iter()
            .flatten()
            .find(|v| is_truthy(v))
    }
}

/// Input shapes accepted by the normalizer, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeSource {
    /// `location: [cx, cy, w, h]`
    Location,
    /// `boundingBox: {x, y, width, height}` with center-based `x`/`y`
    CenterBox,
    /// `polygon` / `teeth_mask` / `mask` point sequence
    Points,
}

impl ShapeSource {
    /// Fixed evaluation order.
    pub const ORDER: [ShapeSource; 3] = [
        ShapeSource::Location,
        ShapeSource::CenterBox,
        ShapeSource::Points,
    ];

    /// Try to extract a box from this shape of the finding.
    pub fn extract(self, finding: &Finding) -> Option<NormalizedBox> {
        match self {
            ShapeSource::Location => from_location(finding.location.as_ref()?),
            ShapeSource::CenterBox => from_center_box(finding.bounding_box.as_ref()?),
            ShapeSource::Points => from_points(finding.points()?),
        }
    }
}

/// Normalize a finding into a top-left-origin box.
///
/// Returns `None` when no shape yields a box. Never panics.
pub fn normalize(finding: &Finding) -> Option<NormalizedBox> {
    normalize_with_source(finding).map(|(bbox, _)| bbox)
}

/// Like [`normalize`], also reporting which shape produced the box.
pub fn normalize_with_source(finding: &Finding) -> Option<(NormalizedBox, ShapeSource)> {
    ShapeSource::ORDER.into_iter().find_map(|source| {
        let bbox = source.extract(finding)?;
        log::trace!("Normalized finding from {:?}: {:?}", source, bbox);
        Some((bbox, source))
    })
}

/// Normalize a raw JSON finding.
pub fn normalize_value(value: &Value) -> Option<NormalizedBox> {
    normalize(&Finding::from_value(value))
}

/// `[cx, cy, w, h]`; sizes are not validated.
fn from_location(location: &Value) -> Option<NormalizedBox> {
    let values = location.as_array()?;
    if values.len() != 4 {
        return None;
    }
    let cx = values[0].as_f64()?;
    let cy = values[1].as_f64()?;
    let w = values[2].as_f64()?;
    let h = values[3].as_f64()?;
    Some(NormalizedBox::from_center(cx, cy, w, h))
}

fn from_center_box(bounding_box: &Value) -> Option<NormalizedBox> {
    let bb = bounding_box.as_object()?;
    let non_null = |name: &str| bb.get(name).filter(|v| !v.is_null());

    let x = non_null("x")?.as_f64()?;
    let y = non_null("y")?.as_f64()?;
    let width = non_null("width").or_else(|| non_null("w"))?.as_f64()?;
    let height = non_null("height").or_else(|| non_null("h"))?.as_f64()?;

    if width > 0.0 && height > 0.0 {
        Some(NormalizedBox::from_center(x, y, width, height))
    } else {
        None
    }
}

/// Extents of a point sequence given as `[[x, y], ...]` or `[x, y, ...]`.
fn from_points(points: &Value) -> Option<NormalizedBox> {
    let entries = points.as_array()?;
    if entries.len() < MIN_POINT_ENTRIES {
        return None;
    }

    // One level of flattening; non-numeric coordinates become NaN and never win a comparison.
    let flat: Vec<f64> = entries
        .iter()
        .flat_map(|entry| match entry {
            Value::Array(inner) => inner.iter().map(coordinate).collect::<Vec<_>>(),
            other => vec![coordinate(other)],
        })
        .collect();

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for pair in flat.chunks(2) {
        let px = pair[0];
        let py = pair.get(1).copied().unwrap_or(f64::NAN);
        if px < min_x {
            min_x = px;
        }
        if px > max_x {
            max_x = px;
        }
        if py < min_y {
            min_y = py;
        }
        if py > max_y {
            max_y = py;
        }
    }

    if min_x.is_finite() && min_y.is_finite() && max_x > min_x {
        Some(NormalizedBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
    } else {
        None
    }
}

fn coordinate(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

/// Truthiness as the analysis payloads use it: null, false, 0 and "" are empty.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
