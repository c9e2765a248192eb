//! Tooth and problem data models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use crate::geometry::{Finding, NormalizedBox, normalize};

/// 2D position of a tooth label on the X-ray.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    #[serde(deserialize_with = "lenient::number")]
    pub x: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub y: f64,
}

/// Segmentation mask of a structure (endo, root, crown, jaw).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub mask: Vec<Value>,
}

/// A detected problem on a tooth (caries, lesion, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Problem type, used for statistics
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub mask: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub images: Vec<Value>,
    /// `[cx, cy, w, h]` location when the detector provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    /// Remaining detector fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Problem {
    /// Create a problem of the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Geometry view for the normalizer.
    pub fn finding(&self) -> Finding {
        Finding {
            location: self.location.clone(),
            mask: Some(Value::Array(self.mask.clone())),
            ..Finding::default()
        }
    }

    /// Normalized bounding box of the problem region.
    pub fn bounding_box(&self) -> Option<NormalizedBox> {
        normalize(&self.finding())
    }
}

/// A tooth in the patient report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tooth {
    #[serde(deserialize_with = "lenient::string")]
    pub comment: String,
    #[serde(deserialize_with = "lenient::opt_count")]
    pub tooth_number: Option<u32>,
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(deserialize_with = "lenient::object")]
    pub position: Position,
    /// Raw detector box (array or object)
    pub bounding_box: Value,
    #[serde(rename = "teeth_mask", deserialize_with = "lenient::seq")]
    pub teeth_mask: Vec<Value>,
    #[serde(deserialize_with = "lenient::seq")]
    pub problems: Vec<Problem>,
    #[serde(deserialize_with = "lenient::string")]
    pub gum_health: String,
    #[serde(deserialize_with = "lenient::string")]
    pub last_checkup: String,
    #[serde(rename = "Endo", deserialize_with = "lenient::opt_object")]
    pub endo: Option<Mask>,
    #[serde(rename = "Root", deserialize_with = "lenient::opt_object")]
    pub root: Option<Mask>,
    #[serde(rename = "Crown", deserialize_with = "lenient::opt_object")]
    pub crown: Option<Mask>,
}

impl Tooth {
    /// Create a tooth with the given FDI number.
    pub fn new(number: u32) -> Self {
        Self {
            tooth_number: Some(number),
            ..Self::default()
        }
    }

    /// Geometry view for the normalizer.
    pub fn finding(&self) -> Finding {
        Finding {
            bounding_box: Some(self.bounding_box.clone()),
            teeth_mask: Some(Value::Array(self.teeth_mask.clone())),
            ..Finding::default()
        }
    }

    /// Normalized bounding box of the tooth.
    pub fn bounding_box(&self) -> Option<NormalizedBox> {
        normalize(&self.finding())
    }

    /// Check if any problem is recorded on this tooth.
    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }
}

/// Human-readable name of a tooth in FDI two-digit notation.
///
/// The tens digit is the quadrant (1-4), the units digit the tooth (1-8).
/// Returns `None` for numbers outside that scheme.
pub fn tooth_name(number: u32) -> Option<String> {
    let quadrant = match number / 10 {
        1 => "Upper Right",
        2 => "Upper Left",
        3 => "Lower Left",
        4 => "Lower Right",
        _ => return None,
    };
    let tooth = match number % 10 {
        1 => "Central Incisor",
        2 => "Lateral Incisor",
        3 => "Canine",
        4 => "First Premolar",
        5 => "Second Premolar",
        6 => "First Molar",
        7 => "Second Molar",
        8 => "Third Molar",
        _ => return None,
    };
    Some(format!("{} {}", quadrant, tooth))
}
