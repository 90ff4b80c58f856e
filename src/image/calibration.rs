//! Per-axis and intensity calibrations and their tag-tree representation.

use crate::tags::{TagMap, TagNode, TagValue};

/// An affine map from an array index (or intensity value) to a physical
/// measurement: `origin + scale * index`, expressed in `units`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Calibration {
    pub origin: f64,
    pub scale: f64,
    pub units: String,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            origin: 0.0,
            scale: 1.0,
            units: String::new(),
        }
    }
}

impl Calibration {
    pub fn new<S: Into<String>>(origin: f64, scale: f64, units: S) -> Self {
        Self {
            origin,
            scale,
            units: units.into(),
        }
    }

    /// Map an index on this axis to its physical measurement.
    pub fn convert(&self, index: f64) -> f64 {
        self.origin + self.scale * index
    }

    pub fn is_default(&self) -> bool {
        self.origin == 0.0 && self.scale == 1.0 && self.units.is_empty()
    }
}

fn calibration_from_node(node: Option<&TagNode>) -> Calibration {
    let mut out = Calibration::default();
    if let Some(map) = node.and_then(TagNode::as_mapping) {
        if let Some(origin) = map.get("Origin").and_then(TagNode::as_scalar) {
            if let Some(value) = origin.as_f64() {
                out.origin = value;
            }
        }
        if let Some(scale) = map.get("Scale").and_then(TagNode::as_scalar) {
            if let Some(value) = scale.as_f64() {
                out.scale = value;
            }
        }
        if let Some(units) = map.get("Units").and_then(TagNode::as_scalar) {
            if let Some(value) = units.as_str() {
                out.units = value.to_string();
            }
        }
    }
    out
}

fn calibration_to_node(calibration: &Calibration) -> TagNode {
    let mut map = TagMap::new();
    map.insert("Origin".into(), TagNode::from(calibration.origin));
    map.insert("Scale".into(), TagNode::from(calibration.scale));
    map.insert(
        "Units".into(),
        TagNode::Scalar(TagValue::String(calibration.units.clone())),
    );
    TagNode::Mapping(map)
}

/// Read the per-axis and intensity calibrations out of an `ImageData`
/// mapping.
///
/// The stored `Dimension` list mirrors the reversed extent list, so it is
/// reversed once here to line the result up with the native axis order.
/// Missing entries and missing fields fall back to the identity calibration
/// `(0.0, 1.0, "")`.
pub fn extract_calibrations(image_data: &TagMap) -> (Vec<Calibration>, Calibration) {
    let calibrations = image_data
        .get("Calibrations")
        .and_then(TagNode::as_mapping);
    let mut dimensional: Vec<Calibration> = calibrations
        .and_then(|c| c.get("Dimension"))
        .and_then(TagNode::as_sequence)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| calibration_from_node(Some(entry)))
                .collect()
        })
        .unwrap_or_default();
    dimensional.reverse();

    let intensity = calibration_from_node(calibrations.and_then(|c| c.get("Brightness")));
    (dimensional, intensity)
}

/// Write calibrations into an `ImageData` mapping, reversing the axis order
/// to mirror the stored extent list.
///
/// Axis calibrations whose count does not equal the array rank are dropped
/// wholesale rather than written partially; the read path then falls back to
/// identity calibrations. `Brightness` is written unconditionally.
pub fn inject_calibrations(
    image_data: &mut TagMap,
    dimensional: &[Calibration],
    intensity: &Calibration,
    rank: usize,
) {
    let mut calibrations = TagMap::new();
    if !dimensional.is_empty() && dimensional.len() == rank {
        let entries: Vec<TagNode> = dimensional.iter().rev().map(calibration_to_node).collect();
        calibrations.insert("Dimension".into(), TagNode::Sequence(entries));
    } else if !dimensional.is_empty() {
        log::debug!(
            "Dropping {} axis calibrations attached to a rank {} image",
            dimensional.len(),
            rank
        );
    }
    calibrations.insert("Brightness".into(), calibration_to_node(intensity));
    image_data.insert("Calibrations".into(), TagNode::Mapping(calibrations));
}
