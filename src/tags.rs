//! The generic tag tree decoded from a DigitalMicrograph container, and the
//! read-path normalization applied to it before any image is extracted.

use std::fmt::{self, Display};

use encoding_rs::UTF_16LE;
use indexmap::IndexMap;
use num_traits::ToPrimitive;

use crate::image::bindata::{Bytes, ElementType};

/// An insertion-ordered tag mapping. Key order is preserved so a re-encoded
/// container lists its tags the way they were built.
pub type TagMap = IndexMap<String, TagNode>;

/// A scalar tag payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl TagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            Self::Integer(value) => Some(*value != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Boolean(value) => Some(*value as i64),
            Self::Integer(value) => Some(*value),
            Self::Float(value) => value.to_i64(),
            Self::String(value) => value.parse().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Boolean(value) => Some(*value as i64 as f64),
            Self::Integer(value) => value.to_f64(),
            Self::Float(value) => Some(*value),
            Self::String(value) => value.parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{}", value),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::String(value) => write!(f, "{}", value),
        }
    }
}

/// A flat, homogeneous array tag: one element type code and the raw little
/// endian byte buffer behind it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawArrayTag {
    pub dtype: ElementType,
    pub data: Bytes,
}

/// An array of fixed-layout records: the ordered per-field element types and
/// the interleaved record byte buffer. The container uses these exclusively
/// for complex-valued image data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuredArrayTag {
    pub field_types: Vec<ElementType>,
    pub data: Bytes,
}

/// One node of the tag tree handed over by the container codec.
///
/// The variant set is closed: every traversal in this crate matches on it
/// exhaustively instead of probing shapes at runtime.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagNode {
    Mapping(TagMap),
    Sequence(Vec<TagNode>),
    Scalar(TagValue),
    RawArray(RawArrayTag),
    StructuredArray(StructuredArrayTag),
}

impl TagNode {
    pub fn as_mapping(&self) -> Option<&TagMap> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[TagNode]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&TagValue> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a child of a Mapping node. Any other variant yields `None`.
    pub fn get(&self, key: &str) -> Option<&TagNode> {
        match self {
            Self::Mapping(map) => map.get(key),
            _ => None,
        }
    }
}

impl From<bool> for TagNode {
    fn from(value: bool) -> Self {
        Self::Scalar(TagValue::Boolean(value))
    }
}

impl From<i64> for TagNode {
    fn from(value: i64) -> Self {
        Self::Scalar(TagValue::Integer(value))
    }
}

impl From<f64> for TagNode {
    fn from(value: f64) -> Self {
        Self::Scalar(TagValue::Float(value))
    }
}

impl From<&str> for TagNode {
    fn from(value: &str) -> Self {
        Self::Scalar(TagValue::String(value.to_string()))
    }
}

impl From<String> for TagNode {
    fn from(value: String) -> Self {
        Self::Scalar(TagValue::String(value))
    }
}

impl From<TagMap> for TagNode {
    fn from(value: TagMap) -> Self {
        Self::Mapping(value)
    }
}

impl From<Vec<TagNode>> for TagNode {
    fn from(value: Vec<TagNode>) -> Self {
        Self::Sequence(value)
    }
}

/// Decode the embedded UTF-16 text buffers of a freshly decoded tag tree.
///
/// The container stores every text field as a flat byte array, so any
/// [`RawArray`](TagNode::RawArray) reached by plain recursion is text by
/// construction. The single exception is a value stored under a key literally
/// named `"Data"`: those hold pixel payloads and are preserved verbatim,
/// along with everything below them.
///
/// Applied once, read path only, immediately after the codec hands over the
/// tree. Idempotent once no encoded-text arrays remain.
pub fn normalize_strings(node: TagNode) -> TagNode {
    match node {
        TagNode::Mapping(map) => {
            let mut out = TagMap::with_capacity(map.len());
            for (key, value) in map {
                let value = if key == "Data" {
                    value
                } else {
                    normalize_strings(value)
                };
                out.insert(key, value);
            }
            TagNode::Mapping(out)
        }
        TagNode::Sequence(items) => {
            TagNode::Sequence(items.into_iter().map(normalize_strings).collect())
        }
        TagNode::RawArray(array) => {
            let (text, _, _) = UTF_16LE.decode(&array.data);
            TagNode::Scalar(TagValue::String(text.into_owned()))
        }
        other => other,
    }
}

/// Write an outline of a tag tree to the log at debug level. Handy when
/// poking at a container whose layout is unfamiliar.
pub fn log_keys(node: &TagNode) {
    fn walk(node: &TagNode, indent: &str) {
        let deeper = format!("{}..", indent);
        match node {
            TagNode::Mapping(map) => {
                for (key, value) in map {
                    log::debug!("{} key: {}", indent, key);
                    walk(value, &deeper);
                }
            }
            TagNode::Sequence(items) => {
                for (i, value) in items.iter().enumerate() {
                    log::debug!("{} {}:", indent, i);
                    walk(value, &deeper);
                }
            }
            TagNode::Scalar(value) => log::debug!("{} {}", indent, value),
            TagNode::RawArray(array) => log::debug!(
                "{} array of {} ({} bytes)",
                indent,
                array.dtype,
                array.data.len()
            ),
            TagNode::StructuredArray(array) => log::debug!(
                "{} structured array {:?} ({} bytes)",
                indent,
                array.field_types,
                array.data.len()
            ),
        }
    }
    walk(node, "")
}
