//! Conversion between an `ImageData` tag mapping and a typed, shaped
//! [`ImageArray`].
//!
//! The container declares three loosely redundant descriptions of one pixel
//! buffer: a data type code, a per-element byte depth, and the physically
//! decoded bytes of the `Data` child. They evolved independently, so this
//! module cross-checks all three and refuses the image when they disagree.
//!
//! Extents are declared fastest-varying axis first while the in-memory array
//! is slowest-first, so the `Dimensions` list is reversed on both paths.
//! Flattening order is never reversed; once the extents are read back
//! correctly, storage order is already shared between the two conventions.

use crate::tags::{RawArrayTag, TagMap, TagNode, TagValue};

use super::array::ImageArray;
use super::encodings::{
    lookup, reverse_lookup, ElementType, MarshalError, COMPLEX128_CODE, COMPLEX64_CODE,
};
use super::structured;

fn require_integer(image_data: &TagMap, key: &'static str) -> Result<i64, MarshalError> {
    let node = image_data.get(key).ok_or(MarshalError::MissingTag(key))?;
    node.as_scalar()
        .and_then(TagValue::as_i64)
        .ok_or(MarshalError::UnexpectedTag(key, "an integer"))
}

fn require_extents(image_data: &TagMap) -> Result<Vec<usize>, MarshalError> {
    let node = image_data
        .get("Dimensions")
        .ok_or(MarshalError::MissingTag("Dimensions"))?;
    let items = node
        .as_sequence()
        .ok_or(MarshalError::UnexpectedTag("Dimensions", "a sequence"))?;
    items
        .iter()
        .map(|item| {
            item.as_scalar()
                .and_then(TagValue::as_i64)
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0)
                .ok_or(MarshalError::UnexpectedTag(
                    "Dimensions",
                    "positive integer extents",
                ))
        })
        .collect()
}

/// Extract the pixel payload of an `ImageData` mapping as a typed, shaped
/// array, enforcing agreement between `DataType`, `PixelDepth` and the
/// decoded `Data` buffer.
pub fn image_data_to_array(image_data: &TagMap) -> Result<ImageArray, MarshalError> {
    let data = image_data
        .get("Data")
        .ok_or(MarshalError::MissingTag("Data"))?;
    let flat = match data {
        TagNode::RawArray(tag) => ImageArray::from_flat_bytes(tag.dtype, &tag.data)?,
        TagNode::StructuredArray(tag) => structured::decode(tag)?,
        _ => return Err(MarshalError::UnexpectedTag("Data", "an array")),
    };
    let decoded = flat.element_type();

    let (_, declared) = lookup(require_integer(image_data, "DataType")?)?;
    if declared != decoded {
        return Err(MarshalError::TypeMismatch { declared, decoded });
    }

    let pixel_depth = require_integer(image_data, "PixelDepth")?;
    if pixel_depth != decoded.size_of() as i64 {
        return Err(MarshalError::PixelDepthMismatch {
            declared: pixel_depth,
            width: decoded.size_of(),
            dtype: decoded,
        });
    }

    let extents = require_extents(image_data)?;
    let shape: Vec<usize> = extents.iter().rev().copied().collect();
    flat.reshape(&shape)
}

/// Build the `ImageData` mapping describing an array: `Data`, `DataType`,
/// `PixelDepth` and the reversed `Dimensions` list.
pub fn array_to_image_data(array: &ImageArray) -> Result<TagMap, MarshalError> {
    let dtype = array.element_type();
    let (code, data) = if dtype.is_complex() {
        // The one place complex codes are assigned; reverse_lookup serves
        // only the plain homogeneous path.
        let code = if dtype == ElementType::Complex64 {
            COMPLEX64_CODE
        } else {
            COMPLEX128_CODE
        };
        (code, TagNode::StructuredArray(structured::encode(array)?))
    } else {
        let tag = RawArrayTag {
            dtype,
            data: array.flat_bytes(),
        };
        (reverse_lookup(dtype)?, TagNode::RawArray(tag))
    };

    let mut out = TagMap::new();
    out.insert("DataType".into(), TagNode::from(code));
    out.insert(
        "PixelDepth".into(),
        TagNode::from(dtype.size_of() as i64),
    );
    out.insert(
        "Dimensions".into(),
        TagNode::Sequence(
            array
                .shape()
                .iter()
                .rev()
                .map(|d| TagNode::from(*d as i64))
                .collect(),
        ),
    );
    out.insert("Data".into(), data);
    Ok(out)
}
