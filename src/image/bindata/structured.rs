//! Codec between structured record tags and complex-valued arrays.
//!
//! Complex image data is the only payload the container stores as records
//! instead of a plain homogeneous array. Field order is fixed: real
//! component first, imaginary second, which is the same layout
//! [`num_complex::Complex`] guarantees, so both directions are byte casts
//! with no value transformation.

use crate::tags::StructuredArrayTag;

use super::array::ImageArray;
use super::encodings::{ElementType, MarshalError};

/// Resolve a record field layout to the complex element kind it encodes.
pub fn element_type_of_fields(fields: &[ElementType]) -> Result<ElementType, MarshalError> {
    match fields {
        [ElementType::Float32, ElementType::Float32] => Ok(ElementType::Complex64),
        [ElementType::Float64, ElementType::Float64] => Ok(ElementType::Complex128),
        _ => Err(MarshalError::UnsupportedFieldLayout(fields.to_vec())),
    }
}

/// Resolve a complex element kind to the record field layout encoding it.
pub fn fields_of_element_type(dtype: ElementType) -> Result<[ElementType; 2], MarshalError> {
    match dtype {
        ElementType::Complex64 => Ok([ElementType::Float32, ElementType::Float32]),
        ElementType::Complex128 => Ok([ElementType::Float64, ElementType::Float64]),
        _ => Err(MarshalError::UnsupportedComplexType(dtype)),
    }
}

/// Reinterpret a structured record tag as a flat complex array.
pub fn decode(tag: &StructuredArrayTag) -> Result<ImageArray, MarshalError> {
    let dtype = element_type_of_fields(&tag.field_types)?;
    ImageArray::from_flat_bytes(dtype, &tag.data)
}

/// Serialize a complex array into the interleaved record layout [`decode`]
/// expects. Exact inverse, bit for bit.
pub fn encode(array: &ImageArray) -> Result<StructuredArrayTag, MarshalError> {
    let fields = fields_of_element_type(array.element_type())?;
    Ok(StructuredArrayTag {
        field_types: fields.to_vec(),
        data: array.flat_bytes(),
    })
}
