//! The marshaling layer between tag subtrees and typed pixel arrays.

pub mod array;
pub mod encodings;
pub mod marshal;
pub mod structured;

pub use array::ImageArray;
pub use encodings::{
    as_bytes, lookup, reverse_lookup, to_bytes, Bytes, ElementType, MarshalError,
    COMPLEX128_CODE, COMPLEX64_CODE, DATA_TYPE_CODES,
};
pub use marshal::{array_to_image_data, image_data_to_array};
