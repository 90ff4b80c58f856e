use std::fmt::Display;

use bytemuck::Pod;
use thiserror::Error;

pub type Bytes = Vec<u8>;

pub fn to_bytes<T: Pod>(data: &[T]) -> Bytes {
    bytemuck::cast_slice(data).to_vec()
}

pub fn as_bytes<T: Pod>(data: &[T]) -> &[u8] {
    bytemuck::cast_slice(data)
}

/// The native element kinds an image pixel buffer can decode to.
///
/// These are the targets of the format's data type codes, not the codes
/// themselves: several codes collapse onto one element kind (see
/// [`DATA_TYPE_CODES`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    Int8,
    Int16,
    Int32,
    UInt16,
    UInt32,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ElementType {
    /// Get the size in bytes of a single value of this type
    pub const fn size_of(&self) -> usize {
        match self {
            Self::Int8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Float64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
        }
    }

    pub const fn is_complex(&self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }
}

/// The data type code written for complex64 image data. Assigned explicitly
/// by the marshaler; never produced through [`reverse_lookup`].
pub const COMPLEX64_CODE: i64 = 3;
/// The data type code written for complex128 image data.
pub const COMPLEX128_CODE: i64 = 13;

/// The format's image data type codes in declaration order, each with its
/// display name and the element kind it decodes to.
///
/// The table is sparse and quirky on purpose: code 8 does not exist, code 6
/// ("uint8") shares the int8 layout with codes 9 and 14, and code 23 ("RGB")
/// shares the int32 layout with code 7. [`reverse_lookup`] resolves such
/// aliases to the first entry here, so a code is not guaranteed to survive a
/// round trip through the element kind it names.
pub const DATA_TYPE_CODES: &[(i64, &str, ElementType)] = &[
    (1, "int16", ElementType::Int16),
    (2, "float32", ElementType::Float32),
    (3, "Complex64", ElementType::Complex64),
    (6, "uint8", ElementType::Int8),
    (7, "int32", ElementType::Int32),
    (9, "int8", ElementType::Int8),
    (10, "uint16", ElementType::UInt16),
    (11, "uint32", ElementType::UInt32),
    (12, "float64", ElementType::Float64),
    (13, "Complex128", ElementType::Complex128),
    (14, "Bool", ElementType::Int8),
    (23, "RGB", ElementType::Int32),
];

/// Resolve a declared data type code to its display name and element kind.
pub fn lookup(code: i64) -> Result<(&'static str, ElementType), MarshalError> {
    DATA_TYPE_CODES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, name, dtype)| (*name, *dtype))
        .ok_or(MarshalError::UnknownTypeCode(code))
}

/// Resolve an element kind to the first data type code declared for it.
pub fn reverse_lookup(dtype: ElementType) -> Result<i64, MarshalError> {
    DATA_TYPE_CODES
        .iter()
        .find(|(_, _, d)| *d == dtype)
        .map(|(code, _, _)| *code)
        .ok_or(MarshalError::UnsupportedElementType(dtype))
}

/// The failure modes of moving image data between a tag subtree and a typed
/// array. All of them mean the container is corrupt, unexpected, or
/// unsupported; none are retryable, and no partially marshaled image is ever
/// returned alongside one.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MarshalError {
    #[error("Unknown image data type code {0}")]
    UnknownTypeCode(i64),
    #[error("No image data type code covers element type {0}")]
    UnsupportedElementType(ElementType),
    #[error("Unsupported structured field layout {0:?}")]
    UnsupportedFieldLayout(Vec<ElementType>),
    #[error("Element type {0} cannot be written as a structured array")]
    UnsupportedComplexType(ElementType),
    #[error("Declared data type {declared} disagrees with decoded element type {decoded}")]
    TypeMismatch {
        declared: ElementType,
        decoded: ElementType,
    },
    #[error("Declared pixel depth {declared} disagrees with the {width}-byte element type {dtype}")]
    PixelDepthMismatch {
        declared: i64,
        width: usize,
        dtype: ElementType,
    },
    #[error("Cannot reshape {len} elements into dimensions {shape:?}")]
    ShapeMismatch { len: usize, shape: Vec<usize> },
    #[error("A buffer of {len} bytes does not divide into {dtype} elements")]
    BufferSizeMismatch { len: usize, dtype: ElementType },
    #[error("Image data is missing the required tag {0:?}")]
    MissingTag(&'static str),
    #[error("Image data tag {0:?} does not hold {1}")]
    UnexpectedTag(&'static str, &'static str),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(ElementType::Int8.size_of(), 1);
        assert_eq!(ElementType::UInt16.size_of(), 2);
        assert_eq!(ElementType::Float32.size_of(), 4);
        assert_eq!(ElementType::Float64.size_of(), 8);
        assert_eq!(ElementType::Complex64.size_of(), 8);
        assert_eq!(ElementType::Complex128.size_of(), 16);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(1).unwrap(), ("int16", ElementType::Int16));
        assert_eq!(lookup(12).unwrap(), ("float64", ElementType::Float64));
        assert_eq!(lookup(23).unwrap(), ("RGB", ElementType::Int32));
        assert_eq!(
            lookup(COMPLEX64_CODE).unwrap(),
            ("Complex64", ElementType::Complex64)
        );
        assert_eq!(
            lookup(COMPLEX128_CODE).unwrap(),
            ("Complex128", ElementType::Complex128)
        );
    }

    #[test]
    fn test_lookup_rejects_code_8() {
        assert_eq!(lookup(8), Err(MarshalError::UnknownTypeCode(8)));
        assert_eq!(lookup(0), Err(MarshalError::UnknownTypeCode(0)));
    }

    #[test]
    fn test_reverse_lookup_first_match() {
        // int8 is claimed by codes 6, 9 and 14; the first declared entry wins
        assert_eq!(reverse_lookup(ElementType::Int8).unwrap(), 6);
        // int32 is claimed by 7 and 23 (RGB)
        assert_eq!(reverse_lookup(ElementType::Int32).unwrap(), 7);
        assert_eq!(reverse_lookup(ElementType::UInt16).unwrap(), 10);
    }

    #[test]
    fn test_reverse_lookup_agrees_with_lookup() {
        for (_, _, dtype) in DATA_TYPE_CODES {
            let code = reverse_lookup(*dtype).unwrap();
            assert_eq!(lookup(code).unwrap().1, *dtype);
        }
    }
}
