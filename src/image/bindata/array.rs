use std::mem;

use bytemuck::Pod;
use ndarray::{Array1, ArrayD, IxDyn};
use num_complex::Complex;

use super::encodings::{to_bytes, Bytes, ElementType, MarshalError};

/// A typed, shaped image payload.
///
/// One variant per supported [`ElementType`], each wrapping a dynamically
/// ranked [`ArrayD`]. The variant set is closed so the marshaler can match
/// exhaustively instead of downcasting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageArray {
    Int8(ArrayD<i8>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    UInt16(ArrayD<u16>),
    UInt32(ArrayD<u32>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Complex64(ArrayD<Complex<f32>>),
    Complex128(ArrayD<Complex<f64>>),
}

/// Apply an expression to the wrapped array of any variant, where every arm
/// produces the same result type.
macro_rules! on_variants {
    ($self:expr, $arr:ident => $body:expr) => {
        match $self {
            ImageArray::Int8($arr) => $body,
            ImageArray::Int16($arr) => $body,
            ImageArray::Int32($arr) => $body,
            ImageArray::UInt16($arr) => $body,
            ImageArray::UInt32($arr) => $body,
            ImageArray::Float32($arr) => $body,
            ImageArray::Float64($arr) => $body,
            ImageArray::Complex64($arr) => $body,
            ImageArray::Complex128($arr) => $body,
        }
    };
}

/// Apply an array-to-array expression to any variant, rewrapping the result
/// in the same variant.
macro_rules! map_variants {
    ($self:expr, $arr:ident => $body:expr) => {
        match $self {
            ImageArray::Int8($arr) => ImageArray::Int8($body),
            ImageArray::Int16($arr) => ImageArray::Int16($body),
            ImageArray::Int32($arr) => ImageArray::Int32($body),
            ImageArray::UInt16($arr) => ImageArray::UInt16($body),
            ImageArray::UInt32($arr) => ImageArray::UInt32($body),
            ImageArray::Float32($arr) => ImageArray::Float32($body),
            ImageArray::Float64($arr) => ImageArray::Float64($body),
            ImageArray::Complex64($arr) => ImageArray::Complex64($body),
            ImageArray::Complex128($arr) => ImageArray::Complex128($body),
        }
    };
}

macro_rules! impl_from_array {
    ($t:ty, $variant:ident) => {
        impl From<ArrayD<$t>> for ImageArray {
            fn from(value: ArrayD<$t>) -> Self {
                Self::$variant(value)
            }
        }
    };
}

impl_from_array!(i8, Int8);
impl_from_array!(i16, Int16);
impl_from_array!(i32, Int32);
impl_from_array!(u16, UInt16);
impl_from_array!(u32, UInt32);
impl_from_array!(f32, Float32);
impl_from_array!(f64, Float64);
impl_from_array!(Complex<f32>, Complex64);
impl_from_array!(Complex<f64>, Complex128);

fn cast_flat<T: Pod>(data: &[u8], dtype: ElementType) -> Result<ArrayD<T>, MarshalError> {
    if data.len() % mem::size_of::<T>() != 0 {
        return Err(MarshalError::BufferSizeMismatch {
            len: data.len(),
            dtype,
        });
    }
    let values: Vec<T> = bytemuck::pod_collect_to_vec(data);
    Ok(Array1::from_vec(values).into_dyn())
}

fn reshape_array<T>(array: ArrayD<T>, shape: &[usize]) -> Result<ArrayD<T>, MarshalError> {
    let len = array.len();
    array
        .into_shape(IxDyn(shape))
        .map_err(|_| MarshalError::ShapeMismatch {
            len,
            shape: shape.to_vec(),
        })
}

impl ImageArray {
    /// Reinterpret a raw byte buffer as a flat (rank 1) array of `dtype`
    /// elements. No value transformation is performed.
    pub fn from_flat_bytes(dtype: ElementType, data: &[u8]) -> Result<Self, MarshalError> {
        Ok(match dtype {
            ElementType::Int8 => cast_flat::<i8>(data, dtype)?.into(),
            ElementType::Int16 => cast_flat::<i16>(data, dtype)?.into(),
            ElementType::Int32 => cast_flat::<i32>(data, dtype)?.into(),
            ElementType::UInt16 => cast_flat::<u16>(data, dtype)?.into(),
            ElementType::UInt32 => cast_flat::<u32>(data, dtype)?.into(),
            ElementType::Float32 => cast_flat::<f32>(data, dtype)?.into(),
            ElementType::Float64 => cast_flat::<f64>(data, dtype)?.into(),
            ElementType::Complex64 => cast_flat::<Complex<f32>>(data, dtype)?.into(),
            ElementType::Complex128 => cast_flat::<Complex<f64>>(data, dtype)?.into(),
        })
    }

    /// Give the array a new shape holding the same elements in the same
    /// logical order.
    pub fn reshape(self, shape: &[usize]) -> Result<Self, MarshalError> {
        Ok(map_variants!(self, arr => reshape_array(arr, shape)?))
    }

    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Int8(_) => ElementType::Int8,
            Self::Int16(_) => ElementType::Int16,
            Self::Int32(_) => ElementType::Int32,
            Self::UInt16(_) => ElementType::UInt16,
            Self::UInt32(_) => ElementType::UInt32,
            Self::Float32(_) => ElementType::Float32,
            Self::Float64(_) => ElementType::Float64,
            Self::Complex64(_) => ElementType::Complex64,
            Self::Complex128(_) => ElementType::Complex128,
        }
    }

    pub fn shape(&self) -> &[usize] {
        on_variants!(self, arr => arr.shape())
    }

    pub fn ndim(&self) -> usize {
        on_variants!(self, arr => arr.ndim())
    }

    pub fn len(&self) -> usize {
        on_variants!(self, arr => arr.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complex(&self) -> bool {
        self.element_type().is_complex()
    }

    /// Flatten the elements in logical (row major) order and return their
    /// little endian bytes. The element iteration order is independent of the
    /// in-memory layout, so views and transposed arrays serialize the way
    /// they read.
    pub fn flat_bytes(&self) -> Bytes {
        on_variants!(self, arr => {
            let flat: Vec<_> = arr.iter().copied().collect();
            to_bytes(&flat)
        })
    }
}
