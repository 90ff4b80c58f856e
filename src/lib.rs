//! `dmdata` marshals DigitalMicrograph image containers to and from typed,
//! calibrated multidimensional arrays.
//!
//! The byte-level container layout is owned by a separate codec behind the
//! [`TagTreeCodec`] trait; this crate maps the generic tag tree such a codec
//! produces onto one [`Image`]: a shaped [`ImageArray`] plus per-axis and
//! intensity [`Calibration`]s, an optional title and free-form properties.

pub mod image;
pub mod io;
pub mod tags;

pub use crate::image::{Calibration, ElementType, Image, ImageArray, MarshalError};

pub use crate::io::{
    assemble, disassemble, load_image, load_image_path, save_image, save_image_path, CodecError,
    ImageDocumentError, TagTreeCodec,
};
pub use crate::tags::{log_keys, normalize_strings, TagMap, TagNode, TagValue};
