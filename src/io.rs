//! Reading and writing whole image documents through a container codec.

pub mod document;
pub mod traits;

pub use document::{assemble, disassemble, ImageDocumentError};
pub use traits::{CodecError, TagTreeCodec};

use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::image::Image;
use crate::tags::{normalize_strings, TagMap};

/// Load the primary image from an already opened container stream:
/// decode, normalize the embedded text buffers, then disassemble.
pub fn load_image<C: TagTreeCodec, R: Read>(
    codec: &mut C,
    reader: &mut R,
) -> Result<Image, ImageDocumentError> {
    let root = codec.decode(reader)?;
    let root = normalize_strings(root);
    disassemble(&root)
}

/// Open `path` and load the primary image from it. The file handle lives
/// for the duration of the call only.
pub fn load_image_path<C: TagTreeCodec, P: AsRef<Path>>(
    codec: &mut C,
    path: P,
) -> Result<Image, ImageDocumentError> {
    let mut reader = BufReader::new(File::open(path)?);
    load_image(codec, &mut reader)
}

/// Assemble a single-image document around `image` and encode it into an
/// already opened stream. `metadata` becomes the entry's `ImageTags`.
pub fn save_image<C: TagTreeCodec, W: Write>(
    codec: &mut C,
    writer: &mut W,
    image: &Image,
    metadata: &TagMap,
) -> Result<(), ImageDocumentError> {
    let root = assemble(image, metadata)?;
    codec.encode(writer, &root)?;
    Ok(())
}

/// Create `path` and save `image` into it. The file handle lives for the
/// duration of the call only and is flushed before it closes.
pub fn save_image_path<C: TagTreeCodec, P: AsRef<Path>>(
    codec: &mut C,
    path: P,
    image: &Image,
    metadata: &TagMap,
) -> Result<(), ImageDocumentError> {
    let mut writer = BufWriter::new(File::create(path)?);
    save_image(codec, &mut writer, image, metadata)?;
    writer.flush()?;
    Ok(())
}
