use std::io;
use std::io::prelude::*;

use thiserror::Error;

use crate::tags::TagNode;

/// The failure modes of the binary container codec. These are propagated
/// through this crate unchanged, with no retry or partial recovery.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed container header: {0}")]
    MalformedHeader(String),
    #[error("Stream ended before the tag tree was complete")]
    TruncatedStream,
    #[error("Unsupported tag primitive type {0}")]
    UnsupportedTagPrimitive(i64),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The contract with the binary container codec collaborator.
///
/// Implementations own the byte-level layout of the container; this crate
/// only ever sees the decoded tag tree. A decoded root is always a
/// [`TagNode::Mapping`]. On the write path the codec receives a freshly
/// built tree and may consume it however it likes.
pub trait TagTreeCodec {
    /// Decode one container from `reader` into a tag tree.
    fn decode<R: Read>(&mut self, reader: &mut R) -> Result<TagNode, CodecError>;

    /// Encode `root` as one container into `writer`.
    fn encode<W: Write>(&mut self, writer: &mut W, root: &TagNode) -> Result<(), CodecError>;
}
