//! Length-prefixed text codec.
//!
//! Text fields travel as a varint32 byte-length prefix followed by that
//! many bytes of UTF-8. The prefix counts bytes, not characters.
//!
//! The decoder does not cap the declared length against the documented
//! maxima (see the `MAX_*` constants in the crate root); consumers that
//! want to reject oversized names must check after decoding. Malformed
//! UTF-8 sequences decode lossily to U+FFFD rather than failing, matching
//! the behavior of the original client.

use std::io::{Read, Write};

use crate::error::{ProtocolError, ProtocolResult};
use crate::varint;

/// Decodes one length-prefixed text field.
///
/// Fails with [`ProtocolError::TruncatedStream`] if fewer bytes remain
/// than the prefix declares.
pub fn read_string<R: Read>(reader: &mut R) -> ProtocolResult<String> {
    let len = varint::read_u32(reader)? as usize;
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .map_err(ProtocolError::from_read_error)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Encodes one length-prefixed text field.
pub fn write_string<W: Write>(writer: &mut W, text: &str) -> ProtocolResult<()> {
    varint::write_u32(writer, text.len() as u32)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}
