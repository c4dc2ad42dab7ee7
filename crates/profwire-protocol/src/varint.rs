//! Variable-length integer codec.
//!
//! Integers travel as little-endian 7-bit groups: each byte carries seven
//! value bits in its low bits and a continuation flag in bit 7. The least
//! significant group comes first, and the final group has the flag clear.
//!
//! Decoding accepts non-canonical encodings (trailing zero groups), so a
//! value re-encoded by this module may be shorter than the bytes it was
//! decoded from. Encoding always emits the minimal form.

use std::io::{Read, Write};

use crate::error::{ProtocolError, ProtocolResult};

/// Maximum encoded length of a 32-bit varint.
const MAX_BYTES_U32: usize = 5;

/// Maximum encoded length of a 64-bit varint.
const MAX_BYTES_U64: usize = 10;

/// Decodes a 32-bit varint from the stream.
///
/// Fails with [`ProtocolError::TruncatedStream`] if the stream ends before
/// a terminating byte, and [`ProtocolError::VarintOverflow`] if more than
/// five bytes carry the continuation flag. Value bits shifted past bit 31
/// are discarded, matching the permissive decoding of the original wire
/// peers.
pub fn read_u32<R: Read>(reader: &mut R) -> ProtocolResult<u32> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;

    for _ in 0..MAX_BYTES_U32 {
        let byte = read_byte(reader)?;
        value |= u32::from(byte & 0x7f).wrapping_shl(shift);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }

    Err(ProtocolError::VarintOverflow {
        max_bytes: MAX_BYTES_U32,
    })
}

/// Decodes a 64-bit varint from the stream.
///
/// Same contract as [`read_u32`], with a ten byte limit.
pub fn read_u64<R: Read>(reader: &mut R) -> ProtocolResult<u64> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;

    for _ in 0..MAX_BYTES_U64 {
        let byte = read_byte(reader)?;
        value |= u64::from(byte & 0x7f).wrapping_shl(shift);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }

    Err(ProtocolError::VarintOverflow {
        max_bytes: MAX_BYTES_U64,
    })
}

/// Decodes a varint-encoded boolean: any nonzero value is `true`.
///
/// Several event fields are booleans on the producer side but travel as
/// varints; this is the single place where that reinterpretation happens.
pub fn read_bool<R: Read>(reader: &mut R) -> ProtocolResult<bool> {
    Ok(read_u32(reader)? != 0)
}

/// Encodes a 32-bit varint in minimal form.
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> ProtocolResult<()> {
    write_u64(writer, u64::from(value))
}

/// Encodes a 64-bit varint in minimal form.
pub fn write_u64<W: Write>(writer: &mut W, mut value: u64) -> ProtocolResult<()> {
    loop {
        let group = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            writer.write_all(&[group])?;
            return Ok(());
        }
        writer.write_all(&[group | 0x80])?;
    }
}

fn read_byte<R: Read>(reader: &mut R) -> ProtocolResult<u8> {
    let mut buf = [0u8; 1];
    reader
        .read_exact(&mut buf)
        .map_err(ProtocolError::from_read_error)?;
    Ok(buf[0])
}
