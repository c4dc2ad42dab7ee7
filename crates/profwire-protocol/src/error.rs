//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while decoding events or encoding requests.
///
/// All variants are surfaced synchronously to the caller of the decode or
/// encode call that hit them. This layer performs no retries and no
/// resynchronization: after a decode error the stream position is
/// indeterminate and the stream must not be reused without external
/// recovery (skip, reconnect).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The stream ended before a field could be fully read.
    #[error("stream truncated mid-field")]
    TruncatedStream,

    /// A varint continuation run exceeded the maximum encoded length.
    ///
    /// Guards against a corrupt or malicious producer emitting an endless
    /// run of continuation bytes.
    #[error("varint exceeded {max_bytes} bytes without terminating")]
    VarintOverflow { max_bytes: usize },

    /// The event stream produced a tag byte outside the closed event set.
    #[error("unknown event tag {0:#04x}")]
    UnknownEventTag(u8),

    /// IO error from the underlying stream (non-EOF read failures on the
    /// decode path, all sink failures on the encode path).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Maps a read error to the protocol taxonomy: an unexpected EOF means
    /// the producer stopped mid-field, anything else is a transport fault.
    pub(crate) fn from_read_error(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::TruncatedStream
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_eof_maps_to_truncated() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(
            ProtocolError::from_read_error(eof),
            ProtocolError::TruncatedStream
        ));
    }

    #[test]
    fn other_read_errors_stay_io() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(
            ProtocolError::from_read_error(refused),
            ProtocolError::Io(_)
        ));
    }

    #[test]
    fn display_includes_tag_value() {
        let err = ProtocolError::UnknownEventTag(0x99);
        assert_eq!(err.to_string(), "unknown event tag 0x99");
    }
}
