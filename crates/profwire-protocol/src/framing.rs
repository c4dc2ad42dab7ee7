//! Stream-level event reading and request writing.
//!
//! One [`EventReader::read_event`] call consumes exactly one tagged event
//! from the incoming stream; one [`RequestWriter::write_request`] call
//! emits exactly one request. The layer holds no state across calls beyond
//! the wrapped stream, so a caller that needs non-blocking or multiplexed
//! behavior wraps the stream itself and keeps calls on one stream
//! serialized.
//!
//! There is no resynchronization: after a decode error the stream position
//! is indeterminate and recovery (skip, reconnect) belongs to the caller.

use std::io::{Read, Write};

use tracing::{debug, trace};

use crate::error::{ProtocolError, ProtocolResult};
use crate::event::Event;
use crate::request::Request;

/// Reads tagged events from the agent's byte stream.
pub struct EventReader<R> {
    reader: R,
}

impl<R: Read> EventReader<R> {
    /// Creates a new EventReader wrapping the given stream.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next event from the stream.
    ///
    /// Returns `Ok(None)` on a clean end of stream, i.e. EOF exactly at a
    /// tag boundary. EOF anywhere inside a message is
    /// [`ProtocolError::TruncatedStream`].
    pub fn read_event(&mut self) -> ProtocolResult<Option<Event>> {
        let mut tag = [0u8; 1];
        match self.reader.read_exact(&mut tag) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                trace!("event stream ended at tag boundary");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let event = Event::read_body(tag[0], &mut self.reader)?;
        trace!(tag = ?event.tag(), "decoded event");
        Ok(Some(event))
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Returns a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwraps this EventReader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Writes requests to the agent's command stream.
pub struct RequestWriter<W> {
    writer: W,
}

impl<W: Write> RequestWriter<W> {
    /// Creates a new RequestWriter wrapping the given sink.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Encodes one request to the sink.
    ///
    /// Write errors are surfaced, not retried.
    pub fn write_request(&mut self, request: &Request) -> ProtocolResult<()> {
        request.write_to(&mut self.writer)?;
        debug!(tag = ?request.tag(), "sent request");
        Ok(())
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> ProtocolResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Returns a mutable reference to the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwraps this RequestWriter, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTag;
    use crate::{text, varint};
    use std::io::Cursor;

    fn thread_created(thread_id: u32) -> Vec<u8> {
        let mut buf = vec![EventTag::ThreadCreated as u8];
        varint::write_u32(&mut buf, thread_id).unwrap();
        buf
    }

    fn thread_named(thread_id: u32, name: &str) -> Vec<u8> {
        let mut buf = vec![EventTag::ThreadNamed as u8];
        varint::write_u32(&mut buf, thread_id).unwrap();
        text::write_string(&mut buf, name).unwrap();
        buf
    }

    #[test]
    fn empty_stream_yields_none() {
        let mut reader = EventReader::new(Cursor::new(Vec::new()));
        assert!(reader.read_event().unwrap().is_none());
    }

    #[test]
    fn reads_messages_in_order_then_none() {
        let mut stream = thread_created(3);
        stream.extend(thread_named(3, "main"));
        stream.push(EventTag::KeepAlive as u8);

        let mut reader = EventReader::new(Cursor::new(stream));

        assert_eq!(
            reader.read_event().unwrap().unwrap(),
            Event::ThreadCreated { thread_id: 3 }
        );
        match reader.read_event().unwrap().unwrap() {
            Event::ThreadNamed(n) => {
                assert_eq!(n.thread_id, 3);
                assert_eq!(n.name, "main");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(reader.read_event().unwrap().unwrap(), Event::KeepAlive);
        assert!(reader.read_event().unwrap().is_none());
    }

    #[test]
    fn eof_inside_message_is_truncation_not_none() {
        // ThreadNamed cut off inside the name payload.
        let mut stream = thread_named(3, "main");
        stream.truncate(stream.len() - 2);

        let mut reader = EventReader::new(Cursor::new(stream));
        assert!(matches!(
            reader.read_event(),
            Err(ProtocolError::TruncatedStream)
        ));
    }

    #[test]
    fn unknown_tag_leaves_rest_of_stream_untouched() {
        let mut reader = EventReader::new(Cursor::new(vec![0x6b, 0xaa, 0xbb]));
        assert!(matches!(
            reader.read_event(),
            Err(ProtocolError::UnknownEventTag(0x6b))
        ));
        assert_eq!(reader.get_ref().position(), 1);
    }

    #[test]
    fn writer_concatenates_requests() {
        let mut writer = RequestWriter::new(Vec::new());
        writer
            .write_request(&Request::GetFunctionMapping { function_id: 1 })
            .unwrap();
        writer.write_request(&Request::Suspend).unwrap();
        writer.flush().unwrap();

        let bytes = writer.into_inner();
        assert_eq!(bytes, [0x01, 1, 0, 0, 0, 0x70]);
    }

    #[test]
    fn reader_accessors() {
        let mut reader = EventReader::new(Cursor::new(thread_created(1)));
        assert_eq!(reader.get_ref().position(), 0);
        reader.read_event().unwrap();
        assert_eq!(reader.get_mut().position(), 2);
        let cursor = reader.into_inner();
        assert_eq!(cursor.position(), 2);
    }
}
