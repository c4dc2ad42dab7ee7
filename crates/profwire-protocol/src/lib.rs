//! Wire codecs for the profwire profiler.
//!
//! This crate defines the binary protocol spoken between an instrumented
//! runtime being profiled (the agent) and the monitoring front end (the
//! client). The two directions are asymmetric:
//!
//! - **Event stream** (agent → client): a sequence of tagged messages,
//!   each a one-byte tag followed by varint-encoded integers,
//!   length-prefixed text and the occasional raw little-endian float.
//!   Decoded with [`Event::read_from`] or the [`EventReader`] loop.
//! - **Command stream** (client → agent): short fixed-layout requests,
//!   a one-byte tag followed by little-endian fixed-width fields.
//!   Encoded with [`Request::write_to`] or a [`RequestWriter`].
//!
//! ```text
//! agent ──► [tag][varint fields / text / floats] ... ──► client
//! client ──► [tag][fixed-width fields]            ... ──► agent
//! ```
//!
//! The message set is closed and versionless: there is no schema
//! negotiation and no optional fields, only the leading tag byte. Unknown
//! tags are a hard decode error. This crate does no transport work; it
//! consumes whatever blocking byte stream it is handed, one message per
//! call.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use profwire_protocol::{Event, EventReader, Request};
//!
//! // A keep-alive is just its tag byte.
//! let mut reader = EventReader::new(Cursor::new(vec![0xff]));
//! assert_eq!(reader.read_event().unwrap(), Some(Event::KeepAlive));
//! assert_eq!(reader.read_event().unwrap(), None);
//!
//! // Requests encode to their documented fixed layout.
//! let bytes = Request::SetFunctionFlags { function_id: 42, enable: true }.to_bytes();
//! assert_eq!(bytes, [0x80, 42, 0, 0, 0, 1]);
//! ```

mod error;
mod event;
mod framing;
mod request;
pub mod text;
pub mod varint;

pub use error::{ProtocolError, ProtocolResult};
pub use event::{
    AssemblyMapping, ClassMapping, CounterName, CounterValue, Event, EventTag, FunctionEvent,
    FunctionMapping, GarbageCollected, GenerationSizes, ModuleMapping, ObjectAllocated,
    StackSample, ThreadMapping, ThreadNamed,
};
pub use framing::{EventReader, RequestWriter};
pub use request::{Request, RequestTag};

/// Documented maximum byte length of a function name.
///
/// The decoder does not enforce the `MAX_*` maxima; they are advisory
/// limits for consumers that want to reject pathological producers after
/// decoding.
pub const MAX_FUNCTION_NAME_LEN: usize = 1024;

/// Documented maximum byte length of a function signature.
pub const MAX_SIGNATURE_LEN: usize = 2048;

/// Documented maximum byte length of a class name.
pub const MAX_CLASS_NAME_LEN: usize = 1024;

/// Documented maximum byte length of a thread name.
pub const MAX_THREAD_NAME_LEN: usize = 256;
