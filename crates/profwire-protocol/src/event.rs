//! Event messages streamed from the agent to the client.
//!
//! Every event starts with a one-byte [`EventTag`] followed by the
//! variant's fields in a fixed order. Integer fields are varint-encoded,
//! names are length-prefixed text, and the two floating-point fields
//! (sample time, counter value) are raw little-endian IEEE values.
//!
//! Decoding consumes exactly the bytes belonging to one message and leaves
//! the stream positioned at the next tag byte. A partial message is never
//! returned: any field-level failure propagates and invalidates the stream
//! for this layer.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::text;
use crate::varint;

/// Tag byte identifying an event message variant.
///
/// Values are sparse, grouped by feature area (mappings, call events,
/// allocations, threads, sampling, counters). The set is closed: a tag
/// byte outside it is a decode error, never silently skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventTag {
    FunctionMapping = 0x01,
    ClassMapping = 0x02,
    ModuleMapping = 0x03,
    AssemblyMapping = 0x04,
    ThreadMapping = 0x05,

    FunctionEntered = 0x10,
    FunctionLeft = 0x11,
    TailCall = 0x12,
    /// Control left the instrumented runtime (managed to native).
    TransitionOut = 0x13,
    /// Control returned to the instrumented runtime (native to managed).
    TransitionIn = 0x14,

    ObjectAllocated = 0x20,
    GarbageCollected = 0x21,
    GenerationSizes = 0x22,

    ThreadCreated = 0x40,
    ThreadDestroyed = 0x41,
    ThreadNamed = 0x42,

    StackSample = 0x50,

    CounterValue = 0xE0,
    CounterName = 0xE1,

    RegionBegin = 0xF0,
    RegionEnd = 0xF1,

    KeepAlive = 0xFF,
}

impl EventTag {
    /// Matches a raw tag byte against the closed event set.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::FunctionMapping),
            0x02 => Some(Self::ClassMapping),
            0x03 => Some(Self::ModuleMapping),
            0x04 => Some(Self::AssemblyMapping),
            0x05 => Some(Self::ThreadMapping),
            0x10 => Some(Self::FunctionEntered),
            0x11 => Some(Self::FunctionLeft),
            0x12 => Some(Self::TailCall),
            0x13 => Some(Self::TransitionOut),
            0x14 => Some(Self::TransitionIn),
            0x20 => Some(Self::ObjectAllocated),
            0x21 => Some(Self::GarbageCollected),
            0x22 => Some(Self::GenerationSizes),
            0x40 => Some(Self::ThreadCreated),
            0x41 => Some(Self::ThreadDestroyed),
            0x42 => Some(Self::ThreadNamed),
            0x50 => Some(Self::StackSample),
            0xE0 => Some(Self::CounterValue),
            0xE1 => Some(Self::CounterName),
            0xF0 => Some(Self::RegionBegin),
            0xF1 => Some(Self::RegionEnd),
            0xFF => Some(Self::KeepAlive),
            _ => None,
        }
    }
}

/// Maps a function id to its symbolic name and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMapping {
    pub function_id: u32,
    pub class_id: u32,
    /// True for functions outside the instrumented runtime (no IL body).
    pub is_native: bool,
    pub name: String,
    pub signature: String,
}

impl FunctionMapping {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            function_id: varint::read_u32(reader)?,
            class_id: varint::read_u32(reader)?,
            is_native: varint::read_bool(reader)?,
            name: text::read_string(reader)?,
            signature: text::read_string(reader)?,
        })
    }
}

/// Maps a class id to its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMapping {
    pub class_id: u32,
    pub is_value_type: bool,
    pub name: String,
}

impl ClassMapping {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            class_id: varint::read_u32(reader)?,
            is_value_type: varint::read_bool(reader)?,
            name: text::read_string(reader)?,
        })
    }
}

/// Maps a module id to its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMapping {
    pub module_id: u32,
    pub name: String,
}

impl ModuleMapping {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            module_id: varint::read_u32(reader)?,
            name: text::read_string(reader)?,
        })
    }
}

/// Maps an assembly id to its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyMapping {
    pub assembly_id: u32,
    pub name: String,
}

impl AssemblyMapping {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            assembly_id: varint::read_u32(reader)?,
            name: text::read_string(reader)?,
        })
    }
}

/// Maps a thread id to its name and liveness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMapping {
    pub thread_id: u32,
    pub is_alive: bool,
    pub name: String,
}

impl ThreadMapping {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            thread_id: varint::read_u32(reader)?,
            is_alive: varint::read_bool(reader)?,
            name: text::read_string(reader)?,
        })
    }
}

/// A function call boundary crossing: enter, leave, tail call, or a
/// transition in or out of the instrumented runtime. The surrounding
/// [`Event`] variant says which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEvent {
    pub thread_id: u32,
    pub function_id: u32,
    /// Agent clock, in the agent's own units.
    pub timestamp: u64,
}

impl FunctionEvent {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            thread_id: varint::read_u32(reader)?,
            function_id: varint::read_u32(reader)?,
            timestamp: varint::read_u64(reader)?,
        })
    }
}

/// An object allocation attributed to a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAllocated {
    pub class_id: u32,
    pub size: u64,
    pub function_id: u32,
    pub timestamp: u64,
}

impl ObjectAllocated {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            class_id: varint::read_u32(reader)?,
            size: varint::read_u64(reader)?,
            function_id: varint::read_u32(reader)?,
            timestamp: varint::read_u64(reader)?,
        })
    }
}

/// A garbage collection of one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarbageCollected {
    pub generation: u32,
    pub function_id: u32,
    pub timestamp: u64,
}

impl GarbageCollected {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            generation: varint::read_u32(reader)?,
            function_id: varint::read_u32(reader)?,
            timestamp: varint::read_u64(reader)?,
        })
    }
}

/// A snapshot of per-generation heap sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSizes {
    pub sizes: Vec<u64>,
    pub timestamp: u64,
}

impl GenerationSizes {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        let count = varint::read_u32(reader)? as usize;
        let mut sizes = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            sizes.push(varint::read_u64(reader)?);
        }
        Ok(Self {
            sizes,
            timestamp: varint::read_u64(reader)?,
        })
    }
}

/// A thread rename event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadNamed {
    pub thread_id: u32,
    pub name: String,
}

impl ThreadNamed {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            thread_id: varint::read_u32(reader)?,
            name: text::read_string(reader)?,
        })
    }
}

/// A sampled call stack for one thread.
///
/// The wire carries a count followed by exactly that many function ids.
/// Ids whose two's-complement interpretation is non-positive are sentinels
/// from the agent's stack walker (frames it could not resolve); they are
/// consumed but dropped, so `function_ids` holds only the resolved frames
/// in their original relative order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSample {
    pub thread_id: u32,
    /// Sample time as reported by the agent, in milliseconds.
    pub time: f32,
    pub function_ids: Vec<u32>,
}

impl StackSample {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        let thread_id = varint::read_u32(reader)?;
        let time = read_f32(reader)?;
        let count = varint::read_u32(reader)? as usize;
        let mut function_ids = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            let id = varint::read_u32(reader)?;
            if id as i32 > 0 {
                function_ids.push(id);
            }
        }
        Ok(Self {
            thread_id,
            time,
            function_ids,
        })
    }
}

/// A sampled performance counter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterValue {
    pub counter_id: u32,
    pub timestamp: u64,
    pub value: f64,
}

impl CounterValue {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            counter_id: varint::read_u32(reader)?,
            timestamp: varint::read_u64(reader)?,
            value: read_f64(reader)?,
        })
    }
}

/// Maps a counter id to its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterName {
    pub counter_id: u32,
    pub name: String,
}

impl CounterName {
    fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        Ok(Self {
            counter_id: varint::read_u32(reader)?,
            name: text::read_string(reader)?,
        })
    }
}

/// One decoded agent-to-client message.
///
/// Values are transient: constructed by a decode call and handed to the
/// caller (symbol table, event store, UI queue) with no identity beyond
/// that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    FunctionMapping(FunctionMapping),
    ClassMapping(ClassMapping),
    ModuleMapping(ModuleMapping),
    AssemblyMapping(AssemblyMapping),
    ThreadMapping(ThreadMapping),
    FunctionEntered(FunctionEvent),
    FunctionLeft(FunctionEvent),
    TailCall(FunctionEvent),
    TransitionOut(FunctionEvent),
    TransitionIn(FunctionEvent),
    ObjectAllocated(ObjectAllocated),
    GarbageCollected(GarbageCollected),
    GenerationSizes(GenerationSizes),
    ThreadCreated { thread_id: u32 },
    ThreadDestroyed { thread_id: u32 },
    ThreadNamed(ThreadNamed),
    StackSample(StackSample),
    CounterValue(CounterValue),
    CounterName(CounterName),
    /// Reserved region marker; carries no payload.
    RegionBegin,
    /// Reserved region marker; carries no payload.
    RegionEnd,
    KeepAlive,
}

/// Cap on speculative Vec preallocation for producer-controlled counts.
/// The decode itself stays permissive; this only bounds the allocation
/// made before any element bytes have been seen.
const MAX_PREALLOC: usize = 4096;

impl Event {
    /// Decodes one event from a stream positioned at a tag byte.
    ///
    /// Consumes the tag byte and exactly the fields belonging to that
    /// variant, leaving the stream at the next tag byte. An unrecognized
    /// tag fails with [`ProtocolError::UnknownEventTag`] having consumed
    /// only the tag byte itself.
    pub fn read_from<R: Read>(reader: &mut R) -> ProtocolResult<Self> {
        let mut tag = [0u8; 1];
        reader
            .read_exact(&mut tag)
            .map_err(ProtocolError::from_read_error)?;
        Self::read_body(tag[0], reader)
    }

    /// Decodes the fields of the event identified by an already-read tag
    /// byte.
    pub fn read_body<R: Read>(tag: u8, reader: &mut R) -> ProtocolResult<Self> {
        let Some(tag) = EventTag::from_u8(tag) else {
            return Err(ProtocolError::UnknownEventTag(tag));
        };

        let event = match tag {
            EventTag::FunctionMapping => Self::FunctionMapping(FunctionMapping::read_from(reader)?),
            EventTag::ClassMapping => Self::ClassMapping(ClassMapping::read_from(reader)?),
            EventTag::ModuleMapping => Self::ModuleMapping(ModuleMapping::read_from(reader)?),
            EventTag::AssemblyMapping => Self::AssemblyMapping(AssemblyMapping::read_from(reader)?),
            EventTag::ThreadMapping => Self::ThreadMapping(ThreadMapping::read_from(reader)?),
            EventTag::FunctionEntered => Self::FunctionEntered(FunctionEvent::read_from(reader)?),
            EventTag::FunctionLeft => Self::FunctionLeft(FunctionEvent::read_from(reader)?),
            EventTag::TailCall => Self::TailCall(FunctionEvent::read_from(reader)?),
            EventTag::TransitionOut => Self::TransitionOut(FunctionEvent::read_from(reader)?),
            EventTag::TransitionIn => Self::TransitionIn(FunctionEvent::read_from(reader)?),
            EventTag::ObjectAllocated => Self::ObjectAllocated(ObjectAllocated::read_from(reader)?),
            EventTag::GarbageCollected => {
                Self::GarbageCollected(GarbageCollected::read_from(reader)?)
            }
            EventTag::GenerationSizes => Self::GenerationSizes(GenerationSizes::read_from(reader)?),
            EventTag::ThreadCreated => Self::ThreadCreated {
                thread_id: varint::read_u32(reader)?,
            },
            EventTag::ThreadDestroyed => Self::ThreadDestroyed {
                thread_id: varint::read_u32(reader)?,
            },
            EventTag::ThreadNamed => Self::ThreadNamed(ThreadNamed::read_from(reader)?),
            EventTag::StackSample => Self::StackSample(StackSample::read_from(reader)?),
            EventTag::CounterValue => Self::CounterValue(CounterValue::read_from(reader)?),
            EventTag::CounterName => Self::CounterName(CounterName::read_from(reader)?),
            EventTag::RegionBegin => Self::RegionBegin,
            EventTag::RegionEnd => Self::RegionEnd,
            EventTag::KeepAlive => Self::KeepAlive,
        };
        Ok(event)
    }

    /// Returns the tag identifying this event's variant.
    pub fn tag(&self) -> EventTag {
        match self {
            Self::FunctionMapping(_) => EventTag::FunctionMapping,
            Self::ClassMapping(_) => EventTag::ClassMapping,
            Self::ModuleMapping(_) => EventTag::ModuleMapping,
            Self::AssemblyMapping(_) => EventTag::AssemblyMapping,
            Self::ThreadMapping(_) => EventTag::ThreadMapping,
            Self::FunctionEntered(_) => EventTag::FunctionEntered,
            Self::FunctionLeft(_) => EventTag::FunctionLeft,
            Self::TailCall(_) => EventTag::TailCall,
            Self::TransitionOut(_) => EventTag::TransitionOut,
            Self::TransitionIn(_) => EventTag::TransitionIn,
            Self::ObjectAllocated(_) => EventTag::ObjectAllocated,
            Self::GarbageCollected(_) => EventTag::GarbageCollected,
            Self::GenerationSizes(_) => EventTag::GenerationSizes,
            Self::ThreadCreated { .. } => EventTag::ThreadCreated,
            Self::ThreadDestroyed { .. } => EventTag::ThreadDestroyed,
            Self::ThreadNamed(_) => EventTag::ThreadNamed,
            Self::StackSample(_) => EventTag::StackSample,
            Self::CounterValue(_) => EventTag::CounterValue,
            Self::CounterName(_) => EventTag::CounterName,
            Self::RegionBegin => EventTag::RegionBegin,
            Self::RegionEnd => EventTag::RegionEnd,
            Self::KeepAlive => EventTag::KeepAlive,
        }
    }
}

fn read_f32<R: Read>(reader: &mut R) -> ProtocolResult<f32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(ProtocolError::from_read_error)?;
    Ok(f32::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R) -> ProtocolResult<f64> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(ProtocolError::from_read_error)?;
    Ok(f64::from_le_bytes(buf))
}
