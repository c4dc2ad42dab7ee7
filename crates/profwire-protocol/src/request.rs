//! Requests sent from the client to the agent.
//!
//! Unlike the event stream, requests are fixed-layout: a one-byte
//! [`RequestTag`] followed by little-endian fixed-width fields. No varint,
//! no length prefix, no text. This path only encodes; the agent decodes.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolResult;

/// Tag byte identifying a request variant.
///
/// Same closed-set discipline as the event tags: values are sparse and
/// matched exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RequestTag {
    GetFunctionMapping = 0x01,
    GetClassMapping = 0x02,
    GetModuleMapping = 0x03,
    GetAssemblyMapping = 0x04,
    GetThreadMapping = 0x05,
    GetCounterName = 0x06,

    GetThreadInfo = 0x10,

    SetSamplerActive = 0x60,

    Suspend = 0x70,
    Resume = 0x71,

    SetFunctionFlags = 0x80,
}

/// One client-to-agent request.
///
/// Constructed by the caller (the command issuer) and serialized with
/// [`Request::write_to`]; this layer does not decide when a request is
/// sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ask the agent to re-send the symbol mapping for a function.
    GetFunctionMapping { function_id: u32 },
    /// Ask the agent to re-send the mapping for a class.
    GetClassMapping { class_id: u32 },
    /// Ask the agent to re-send the mapping for a module.
    GetModuleMapping { module_id: u32 },
    /// Ask the agent to re-send the mapping for an assembly.
    GetAssemblyMapping { assembly_id: u32 },
    /// Ask the agent to re-send the mapping for a thread.
    GetThreadMapping { thread_id: u32 },
    /// Ask the agent to re-send a counter's display name.
    GetCounterName { counter_id: u32 },
    /// Ask the agent for a thread's current state.
    GetThreadInfo { thread_id: u32 },
    /// Turn stack sampling on or off.
    SetSamplerActive { active: bool },
    /// Suspend the profiled process.
    Suspend,
    /// Resume the profiled process.
    Resume,
    /// Enable or disable instrumentation for one function.
    SetFunctionFlags { function_id: u32, enable: bool },
}

impl Request {
    /// Returns the tag identifying this request's variant.
    pub fn tag(&self) -> RequestTag {
        match self {
            Self::GetFunctionMapping { .. } => RequestTag::GetFunctionMapping,
            Self::GetClassMapping { .. } => RequestTag::GetClassMapping,
            Self::GetModuleMapping { .. } => RequestTag::GetModuleMapping,
            Self::GetAssemblyMapping { .. } => RequestTag::GetAssemblyMapping,
            Self::GetThreadMapping { .. } => RequestTag::GetThreadMapping,
            Self::GetCounterName { .. } => RequestTag::GetCounterName,
            Self::GetThreadInfo { .. } => RequestTag::GetThreadInfo,
            Self::SetSamplerActive { .. } => RequestTag::SetSamplerActive,
            Self::Suspend => RequestTag::Suspend,
            Self::Resume => RequestTag::Resume,
            Self::SetFunctionFlags { .. } => RequestTag::SetFunctionFlags,
        }
    }

    /// Writes the tag byte and the request's fields to the sink.
    ///
    /// Cannot fail except on a downstream write error, which is surfaced
    /// unretried as [`crate::ProtocolError::Io`].
    pub fn write_to<W: Write>(&self, writer: &mut W) -> ProtocolResult<()> {
        writer.write_all(&[self.tag() as u8])?;
        match *self {
            Self::GetFunctionMapping { function_id } => {
                writer.write_all(&function_id.to_le_bytes())?;
            }
            Self::GetClassMapping { class_id } => {
                writer.write_all(&class_id.to_le_bytes())?;
            }
            Self::GetModuleMapping { module_id } => {
                writer.write_all(&module_id.to_le_bytes())?;
            }
            Self::GetAssemblyMapping { assembly_id } => {
                writer.write_all(&assembly_id.to_le_bytes())?;
            }
            Self::GetThreadMapping { thread_id } => {
                writer.write_all(&thread_id.to_le_bytes())?;
            }
            Self::GetCounterName { counter_id } => {
                writer.write_all(&counter_id.to_le_bytes())?;
            }
            Self::GetThreadInfo { thread_id } => {
                writer.write_all(&thread_id.to_le_bytes())?;
            }
            Self::SetSamplerActive { active } => {
                writer.write_all(&[u8::from(active)])?;
            }
            Self::Suspend | Self::Resume => {}
            Self::SetFunctionFlags {
                function_id,
                enable,
            } => {
                writer.write_all(&function_id.to_le_bytes())?;
                writer.write_all(&[u8::from(enable)])?;
            }
        }
        Ok(())
    }

    /// Encodes the request into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(6);
        // Writes to a Vec cannot fail.
        self.write_to(&mut buf)
            .expect("encoding to a Vec never fails");
        buf
    }
}
