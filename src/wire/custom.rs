//! User-space messages.
//!
//! Type tags at or above [`CUSTOM_TYPE_START`](super::CUSTOM_TYPE_START)
//! belong to applications layered over the peer wire. Their bodies are
//! opaque here: the codec preserves the bytes exactly and leaves
//! interpretation to whoever registered the type.

use std::io::{Read, Write};

use super::codec::write_all;
use super::{MessageType, WireError};

/// An application-defined message, body uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomMessage {
    /// The message's type tag, at or above the custom range start.
    pub msg_type: MessageType,
    /// The raw body bytes.
    pub data: Vec<u8>,
}

impl CustomMessage {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.data)
    }

    pub(crate) fn decode<R: Read>(msg_type: MessageType, r: &mut R) -> Result<Self, WireError> {
        let mut data = Vec::new();
        r.read_to_end(&mut data).map_err(WireError::Io)?;
        Ok(Self { msg_type, data })
    }
}
