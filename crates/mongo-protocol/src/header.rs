//! Message header definitions.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;

/// Message header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Largest message accepted in either direction.
///
/// Matches the server's default `maxMessageSizeBytes`.
pub const MAX_MESSAGE_SIZE: usize = 48_000_000;

/// Wire opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OpCode {
    /// Reply to a query or get-more.
    Reply = 1,
    /// Query a collection or run a command.
    Query = 2004,
    /// Fetch the next batch of an open cursor.
    GetMore = 2005,
    /// Release server-side cursors.
    KillCursors = 2007,
}

impl OpCode {
    /// Create an opcode from its raw value.
    pub fn from_i32(value: i32) -> Result<Self, ProtocolError> {
        match value {
            1 => Ok(Self::Reply),
            2004 => Ok(Self::Query),
            2005 => Ok(Self::GetMore),
            2007 => Ok(Self::KillCursors),
            _ => Err(ProtocolError::InvalidOpCode(value)),
        }
    }

    /// Human-readable name, as used in server logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reply => "OP_REPLY",
            Self::Query => "OP_QUERY",
            Self::GetMore => "OP_GET_MORE",
            Self::KillCursors => "OP_KILL_CURSORS",
        }
    }
}

/// Message header.
///
/// Every message begins with a 16-byte little-endian header carrying the
/// total length, the sender's request id, the request id being answered
/// (replies only) and the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Total message length including the header.
    pub message_length: i32,
    /// Identifier chosen by the sender.
    pub request_id: i32,
    /// Request id this message answers; 0 for requests.
    pub response_to: i32,
    /// Message kind.
    pub op_code: OpCode,
}

impl MessageHeader {
    /// Create a new request header.
    #[must_use]
    pub const fn new(op_code: OpCode, request_id: i32, message_length: i32) -> Self {
        Self {
            message_length,
            request_id,
            response_to: 0,
            op_code,
        }
    }

    /// Parse a message header from bytes.
    ///
    /// Validates the opcode and that the declared length lies between the
    /// header size and [`MAX_MESSAGE_SIZE`].
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        if src.remaining() < HEADER_SIZE {
            return Err(ProtocolError::IncompleteMessage {
                expected: HEADER_SIZE,
                actual: src.remaining(),
            });
        }

        let message_length = src.get_i32_le();
        let request_id = src.get_i32_le();
        let response_to = src.get_i32_le();
        let op_code = OpCode::from_i32(src.get_i32_le())?;

        Self::check_length(message_length)?;

        Ok(Self {
            message_length,
            request_id,
            response_to,
            op_code,
        })
    }

    /// Validate a declared total length.
    pub fn check_length(message_length: i32) -> Result<usize, ProtocolError> {
        if message_length < HEADER_SIZE as i32 {
            return Err(ProtocolError::InvalidMessageLength(message_length));
        }
        let length = message_length as usize;
        if length > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                length,
                max: MAX_MESSAGE_SIZE,
            });
        }
        Ok(length)
    }

    /// Encode the header to bytes.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_i32_le(self.message_length);
        dst.put_i32_le(self.request_id);
        dst.put_i32_le(self.response_to);
        dst.put_i32_le(self.op_code as i32);
    }

    /// Encode the header to a new `Bytes` buffer.
    #[must_use]
    pub fn encode_to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Body length (total length minus header).
    #[must_use]
    pub const fn body_length(&self) -> usize {
        (self.message_length as usize).saturating_sub(HEADER_SIZE)
    }

    /// Set the response-to field.
    #[must_use]
    pub const fn with_response_to(mut self, response_to: i32) -> Self {
        self.response_to = response_to;
        self
    }
}

/// Write a complete message: header placeholder, body, then backpatched length.
pub(crate) fn write_message(
    op_code: OpCode,
    request_id: i32,
    response_to: i32,
    body: impl FnOnce(&mut BytesMut) -> Result<(), ProtocolError>,
) -> Result<Bytes, ProtocolError> {
    let mut buf = BytesMut::with_capacity(128);
    MessageHeader {
        message_length: 0,
        request_id,
        response_to,
        op_code,
    }
    .encode(&mut buf);

    body(&mut buf)?;

    let length = buf.len();
    if length > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            length,
            max: MAX_MESSAGE_SIZE,
        });
    }
    buf[0..4].copy_from_slice(&(length as i32).to_le_bytes());
    Ok(buf.freeze())
}
