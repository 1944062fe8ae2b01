//! Wire message codec implementation.

use bytes::{Bytes, BytesMut};
use mongo_protocol::{HEADER_SIZE, MAX_MESSAGE_SIZE, MessageHeader};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// One complete message: parsed header plus raw body.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Message header.
    pub header: MessageHeader,
    /// Body bytes (excluding header).
    pub body: Bytes,
}

impl Frame {
    /// Create a frame from its parts.
    #[must_use]
    pub fn new(header: MessageHeader, body: Bytes) -> Self {
        Self { header, body }
    }

    /// Total message size including header.
    #[must_use]
    pub fn total_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }
}

/// Message codec for tokio-util framing.
///
/// Decoding validates the 16-byte header as soon as it is available and
/// only then waits for the declared body. Encoding accepts fully built
/// messages (header included) and checks their size.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    max_message_size: usize,
}

impl MessageCodec {
    /// Create a codec with the default maximum message size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Create a codec with a custom maximum message size.
    #[must_use]
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size.clamp(HEADER_SIZE, MAX_MESSAGE_SIZE);
        self
    }

    /// The maximum message size in force.
    #[must_use]
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Need at least a header to proceed
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        // Validate the header before buffering the body
        let header = MessageHeader::decode(&mut &src[..HEADER_SIZE])?;
        let length = header.message_length as usize;
        if length > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: length,
                max: self.max_message_size,
            });
        }

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let mut message = src.split_to(length);
        let body = message.split_off(HEADER_SIZE).freeze();

        tracing::trace!(
            op_code = header.op_code.name(),
            length = length,
            request_id = header.request_id,
            response_to = header.response_to,
            "decoded message"
        );

        Ok(Some(Frame::new(header, body)))
    }
}

impl Encoder<Bytes> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: item.len(),
                max: self.max_message_size,
            });
        }
        let header = MessageHeader::decode(&mut item.as_ref())?;
        if header.message_length as usize != item.len() {
            return Err(CodecError::Protocol(
                mongo_protocol::ProtocolError::InvalidMessageLength(header.message_length),
            ));
        }

        dst.extend_from_slice(&item);

        tracing::trace!(
            op_code = header.op_code.name(),
            length = item.len(),
            request_id = header.request_id,
            "encoded message"
        );

        Ok(())
    }
}
