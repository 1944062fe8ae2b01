//! OP_KILL_CURSORS request encoding and decoding.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::require;
use crate::error::ProtocolError;
use crate::header::{OpCode, write_message};

/// An OP_KILL_CURSORS message. The server sends no reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpKillCursors {
    /// Cursor ids to release.
    pub cursor_ids: Vec<i64>,
}

impl OpKillCursors {
    /// Create a kill-cursors request.
    pub fn new(cursor_ids: Vec<i64>) -> Self {
        Self { cursor_ids }
    }

    /// Encode the full message, header included.
    pub fn encode(&self, request_id: i32) -> Result<Bytes, ProtocolError> {
        write_message(OpCode::KillCursors, request_id, 0, |buf| {
            buf.put_i32_le(0); // reserved
            buf.put_i32_le(self.cursor_ids.len() as i32);
            for id in &self.cursor_ids {
                buf.put_i64_le(*id);
            }
            Ok(())
        })
    }

    /// Parse a message body (everything after the header).
    pub fn decode_body(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut src = body;
        require(src, 8)?;
        src.advance(4);
        let count = src.get_i32_le();
        if count < 0 {
            return Err(ProtocolError::InvalidMessageLength(count));
        }
        let count = count as usize;
        require(src, count.saturating_mul(8))?;
        let cursor_ids = (0..count).map(|_| src.get_i64_le()).collect();
        Ok(Self { cursor_ids })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::header::HEADER_SIZE;

    #[test]
    fn test_roundtrip() {
        let msg = OpKillCursors::new(vec![77, -3]);
        let bytes = msg.encode(5).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 8 + 16);
        assert_eq!(OpKillCursors::decode_body(&bytes[HEADER_SIZE..]).unwrap(), msg);
    }

    #[test]
    fn test_count_exceeds_body() {
        let mut body = vec![0, 0, 0, 0];
        body.extend_from_slice(&1000i32.to_le_bytes());
        body.extend_from_slice(&1i64.to_le_bytes());
        assert!(matches!(
            OpKillCursors::decode_body(&body),
            Err(ProtocolError::IncompleteMessage { .. })
        ));
    }
}
