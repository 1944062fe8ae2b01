//! OP_GET_MORE request encoding and decoding.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{read_cstring, require, write_cstring};
use crate::error::ProtocolError;
use crate::header::{OpCode, write_message};

/// An OP_GET_MORE message: fetch the next batch of an open cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpGetMore {
    /// Namespace the cursor was opened on.
    pub full_collection_name: String,
    /// Batch size hint.
    pub number_to_return: i32,
    /// Server cursor id.
    pub cursor_id: i64,
}

impl OpGetMore {
    /// Create a get-more request.
    pub fn new(full_collection_name: impl Into<String>, cursor_id: i64, number_to_return: i32) -> Self {
        Self {
            full_collection_name: full_collection_name.into(),
            number_to_return,
            cursor_id,
        }
    }

    /// Encode the full message, header included.
    pub fn encode(&self, request_id: i32) -> Result<Bytes, ProtocolError> {
        write_message(OpCode::GetMore, request_id, 0, |buf| {
            buf.put_i32_le(0); // reserved
            write_cstring(buf, &self.full_collection_name);
            buf.put_i32_le(self.number_to_return);
            buf.put_i64_le(self.cursor_id);
            Ok(())
        })
    }

    /// Parse a message body (everything after the header).
    pub fn decode_body(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut src = body;
        require(src, 4)?;
        src.advance(4);
        let full_collection_name = read_cstring(&mut src, "full collection name")?;
        require(src, 12)?;
        let number_to_return = src.get_i32_le();
        let cursor_id = src.get_i64_le();
        Ok(Self {
            full_collection_name,
            number_to_return,
            cursor_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::header::{HEADER_SIZE, MessageHeader};

    #[test]
    fn test_encode_layout() {
        let msg = OpGetMore::new("test.c", 77, 100);
        let bytes = msg.encode(9).unwrap();
        // header + reserved + "test.c\0" + i32 + i64
        assert_eq!(bytes.len(), HEADER_SIZE + 4 + 7 + 4 + 8);

        let mut cursor = bytes.as_ref();
        let header = MessageHeader::decode(&mut cursor).unwrap();
        assert_eq!(header.op_code, OpCode::GetMore);
        assert_eq!(&bytes[bytes.len() - 8..], &77i64.to_le_bytes());

        assert_eq!(OpGetMore::decode_body(&bytes[HEADER_SIZE..]).unwrap(), msg);
    }

    #[test]
    fn test_decode_short_body() {
        assert!(OpGetMore::decode_body(&[0, 0, 0, 0, b'a', 0, 1]).is_err());
    }
}
