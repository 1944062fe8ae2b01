//! OP_REPLY decoding (and encoding, for test servers).
//!
//! Body layout:
//! - `i32` response flags
//! - `i64` cursor id (0 when the cursor is exhausted)
//! - `i32` starting position in the cursor
//! - `i32` number of documents returned
//! - that many documents, back to back

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes};
use mongo_types::{Document, decode_document_sequence};

use crate::codec::{require, write_document};
use crate::error::ProtocolError;
use crate::header::{OpCode, write_message};

/// Fixed-size prefix of a reply body.
pub const REPLY_PREFIX_SIZE: usize = 20;

bitflags! {
    /// OP_REPLY response flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResponseFlags: u32 {
        /// The cursor id in a get-more was not known to the server.
        const CURSOR_NOT_FOUND = 1 << 0;
        /// The query failed; the single document carries `$err`.
        const QUERY_FAILURE = 1 << 1;
        /// Shard configuration is stale.
        const SHARD_CONFIG_STALE = 1 << 2;
        /// Server supports the await-data query flag.
        const AWAIT_CAPABLE = 1 << 3;
    }
}

/// An OP_REPLY message.
#[derive(Debug, Clone, PartialEq)]
pub struct OpReply {
    /// Response flags.
    pub response_flags: ResponseFlags,
    /// Cursor id to continue with, or 0 when exhausted.
    pub cursor_id: i64,
    /// Position of the first returned document within the cursor.
    pub starting_from: i32,
    /// Documents in this batch.
    pub documents: Vec<Document>,
}

impl OpReply {
    /// Create a successful reply carrying `documents`.
    pub fn new(cursor_id: i64, documents: Vec<Document>) -> Self {
        Self {
            response_flags: ResponseFlags::AWAIT_CAPABLE,
            cursor_id,
            starting_from: 0,
            documents,
        }
    }

    /// Create a reply flagged with query failure.
    pub fn query_failure(message: &str, code: i32) -> Self {
        let mut err = Document::new();
        err.insert("$err", message);
        err.insert("code", code);
        Self {
            response_flags: ResponseFlags::QUERY_FAILURE,
            cursor_id: 0,
            starting_from: 0,
            documents: vec![err],
        }
    }

    /// Create a reply flagged with cursor-not-found.
    pub fn cursor_not_found() -> Self {
        Self {
            response_flags: ResponseFlags::CURSOR_NOT_FOUND,
            cursor_id: 0,
            starting_from: 0,
            documents: Vec::new(),
        }
    }

    /// Whether the server reported an unknown cursor.
    #[must_use]
    pub fn is_cursor_not_found(&self) -> bool {
        self.response_flags.contains(ResponseFlags::CURSOR_NOT_FOUND)
    }

    /// Whether the server reported a failed query.
    #[must_use]
    pub fn is_query_failure(&self) -> bool {
        self.response_flags.contains(ResponseFlags::QUERY_FAILURE)
    }

    /// Encode the full message, header included.
    pub fn encode(&self, request_id: i32, response_to: i32) -> Result<Bytes, ProtocolError> {
        write_message(OpCode::Reply, request_id, response_to, |buf| {
            buf.put_u32_le(self.response_flags.bits());
            buf.put_i64_le(self.cursor_id);
            buf.put_i32_le(self.starting_from);
            buf.put_i32_le(self.documents.len() as i32);
            for doc in &self.documents {
                write_document(buf, doc)?;
            }
            Ok(())
        })
    }

    /// Parse a message body (everything after the header).
    ///
    /// The declared document count must match the documents present.
    pub fn decode_body(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut src = body;
        require(src, REPLY_PREFIX_SIZE)?;
        let response_flags = ResponseFlags::from_bits_retain(src.get_u32_le());
        let cursor_id = src.get_i64_le();
        let starting_from = src.get_i32_le();
        let number_returned = src.get_i32_le();

        let documents = decode_document_sequence(src)?;
        if number_returned < 0 || documents.len() != number_returned as usize {
            return Err(ProtocolError::ReplyCountMismatch {
                declared: number_returned,
                actual: documents.len(),
            });
        }

        Ok(Self {
            response_flags,
            cursor_id,
            starting_from,
            documents,
        })
    }
}
