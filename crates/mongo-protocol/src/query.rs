//! OP_QUERY request encoding and decoding.
//!
//! Body layout:
//! - `i32` flags
//! - C string full collection name (`db.collection`, or `db.$cmd` for commands)
//! - `i32` number to skip
//! - `i32` number to return
//! - query document
//! - optional field-selector document

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes};
use mongo_types::Document;

use crate::codec::{read_cstring, read_document, require, write_cstring, write_document};
use crate::error::ProtocolError;
use crate::header::{OpCode, write_message};

bitflags! {
    /// OP_QUERY flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct QueryFlags: u32 {
        /// Leave the cursor open when the last result is read.
        const TAILABLE_CURSOR = 1 << 1;
        /// Allow the query on a secondary.
        const SLAVE_OK = 1 << 2;
        /// Internal replication use.
        const OPLOG_REPLAY = 1 << 3;
        /// Disable the server's idle-cursor timeout.
        const NO_CURSOR_TIMEOUT = 1 << 4;
        /// Block on a tailable cursor rather than returning no data.
        const AWAIT_DATA = 1 << 5;
        /// Stream all batches without waiting for get-more.
        const EXHAUST = 1 << 6;
        /// Return partial results if some shards are down.
        const PARTIAL = 1 << 7;
    }
}

/// An OP_QUERY message.
#[derive(Debug, Clone, PartialEq)]
pub struct OpQuery {
    /// Query flags.
    pub flags: QueryFlags,
    /// Target namespace.
    pub full_collection_name: String,
    /// Documents to skip.
    pub number_to_skip: i32,
    /// Batch size hint. `-1` asks for a single document and closes the cursor.
    pub number_to_return: i32,
    /// Filter or command document.
    pub query: Document,
    /// Optional projection.
    pub return_fields_selector: Option<Document>,
}

impl OpQuery {
    /// Create a query with no flags, skip or projection.
    pub fn new(full_collection_name: impl Into<String>, query: Document, number_to_return: i32) -> Self {
        Self {
            flags: QueryFlags::empty(),
            full_collection_name: full_collection_name.into(),
            number_to_skip: 0,
            number_to_return,
            query,
            return_fields_selector: None,
        }
    }

    /// Build a command invocation against `<db>.$cmd`.
    ///
    /// Commands always ask for exactly one reply document.
    pub fn command(db: &str, command: Document) -> Self {
        Self::new(format!("{db}.$cmd"), command, -1)
    }

    /// Set the query flags.
    #[must_use]
    pub fn with_flags(mut self, flags: QueryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the number of documents to skip.
    #[must_use]
    pub fn with_skip(mut self, skip: i32) -> Self {
        self.number_to_skip = skip;
        self
    }

    /// Set the projection.
    #[must_use]
    pub fn with_projection(mut self, projection: Option<Document>) -> Self {
        self.return_fields_selector = projection;
        self
    }

    /// Encode the full message, header included.
    pub fn encode(&self, request_id: i32) -> Result<Bytes, ProtocolError> {
        write_message(OpCode::Query, request_id, 0, |buf| {
            buf.put_u32_le(self.flags.bits());
            write_cstring(buf, &self.full_collection_name);
            buf.put_i32_le(self.number_to_skip);
            buf.put_i32_le(self.number_to_return);
            write_document(buf, &self.query)?;
            if let Some(fields) = &self.return_fields_selector {
                write_document(buf, fields)?;
            }
            Ok(())
        })
    }

    /// Parse a message body (everything after the header).
    pub fn decode_body(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut src = body;
        require(src, 4)?;
        let flags = QueryFlags::from_bits_retain(src.get_u32_le());
        let full_collection_name = read_cstring(&mut src, "full collection name")?;
        require(src, 8)?;
        let number_to_skip = src.get_i32_le();
        let number_to_return = src.get_i32_le();
        let query = read_document(&mut src)?;
        let return_fields_selector = if src.has_remaining() {
            Some(read_document(&mut src)?)
        } else {
            None
        };
        if src.has_remaining() {
            return Err(ProtocolError::TrailingBytes(src.len()));
        }

        Ok(Self {
            flags,
            full_collection_name,
            number_to_skip,
            number_to_return,
            query,
            return_fields_selector,
        })
    }

    /// Name of the command if this query targets `<db>.$cmd`.
    #[must_use]
    pub fn command_name(&self) -> Option<&str> {
        if self.full_collection_name.ends_with(".$cmd") {
            self.query.keys().next()
        } else {
            None
        }
    }
}
