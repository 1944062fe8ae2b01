//! # mongo-protocol
//!
//! Pure implementation of the legacy MongoDB wire protocol message family:
//! OP_QUERY, OP_GET_MORE, OP_KILL_CURSORS and OP_REPLY.
//!
//! Every message is a 16-byte little-endian [`MessageHeader`] followed by an
//! opcode-specific body. Bodies embed documents in the binary format
//! implemented by `mongo-types`.
//!
//! ## Design Philosophy
//!
//! This crate is intentionally IO-agnostic. It contains no networking logic and
//! makes no assumptions about the async runtime. Higher-level crates build upon
//! this foundation to provide async I/O capabilities.
//!
//! ## Example
//!
//! ```rust
//! use mongo_protocol::{HEADER_SIZE, MessageHeader, OpCode, OpQuery};
//! use mongo_types::doc;
//!
//! let bytes = OpQuery::command("admin", doc! { "ping" => 1 }).encode(1).unwrap();
//! let header = MessageHeader::decode(&mut &bytes[..HEADER_SIZE]).unwrap();
//! assert_eq!(header.op_code, OpCode::Query);
//! assert_eq!(header.message_length as usize, bytes.len());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod error;
pub mod get_more;
pub mod header;
pub mod kill_cursors;
pub mod message;
pub mod namespace;
pub mod query;
pub mod reply;

pub use error::ProtocolError;
pub use get_more::OpGetMore;
pub use header::{HEADER_SIZE, MAX_MESSAGE_SIZE, MessageHeader, OpCode};
pub use kill_cursors::OpKillCursors;
pub use message::Message;
pub use namespace::{
    EXTERNAL_DATABASE, Namespace, validate_collection_name, validate_database_name,
};
pub use query::{OpQuery, QueryFlags};
pub use reply::{OpReply, ResponseFlags};
