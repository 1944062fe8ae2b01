//! Opcode dispatch over complete messages.

use crate::error::ProtocolError;
use crate::get_more::OpGetMore;
use crate::header::{MessageHeader, OpCode};
use crate::kill_cursors::OpKillCursors;
use crate::query::OpQuery;
use crate::reply::OpReply;

/// Any message this crate understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// OP_QUERY.
    Query(OpQuery),
    /// OP_GET_MORE.
    GetMore(OpGetMore),
    /// OP_KILL_CURSORS.
    KillCursors(OpKillCursors),
    /// OP_REPLY.
    Reply(OpReply),
}

impl Message {
    /// Decode a body according to the opcode in `header`.
    pub fn decode(header: &MessageHeader, body: &[u8]) -> Result<Self, ProtocolError> {
        Ok(match header.op_code {
            OpCode::Query => Self::Query(OpQuery::decode_body(body)?),
            OpCode::GetMore => Self::GetMore(OpGetMore::decode_body(body)?),
            OpCode::KillCursors => Self::KillCursors(OpKillCursors::decode_body(body)?),
            OpCode::Reply => Self::Reply(OpReply::decode_body(body)?),
        })
    }

    /// Opcode of this message.
    #[must_use]
    pub fn op_code(&self) -> OpCode {
        match self {
            Self::Query(_) => OpCode::Query,
            Self::GetMore(_) => OpCode::GetMore,
            Self::KillCursors(_) => OpCode::KillCursors,
            Self::Reply(_) => OpCode::Reply,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::header::HEADER_SIZE;
    use mongo_types::doc;

    #[test]
    fn test_dispatch_by_opcode() {
        let bytes = OpGetMore::new("a.b", 1, 0).encode(3).unwrap();
        let header = MessageHeader::decode(&mut &bytes[..HEADER_SIZE]).unwrap();
        let msg = Message::decode(&header, &bytes[HEADER_SIZE..]).unwrap();
        assert_eq!(msg.op_code(), OpCode::GetMore);

        let bytes = OpQuery::command("a", doc! { "ping" => 1 }).encode(4).unwrap();
        let header = MessageHeader::decode(&mut &bytes[..HEADER_SIZE]).unwrap();
        assert!(matches!(
            Message::decode(&header, &bytes[HEADER_SIZE..]).unwrap(),
            Message::Query(_)
        ));
    }
}
