#![no_main]

use libfuzzer_sys::fuzz_target;
use mongo_protocol::{HEADER_SIZE, Message, MessageHeader, OpCode, OpReply};

fuzz_target!(|data: &[u8]| {
    let _ = OpReply::decode_body(data);

    // Route through the generic dispatcher with a header that claims the
    // body is a reply
    let len = i32::try_from(data.len() + HEADER_SIZE).unwrap_or(i32::MAX);
    let header = MessageHeader::new(OpCode::Reply, 1, len).with_response_to(1);
    let _ = Message::decode(&header, data);
});
