#![no_main]

use libfuzzer_sys::fuzz_target;
use mongo_protocol::{HEADER_SIZE, MessageHeader};

fuzz_target!(|data: &[u8]| {
    if data.len() >= HEADER_SIZE {
        let mut cursor = data;
        let _ = MessageHeader::decode(&mut cursor);
    }
});
