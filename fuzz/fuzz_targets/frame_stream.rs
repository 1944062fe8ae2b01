#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use mongo_codec::MessageCodec;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::from(data);

    // Drain every complete frame; stop at the first error or short read
    while let Ok(Some(_frame)) = codec.decode(&mut buf) {}
});
