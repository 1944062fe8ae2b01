#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mongo_protocol::{OpGetMore, OpKillCursors, OpQuery};

#[derive(Debug, Arbitrary)]
enum Request<'a> {
    Query(&'a [u8]),
    GetMore(&'a [u8]),
    KillCursors(&'a [u8]),
}

fuzz_target!(|request: Request<'_>| {
    match request {
        Request::Query(body) => {
            if let Ok(query) = OpQuery::decode_body(body) {
                let _ = query.command_name();
            }
        }
        Request::GetMore(body) => {
            let _ = OpGetMore::decode_body(body);
        }
        Request::KillCursors(body) => {
            let _ = OpKillCursors::decode_body(body);
        }
    }
});
