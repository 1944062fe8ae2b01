#![no_main]

use libfuzzer_sys::fuzz_target;
use mongo_types::{decode_document, decode_document_sequence, encode_to_bytes};

fuzz_target!(|data: &[u8]| {
    let _ = decode_document_sequence(data);

    // Anything that decodes must encode back to bytes that decode to an
    // equal document
    if let Ok((doc, _)) = decode_document(data) {
        let bytes = encode_to_bytes(&doc).expect("decoded document re-encodes");
        let (again, used) = decode_document(&bytes).expect("re-encoded document decodes");
        assert_eq!(used, bytes.len());
        assert_eq!(doc.len(), again.len());
    }
});
