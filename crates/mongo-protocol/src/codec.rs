//! Low-level field helpers shared by the message encoders and decoders.

use bytes::{Buf, BufMut};
use mongo_types::{Document, decode_document, encode_document};

use crate::error::ProtocolError;

/// Read a NUL-terminated UTF-8 string.
pub fn read_cstring(src: &mut &[u8], field: &'static str) -> Result<String, ProtocolError> {
    let nul = src
        .iter()
        .position(|&b| b == 0)
        .ok_or(ProtocolError::InvalidCString(field))?;
    let s = std::str::from_utf8(&src[..nul])
        .map_err(|_| ProtocolError::InvalidCString(field))?
        .to_owned();
    src.advance(nul + 1);
    Ok(s)
}

/// Write a NUL-terminated string.
pub fn write_cstring(dst: &mut impl BufMut, s: &str) {
    dst.put_slice(s.as_bytes());
    dst.put_u8(0);
}

/// Ensure at least `n` bytes remain.
pub fn require(src: &[u8], n: usize) -> Result<(), ProtocolError> {
    if src.len() < n {
        return Err(ProtocolError::IncompleteMessage {
            expected: n,
            actual: src.len(),
        });
    }
    Ok(())
}

/// Read one embedded document and advance past it.
pub fn read_document(src: &mut &[u8]) -> Result<Document, ProtocolError> {
    let (doc, consumed) = decode_document(&src[..])?;
    src.advance(consumed);
    Ok(doc)
}

/// Append an embedded document.
pub fn write_document(dst: &mut bytes::BytesMut, doc: &Document) -> Result<(), ProtocolError> {
    encode_document(doc, dst)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cstring_roundtrip() {
        let mut buf = Vec::new();
        write_cstring(&mut buf, "test.users");
        buf.push(0xFF);
        let mut src = buf.as_slice();
        assert_eq!(read_cstring(&mut src, "namespace").unwrap(), "test.users");
        assert_eq!(src, &[0xFF]);
    }

    #[test]
    fn test_unterminated_cstring() {
        let mut src: &[u8] = b"abc";
        assert_eq!(
            read_cstring(&mut src, "namespace").unwrap_err(),
            ProtocolError::InvalidCString("namespace")
        );
    }
}
