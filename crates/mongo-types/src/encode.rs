//! Binary document encoding.
//!
//! A document is written as a little-endian `i32` total length, a run of
//! `(tag, key, payload)` elements and a terminating zero byte. The length
//! is written as a placeholder first and backpatched once the size is known.
//! Nesting is capped at [`MAX_NESTING_DEPTH`] so every encoded document can be
//! decoded again.

use bytes::{BufMut, Bytes, BytesMut};

use crate::decode::MAX_NESTING_DEPTH;
use crate::document::Document;
use crate::error::TypeError;
use crate::value::Value;

/// Encode `doc` onto the end of `dst`, returning the number of bytes written.
///
/// On error `dst` is truncated back to its original length.
pub fn encode_document(doc: &Document, dst: &mut BytesMut) -> Result<usize, TypeError> {
    let start = dst.len();
    match write_document(doc, dst, 0) {
        Ok(n) => Ok(n),
        Err(e) => {
            dst.truncate(start);
            Err(e)
        }
    }
}

/// Encode `doc` into a freshly allocated buffer.
pub fn encode_to_bytes(doc: &Document) -> Result<Bytes, TypeError> {
    let mut buf = BytesMut::with_capacity(64);
    encode_document(doc, &mut buf)?;
    Ok(buf.freeze())
}

fn write_document(doc: &Document, dst: &mut BytesMut, depth: usize) -> Result<usize, TypeError> {
    check_depth(depth)?;
    let start = dst.len();
    dst.put_i32_le(0);
    for (key, value) in doc {
        write_element(key, value, dst, depth)?;
    }
    dst.put_u8(0);
    backpatch_length(dst, start)
}

fn write_array(items: &[Value], dst: &mut BytesMut, depth: usize) -> Result<usize, TypeError> {
    check_depth(depth)?;
    let start = dst.len();
    dst.put_i32_le(0);
    for (i, item) in items.iter().enumerate() {
        write_element(&i.to_string(), item, dst, depth)?;
    }
    dst.put_u8(0);
    backpatch_length(dst, start)
}

fn check_depth(depth: usize) -> Result<(), TypeError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(TypeError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }
    Ok(())
}

fn backpatch_length(dst: &mut BytesMut, start: usize) -> Result<usize, TypeError> {
    let size = dst.len() - start;
    let prefix = i32::try_from(size).map_err(|_| TypeError::DocumentTooLarge { size })?;
    dst[start..start + 4].copy_from_slice(&prefix.to_le_bytes());
    Ok(size)
}

fn write_element(
    key: &str,
    value: &Value,
    dst: &mut BytesMut,
    depth: usize,
) -> Result<(), TypeError> {
    if key.as_bytes().contains(&0) {
        return Err(TypeError::InvalidKey(key.to_string()));
    }
    dst.put_u8(value.element_type().as_u8());
    put_cstring(key, dst);

    match value {
        Value::Null | Value::MinKey | Value::MaxKey => {}
        Value::Bool(v) => dst.put_u8(u8::from(*v)),
        Value::Int32(v) => dst.put_i32_le(*v),
        Value::Int64(v) => dst.put_i64_le(*v),
        Value::Double(v) => dst.put_f64_le(*v),
        Value::String(s) | Value::JavaScript(s) => put_string(s, dst)?,
        Value::Binary(bin) => {
            let len = i32::try_from(bin.bytes.len()).map_err(|_| TypeError::DocumentTooLarge {
                size: bin.bytes.len(),
            })?;
            dst.put_i32_le(len);
            dst.put_u8(bin.subtype);
            dst.put_slice(&bin.bytes);
        }
        Value::Document(d) => {
            write_document(d, dst, depth + 1)?;
        }
        Value::Array(items) => {
            write_array(items, dst, depth + 1)?;
        }
        Value::ObjectId(oid) => dst.put_slice(&oid.bytes()),
        Value::DateTime(ms) => dst.put_i64_le(*ms),
        Value::Timestamp { time, increment } => {
            dst.put_u32_le(*increment);
            dst.put_u32_le(*time);
        }
        Value::Regex { pattern, options } => {
            for part in [pattern, options] {
                if part.as_bytes().contains(&0) {
                    return Err(TypeError::InvalidRegex(part.clone()));
                }
            }
            put_cstring(pattern, dst);
            put_cstring(options, dst);
        }
        Value::Decimal128(raw) => dst.put_slice(raw),
    }
    Ok(())
}

fn put_cstring(s: &str, dst: &mut BytesMut) {
    dst.put_slice(s.as_bytes());
    dst.put_u8(0);
}

/// Strings carry a length that includes the trailing NUL.
fn put_string(s: &str, dst: &mut BytesMut) -> Result<(), TypeError> {
    let size = s.len() + 1;
    let len = i32::try_from(size).map_err(|_| TypeError::DocumentTooLarge { size })?;
    dst.put_i32_le(len);
    put_cstring(s, dst);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_empty_document() {
        let bytes = encode_to_bytes(&Document::new()).unwrap();
        assert_eq!(&bytes[..], &[5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_known_encoding() {
        // {"hello": "world"}
        let bytes = encode_to_bytes(&doc! { "hello" => "world" }).unwrap();
        let expected: &[u8] = b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00";
        assert_eq!(&bytes[..], expected);
    }

    #[test]
    fn test_length_prefix_matches_output() {
        let d = doc! {
            "name" => "alice",
            "age" => 30,
            "nested" => doc! { "list" => vec![Value::Int64(1), Value::Null] },
        };
        let bytes = encode_to_bytes(&d).unwrap();
        let prefix = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(prefix as usize, bytes.len());
        assert_eq!(*bytes.last().unwrap(), 0);
    }

    #[test]
    fn test_array_keys_are_indices() {
        let d = doc! { "a" => vec![Value::Bool(true), Value::Bool(false)] };
        let bytes = encode_to_bytes(&d).unwrap();
        let body = &bytes[..];
        assert!(body.windows(3).any(|w| w == b"\x080\x00"));
        assert!(body.windows(3).any(|w| w == b"\x081\x00"));
    }

    #[test]
    fn test_nul_in_key_rejected() {
        let mut d = Document::new();
        d.insert("bad\0key", 1);
        let mut buf = BytesMut::new();
        buf.put_u8(0xAA);
        let err = encode_document(&d, &mut buf).unwrap_err();
        assert!(matches!(err, TypeError::InvalidKey(_)));
        // partial output is rolled back
        assert_eq!(&buf[..], &[0xAA]);
    }

    #[test]
    fn test_appends_to_existing_buffer() {
        let mut buf = BytesMut::from(&b"xyz"[..]);
        let n = encode_document(&doc! { "a" => 1 }, &mut buf).unwrap();
        assert_eq!(buf.len(), 3 + n);
        assert_eq!(i32::from_le_bytes([buf[3], buf[4], buf[5], buf[6]]) as usize, n);
    }
}
