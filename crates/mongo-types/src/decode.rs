//! Binary document decoding.
//!
//! Every length read from the input is checked against the bytes that are
//! actually available before anything is allocated, so a hostile or
//! truncated buffer fails with [`TypeError::CorruptData`] instead of
//! over-reading.

use bytes::Bytes;

use crate::document::Document;
use crate::element::ElementType;
use crate::error::TypeError;
use crate::oid::ObjectId;
use crate::value::{Binary, Value};

/// Smallest valid document: length prefix plus terminator.
pub const MIN_DOCUMENT_SIZE: usize = 5;

/// Maximum nesting of documents and arrays accepted while decoding.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Decode one document from the start of `buf`.
///
/// Returns the document and the number of bytes it occupied. Trailing
/// bytes after the document are left for the caller.
pub fn decode_document(buf: &[u8]) -> Result<(Document, usize), TypeError> {
    decode_at(buf, 0, 0)
}

/// Decode a buffer that holds exactly one document.
pub fn from_slice(buf: &[u8]) -> Result<Document, TypeError> {
    let (doc, consumed) = decode_document(buf)?;
    if consumed != buf.len() {
        return Err(TypeError::corrupt(
            consumed,
            format!("{} trailing bytes after document", buf.len() - consumed),
        ));
    }
    Ok(doc)
}

/// Decode a run of back-to-back documents filling all of `buf`.
pub fn decode_document_sequence(buf: &[u8]) -> Result<Vec<Document>, TypeError> {
    let mut docs = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        let (doc, consumed) = decode_at(&buf[offset..], offset, 0)?;
        docs.push(doc);
        offset += consumed;
    }
    Ok(docs)
}

/// Bounded cursor over a slice that reports absolute offsets.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], TypeError> {
        if self.remaining() < n {
            return Err(TypeError::corrupt(
                self.offset(),
                format!("{what} needs {n} bytes, {} remain", self.remaining()),
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], TypeError> {
        let slice = self.take(N, what)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> Result<u8, TypeError> {
        Ok(self.take_array::<1>(what)?[0])
    }

    fn i32(&mut self, what: &str) -> Result<i32, TypeError> {
        self.take_array(what).map(i32::from_le_bytes)
    }

    fn u32(&mut self, what: &str) -> Result<u32, TypeError> {
        self.take_array(what).map(u32::from_le_bytes)
    }

    fn i64(&mut self, what: &str) -> Result<i64, TypeError> {
        self.take_array(what).map(i64::from_le_bytes)
    }

    fn f64(&mut self, what: &str) -> Result<f64, TypeError> {
        self.take_array(what).map(f64::from_le_bytes)
    }

    fn cstring(&mut self, what: &str) -> Result<&'a str, TypeError> {
        let start = self.offset();
        let rest = self.rest();
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| TypeError::corrupt(start, format!("unterminated {what}")))?;
        let s = std::str::from_utf8(&rest[..nul])
            .map_err(|_| TypeError::corrupt(start, format!("{what} is not valid UTF-8")))?;
        self.advance(nul + 1);
        Ok(s)
    }

    /// Length-prefixed string whose length includes the trailing NUL.
    fn string(&mut self, what: &str) -> Result<String, TypeError> {
        let start = self.offset();
        let len = self.i32(what)?;
        if len < 1 {
            return Err(TypeError::corrupt(
                start,
                format!("{what} length {len} is less than 1"),
            ));
        }
        let raw = self.take(len as usize, what)?;
        let (text, nul) = raw.split_at(raw.len() - 1);
        if nul[0] != 0 {
            return Err(TypeError::corrupt(
                start,
                format!("{what} is missing its NUL terminator"),
            ));
        }
        std::str::from_utf8(text)
            .map(str::to_owned)
            .map_err(|_| TypeError::corrupt(start, format!("{what} is not valid UTF-8")))
    }
}

fn decode_at(buf: &[u8], base: usize, depth: usize) -> Result<(Document, usize), TypeError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(TypeError::corrupt(
            base,
            format!("nesting exceeds {MAX_NESTING_DEPTH} levels"),
        ));
    }
    if buf.len() < MIN_DOCUMENT_SIZE {
        return Err(TypeError::corrupt(
            base,
            format!(
                "need at least {MIN_DOCUMENT_SIZE} bytes for a document, have {}",
                buf.len()
            ),
        ));
    }
    let declared = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if declared < MIN_DOCUMENT_SIZE as i32 {
        return Err(TypeError::corrupt(
            base,
            format!("declared length {declared} is below the minimum of {MIN_DOCUMENT_SIZE}"),
        ));
    }
    let len = declared as usize;
    if len > buf.len() {
        return Err(TypeError::corrupt(
            base,
            format!(
                "declared length {len} exceeds the {} bytes available",
                buf.len()
            ),
        ));
    }
    if buf[len - 1] != 0 {
        return Err(TypeError::corrupt(
            base + len - 1,
            "missing document terminator",
        ));
    }

    let mut reader = Reader::new(&buf[4..len - 1], base + 4);
    let mut doc = Document::new();
    while reader.remaining() > 0 {
        let tag_offset = reader.offset();
        let tag = reader.u8("element tag")?;
        let ty = ElementType::from_u8(tag).ok_or_else(|| {
            TypeError::corrupt(tag_offset, format!("unknown element type 0x{tag:02x}"))
        })?;
        let key = reader.cstring("element key")?;
        let value = decode_value(ty, &mut reader, depth)?;
        doc.insert(key, value);
    }
    Ok((doc, len))
}

fn decode_value(ty: ElementType, reader: &mut Reader<'_>, depth: usize) -> Result<Value, TypeError> {
    Ok(match ty {
        ElementType::Double => Value::Double(reader.f64("double")?),
        ElementType::String => Value::String(reader.string("string")?),
        ElementType::JavaScript => Value::JavaScript(reader.string("javascript")?),
        ElementType::Document => {
            let (doc, consumed) = decode_at(reader.rest(), reader.offset(), depth + 1)?;
            reader.advance(consumed);
            Value::Document(doc)
        }
        ElementType::Array => {
            let (doc, consumed) = decode_at(reader.rest(), reader.offset(), depth + 1)?;
            reader.advance(consumed);
            Value::Array(doc.into_iter().map(|(_, v)| v).collect())
        }
        ElementType::Binary => {
            let start = reader.offset();
            let len = reader.i32("binary length")?;
            if len < 0 {
                return Err(TypeError::corrupt(
                    start,
                    format!("binary length {len} is negative"),
                ));
            }
            let subtype = reader.u8("binary subtype")?;
            let bytes = reader.take(len as usize, "binary payload")?;
            Value::Binary(Binary::with_subtype(subtype, Bytes::copy_from_slice(bytes)))
        }
        ElementType::ObjectId => {
            Value::ObjectId(ObjectId::from_bytes(reader.take_array("object id")?))
        }
        ElementType::Boolean => {
            let start = reader.offset();
            match reader.u8("boolean")? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(TypeError::corrupt(
                        start,
                        format!("invalid boolean byte 0x{other:02x}"),
                    ));
                }
            }
        }
        ElementType::DateTime => Value::DateTime(reader.i64("datetime")?),
        ElementType::Null => Value::Null,
        ElementType::Regex => {
            let pattern = reader.cstring("regex pattern")?.to_owned();
            let options = reader.cstring("regex options")?.to_owned();
            Value::Regex { pattern, options }
        }
        ElementType::Int32 => Value::Int32(reader.i32("int32")?),
        ElementType::Timestamp => {
            let increment = reader.u32("timestamp increment")?;
            let time = reader.u32("timestamp seconds")?;
            Value::Timestamp { time, increment }
        }
        ElementType::Int64 => Value::Int64(reader.i64("int64")?),
        ElementType::Decimal128 => Value::Decimal128(reader.take_array("decimal128")?),
        ElementType::MinKey => Value::MinKey,
        ElementType::MaxKey => Value::MaxKey,
    })
}
