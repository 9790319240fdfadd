//! Binary codec for [`Resource`].
//!
//! Little-endian throughout, length-prefixed strings, one tag byte per
//! value:
//!
//! ```text
//! resource: magic "DRES" | codec version u32 | class str | schema version u32
//!           | prop count u32 | (name str, value)*
//! str:      length u32 | UTF-8 bytes
//! value:    tag u8 | payload
//! ```
//!
//! Decoding is strict: unknown tags, truncation, non-UTF8 strings, out-of-
//! range booleans and trailing bytes are all `MalformedResource`. Encoding
//! is deterministic, so decode∘encode is the identity and encode∘decode
//! reproduces well-formed input byte-for-byte.

use crate::error::{ErrorKind, Result};
use crate::model::{Resource, Value};

const MAGIC: [u8; 4] = *b"DRES";
const CODEC_VERSION: u32 = 1;

mod tag {
    pub const BOOL: u8 = 0;
    pub const INT: u8 = 1;
    pub const UINT: u8 = 2;
    pub const FLOAT: u8 = 3;
    pub const STR: u8 = 4;
    pub const BYTES: u8 = 5;
    pub const REF: u8 = 6;
    pub const LIST: u8 = 7;
    pub const RECORD: u8 = 8;
}

/// Serialize a resource to its binary form.
pub fn encode(resource: &Resource) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&CODEC_VERSION.to_le_bytes());
    write_str(&mut out, &resource.class);
    out.extend_from_slice(&resource.version.to_le_bytes());
    write_props(&mut out, &resource.props);
    out
}

/// Parse a resource from its binary form.
pub fn decode(data: &[u8]) -> Result<Resource> {
    let mut reader = Reader { data, pos: 0 };
    if reader.take(4)? != MAGIC {
        exn::bail!(malformed("bad resource magic"));
    }
    let codec = reader.u32()?;
    if codec != CODEC_VERSION {
        exn::bail!(malformed(format!("unsupported codec version {codec}")));
    }
    let class = reader.string()?;
    let version = reader.u32()?;
    let props = reader.props()?;
    if reader.pos != reader.data.len() {
        exn::bail!(malformed(format!("{} trailing bytes", reader.data.len() - reader.pos)));
    }
    Ok(Resource { class, version, props })
}

fn malformed(detail: impl Into<String>) -> ErrorKind {
    ErrorKind::MalformedResource(detail.into())
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn write_props(out: &mut Vec<u8>, props: &[(String, Value)]) {
    out.extend_from_slice(&(props.len() as u32).to_le_bytes());
    for (name, value) in props {
        write_str(out, name);
        write_value(out, value);
    }
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Bool(b) => {
            out.push(tag::BOOL);
            out.push(u8::from(*b));
        },
        Value::Int(i) => {
            out.push(tag::INT);
            out.extend_from_slice(&i.to_le_bytes());
        },
        Value::Uint(u) => {
            out.push(tag::UINT);
            out.extend_from_slice(&u.to_le_bytes());
        },
        Value::Float(f) => {
            out.push(tag::FLOAT);
            out.extend_from_slice(&f.to_le_bytes());
        },
        Value::Str(s) => {
            out.push(tag::STR);
            write_str(out, s);
        },
        Value::Bytes(b) => {
            out.push(tag::BYTES);
            out.extend_from_slice(&(b.len() as u32).to_le_bytes());
            out.extend_from_slice(b);
        },
        Value::Ref(hash) => {
            out.push(tag::REF);
            out.extend_from_slice(&hash.to_le_bytes());
        },
        Value::List(items) => {
            out.push(tag::LIST);
            out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                write_value(out, item);
            }
        },
        Value::Record(fields) => {
            out.push(tag::RECORD);
            write_props(out, fields);
        },
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            },
            None => exn::bail!(malformed(format!("truncated at offset {}", self.pos))),
        }
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| exn::Exn::from(malformed("string is not UTF-8")))
    }

    fn props(&mut self) -> Result<Vec<(String, Value)>> {
        let count = self.u32()? as usize;
        let mut props = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let name = self.string()?;
            let value = self.value()?;
            props.push((name, value));
        }
        Ok(props)
    }

    fn value(&mut self) -> Result<Value> {
        Ok(match self.u8()? {
            tag::BOOL => match self.u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => exn::bail!(malformed(format!("boolean byte {other:#04x}"))),
            },
            tag::INT => Value::Int(i64::from_le_bytes(self.take(8)?.try_into().unwrap())),
            tag::UINT => Value::Uint(self.u64()?),
            tag::FLOAT => Value::Float(f64::from_le_bytes(self.take(8)?.try_into().unwrap())),
            tag::STR => Value::Str(self.string()?),
            tag::BYTES => {
                let len = self.u32()? as usize;
                Value::Bytes(self.take(len)?.to_vec())
            },
            tag::REF => Value::Ref(self.u64()?),
            tag::LIST => {
                let count = self.u32()? as usize;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(self.value()?);
                }
                Value::List(items)
            },
            tag::RECORD => Value::Record(self.props()?),
            other => exn::bail!(malformed(format!("unknown value tag {other:#04x}"))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Resource {
        Resource::new("entEntityTemplate")
            .with_prop("visible", Value::Bool(true))
            .with_prop("offset", Value::Int(-42))
            .with_prop("flags", Value::Uint(u64::MAX))
            .with_prop("scale", Value::Float(0.25))
            .with_prop("appearance", Value::Str("default".into()))
            .with_prop("cooked", Value::Bytes(vec![0x00, 0xff, 0x12]))
            .with_prop("mesh", Value::Ref(0xdead_beef_cafe))
            .with_prop(
                "tags",
                Value::List(vec![Value::Str("a".into()), Value::Str("b".into())]),
            )
            .with_prop(
                "transform",
                Value::Record(vec![
                    ("x".to_string(), Value::Float(1.0)),
                    ("y".to_string(), Value::Float(-0.0)),
                ]),
            )
    }

    #[test]
    fn test_round_trip() {
        let resource = sample();
        let encoded = encode(&resource);
        assert_eq!(decode(&encoded).unwrap(), resource);
        // Encoding is deterministic, so the bytes round-trip too.
        assert_eq!(encode(&decode(&encoded).unwrap()), encoded);
    }

    #[test]
    fn test_empty_resource() {
        let resource = Resource::new("gameDevice");
        assert_eq!(decode(&encode(&resource)).unwrap(), resource);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut encoded = encode(&sample());
        encoded.push(0);
        let err = decode(&encoded).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedResource(_)));
    }

    #[test]
    fn test_truncation_rejected() {
        let encoded = encode(&sample());
        for len in [0, 3, 7, encoded.len() / 2, encoded.len() - 1] {
            assert!(decode(&encoded[..len]).is_err(), "accepted truncation to {len}");
        }
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut encoded = encode(&sample());
        encoded[0] = b'X';
        assert!(decode(&encoded).is_err());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let encoded = encode(&Resource::new("x").with_prop("p", Value::Bool(false)));
        let mut broken = encoded.clone();
        // The value tag is the byte right before the trailing bool payload.
        let tag_pos = broken.len() - 2;
        broken[tag_pos] = 0x7f;
        assert!(decode(&broken).is_err());
    }

    #[test]
    fn test_bad_bool_rejected() {
        let encoded = encode(&Resource::new("x").with_prop("p", Value::Bool(false)));
        let mut broken = encoded;
        let last = broken.len() - 1;
        broken[last] = 2;
        assert!(decode(&broken).is_err());
    }
}
