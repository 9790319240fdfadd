//! JSON codec for [`Resource`].
//!
//! The JSON form is a *total* serialization, not a lossy summary: every
//! value carries an explicit type tag, signed/unsigned stay distinct,
//! bytes are hex strings, and property order is kept in arrays. That is
//! what makes `from_json(to_json(r)) == r` hold exactly, and with it the
//! binary↔JSON round-trip.
//!
//! ```json
//! {
//!   "class": "entEntityTemplate",
//!   "version": 1,
//!   "props": [
//!     { "name": "visible", "value": { "type": "bool", "value": true } },
//!     { "name": "cooked", "value": { "type": "bytes", "value": "00ff12" } }
//!   ]
//! }
//! ```
//!
//! Parsing is strict — unknown keys, missing keys and mistyped values are
//! all `MalformedJson`. Leniency here would silently drop data and break
//! the round-trip contract.

use serde_json::{Map, Value as Json, json};

use crate::error::{ErrorKind, Result};
use crate::model::{Resource, Value};

/// Serialize a resource to a JSON value.
///
/// Fails with `MalformedResource` if the resource carries a non-finite
/// float, which JSON cannot represent.
pub fn to_json(resource: &Resource) -> Result<Json> {
    Ok(json!({
        "class": resource.class,
        "version": resource.version,
        "props": props_to_json(&resource.props)?,
    }))
}

/// Serialize a resource to pretty-printed JSON text.
pub fn to_json_string(resource: &Resource) -> Result<String> {
    // Serializing a tree we just built cannot fail.
    Ok(serde_json::to_string_pretty(&to_json(resource)?).expect("valid JSON tree"))
}

/// Parse a resource from JSON text.
pub fn from_json(text: &str) -> Result<Resource> {
    let root: Json = serde_json::from_str(text).map_err(|err| exn::Exn::from(malformed(err.to_string())))?;
    let root = object(&root, &["class", "version", "props"])?;
    let class = root["class"]
        .as_str()
        .ok_or_else(|| exn::Exn::from(malformed("\"class\" must be a string")))?
        .to_string();
    let version = root["version"]
        .as_u64()
        .filter(|&v| v <= u64::from(u32::MAX))
        .ok_or_else(|| exn::Exn::from(malformed("\"version\" must be a u32")))?;
    let props = props_from_json(&root["props"])?;
    Ok(Resource { class, version: version as u32, props })
}

fn malformed(detail: impl Into<String>) -> ErrorKind {
    ErrorKind::MalformedJson(detail.into())
}

fn props_to_json(props: &[(String, Value)]) -> Result<Json> {
    let entries = props
        .iter()
        .map(|(name, value)| Ok(json!({ "name": name, "value": value_to_json(value)? })))
        .collect::<Result<Vec<_>>>()?;
    Ok(Json::Array(entries))
}

fn value_to_json(value: &Value) -> Result<Json> {
    let payload = match value {
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Uint(u) => json!(u),
        Value::Float(f) => match serde_json::Number::from_f64(*f) {
            Some(number) => Json::Number(number),
            None => exn::bail!(ErrorKind::MalformedResource(format!("non-finite float {f}"))),
        },
        Value::Str(s) => json!(s),
        Value::Bytes(b) => json!(hex_encode(b)),
        Value::Ref(hash) => json!(hash),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect::<Result<_>>()?),
        Value::Record(fields) => props_to_json(fields)?,
    };
    Ok(json!({ "type": value.type_name(), "value": payload }))
}

fn props_from_json(json: &Json) -> Result<Vec<(String, Value)>> {
    let entries = json.as_array().ok_or_else(|| exn::Exn::from(malformed("props must be an array")))?;
    entries
        .iter()
        .map(|entry| {
            let entry = object(entry, &["name", "value"])?;
            let name = entry["name"]
                .as_str()
                .ok_or_else(|| exn::Exn::from(malformed("property name must be a string")))?;
            Ok((name.to_string(), value_from_json(&entry["value"])?))
        })
        .collect()
}

fn value_from_json(json: &Json) -> Result<Value> {
    let tagged = object(json, &["type", "value"])?;
    let kind = tagged["type"].as_str().ok_or_else(|| exn::Exn::from(malformed("\"type\" must be a string")))?;
    let payload = &tagged["value"];
    let mistyped = || exn::Exn::from(malformed(format!("bad payload for type {kind:?}")));
    Ok(match kind {
        "bool" => Value::Bool(payload.as_bool().ok_or_else(mistyped)?),
        "int" => Value::Int(payload.as_i64().ok_or_else(mistyped)?),
        "uint" => Value::Uint(payload.as_u64().ok_or_else(mistyped)?),
        "float" => Value::Float(payload.as_f64().ok_or_else(mistyped)?),
        "str" => Value::Str(payload.as_str().ok_or_else(mistyped)?.to_string()),
        "bytes" => Value::Bytes(hex_decode(payload.as_str().ok_or_else(mistyped)?)?),
        "ref" => Value::Ref(payload.as_u64().ok_or_else(mistyped)?),
        "list" => Value::List(
            payload
                .as_array()
                .ok_or_else(mistyped)?
                .iter()
                .map(value_from_json)
                .collect::<Result<_>>()?,
        ),
        "record" => Value::Record(props_from_json(payload)?),
        other => exn::bail!(malformed(format!("unknown value type {other:?}"))),
    })
}

/// Require an object with exactly the given keys.
fn object<'a>(json: &'a Json, keys: &[&str]) -> Result<&'a Map<String, Json>> {
    let map = json.as_object().ok_or_else(|| exn::Exn::from(malformed("expected an object")))?;
    for key in keys {
        if !map.contains_key(*key) {
            exn::bail!(malformed(format!("missing key {key:?}")));
        }
    }
    if map.len() != keys.len() {
        let extra: Vec<_> = map.keys().filter(|key| !keys.contains(&key.as_str())).collect();
        exn::bail!(malformed(format!("unexpected keys {extra:?}")));
    }
    Ok(map)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        use std::fmt::Write;
        _ = write!(out, "{byte:02x}");
        out
    })
}

fn hex_decode(text: &str) -> Result<Vec<u8>> {
    // The ASCII check also keeps the two-byte slices below on char
    // boundaries.
    if text.len() % 2 != 0 || !text.is_ascii() {
        exn::bail!(malformed("bad hex string"));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16)
                .map_err(|_| exn::Exn::from(malformed(format!("bad hex at offset {i}"))))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Resource {
        Resource::new("entEntityTemplate")
            .with_prop("visible", Value::Bool(true))
            .with_prop("offset", Value::Int(-42))
            .with_prop("flags", Value::Uint(u64::MAX))
            .with_prop("scale", Value::Float(-0.25))
            .with_prop("cooked", Value::Bytes(vec![0x00, 0xff, 0x12]))
            .with_prop("mesh", Value::Ref(0xdead_beef))
            .with_prop("tags", Value::List(vec![Value::Str("a".into()), Value::Bool(false)]))
            .with_prop("t", Value::Record(vec![("x".to_string(), Value::Float(1.5))]))
    }

    #[test]
    fn test_round_trip() {
        let resource = sample();
        let text = to_json_string(&resource).unwrap();
        assert_eq!(from_json(&text).unwrap(), resource);
    }

    #[test]
    fn test_round_trip_preserves_binary_bytes() {
        let resource = sample();
        let binary = crate::binary::encode(&resource);
        let text = to_json_string(&resource).unwrap();
        assert_eq!(crate::binary::encode(&from_json(&text).unwrap()), binary);
    }

    #[test]
    fn test_large_uint_survives() {
        // Distinct from Int: u64::MAX doesn't fit i64 and must not be
        // coerced through a float on either side.
        let resource = Resource::new("x").with_prop("flags", Value::Uint(u64::MAX));
        let text = to_json_string(&resource).unwrap();
        assert_eq!(from_json(&text).unwrap().prop("flags"), Some(&Value::Uint(u64::MAX)));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let resource = Resource::new("x").with_prop("bad", Value::Float(f64::NAN));
        let err = to_json_string(&resource).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedResource(_)));
    }

    #[rstest]
    #[case::not_json("not json at all")]
    #[case::not_object("[1, 2]")]
    #[case::missing_keys(r#"{"class": "x"}"#)]
    #[case::extra_keys(r#"{"class": "x", "version": 1, "props": [], "other": 1}"#)]
    #[case::bad_version(r#"{"class": "x", "version": -1, "props": []}"#)]
    #[case::untagged_value(r#"{"class": "x", "version": 1, "props": [{"name": "p", "value": 1}]}"#)]
    #[case::unknown_type(r#"{"class": "x", "version": 1, "props": [{"name": "p", "value": {"type": "quaternion", "value": 1}}]}"#)]
    #[case::int_with_fraction(r#"{"class": "x", "version": 1, "props": [{"name": "p", "value": {"type": "int", "value": 1.5}}]}"#)]
    #[case::negative_uint(r#"{"class": "x", "version": 1, "props": [{"name": "p", "value": {"type": "uint", "value": -1}}]}"#)]
    #[case::odd_hex(r#"{"class": "x", "version": 1, "props": [{"name": "p", "value": {"type": "bytes", "value": "abc"}}]}"#)]
    #[case::bad_hex(r#"{"class": "x", "version": 1, "props": [{"name": "p", "value": {"type": "bytes", "value": "zz"}}]}"#)]
    #[case::non_ascii_hex(r#"{"class": "x", "version": 1, "props": [{"name": "p", "value": {"type": "bytes", "value": "αβ"}}]}"#)]
    fn test_malformed_json_rejected(#[case] text: &str) {
        let err = from_json(text).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedJson(_)));
    }

    #[rstest]
    #[case(&[], "")]
    #[case(&[0x00], "00")]
    #[case(&[0xde, 0xad, 0xbe, 0xef], "deadbeef")]
    fn test_hex(#[case] bytes: &[u8], #[case] text: &str) {
        assert_eq!(hex_encode(bytes), text);
        assert_eq!(hex_decode(text).unwrap(), bytes);
    }
}
