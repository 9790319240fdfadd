//! Representation selection and conversion.

use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorKind, Result};
use crate::model::Resource;
use crate::{binary, json};

/// What a resolved file's payload should materialize as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Representation {
    /// Opaque bytes, exactly as stored.
    #[default]
    Raw,
    /// The parsed, schema-aware [`Resource`] object.
    Resource,
    /// JSON text.
    Json,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Raw => "raw",
            Self::Resource => "resource",
            Self::Json => "json",
        })
    }
}

impl FromStr for Representation {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(Self::Raw),
            "resource" => Ok(Self::Resource),
            "json" => Ok(Self::Json),
            other => exn::bail!(ErrorKind::UnknownRepresentation(other.to_string())),
        }
    }
}

/// The closed variant a file payload can take.
///
/// Only [`convert`] may move between variants; the rest of the system
/// treats a payload as opaque.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Raw(Vec<u8>),
    Resource(Resource),
    Json(String),
}

impl Payload {
    pub fn representation(&self) -> Representation {
        match self {
            Self::Raw(_) => Representation::Raw,
            Self::Resource(_) => Representation::Resource,
            Self::Json(_) => Representation::Json,
        }
    }

    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Self::Raw(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Self::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&str> {
        match self {
            Self::Json(text) => Some(text),
            _ => None,
        }
    }
}

/// Convert a payload to the requested representation.
///
/// All pairwise conversions are supported and lossless for well-formed
/// input; converting to the representation a payload already has is a
/// no-op. Failures (`MalformedResource` for bad binary input,
/// `MalformedJson` for bad JSON input) are recoverable and leave no state
/// behind.
///
/// # Examples
///
/// ```
/// use depot_resource::{Payload, Representation, Resource, Value, convert, encode};
///
/// let resource = Resource::new("gameDevice").with_prop("on", Value::Bool(true));
/// let raw = Payload::Raw(encode(&resource));
/// let json = convert(raw.clone(), Representation::Json).unwrap();
/// let back = convert(json, Representation::Raw).unwrap();
/// assert_eq!(back, raw);
/// ```
pub fn convert(payload: Payload, to: Representation) -> Result<Payload> {
    Ok(match (payload, to) {
        (payload, to) if payload.representation() == to => payload,
        (Payload::Raw(data), Representation::Resource) => Payload::Resource(binary::decode(&data)?),
        (Payload::Raw(data), Representation::Json) => {
            Payload::Json(json::to_json_string(&binary::decode(&data)?)?)
        },
        (Payload::Resource(resource), Representation::Raw) => Payload::Raw(binary::encode(&resource)),
        (Payload::Resource(resource), Representation::Json) => {
            Payload::Json(json::to_json_string(&resource)?)
        },
        (Payload::Json(text), Representation::Resource) => Payload::Resource(json::from_json(&text)?),
        (Payload::Json(text), Representation::Raw) => Payload::Raw(binary::encode(&json::from_json(&text)?)),
        // The identity arms above are exhaustive over same-representation
        // pairs; everything else was matched explicitly.
        _ => unreachable!("all representation pairs handled"),
    })
}
