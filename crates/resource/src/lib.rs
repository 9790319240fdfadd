//! Structured resources and representation conversion.
//!
//! A resolved game file materializes as one of three representations:
//! opaque bytes, a typed [`Resource`] object, or a JSON string. This crate
//! owns the closed [`Payload`] variant over those three and is the *only*
//! place allowed to transmute between them.
//!
//! Both codecs are total and deterministic, so conversion round-trips are
//! byte-for-byte for well-formed input: `decode(encode(r)) == r` and
//! `from_json(to_json(r)) == r`. Malformed input is a recoverable,
//! per-call failure — it never touches any store.

mod binary;
mod convert;
pub mod error;
mod json;
mod model;
mod text;

pub use crate::binary::{decode, encode};
pub use crate::convert::{Payload, Representation, convert};
pub use crate::json::{from_json, to_json, to_json_string};
pub use crate::model::{Resource, Value};
pub use crate::text::{json_to_yaml, yaml_to_json};
