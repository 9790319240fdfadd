//! YAML ↔ JSON text conversion.
//!
//! Structural round-trip helpers for scripts that keep mod data in YAML.
//! Both directions go through `serde_json::Value`, so well-formed input
//! survives a full `yaml → json → yaml` trip with its structure intact
//! (formatting and key style are normalized, values are not).

use crate::error::{ErrorKind, Result};

/// Convert a YAML document to JSON text.
pub fn yaml_to_json(yaml: &str) -> Result<String> {
    let value: serde_json::Value =
        serde_yaml::from_str(yaml).map_err(|err| exn::Exn::from(ErrorKind::MalformedYaml(err.to_string())))?;
    serde_json::to_string_pretty(&value)
        .map_err(|err| exn::Exn::from(ErrorKind::MalformedYaml(err.to_string())))
}

/// Convert JSON text to a YAML document.
pub fn json_to_yaml(json: &str) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|err| exn::Exn::from(ErrorKind::MalformedJson(err.to_string())))?;
    serde_yaml::to_string(&value)
        .map_err(|err| exn::Exn::from(ErrorKind::MalformedYaml(err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_to_json() {
        let json = yaml_to_json("name: nathan\ntags:\n  - a\n  - b\ncount: 3\n").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "nathan");
        assert_eq!(value["tags"][1], "b");
        assert_eq!(value["count"], 3);
    }

    #[test]
    fn test_structural_round_trip() {
        let json = r#"{"a": [1, 2.5, "three"], "b": {"nested": true}, "c": null}"#;
        let yaml = json_to_yaml(json).unwrap();
        let back = yaml_to_json(&yaml).unwrap();
        let original: serde_json::Value = serde_json::from_str(json).unwrap();
        let round_tripped: serde_json::Value = serde_json::from_str(&back).unwrap();
        assert_eq!(original, round_tripped);
    }

    #[test]
    fn test_malformed_inputs_are_distinguishable() {
        let err = yaml_to_json("{ not: [ valid").unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedYaml(_)));
        let err = json_to_yaml("{ not json").unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedJson(_)));
    }
}
