//! Text-only JSON gateway.
//!
//! Callers on the far side of the boundary only ever see `&str` in and
//! `String` out. The `serde_json::Value` tree stays on this side, and every
//! `serde_json::Error` is rewrapped into a [`SerializationError`] with a
//! fixed, operation-specific prefix.
//!
//! Object keys are emitted in sorted order (serde_json's default map), so
//! [`pretty_print`] is idempotent.

use serde::{de::DeserializeOwned, de::IgnoredAny, Serialize};
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::error::{SerializationError, SerializationOp};

const PRETTY_INDENT: &[u8] = b"    ";

/// `true` iff `text` is one complete, well-formed JSON document.
pub fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(text).is_ok()
}

/// Parse `text` and re-serialize it with 4-space indentation.
///
/// # Errors
/// `Failed to pretty print JSON: ...` when `text` does not parse.
pub fn pretty_print(text: &str) -> Result<String, SerializationError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SerializationError::new(SerializationOp::PrettyPrint, e))?;
    write_pretty(&value).map_err(|e| SerializationError::new(SerializationOp::PrettyPrint, e))
}

/// Parse `text` into a `serde_json::Value`.
///
/// Not part of the text-only surface; native code uses it to work on the
/// tree directly.
pub fn parse_json(text: &str) -> Result<Value, SerializationError> {
    serde_json::from_str(text).map_err(|e| SerializationError::new(SerializationOp::Parse, e))
}

/// Serialize a `serde_json::Value`. `pretty` selects 4-space indentation,
/// otherwise the compact encoding.
pub fn stringify_json(value: &Value, pretty: bool) -> Result<String, SerializationError> {
    to_json_text(value, pretty)
}

/// Serialize any `Serialize` type through the gateway's error shape.
pub fn to_json_text<T: Serialize + ?Sized>(
    value: &T,
    pretty: bool,
) -> Result<String, SerializationError> {
    let encoded = if pretty {
        write_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    encoded.map_err(|e| SerializationError::new(SerializationOp::Stringify, e))
}

/// Decode `text` into `T`. Both syntax and shape mismatches report as parse
/// failures.
pub fn from_json_text<T: DeserializeOwned>(text: &str) -> Result<T, SerializationError> {
    serde_json::from_str(text).map_err(|e| SerializationError::new(SerializationOp::Parse, e))
}

fn write_pretty<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(PRETTY_INDENT));
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    const MALFORMED: &[&str] = &[
        "",
        "{",
        "{\"a\":}",
        "[1, 2,]",
        "{'single': 1}",
        "nul",
        "{\"a\": 1} trailing",
        "01",
    ];

    #[test]
    fn accepts_well_formed_documents() {
        for text in ["{}", "[]", "null", "true", "3.5", "\"s\"", " {\"a\": [1, {\"b\": null}]} "] {
            assert!(is_valid_json(text), "expected valid: {text:?}");
        }
    }

    #[test]
    fn rejects_malformed_documents() {
        for text in MALFORMED {
            assert!(!is_valid_json(text), "expected invalid: {text:?}");
        }
    }

    #[test]
    fn pretty_print_uses_four_space_indent() {
        let out = pretty_print(r#"{"b":[1,2],"a":{"x":true}}"#).unwrap();
        let expected = "{\n    \"a\": {\n        \"x\": true\n    },\n    \"b\": [\n        1,\n        2\n    ]\n}";
        assert_eq!(out, expected);
    }

    #[test]
    fn pretty_print_preserves_value_and_is_idempotent() {
        let inputs = [
            r#"{"freq": 100.5e6, "gain": -3, "name": "rsp1a", "tags": ["a", "b"], "agc": false}"#,
            r#"[{"k": 1}, null, 0.1, "é"]"#,
            "42",
        ];
        for text in inputs {
            let once = pretty_print(text).unwrap();
            assert_eq!(parse_json(&once).unwrap(), parse_json(text).unwrap());
            assert_eq!(pretty_print(&once).unwrap(), once);
        }
    }

    #[test]
    fn pretty_print_failure_carries_prefix() {
        for text in MALFORMED {
            let err = pretty_print(text).unwrap_err();
            assert_eq!(err.op, SerializationOp::PrettyPrint);
            assert!(
                err.to_string().starts_with("Failed to pretty print JSON: "),
                "unexpected message: {err}"
            );
        }
    }

    #[test]
    fn parse_failure_carries_prefix() {
        let err = parse_json("{").unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse JSON: "));
    }

    #[test]
    fn stringify_compact_and_pretty() {
        let value = json!({"b": 1, "a": [true]});
        assert_eq!(stringify_json(&value, false).unwrap(), r#"{"a":[true],"b":1}"#);
        assert_eq!(
            stringify_json(&value, true).unwrap(),
            "{\n    \"a\": [\n        true\n    ],\n    \"b\": 1\n}"
        );
    }

    #[test]
    fn stringify_failure_carries_prefix() {
        use std::collections::BTreeMap;

        // Non-string map keys cannot be encoded as JSON object keys.
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 1);
        let err = to_json_text(&bad, false).unwrap_err();
        assert_eq!(err.op, SerializationOp::Stringify);
        assert!(err.to_string().starts_with("Failed to stringify JSON: "));
    }

    #[test]
    fn typed_helpers_report_shape_mismatch_as_parse() {
        #[derive(Debug, Deserialize)]
        struct Gain {
            #[allow(dead_code)]
            db: f32,
        }

        let err = from_json_text::<Gain>(r#"{"db": "loud"}"#).unwrap_err();
        assert_eq!(err.op, SerializationOp::Parse);
    }
}
