//! Position-tracking YAML decoding.
//!
//! YAML is parsed once with `saphyr`'s marked node tree and lowered into the
//! shared spanned [`Node`] representation, so the locator walk is identical
//! for every input format. Multi-document streams use the first document.

use saphyr::{LoadableYamlNode, MarkedYaml, Scalar, YamlData};
use serde_json::{Number, Value};

use super::node::{Node, NodeKind};
use super::{Location, LocationRange, ParseError};

/// Parses a YAML document into decoded data plus its spanned tree.
///
/// An empty stream decodes to `null` with no locatable tree.
pub(crate) fn parse(input: &str) -> Result<(Value, Option<Node>), ParseError> {
    let docs =
        MarkedYaml::load_from_str(input).map_err(|error| ParseError::Yaml(error.to_string()))?;
    let Some(doc) = docs.first() else {
        return Ok((Value::Null, None));
    };
    let tree = convert(doc);
    Ok((tree.to_value(), Some(tree)))
}

/// Lowers a marked YAML node into the shared spanned tree. Values the JSON
/// data model cannot represent (non-finite floats, unresolved aliases)
/// become `null` while keeping their span.
fn convert(node: &MarkedYaml<'_>) -> Node {
    let span = span_of(node);
    let kind = match &node.data {
        YamlData::Value(scalar) => scalar_kind(scalar),
        YamlData::Sequence(items) => NodeKind::Array(items.iter().map(convert).collect()),
        YamlData::Mapping(entries) => {
            let mut members = Vec::with_capacity(entries.len());
            for (key, value) in entries.iter() {
                members.push((key_string(key), convert(value)));
            }
            NodeKind::Object(members)
        }
        _ => NodeKind::Null,
    };
    Node { kind, span }
}

fn scalar_kind(scalar: &Scalar<'_>) -> NodeKind {
    match scalar {
        Scalar::Null => NodeKind::Null,
        Scalar::Boolean(value) => NodeKind::Bool(*value),
        Scalar::Integer(value) => NodeKind::Number(Number::from(*value)),
        Scalar::FloatingPoint(value) => {
            Number::from_f64(value.into_inner()).map_or(NodeKind::Null, NodeKind::Number)
        }
        Scalar::String(value) => NodeKind::String(value.clone().into_owned()),
    }
}

/// Mapping keys are matched against JSON-Pointer segments, which are
/// strings; non-string keys are stringified the way they would appear in
/// the decoded JSON value.
fn key_string(key: &MarkedYaml<'_>) -> String {
    match convert(key).to_value() {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn span_of(node: &MarkedYaml<'_>) -> LocationRange {
    LocationRange {
        start: location(node.span.start),
        end: location(node.span.end),
    }
}

/// `saphyr` markers use 1-based lines and 0-based columns.
fn location(marker: saphyr::Marker) -> Location {
    Location {
        line: marker.line(),
        col: marker.col() + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> (Value, Option<Node>) {
        parse(input).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    fn locate(input: &str, path: &[&str]) -> Option<LocationRange> {
        let segments: Vec<String> = path.iter().map(|s| (*s).to_owned()).collect();
        let (_, tree) = parse_ok(input);
        tree.and_then(|node| node.find(&segments).map(|found| found.span))
    }

    #[test]
    fn mapping_decodes_to_object() {
        let (data, _) = parse_ok("a: 1\nb: foo\n");
        assert_eq!(data, serde_json::json!({"a": 1, "b": "foo"}));
    }

    #[test]
    fn scalar_types_decode() {
        let (data, _) = parse_ok("n: null\nf: 1.5\nt: true\ns: 'x'\n");
        assert_eq!(
            data,
            serde_json::json!({"n": null, "f": 1.5, "t": true, "s": "x"})
        );
    }

    #[test]
    fn plain_scalar_location() {
        let span = locate("a: 1\nb: foo\n", &["b"]).unwrap_or_else(|| panic!("no span"));
        assert_eq!(span.start, Location { line: 2, col: 4 });
        assert_eq!(span.end, Location { line: 2, col: 7 });
    }

    #[test]
    fn sequence_element_location() {
        let span =
            locate("items:\n  - 1\n  - two\n", &["items", "1"]).unwrap_or_else(|| panic!("no span"));
        assert_eq!(span.start, Location { line: 3, col: 5 });
        assert_eq!(span.end, Location { line: 3, col: 8 });
    }

    #[test]
    fn missing_path_is_none() {
        assert_eq!(locate("a: 1\n", &["b"]), None);
        assert_eq!(locate("a: 1\n", &["a", "0"]), None);
    }

    #[test]
    fn first_document_wins() {
        let (data, _) = parse_ok("---\na: 1\n---\nb: 2\n");
        assert_eq!(data, serde_json::json!({"a": 1}));
    }

    #[test]
    fn empty_stream_decodes_to_null() {
        let (data, _) = parse_ok("");
        assert_eq!(data, Value::Null);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(parse("a: [1, 2\n").is_err());
    }

    #[test]
    fn integer_mapping_keys_are_stringified() {
        let (data, tree) = parse_ok("1: one\n");
        assert_eq!(data, serde_json::json!({"1": "one"}));
        let segments = vec!["1".to_owned()];
        assert!(tree.and_then(|node| node.find(&segments).cloned()).is_some());
    }
}
