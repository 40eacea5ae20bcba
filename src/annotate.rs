//! Attaching source locations to error records.
//!
//! Each error's instance path is unescaped into path segments and handed
//! to the file's locator. Every annotated record carries the filename;
//! `start`/`end` are both present when the locator resolved a span and
//! both absent otherwise. That no-location state is not an error; every
//! output format must render it gracefully.

use serde::Serialize;

use crate::engine::ErrorObject;
use crate::parsers::{Location, LocationRange, ParsedFile};
use crate::pointer;

/// Where an error's instance path landed in the source file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceLocation {
    /// The file the error concerns. Always present.
    pub filename: String,
    /// Start of the offending span, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Location>,
    /// One past the end of the offending span, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Location>,
}

/// An error record plus its resolved source location.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedError {
    /// The underlying (raw or merged) error record.
    #[serde(flatten)]
    pub error: ErrorObject,
    /// The error's place in the source file.
    pub instance_location: InstanceLocation,
}

impl AnnotatedError {
    /// The resolved span, when both endpoints are present.
    #[must_use]
    pub fn resolved_range(&self) -> Option<LocationRange> {
        match (self.instance_location.start, self.instance_location.end) {
            (Some(start), Some(end)) => Some(LocationRange { start, end }),
            _ => None,
        }
    }
}

/// Annotates every error with `file`'s name and, when `resolve_locations`
/// is set, the span its instance path points at.
///
/// Location resolution is skipped entirely for formats that never display
/// positions, so the lazy syntax tree is not built for nothing.
#[must_use]
pub fn annotate(
    errors: Vec<ErrorObject>,
    file: &ParsedFile,
    resolve_locations: bool,
) -> Vec<AnnotatedError> {
    errors
        .into_iter()
        .map(|error| {
            let range = if resolve_locations {
                file.locate(&pointer::split(&error.instance_path))
            } else {
                None
            };
            AnnotatedError {
                instance_location: InstanceLocation {
                    filename: file.filename().to_owned(),
                    start: range.map(|span| span.start),
                    end: range.map(|span| span.end),
                },
                error,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_at(instance_path: &str) -> ErrorObject {
        ErrorObject {
            instance_path: instance_path.to_owned(),
            message: "must be number".to_owned(),
            ..ErrorObject::default()
        }
    }

    fn file() -> ParsedFile {
        ParsedFile::parse("data.json", r#"{"a/b": {"~x": [10, 20]}}"#)
            .unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn escaped_pointer_segments_resolve() {
        let annotated = annotate(vec![error_at("/a~1b/~0x/1")], &file(), true);
        let first = annotated.first().unwrap_or_else(|| panic!("one record"));
        let range = first
            .resolved_range()
            .unwrap_or_else(|| panic!("resolved range"));
        assert_eq!(range.start, Location { line: 1, col: 21 });
        assert_eq!(range.end, Location { line: 1, col: 23 });
    }

    #[test]
    fn start_and_end_are_both_absent_on_a_miss() {
        let annotated = annotate(vec![error_at("/missing")], &file(), true);
        let first = annotated.first().unwrap_or_else(|| panic!("one record"));
        assert_eq!(first.instance_location.filename, "data.json");
        assert!(first.instance_location.start.is_none());
        assert!(first.instance_location.end.is_none());
        assert!(first.resolved_range().is_none());
    }

    #[test]
    fn resolution_can_be_skipped() {
        let annotated = annotate(vec![error_at("/a~1b")], &file(), false);
        let first = annotated.first().unwrap_or_else(|| panic!("one record"));
        assert!(first.resolved_range().is_none());
        assert_eq!(first.instance_location.filename, "data.json");
    }

    #[test]
    fn root_pointer_resolves_to_the_document() {
        let annotated = annotate(vec![error_at("")], &file(), true);
        let first = annotated.first().unwrap_or_else(|| panic!("one record"));
        let range = first
            .resolved_range()
            .unwrap_or_else(|| panic!("resolved range"));
        assert_eq!(range.start, Location { line: 1, col: 1 });
    }
}
