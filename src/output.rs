//! Rendering annotated errors in the supported output formats.
//!
//! The format is a closed enum selected once at this boundary; each
//! variant has its own render function. Formatters never re-derive
//! messages, they only serialize what the pipeline produced, and every
//! one of them renders the no-location state as a filename-only line.

use clap::ValueEnum;
use serde::Serialize;

use crate::annotate::AnnotatedError;
use crate::codespan::{self, Options};
use crate::parsers::ParsedFile;

/// Error output formats of the `validate` and `test` commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ErrorFormat {
    /// Native structured dump of the annotated records.
    #[default]
    Js,
    /// Pretty-printed JSON array.
    Json,
    /// Single-line JSON array.
    JsonOneline,
    /// One `#<instancePath> - <message>` line per error.
    Jsonpath,
    /// One `<file>:<line>:<col> - <message>` line per error.
    Line,
    /// Source excerpts with carets under the offending spans.
    Pretty,
    /// Code Climate issue list JSON.
    CodeClimate,
    /// Print nothing.
    No,
}

impl ErrorFormat {
    /// Whether this format displays source positions and therefore needs
    /// the locator to run.
    #[must_use]
    pub const fn needs_locations(self) -> bool {
        matches!(self, Self::Line | Self::Pretty | Self::CodeClimate)
    }
}

/// Renders `errors` in the requested format. `Ok(None)` means the format
/// produces no output at all.
///
/// # Errors
///
/// Returns a serialization error only for the JSON-producing formats,
/// and only if serialization itself fails.
pub fn format_errors(
    format: ErrorFormat,
    errors: &[AnnotatedError],
    file: &ParsedFile,
    colors: bool,
) -> Result<Option<String>, serde_json::Error> {
    match format {
        ErrorFormat::No => Ok(None),
        ErrorFormat::Js => Ok(Some(format!("{errors:#?}"))),
        ErrorFormat::Json => serde_json::to_string_pretty(errors).map(Some),
        ErrorFormat::JsonOneline => serde_json::to_string(errors).map(Some),
        ErrorFormat::Jsonpath => Ok(Some(jsonpath_format(errors))),
        ErrorFormat::Line => Ok(Some(line_format(errors))),
        ErrorFormat::Pretty => Ok(Some(pretty_format(errors, file, colors))),
        ErrorFormat::CodeClimate => code_climate_format(errors).map(Some),
    }
}

fn jsonpath_format(errors: &[AnnotatedError]) -> String {
    errors
        .iter()
        .map(|error| format!("#{} - {}", error.error.instance_path, error.error.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn line_format(errors: &[AnnotatedError]) -> String {
    errors
        .iter()
        .map(|error| {
            let filename = &error.instance_location.filename;
            error.resolved_range().map_or_else(
                || format!("{filename} - {}", error.error.message),
                |range| {
                    format!(
                        "{filename}:{}:{} - {}",
                        range.start.line, range.start.col, error.error.message
                    )
                },
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pretty_format(errors: &[AnnotatedError], file: &ParsedFile, colors: bool) -> String {
    errors
        .iter()
        .map(|error| {
            let filename = &error.instance_location.filename;
            error.resolved_range().map_or_else(
                || format!("{filename}: {}", error.error.message),
                |range| {
                    codespan::codespan(
                        file.lines(),
                        range,
                        &Options {
                            colors,
                            filename: Some(filename.as_str()),
                            message: Some(error.error.message.as_str()),
                            ..Options::default()
                        },
                    )
                },
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ── Code Climate issues ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Issue<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    check_name: &'a str,
    description: &'a str,
    fingerprint: String,
    severity: &'static str,
    location: IssueLocation<'a>,
}

#[derive(Debug, Serialize)]
struct IssueLocation<'a> {
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    positions: Option<Positions>,
}

#[derive(Debug, Serialize)]
struct Positions {
    begin: Point,
    end: Point,
}

#[derive(Debug, Serialize)]
struct Point {
    line: usize,
    column: usize,
}

fn code_climate_format(errors: &[AnnotatedError]) -> Result<String, serde_json::Error> {
    let issues: Vec<Issue<'_>> = errors
        .iter()
        .map(|error| {
            let filename = &error.instance_location.filename;
            Issue {
                kind: "issue",
                check_name: error.error.keyword.as_deref().unwrap_or("jsonschema"),
                description: error.error.message.as_str(),
                fingerprint: fingerprint(filename, &error.error.instance_path, &error.error.message),
                severity: "major",
                location: IssueLocation {
                    path: filename.as_str(),
                    positions: error.resolved_range().map(|range| Positions {
                        begin: Point {
                            line: range.start.line,
                            column: range.start.col,
                        },
                        end: Point {
                            line: range.end.line,
                            column: range.end.col,
                        },
                    }),
                },
            }
        })
        .collect();
    serde_json::to_string(&issues)
}

/// Deterministic issue fingerprint: a blake3 hash over the filename,
/// instance path, and message, NUL-separated so no two distinct triples
/// can collide by concatenation.
#[must_use]
pub fn fingerprint(filename: &str, instance_path: &str, message: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(filename.as_bytes());
    hasher.update(&[0]);
    hasher.update(instance_path.as_bytes());
    hasher.update(&[0]);
    hasher.update(message.as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use crate::annotate::annotate;
    use crate::engine::ErrorObject;

    use super::*;

    fn sample_file() -> ParsedFile {
        ParsedFile::parse("data.json", "{\"height\": \"tall\"}")
            .unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    fn sample_error(instance_path: &str) -> ErrorObject {
        ErrorObject {
            keyword: Some("type".to_owned()),
            instance_path: instance_path.to_owned(),
            schema_path: "#/properties/height/type".to_owned(),
            message: "must be number".to_owned(),
            ..ErrorObject::default()
        }
    }

    fn annotated(instance_path: &str, resolve: bool) -> Vec<AnnotatedError> {
        annotate(vec![sample_error(instance_path)], &sample_file(), resolve)
    }

    /// No location-displaying format may fail or drop the message when the
    /// locator could not resolve a span.
    #[rstest]
    #[case(ErrorFormat::Line, "data.json - must be number")]
    #[case(ErrorFormat::Pretty, "data.json: must be number")]
    #[case(ErrorFormat::Jsonpath, "#/nowhere - must be number")]
    fn unresolved_location_falls_back(#[case] format: ErrorFormat, #[case] expected: &str) {
        let errors = annotated("/nowhere", true);
        let rendered = format_errors(format, &errors, &sample_file(), false)
            .unwrap_or_else(|e| panic!("format failed: {e}"))
            .unwrap_or_else(|| panic!("some output"));
        assert_eq!(rendered, expected);
    }

    #[test]
    fn code_climate_without_location_omits_positions() {
        let errors = annotated("/nowhere", true);
        let rendered = format_errors(ErrorFormat::CodeClimate, &errors, &sample_file(), false)
            .unwrap_or_else(|e| panic!("format failed: {e}"))
            .unwrap_or_else(|| panic!("some output"));
        let issues: serde_json::Value =
            serde_json::from_str(&rendered).unwrap_or_else(|e| panic!("bad JSON: {e}"));
        let issue = issues
            .get(0)
            .unwrap_or_else(|| panic!("one issue"));
        assert_eq!(issue.get("type"), Some(&json!("issue")));
        assert_eq!(issue.get("severity"), Some(&json!("major")));
        assert_eq!(
            issue.pointer("/location/path"),
            Some(&json!("data.json"))
        );
        assert_eq!(issue.pointer("/location/positions"), None);
        assert!(issue.get("fingerprint").is_some());
    }

    #[test]
    fn code_climate_with_location_has_positions() {
        let errors = annotated("/height", true);
        let rendered = format_errors(ErrorFormat::CodeClimate, &errors, &sample_file(), false)
            .unwrap_or_else(|e| panic!("format failed: {e}"))
            .unwrap_or_else(|| panic!("some output"));
        let issues: serde_json::Value =
            serde_json::from_str(&rendered).unwrap_or_else(|e| panic!("bad JSON: {e}"));
        assert_eq!(
            issues.pointer("/0/location/positions/begin/line"),
            Some(&json!(1))
        );
        assert_eq!(
            issues.pointer("/0/location/positions/begin/column"),
            Some(&json!(12))
        );
    }

    #[test]
    fn line_format_points_at_the_span() {
        let errors = annotated("/height", true);
        let rendered = format_errors(ErrorFormat::Line, &errors, &sample_file(), false)
            .unwrap_or_else(|e| panic!("format failed: {e}"))
            .unwrap_or_else(|| panic!("some output"));
        assert_eq!(rendered, "data.json:1:12 - must be number");
    }

    #[test]
    fn pretty_format_renders_a_code_span() {
        let errors = annotated("/height", true);
        let rendered = format_errors(ErrorFormat::Pretty, &errors, &sample_file(), false)
            .unwrap_or_else(|e| panic!("format failed: {e}"))
            .unwrap_or_else(|| panic!("some output"));
        assert!(rendered.starts_with("--> data.json:1:12"));
        assert!(rendered.contains("^^^^^^ must be number"));
    }

    /// Decoding the JSON output reproduces the identifying triples that
    /// were fed in.
    #[test]
    fn json_output_round_trips() {
        let errors = annotated("/height", true);
        let rendered = format_errors(ErrorFormat::Json, &errors, &sample_file(), false)
            .unwrap_or_else(|e| panic!("format failed: {e}"))
            .unwrap_or_else(|| panic!("some output"));
        let decoded: Vec<ErrorObject> =
            serde_json::from_str(&rendered).unwrap_or_else(|e| panic!("bad JSON: {e}"));
        assert_eq!(decoded.len(), 1);
        let record = decoded.first().unwrap_or_else(|| panic!("one record"));
        assert_eq!(record.instance_path, "/height");
        assert_eq!(record.schema_path, "#/properties/height/type");
        assert_eq!(record.message, "must be number");
    }

    #[test]
    fn oneline_json_is_single_line() {
        let errors = annotated("/height", true);
        let rendered = format_errors(ErrorFormat::JsonOneline, &errors, &sample_file(), false)
            .unwrap_or_else(|e| panic!("format failed: {e}"))
            .unwrap_or_else(|| panic!("some output"));
        assert_eq!(rendered.lines().count(), 1);
    }

    #[test]
    fn no_format_produces_no_output() {
        let errors = annotated("/height", true);
        let rendered = format_errors(ErrorFormat::No, &errors, &sample_file(), false)
            .unwrap_or_else(|e| panic!("format failed: {e}"));
        assert!(rendered.is_none());
    }

    #[test]
    fn fingerprint_is_deterministic_and_input_sensitive() {
        let base = fingerprint("data.json", "/height", "must be number");
        assert_eq!(base, fingerprint("data.json", "/height", "must be number"));
        assert_ne!(base, fingerprint("other.json", "/height", "must be number"));
        assert_ne!(base, fingerprint("data.json", "/weight", "must be number"));
        assert_ne!(base, fingerprint("data.json", "/height", "must be string"));
    }
}
