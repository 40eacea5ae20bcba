//! Input decoding and source-location lookup for JSON, JSONC, and YAML.
//!
//! Every input file becomes a [`ParsedFile`]: the decoded value tree, the
//! raw source lines for excerpt rendering, and a locator that maps a path
//! of object keys / array indices back to the line/column span of the
//! tokens that produced the value. Plain JSON is decoded with `serde_json`
//! first; the position-tracking syntax tree is built lazily, only when a
//! location is actually requested, and at most once per file.

mod json;
mod node;
mod yaml;

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use node::{Node, NodeKind};

/// A 1-based line/column position. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub col: usize,
}

/// The source span of a value: from its first character to one past its
/// last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRange {
    /// Position of the first character of the value.
    pub start: Location,
    /// Position one past the last character of the value.
    pub end: Location,
}

/// Errors from decoding an input document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Malformed JSON or JSONC.
    #[error("{message} at line {line} column {col}")]
    Syntax {
        /// 1-based line of the offending character.
        line: usize,
        /// 1-based column of the offending character.
        col: usize,
        /// What the parser expected or found.
        message: String,
    },

    /// Malformed YAML (the message carries the parser's own position info).
    #[error("{0}")]
    Yaml(String),

    /// The file extension maps to no known format.
    #[error("unsupported file type '{0}'")]
    UnsupportedType(String),
}

/// Input formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Plain JSON (`.json`).
    Json,
    /// JSON with comments and trailing commas (`.jsonc`).
    Jsonc,
    /// YAML (`.yaml` / `.yml`).
    Yaml,
}

impl FileType {
    /// Determines the format from a file path's extension.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match Path::new(path).extension()?.to_str()? {
            "json" => Some(Self::Json),
            "jsonc" => Some(Self::Jsonc),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// A decoded input file together with its location lookup capability.
///
/// Created once per input file and immutable afterwards; each file owns its
/// source text and decoded tree outright, so files can be processed
/// independently.
#[derive(Debug)]
pub struct ParsedFile {
    filename: String,
    data: Value,
    lines: Vec<String>,
    locator: Locator,
}

/// How the spanned tree is obtained: eagerly (JSONC, YAML) or lazily from
/// the retained source text (plain JSON fast path).
#[derive(Debug)]
enum Locator {
    Json {
        text: String,
        tree: OnceLock<Option<Node>>,
    },
    Tree(Option<Node>),
}

impl ParsedFile {
    /// Decodes `input`, picking the format from the filename's extension.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnsupportedType`] for unknown extensions and a
    /// syntax error when the document is malformed.
    pub fn parse(filename: impl Into<String>, input: &str) -> Result<Self, ParseError> {
        let filename = filename.into();
        let file_type = FileType::from_path(&filename).ok_or_else(|| {
            let extension = Path::new(&filename)
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default();
            ParseError::UnsupportedType(extension)
        })?;
        Self::parse_as(filename, input, file_type)
    }

    /// Decodes `input` as an explicit format, ignoring the extension.
    ///
    /// # Errors
    ///
    /// Returns a syntax error when the document is malformed.
    pub fn parse_as(
        filename: impl Into<String>,
        input: &str,
        file_type: FileType,
    ) -> Result<Self, ParseError> {
        let filename = filename.into();
        let lines = input.split('\n').map(str::to_owned).collect();
        let (data, locator) = match file_type {
            FileType::Json => match serde_json::from_str(input) {
                Ok(data) => (
                    data,
                    Locator::Json {
                        text: input.to_owned(),
                        tree: OnceLock::new(),
                    },
                ),
                Err(error) => return Err(json_error(input, &error)),
            },
            FileType::Jsonc => {
                let tree = json::parse_tree(input, json::Mode::Jsonc)?;
                (tree.to_value(), Locator::Tree(Some(tree)))
            }
            FileType::Yaml => {
                let (data, tree) = yaml::parse(input)?;
                (data, Locator::Tree(tree))
            }
        };
        Ok(Self {
            filename,
            data,
            lines,
            locator,
        })
    }

    /// The filename this document was decoded from.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The decoded value tree.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The raw source text split by newline, for excerpt rendering.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Maps a path of object keys / stringified array indices to the span
    /// of the value it resolves to in the original source text.
    ///
    /// Returns `None` when the path does not resolve: absent keys,
    /// duplicate (ambiguous) keys, out-of-range indices, or shape
    /// mismatches. Repeated calls with the same path return identical
    /// ranges; the lazy syntax tree is built at most once.
    #[must_use]
    pub fn locate(&self, path: &[String]) -> Option<LocationRange> {
        let tree = match &self.locator {
            Locator::Tree(tree) => tree.as_ref()?,
            Locator::Json { text, tree } => tree
                .get_or_init(|| {
                    tracing::debug!(filename = %self.filename, "building JSON syntax tree");
                    json::parse_tree(text, json::Mode::Json).ok()
                })
                .as_ref()?,
        };
        tree.find(path).map(|found| found.span)
    }
}

/// Reruns the spanned parser over input the fast path rejected, so JSON
/// syntax errors speak with one voice regardless of which parser found
/// them first.
fn json_error(input: &str, error: &serde_json::Error) -> ParseError {
    match json::parse_tree(input, json::Mode::Json) {
        Err(parse_error) => parse_error,
        Ok(_) => ParseError::Syntax {
            line: error.line(),
            col: error.column(),
            message: "invalid JSON".to_owned(),
        },
    }
}
