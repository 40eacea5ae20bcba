//! Command implementations and the plumbing they share.

pub mod compile;
pub mod validate;

use std::sync::Arc;

use serde_json::Value;

use crate::engine::{self, CompileOptions, ErrorObject};
use crate::error::ProgramError;
use crate::output::{self, ErrorFormat};
use crate::parsers::ParsedFile;
use crate::schema_path::SchemaPathIndex;
use crate::{annotate, merge};

/// Reads and decodes one document, wrapping failures with the filename.
pub(crate) async fn load_document(path: &str) -> Result<ParsedFile, ProgramError> {
    let text =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|error| ProgramError::InvalidFile {
                filename: path.to_owned(),
                reason: format!("cannot read file: {error}"),
            })?;
    ParsedFile::parse(path, &text).map_err(|error| ProgramError::InvalidFile {
        filename: path.to_owned(),
        reason: error.to_string(),
    })
}

/// Expands glob patterns into concrete paths. Literal paths pass through
/// unchanged, and a pattern that matches nothing stays as written so the
/// later read failure names it.
pub(crate) fn expand_patterns(patterns: &[String]) -> Result<Vec<String>, ProgramError> {
    let mut out = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            out.push(pattern.clone());
            continue;
        }
        let entries = glob::glob(pattern).map_err(|error| ProgramError::InvalidFile {
            filename: pattern.clone(),
            reason: format!("invalid glob pattern: {error}"),
        })?;
        let mut matched = false;
        for entry in entries {
            let path = entry.map_err(|error| ProgramError::InvalidFile {
                filename: pattern.clone(),
                reason: error.to_string(),
            })?;
            if path.is_file() {
                out.push(path.display().to_string());
                matched = true;
            }
        }
        if !matched {
            out.push(pattern.clone());
        }
    }
    Ok(out)
}

/// The compiled validator together with the schema document and its
/// lexical-path side table. The index holds addresses into the `Arc`ed
/// schema value, so the three travel together.
pub(crate) struct CompiledSchema {
    pub schema: Arc<Value>,
    pub index: Arc<SchemaPathIndex>,
    pub validator: Arc<jsonschema::Validator>,
}

/// Loads the schema and its `$ref` resources, compiles the validator, and
/// builds the schema-path side table.
pub(crate) async fn build_validator(
    schema_file: &str,
    ref_files: &[String],
    options: &CompileOptions,
) -> Result<CompiledSchema, ProgramError> {
    let schema_doc = load_document(schema_file).await?;
    let schema = Arc::new(schema_doc.data().clone());

    let mut resources = Vec::with_capacity(ref_files.len());
    for path in ref_files {
        let doc = load_document(path).await?;
        let id = doc
            .data()
            .get("$id")
            .and_then(Value::as_str)
            .ok_or_else(|| ProgramError::SchemaInvalid {
                filename: path.clone(),
                reason: "referenced schema has no $id to register it under".to_owned(),
            })?
            .to_owned();
        resources.push((id, doc.data().clone()));
    }

    let validator = engine::compile(&schema, resources, options).map_err(|error| {
        ProgramError::SchemaInvalid {
            filename: schema_file.to_owned(),
            reason: error.to_string(),
        }
    })?;
    let index = Arc::new(SchemaPathIndex::build(&schema));
    Ok(CompiledSchema {
        schema,
        index,
        validator: Arc::new(validator),
    })
}

/// Runs the reporting pipeline over one file's raw errors: schema-path
/// rewrite, optional merge, location annotation, and formatting.
pub(crate) fn render_file_errors(
    mut raw: Vec<ErrorObject>,
    schema: &Value,
    index: &SchemaPathIndex,
    parsed: &ParsedFile,
    format: ErrorFormat,
    merge_errors: bool,
    force_locations: bool,
    colors: bool,
) -> Result<Option<String>, ProgramError> {
    index.rewrite(schema, &mut raw);
    let errors = if merge_errors {
        merge::merge_errors(&raw, schema)
    } else {
        raw
    };
    let resolve = format.needs_locations() || force_locations;
    let annotated = annotate::annotate(errors, parsed, resolve);
    output::format_errors(format, &annotated, parsed, colors).map_err(ProgramError::from)
}
