//! Interface to the external `jsonschema` validation engine.
//!
//! Everything that touches the engine lives here: draft selection, schema
//! compilation (including extra `$ref` resources), and the conversion of
//! engine errors into the [`ErrorObject`] records the reporting pipeline
//! works on.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema_path;

/// JSON Schema draft selection. When unset, the engine detects the draft
/// from the schema's `$schema` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaSpec {
    /// JSON Schema draft-04.
    Draft4,
    /// JSON Schema draft-06.
    Draft6,
    /// JSON Schema draft-07.
    Draft7,
    /// JSON Schema draft 2019-09.
    Draft2019,
    /// JSON Schema draft 2020-12.
    Draft2020,
}

impl SchemaSpec {
    const fn draft(self) -> jsonschema::Draft {
        match self {
            Self::Draft4 => jsonschema::Draft::Draft4,
            Self::Draft6 => jsonschema::Draft::Draft6,
            Self::Draft7 => jsonschema::Draft::Draft7,
            Self::Draft2019 => jsonschema::Draft::Draft201909,
            Self::Draft2020 => jsonschema::Draft::Draft202012,
        }
    }
}

/// Engine configuration derived from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Draft override; `None` lets the engine detect it.
    pub spec: Option<SchemaSpec>,
    /// Whether `format` keywords are validated.
    pub validate_formats: bool,
}

/// A schema failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CompileError(String);

/// Compiles `schema` into a reusable validator.
///
/// `resources` are additional schema documents referenced via `$ref`,
/// registered under the given URIs (normally their `$id`).
///
/// # Errors
///
/// Returns [`CompileError`] with the engine's description of the first
/// defect when the schema or one of the resources is invalid.
pub fn compile(
    schema: &Value,
    resources: Vec<(String, Value)>,
    options: &CompileOptions,
) -> Result<jsonschema::Validator, CompileError> {
    let mut builder = jsonschema::options();
    if let Some(spec) = options.spec {
        builder.with_draft(spec.draft());
    }
    if options.validate_formats {
        builder.should_validate_formats(true);
    }
    for (uri, contents) in resources {
        let resource = jsonschema::Resource::from_contents(contents)
            .map_err(|error| CompileError(error.to_string()))?;
        builder.with_resource(uri, resource);
    }
    builder
        .build(schema)
        .map_err(|error| CompileError(error.to_string()))
}

/// One validation error record.
///
/// Raw records carry `keyword` and `params`; merged records drop both and
/// keep only the synthesized message. The verbose-mode context fields
/// (`schema`, `parent_schema`, `data`) are populated only when requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorObject {
    /// Name of the failed schema rule (absent on merged records).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// JSON Pointer into the validated data; empty for the root.
    pub instance_path: String,
    /// Pointer to the failed rule: the engine's resolved path on raw
    /// records, the lexical `<$id>#<pointer>` form once rewritten.
    pub schema_path: String,
    /// Human-readable description of the failure.
    pub message: String,
    /// Keyword-specific detail (absent on merged records).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// The failed keyword's value (verbose mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    /// The schema object containing the failed keyword (verbose mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_schema: Option<Value>,
    /// The offending data value (verbose mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Validates `instance` and converts every engine error into a record.
///
/// The record order is the engine's, which is deterministic for a given
/// schema and instance.
#[must_use]
pub fn collect_errors(
    validator: &jsonschema::Validator,
    schema: &Value,
    instance: &Value,
    verbose: bool,
) -> Vec<ErrorObject> {
    validator
        .iter_errors(instance)
        .map(|error| to_error_object(&error, schema, verbose))
        .collect()
}

fn to_error_object(
    error: &jsonschema::ValidationError<'_>,
    schema: &Value,
    verbose: bool,
) -> ErrorObject {
    let instance_path = error.instance_path.to_string();
    let schema_path = error.schema_path.to_string();
    let message = error.to_string();
    let keyword = crate::pointer::split(&schema_path)
        .pop()
        .unwrap_or_default();
    let params = build_params(&keyword, &message, schema, &schema_path, &error.instance);
    let (schema_value, parent_schema) = if verbose {
        (
            schema_path::resolve(schema, &schema_path).cloned(),
            parent_of(&schema_path).and_then(|path| schema_path::resolve(schema, path).cloned()),
        )
    } else {
        (None, None)
    };
    ErrorObject {
        keyword: Some(keyword),
        instance_path,
        schema_path,
        message,
        params,
        schema: schema_value,
        parent_schema,
        data: verbose.then(|| error.instance.clone().into_owned()),
    }
}

fn parent_of(path: &str) -> Option<&str> {
    path.rfind('/').and_then(|index| path.get(..index))
}

/// Builds the keyword-specific `params` object the way the reporting
/// layers expect it; keywords with no structured detail yield `None`.
fn build_params(
    keyword: &str,
    message: &str,
    schema: &Value,
    schema_path: &str,
    instance: &Value,
) -> Option<Value> {
    let value = schema_path::resolve(schema, schema_path);
    let mut params = Map::new();
    match keyword {
        "required" => {
            let missing = quoted_name(message)
                .or_else(|| value.and_then(|list| first_missing_property(list, instance)))?;
            params.insert("missingProperty".to_owned(), Value::String(missing));
        }
        "type" => {
            params.insert("type".to_owned(), value?.clone());
        }
        "minimum" | "maximum" | "exclusiveMinimum" | "exclusiveMaximum" | "minLength"
        | "maxLength" | "minItems" | "maxItems" | "minProperties" | "maxProperties"
        | "multipleOf" => {
            params.insert("limit".to_owned(), value?.clone());
        }
        "pattern" => {
            params.insert("pattern".to_owned(), value?.clone());
        }
        "format" => {
            params.insert("format".to_owned(), value?.clone());
        }
        "enum" => {
            params.insert("allowedValues".to_owned(), value?.clone());
        }
        "const" => {
            params.insert("allowedValue".to_owned(), value?.clone());
        }
        "additionalProperties" => {
            let name = quoted_name(message)?;
            params.insert("additionalProperty".to_owned(), Value::String(name));
        }
        _ => return None,
    }
    Some(Value::Object(params))
}

/// Extracts the first quoted name (double or single quotes) from an
/// engine message such as `"height" is a required property`.
fn quoted_name(message: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let mut parts = message.split(quote);
        parts.next()?;
        if let Some(name) = parts.next() {
            if parts.next().is_some() {
                return Some(name.to_owned());
            }
        }
    }
    None
}

fn first_missing_property(required: &Value, instance: &Value) -> Option<String> {
    let list = required.as_array()?;
    let object = instance.as_object()?;
    list.iter()
        .filter_map(Value::as_str)
        .find(|name| !object.contains_key(*name))
        .map(str::to_owned)
}
