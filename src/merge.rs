//! Merging raw validator errors into fewer, more readable records.
//!
//! Raw engine errors are grouped by instance path (first-appearance order)
//! and each distinct complaint is restated as a `must …` message derived
//! from the failing keyword and its value in the schema document. Merging
//! is lossy by design: several raw errors that say the same thing about
//! one location collapse into a single record.

use indexmap::IndexMap;
use serde_json::Value;

use crate::engine::ErrorObject;
use crate::schema_path;

/// Collapses `errors` into one record per distinct complaint per instance
/// path, preserving the order in which instance paths first appear.
///
/// Merged records drop `keyword` and `params`; the verbose context fields
/// of one representative contributing error are carried over.
#[must_use]
pub fn merge_errors(errors: &[ErrorObject], schema: &Value) -> Vec<ErrorObject> {
    let mut groups: IndexMap<&str, Vec<&ErrorObject>> = IndexMap::new();
    for error in errors {
        groups
            .entry(error.instance_path.as_str())
            .or_default()
            .push(error);
    }

    let mut merged = Vec::new();
    for group in groups.values() {
        let mut complaints: Vec<(String, &ErrorObject)> = Vec::new();
        for &error in group {
            let message = strip_to_must(synthesize_message(error, schema));
            if !complaints.iter().any(|(seen, _)| seen == &message) {
                complaints.push((message, error));
            }
        }
        for (message, representative) in complaints {
            merged.push(simplified(representative, message));
        }
    }
    merged
}

fn simplified(error: &ErrorObject, message: String) -> ErrorObject {
    ErrorObject {
        keyword: None,
        instance_path: error.instance_path.clone(),
        schema_path: error.schema_path.clone(),
        message,
        params: None,
        schema: error.schema.clone(),
        parent_schema: error.parent_schema.clone(),
        data: error.data.clone(),
    }
}

/// Restates an error as a `must …` sentence. Keywords without a template
/// fall back to the engine's own message.
fn synthesize_message(error: &ErrorObject, schema: &Value) -> String {
    template_message(error, schema).unwrap_or_else(|| error.message.clone())
}

fn template_message(error: &ErrorObject, schema: &Value) -> Option<String> {
    let keyword = error.keyword.as_deref()?;
    let value = schema_path::resolve(schema, &error.schema_path);
    match keyword {
        "required" => {
            let name = error.params.as_ref()?.get("missingProperty")?.as_str()?;
            Some(format!("must have required property '{name}'"))
        }
        "type" => Some(format!("must be {}", type_text(value?))),
        "enum" => Some("must be equal to one of the allowed values".to_owned()),
        "const" => Some("must be equal to constant".to_owned()),
        "minimum" => Some(format!("must be >= {}", value?)),
        "maximum" => Some(format!("must be <= {}", value?)),
        "exclusiveMinimum" => Some(format!("must be > {}", value?)),
        "exclusiveMaximum" => Some(format!("must be < {}", value?)),
        "multipleOf" => Some(format!("must be multiple of {}", value?)),
        "minLength" => Some(format!("must NOT have fewer than {} characters", value?)),
        "maxLength" => Some(format!("must NOT have more than {} characters", value?)),
        "minItems" => Some(format!("must NOT have fewer than {} items", value?)),
        "maxItems" => Some(format!("must NOT have more than {} items", value?)),
        "minProperties" => Some(format!("must NOT have fewer than {} properties", value?)),
        "maxProperties" => Some(format!("must NOT have more than {} properties", value?)),
        "uniqueItems" => Some("must NOT have duplicate items".to_owned()),
        "pattern" => Some(format!("must match pattern \"{}\"", value?.as_str()?)),
        "format" => Some(format!("must match format \"{}\"", value?.as_str()?)),
        "additionalProperties" => Some("must NOT have additional properties".to_owned()),
        "not" => Some("must NOT be valid".to_owned()),
        "anyOf" | "oneOf" => Some(
            union_message(value)
                .unwrap_or_else(|| format!("must match a schema in {keyword}")),
        ),
        _ => None,
    }
}

fn type_text(value: &Value) -> String {
    match value {
        Value::Array(alternatives) => alternatives
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        other => other.as_str().unwrap_or_default().to_owned(),
    }
}

/// When every branch of an `anyOf`/`oneOf` constrains `type`, the union of
/// those types reads better than a generic branch-mismatch message.
fn union_message(value: Option<&Value>) -> Option<String> {
    let branches = value?.as_array()?;
    let mut types: Vec<&str> = Vec::new();
    for branch in branches {
        let name = branch.get("type")?.as_str()?;
        if !types.contains(&name) {
            types.push(name);
        }
    }
    if types.is_empty() {
        return None;
    }
    Some(format!("must be {}", types.join(" or ")))
}

/// Normalizes phrasing by dropping any leading clause before the first
/// `must `.
fn strip_to_must(message: String) -> String {
    if let Some(index) = message.find("must ") {
        if index > 0 {
            if let Some(stripped) = message.get(index..) {
                return stripped.to_owned();
            }
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(keyword: &str, instance_path: &str, schema_path: &str) -> ErrorObject {
        ErrorObject {
            keyword: Some(keyword.to_owned()),
            instance_path: instance_path.to_owned(),
            schema_path: schema_path.to_owned(),
            message: format!("engine message for {keyword}"),
            ..ErrorObject::default()
        }
    }

    #[test]
    fn required_error_reads_naturally() {
        let schema = json!({
            "type": "object",
            "required": ["height"],
            "properties": {"height": {"type": "number"}}
        });
        let mut error = raw("required", "", "#/required");
        error.params = Some(json!({"missingProperty": "height"}));
        let merged = merge_errors(&[error], &schema);
        assert_eq!(merged.len(), 1);
        let first = merged.first().unwrap_or_else(|| panic!("one record"));
        assert_eq!(first.message, "must have required property 'height'");
        assert_eq!(first.instance_path, "");
        assert!(first.keyword.is_none());
        assert!(first.params.is_none());
    }

    #[test]
    fn limit_keywords_state_the_bound() {
        let schema = json!({"minimum": 10});
        let merged = merge_errors(&[raw("minimum", "", "#/minimum")], &schema);
        assert_eq!(
            merged.first().map(|e| e.message.as_str()),
            Some("must be >= 10")
        );
    }

    #[test]
    fn type_union_in_any_of_collapses() {
        let schema = json!({"anyOf": [{"type": "string"}, {"type": "number"}]});
        let merged = merge_errors(&[raw("anyOf", "", "#/anyOf")], &schema);
        assert_eq!(
            merged.first().map(|e| e.message.as_str()),
            Some("must be string or number")
        );
    }

    #[test]
    fn mixed_any_of_keeps_generic_message() {
        let schema = json!({"anyOf": [{"type": "string"}, {"minimum": 3}]});
        let merged = merge_errors(&[raw("anyOf", "", "#/anyOf")], &schema);
        assert_eq!(
            merged.first().map(|e| e.message.as_str()),
            Some("must match a schema in anyOf")
        );
    }

    #[test]
    fn duplicate_complaints_collapse() {
        let schema = json!({"anyOf": [{"type": "string"}, {"type": "number"}]});
        let errors = vec![
            raw("anyOf", "/a", "#/anyOf"),
            raw("anyOf", "/a", "#/anyOf"),
        ];
        let merged = merge_errors(&errors, &schema);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn instance_path_order_is_first_appearance() {
        let schema = json!({"minimum": 10, "maximum": 20});
        let errors = vec![
            raw("minimum", "/b", "#/minimum"),
            raw("maximum", "/a", "#/maximum"),
            raw("maximum", "/b", "#/maximum"),
        ];
        let merged = merge_errors(&errors, &schema);
        let paths: Vec<&str> = merged.iter().map(|e| e.instance_path.as_str()).collect();
        assert_eq!(paths, vec!["/b", "/b", "/a"]);
    }

    #[test]
    fn untemplated_keyword_falls_back_and_strips_prefix() {
        let schema = json!({});
        let mut error = raw("x-custom", "", "/x-custom");
        error.message = "value at root must be frobnicated".to_owned();
        let merged = merge_errors(&[error], &schema);
        assert_eq!(
            merged.first().map(|e| e.message.as_str()),
            Some("must be frobnicated")
        );
    }

    #[test]
    fn verbose_context_is_carried_from_the_representative() {
        let schema = json!({"minimum": 10});
        let mut error = raw("minimum", "", "#/minimum");
        error.data = Some(json!(3));
        error.parent_schema = Some(schema.clone());
        let merged = merge_errors(&[error], &schema);
        let first = merged.first().unwrap_or_else(|| panic!("one record"));
        assert_eq!(first.data, Some(json!(3)));
        assert_eq!(first.parent_schema, Some(schema));
    }
}
