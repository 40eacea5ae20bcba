//! Rewriting engine-reported schema paths to lexical schema-document paths.
//!
//! The engine reports where a failed rule lives in its *resolved* view of
//! the schema, which may have stepped through `$ref`s. Readers want the
//! path into the schema document as written. Before compiling, every
//! non-`$ref` schema subtree is tagged with its lexical pointer relative
//! to the document's `$id`, in a side table keyed by node identity (never
//! on the schema value itself). After validation each error's schema
//! path is resolved back to a node and rewritten to `<tag>/<keyword>`.
//! The table lives for one run and is never serialized.

use std::collections::HashMap;

use serde_json::Value;

use crate::engine::ErrorObject;
use crate::pointer;

/// Side table mapping schema-subtree identity to its lexical pointer tag.
///
/// The table is built against one specific schema document value and is
/// only valid for lookups into that same value; it holds node addresses,
/// so the document must not move while the index is alive (keep both
/// behind the same `Arc`).
#[derive(Debug)]
pub struct SchemaPathIndex {
    tags: HashMap<usize, String>,
}

impl SchemaPathIndex {
    /// Tags every non-`$ref` object subtree of `schema` with
    /// `"<$id>#<pointer>"`.
    #[must_use]
    pub fn build(schema: &Value) -> Self {
        let id = schema.get("$id").and_then(Value::as_str).unwrap_or("");
        let mut tags = HashMap::new();
        tag_subtrees(schema, &format!("{id}#"), String::new(), &mut tags);
        Self { tags }
    }

    /// Rewrites each error's `schema_path` to the lexical tag of its
    /// parent schema node plus the failing keyword. Errors whose path
    /// cannot be resolved to a tagged node are left untouched.
    pub fn rewrite(&self, schema: &Value, errors: &mut [ErrorObject]) {
        for error in errors {
            let path = error.schema_path.clone();
            let Some((parent_path, keyword)) = split_last(&path) else {
                continue;
            };
            let Some(parent) = resolve(schema, parent_path) else {
                continue;
            };
            let Some(tag) = self.tag_of(parent) else {
                continue;
            };
            error.schema_path = format!("{tag}/{keyword}");
        }
    }

    fn tag_of(&self, node: &Value) -> Option<&str> {
        self.tags.get(&identity(node)).map(String::as_str)
    }
}

fn identity(node: &Value) -> usize {
    std::ptr::from_ref(node) as usize
}

fn tag_subtrees(node: &Value, prefix: &str, path: String, tags: &mut HashMap<usize, String>) {
    match node {
        Value::Object(map) => {
            if !map.contains_key("$ref") {
                tags.insert(identity(node), format!("{prefix}{path}"));
            }
            for (key, child) in map {
                tag_subtrees(child, prefix, format!("{path}/{}", pointer::escape(key)), tags);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                tag_subtrees(child, prefix, format!("{path}/{index}"), tags);
            }
        }
        _ => {}
    }
}

/// Resolves a schema pointer to a node of the original document.
///
/// Accepts both raw engine paths (`/properties/a/type`) and already
/// rewritten tags (`<$id>#/properties/a/type`). A `$ref` path segment, or
/// a segment the current node lacks while carrying a `$ref`, follows the
/// local reference the way the engine inlines it. Returns `None` when the
/// path does not resolve.
#[must_use]
pub fn resolve<'a>(schema: &'a Value, path: &str) -> Option<&'a Value> {
    let pointer_part = path.split_once('#').map_or(path, |(_, after)| after);
    let mut node = schema;
    for segment in pointer::split(pointer_part) {
        if segment == "$ref" {
            node = follow_ref(schema, node)?;
            continue;
        }
        node = match step(node, &segment) {
            Some(next) => next,
            None => step(follow_ref(schema, node)?, &segment)?,
        };
    }
    Some(node)
}

fn step<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

/// Follows a document-local `$ref` (`#`, `#/...`). Remote references are
/// not resolvable here and yield `None`.
fn follow_ref<'a>(schema: &'a Value, node: &'a Value) -> Option<&'a Value> {
    let reference = node.get("$ref")?.as_str()?;
    let pointer_part = reference.strip_prefix('#')?;
    let mut target = schema;
    for segment in pointer::split(pointer_part) {
        target = step(target, &segment)?;
    }
    Some(target)
}

fn split_last(path: &str) -> Option<(&str, &str)> {
    let index = path.rfind('/')?;
    Some((path.get(..index)?, path.get(index.checked_add(1)?..)?))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn raw_error(schema_path: &str) -> ErrorObject {
        ErrorObject {
            keyword: Some(
                schema_path
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_owned(),
            ),
            instance_path: String::new(),
            schema_path: schema_path.to_owned(),
            message: "whatever".to_owned(),
            ..ErrorObject::default()
        }
    }

    #[test]
    fn plain_path_gains_lexical_tag() {
        let schema = json!({
            "type": "object",
            "properties": {"height": {"type": "number"}}
        });
        let index = SchemaPathIndex::build(&schema);
        let mut errors = vec![raw_error("/properties/height/type")];
        index.rewrite(&schema, &mut errors);
        assert_eq!(errors[0].schema_path, "#/properties/height/type");
    }

    #[test]
    fn root_keyword_is_tagged_at_root() {
        let schema = json!({"type": "object", "required": ["height"]});
        let index = SchemaPathIndex::build(&schema);
        let mut errors = vec![raw_error("/required")];
        index.rewrite(&schema, &mut errors);
        assert_eq!(errors[0].schema_path, "#/required");
    }

    #[test]
    fn id_prefixes_the_tag() {
        let schema = json!({
            "$id": "https://example.com/box.json",
            "properties": {"height": {"type": "number"}}
        });
        let index = SchemaPathIndex::build(&schema);
        let mut errors = vec![raw_error("/properties/height/type")];
        index.rewrite(&schema, &mut errors);
        assert_eq!(
            errors[0].schema_path,
            "https://example.com/box.json#/properties/height/type"
        );
    }

    /// The engine may report the path through the `$ref` hop or the
    /// resolved target's own path; both rewrite to the same lexical tag.
    #[rstest]
    #[case("/properties/a/$ref/type")]
    #[case("/$defs/pos/type")]
    fn ref_paths_resolve_to_the_definition(#[case] engine_path: &str) {
        let schema = json!({
            "properties": {"a": {"$ref": "#/$defs/pos"}},
            "$defs": {"pos": {"type": "number"}}
        });
        let index = SchemaPathIndex::build(&schema);
        let mut errors = vec![raw_error(engine_path)];
        index.rewrite(&schema, &mut errors);
        assert_eq!(errors[0].schema_path, "#/$defs/pos/type");
    }

    #[test]
    fn unresolvable_path_is_left_untouched() {
        let schema = json!({"type": "object"});
        let index = SchemaPathIndex::build(&schema);
        let mut errors = vec![raw_error("/nope/missing/type")];
        index.rewrite(&schema, &mut errors);
        assert_eq!(errors[0].schema_path, "/nope/missing/type");
    }

    #[test]
    fn ref_nodes_are_not_tagged() {
        let schema = json!({
            "properties": {"a": {"$ref": "#/$defs/pos"}},
            "$defs": {"pos": {"type": "number"}}
        });
        let index = SchemaPathIndex::build(&schema);
        let ref_node = schema
            .pointer("/properties/a")
            .unwrap_or_else(|| panic!("node"));
        assert_eq!(index.tag_of(ref_node), None);
    }

    #[test]
    fn resolve_accepts_rewritten_tags() {
        let schema = json!({"properties": {"height": {"type": "number"}}});
        let node = resolve(&schema, "#/properties/height/type");
        assert_eq!(node, Some(&json!("number")));
    }

    #[test]
    fn escaped_keys_resolve() {
        let schema = json!({"properties": {"a/b": {"type": "number"}}});
        let index = SchemaPathIndex::build(&schema);
        let node = resolve(&schema, "/properties/a~1b");
        assert_eq!(node, Some(&json!({"type": "number"})));
        let tagged = resolve(&schema, "/properties/a~1b")
            .and_then(|found| index.tag_of(found))
            .map(str::to_owned);
        assert_eq!(tagged, Some("#/properties/a~1b".to_owned()));
    }
}
