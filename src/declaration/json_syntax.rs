//! Terraform JSON syntax (`.tf.json`) declaration parsing.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::DeclarationError;

use super::types::{DeclaredResource, FieldValue, ResourceAddress};

/// Parses the `resource` section of a Terraform JSON document.
///
/// Both the object form (`"resource": {"type": {"name": {...}}}`) and the
/// array-of-objects form are accepted.
///
/// # Errors
///
/// Returns [`DeclarationError::Syntax`] if the document is not valid JSON.
pub fn parse_resources(
    content: &str,
    file: &Path,
    directory: &Path,
) -> std::result::Result<Vec<DeclaredResource>, DeclarationError> {
    let document: Value = serde_json::from_str(content).map_err(|e| DeclarationError::Syntax {
        path: file.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut resources = Vec::new();
    match document.get("resource") {
        Some(Value::Object(by_type)) => collect_types(by_type, file, directory, &mut resources),
        Some(Value::Array(items)) => {
            for item in items {
                if let Value::Object(by_type) = item {
                    collect_types(by_type, file, directory, &mut resources);
                }
            }
        }
        Some(other) => debug!(
            "Ignoring non-object resource section ({}) in {}",
            type_name(other),
            file.display()
        ),
        None => {}
    }

    Ok(resources)
}

fn collect_types(
    by_type: &Map<String, Value>,
    file: &Path,
    directory: &Path,
    out: &mut Vec<DeclaredResource>,
) {
    for (resource_type, by_name) in by_type {
        let Value::Object(by_name) = by_name else {
            debug!("Skipping malformed '{resource_type}' section in {}", file.display());
            continue;
        };

        for (name, body) in by_name {
            // A single-element array of bodies is also valid JSON syntax.
            let body = match body {
                Value::Array(bodies) if bodies.len() == 1 => &bodies[0],
                other => other,
            };
            let Value::Object(attributes) = body else {
                debug!("Skipping malformed block {resource_type}.{name} in {}", file.display());
                continue;
            };

            let fields: BTreeMap<String, FieldValue> = attributes
                .iter()
                .map(|(key, value)| (key.clone(), field_value(value)))
                .collect();

            out.push(DeclaredResource {
                address: ResourceAddress::new(resource_type, name),
                fields,
                source_directory: directory.to_path_buf(),
                source_file: file.to_path_buf(),
            });
        }
    }
}

fn field_value(value: &Value) -> FieldValue {
    match value {
        Value::String(s) => FieldValue::from_template(s),
        Value::Number(n) => FieldValue::Literal(n.to_string()),
        Value::Bool(b) => FieldValue::Literal(b.to_string()),
        other => FieldValue::Expression(other.to_string()),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
