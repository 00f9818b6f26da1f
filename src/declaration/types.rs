//! Declared resource types.
//!
//! These types represent resource blocks as they appear in declaration
//! files, before they are compared against tracked state.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Root names that look like resource references but address other
/// namespaces (`var.x`, `data.y.z`, `module.m.out`, ...).
const NON_RESOURCE_ROOTS: &[&str] = &[
    "var", "local", "data", "module", "path", "terraform", "each", "count", "self",
];

/// Identifies a resource within one declaration batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceAddress {
    /// Resource type (e.g. `aws_iam_role`).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Local resource name.
    pub name: String,
}

impl ResourceAddress {
    /// Creates a new address.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// A reference from one resource field to another resource's field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldReference {
    /// Referenced resource.
    pub target: ResourceAddress,
    /// Referenced field on that resource.
    pub field: String,
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.field)
    }
}

/// The value of a single field in a resource block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    /// A plain value known at parse time.
    Literal(String),
    /// A `type.name.field` reference to another resource.
    Reference(FieldReference),
    /// Anything else, kept as raw source text.
    Expression(String),
}

impl FieldValue {
    /// Classifies the text of a quoted string or template.
    ///
    /// `"${aws_iam_role.app.name}"` becomes a reference, a string without
    /// interpolation is a literal, and any other template is an expression.
    /// Escaped `$${` and `%%{` sequences are literal text.
    #[must_use]
    pub fn from_template(text: &str) -> Self {
        if let Some(inner) = text
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
        {
            if let Some(reference) = Self::parse_reference(inner.trim()) {
                return Self::Reference(reference);
            }
            return Self::Expression(text.to_string());
        }

        let unescaped = text.replace("$${", "").replace("%%{", "");
        if unescaped.contains("${") || unescaped.contains("%{") {
            Self::Expression(text.to_string())
        } else {
            Self::Literal(text.replace("$${", "${").replace("%%{", "%{"))
        }
    }

    /// Builds a reference from traversal segments, if they form one.
    #[must_use]
    pub fn from_segments(segments: &[&str]) -> Option<Self> {
        match segments {
            [resource_type, name, field] if Self::is_resource_root(resource_type) => {
                Some(Self::Reference(FieldReference {
                    target: ResourceAddress::new(*resource_type, *name),
                    field: (*field).to_string(),
                }))
            }
            _ => None,
        }
    }

    /// Parses a bare `type.name.field` path.
    fn parse_reference(path: &str) -> Option<FieldReference> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| !is_identifier(s)) {
            return None;
        }
        match Self::from_segments(&segments) {
            Some(Self::Reference(reference)) => Some(reference),
            _ => None,
        }
    }

    fn is_resource_root(root: &str) -> bool {
        !NON_RESOURCE_ROOTS.contains(&root) && root.contains('_')
    }

    /// Returns the literal text, if this is a literal.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Reference(reference) => write!(f, "${{{reference}}}"),
            Self::Expression(raw) => write!(f, "{raw}"),
        }
    }
}

/// Returns true for HCL identifiers (`[A-Za-z_][A-Za-z0-9_-]*`).
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A resource block found in a declaration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredResource {
    /// Type and local name.
    pub address: ResourceAddress,
    /// Top-level attributes of the block.
    pub fields: BTreeMap<String, FieldValue>,
    /// Directory the declaration lives in.
    pub source_directory: PathBuf,
    /// File the declaration was read from.
    pub source_file: PathBuf,
}

impl DeclaredResource {
    /// Returns a field value by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_string_is_literal() {
        assert_eq!(
            FieldValue::from_template("app-role"),
            FieldValue::Literal(String::from("app-role"))
        );
    }

    #[test]
    fn test_wrapped_path_is_reference() {
        let value = FieldValue::from_template("${aws_iam_role.app.name}");
        let FieldValue::Reference(reference) = value else {
            panic!("expected a reference, got {value:?}");
        };
        assert_eq!(reference.target, ResourceAddress::new("aws_iam_role", "app"));
        assert_eq!(reference.field, "name");
    }

    #[test]
    fn test_variable_interpolation_is_expression() {
        assert!(matches!(
            FieldValue::from_template("${var.prefix}"),
            FieldValue::Expression(_)
        ));
        assert!(matches!(
            FieldValue::from_template("${var.prefix}-role"),
            FieldValue::Expression(_)
        ));
        assert!(matches!(
            FieldValue::from_template("${data.aws_iam_role.x.name}"),
            FieldValue::Expression(_)
        ));
    }

    #[test]
    fn test_escaped_interpolation_is_literal() {
        assert_eq!(
            FieldValue::from_template("$${aws_iam_role.app.name}"),
            FieldValue::Literal(String::from("${aws_iam_role.app.name}"))
        );
        assert!(matches!(
            FieldValue::from_template("$${literal}-${var.prefix}"),
            FieldValue::Expression(_)
        ));
    }

    #[test]
    fn test_two_segment_path_is_expression() {
        assert!(matches!(
            FieldValue::from_template("${aws_iam_role.app}"),
            FieldValue::Expression(_)
        ));
    }

    #[test]
    fn test_reference_display_round_trips_template() {
        let value = FieldValue::from_template("${aws_iam_role.app.name}");
        assert_eq!(value.to_string(), "${aws_iam_role.app.name}");
    }

    #[test]
    fn test_address_display() {
        let address = ResourceAddress::new("aws_iam_policy", "deploy");
        assert_eq!(address.to_string(), "aws_iam_policy.deploy");
    }
}
