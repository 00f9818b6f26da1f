//! HCL declaration parsing.
//!
//! Turns the `resource "<type>" "<name>" { ... }` blocks of a `.tf` file
//! into [`DeclaredResource`] values. Everything else in the file
//! (variables, data sources, modules, providers) is ignored.

use hcl::{Block, Body, Expression, TemplateExpr, TraversalOperator};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::DeclarationError;

use super::types::{DeclaredResource, FieldValue, ResourceAddress};

/// Parses the resource blocks of an HCL document.
///
/// # Errors
///
/// Returns [`DeclarationError::Syntax`] if the document is not valid HCL.
pub fn parse_resources(
    content: &str,
    file: &Path,
    directory: &Path,
) -> std::result::Result<Vec<DeclaredResource>, DeclarationError> {
    let body: Body = hcl::parse(content).map_err(|e| DeclarationError::Syntax {
        path: file.to_path_buf(),
        message: e.to_string(),
    })?;

    let resources = body
        .blocks()
        .filter(|block| block.identifier() == "resource")
        .filter_map(|block| resource_from_block(block, file, directory))
        .collect();

    Ok(resources)
}

/// Converts one `resource` block, skipping it if its labels are malformed.
fn resource_from_block(block: &Block, file: &Path, directory: &Path) -> Option<DeclaredResource> {
    let [resource_type, name] = block.labels() else {
        debug!(
            "Skipping resource block with {} labels in {}",
            block.labels().len(),
            file.display()
        );
        return None;
    };

    let fields: BTreeMap<String, FieldValue> = block
        .body()
        .attributes()
        .map(|attr| (attr.key().to_string(), field_value(attr.expr())))
        .collect();

    Some(DeclaredResource {
        address: ResourceAddress::new(resource_type.as_str(), name.as_str()),
        fields,
        source_directory: directory.to_path_buf(),
        source_file: file.to_path_buf(),
    })
}

/// Classifies an attribute expression.
fn field_value(expr: &Expression) -> FieldValue {
    match expr {
        Expression::String(s) => FieldValue::Literal(s.clone()),
        Expression::Number(n) => FieldValue::Literal(n.to_string()),
        Expression::Bool(b) => FieldValue::Literal(b.to_string()),
        Expression::TemplateExpr(template) => match template.as_ref() {
            TemplateExpr::QuotedString(s) => FieldValue::from_template(s),
            _ => FieldValue::Expression(expr.to_string()),
        },
        Expression::Traversal(traversal) => {
            let Expression::Variable(root) = &traversal.expr else {
                return FieldValue::Expression(expr.to_string());
            };
            let mut segments = vec![root.as_str()];
            for operator in &traversal.operators {
                match operator {
                    TraversalOperator::GetAttr(ident) => segments.push(ident.as_str()),
                    _ => return FieldValue::Expression(expr.to_string()),
                }
            }
            FieldValue::from_segments(&segments)
                .unwrap_or_else(|| FieldValue::Expression(expr.to_string()))
        }
        _ => FieldValue::Expression(expr.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Vec<DeclaredResource> {
        parse_resources(content, Path::new("/infra/iam/main.tf"), Path::new("/infra/iam"))
            .expect("HCL should parse")
    }

    #[test]
    fn test_parses_resource_blocks() {
        let resources = parse(
            r#"
resource "aws_iam_role" "app" {
  name               = "app-role"
  assume_role_policy = data.aws_iam_policy_document.assume.json
}

resource "aws_iam_policy" "deploy" {
  name = "deploy"
  path = "/service/"
}

variable "region" {
  default = "eu-west-1"
}
"#,
        );

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].address, ResourceAddress::new("aws_iam_role", "app"));
        assert_eq!(
            resources[0].field("name"),
            Some(&FieldValue::Literal(String::from("app-role")))
        );
        assert!(matches!(
            resources[0].field("assume_role_policy"),
            Some(FieldValue::Expression(_))
        ));
        assert_eq!(
            resources[1].field("path"),
            Some(&FieldValue::Literal(String::from("/service/")))
        );
        assert_eq!(resources[1].source_directory, Path::new("/infra/iam"));
    }

    #[test]
    fn test_interpolated_reference() {
        let resources = parse(
            r#"
resource "aws_iam_instance_profile" "app" {
  name = "${aws_iam_role.app.name}"
}
"#,
        );

        let Some(FieldValue::Reference(reference)) = resources[0].field("name") else {
            panic!("expected reference, got {:?}", resources[0].field("name"));
        };
        assert_eq!(reference.target, ResourceAddress::new("aws_iam_role", "app"));
        assert_eq!(reference.field, "name");
    }

    #[test]
    fn test_escaped_interpolation_is_literal() {
        let resources = parse(
            r#"
resource "aws_iam_role" "app" {
  name = "$${aws_iam_role.other.name}"
}
"#,
        );

        assert_eq!(
            resources[0].field("name"),
            Some(&FieldValue::Literal(String::from("${aws_iam_role.other.name}")))
        );
    }

    #[test]
    fn test_bare_traversal_reference() {
        let resources = parse(
            r#"
resource "aws_iam_instance_profile" "app" {
  name = aws_iam_role.app.name
}
"#,
        );

        assert!(matches!(
            resources[0].field("name"),
            Some(FieldValue::Reference(_))
        ));
    }

    #[test]
    fn test_variable_is_expression() {
        let resources = parse(
            r#"
resource "aws_ecr_repository" "api" {
  name = var.repository_name
}
"#,
        );

        assert!(matches!(
            resources[0].field("name"),
            Some(FieldValue::Expression(_))
        ));
    }

    #[test]
    fn test_skips_block_with_wrong_label_count() {
        let resources = parse(
            r#"
resource "aws_iam_role" {
  name = "orphan"
}

resource "aws_iam_role" "kept" {
  name = "kept"
}
"#,
        );

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].address.name, "kept");
    }

    #[test]
    fn test_invalid_hcl_is_syntax_error() {
        let result = parse_resources(
            "resource \"aws_iam_role\" \"x\" {",
            Path::new("broken.tf"),
            Path::new("."),
        );
        assert!(matches!(result, Err(DeclarationError::Syntax { .. })));
    }
}
