//! Declaration extraction module.
//!
//! This module finds declaration files in a directory tree and turns their
//! resource blocks into typed [`DeclaredResource`] values:
//! - `.tf` files through the HCL parser
//! - `.tf.json` files through the JSON syntax parser
//! - reference expressions classified into tagged [`FieldValue`]s

mod extractor;
mod hcl_syntax;
mod json_syntax;
mod types;

pub use extractor::{DeclarationExtractor, DeclarationFormat, DirectoryScan};
pub use types::{DeclaredResource, FieldReference, FieldValue, ResourceAddress};
