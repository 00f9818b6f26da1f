//! Identifier resolution module.
//!
//! This module computes the identifier each new resource is imported by:
//! - [`RuleSet`] maps resource types to import rules
//! - [`IdentityProvider`] supplies the account id for policy ARNs
//! - [`IdentifierResolver`] follows references and applies the rules

mod engine;
mod identity;
mod rules;

pub use engine::{IdentifierResolver, ResolvedResource};
pub use identity::{AccountCache, IdentityProvider, StaticIdentity, StsIdentityProvider};
pub use rules::{ImportRule, RuleSet};
