//! # verdict-authz
//!
//! Role-based authorization decision engine.
//!
//! This crate provides:
//! - A declarative rule-composition DSL with inheritance, override and
//!   revocation semantics, producing one deterministic merged table per
//!   policy class
//! - A decision algorithm that walks a principal's role set against that
//!   table, first match wins
//! - A condition evaluator for literal, named-predicate and closure
//!   conditions, with `require`/`permit` directive extraction
//! - An association resolver mapping convention-based route identifiers to
//!   a concrete parent instance
//!
//! ## Overview
//!
//! Policies are declared once at startup against [`policy::PolicyClass`]
//! builders and registered in a [`PolicyRegistry`]; the
//! [`DecisionEngine`] then answers `decide`/`preload`/`authorize` calls
//! statelessly. Host integration happens through the capability traits in
//! `verdict-core` (`Principal`, `Subject`, `TypeCatalog`, `InstanceLookup`,
//! `NameMapper`).
//!
//! ## Modules
//!
//! - [`action`] - action identifiers and declaration-time alias expansion
//! - [`condition`] - condition kinds, combinator clauses and evaluation
//! - [`context`] - per-decision evaluation context
//! - [`policy`] - policy classes: tables, builder DSL, inheritance merging
//! - [`registry`] - type-to-policy resolution with ancestor fallback
//! - [`engine`] - the decision engine and its `Decision`/`Directive` types
//! - [`resolver`] - parent association resolution
//! - [`error`] - authorization error taxonomy

pub mod action;
pub mod condition;
pub mod context;
pub mod engine;
pub mod error;
pub mod policy;
pub mod registry;
pub mod resolver;

pub use action::{Action, ActionAliases};
pub use condition::{
    Condition, ConditionClause, ConditionSet, ExtractedValues, FieldsSource, KeySource,
};
pub use context::EvaluationContext;
pub use engine::{Decision, DecisionEngine, Directive};
pub use error::{AuthzError, ErrorCategory};
pub use policy::builder::{Grant, PolicyBuilder, RuleSet};
pub use policy::table::{PolicyDefaults, PolicyTable, Rule};
pub use policy::{DefaultBehavior, PolicyBehavior, PolicyClass};
pub use registry::PolicyRegistry;
pub use resolver::{ParentCandidate, ParentInfo, resolve_parent};

/// Type alias for authorization results.
pub type AuthzResult<T> = Result<T, AuthzError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use verdict_authz::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthzResult;
    pub use crate::action::{Action, ActionAliases};
    pub use crate::condition::{Condition, ConditionClause, ConditionSet};
    pub use crate::context::EvaluationContext;
    pub use crate::engine::{Decision, DecisionEngine, Directive};
    pub use crate::error::{AuthzError, ErrorCategory};
    pub use crate::policy::builder::{Grant, PolicyBuilder, RuleSet};
    pub use crate::policy::{DefaultBehavior, PolicyBehavior, PolicyClass};
    pub use crate::registry::PolicyRegistry;
    pub use crate::resolver::{ParentCandidate, ParentInfo, resolve_parent};
    pub use verdict_core::{
        EnglishNameMapper, InstanceLookup, MemoryTypeCatalog, NameMapper, Principal,
        RequestParameters, RoleId, Subject, TypeCatalog, TypeId,
    };
}
