//! Conditions and their combinators.
//!
//! A rule carries an ordered set of clauses. `If`/`Unless` clauses gate the
//! match with AND semantics; `Require`/`Permit` clauses are not boolean,
//! they contribute the parameter directive attached to a successful match.
//! An empty clause set always matches (vacuous AND).

use std::fmt;
use std::sync::Arc;

use crate::context::EvaluationContext;
use crate::error::AuthzError;
use crate::policy::PolicyBehavior;

/// Closure signature for inline boolean conditions.
pub type PredicateFn = dyn Fn(&EvaluationContext<'_>) -> Result<bool, AuthzError> + Send + Sync;
/// Closure signature for computed `require` keys.
pub type KeyFn = dyn Fn(&EvaluationContext<'_>) -> Result<String, AuthzError> + Send + Sync;
/// Closure signature for computed `permit` field lists.
pub type FieldsFn = dyn Fn(&EvaluationContext<'_>) -> Result<Vec<String>, AuthzError> + Send + Sync;

/// A side-effect-free boolean test.
///
/// `Named` dispatches to a predicate on the policy behavior, so host
/// policies express tests like "associated with client?" as ordinary
/// methods. `Closure` captures the test inline over the context.
#[derive(Clone)]
pub enum Condition {
    /// A constant outcome.
    Literal(bool),
    /// Dispatches to a named predicate on the policy behavior.
    Named(String),
    /// An inline closure over the evaluation context.
    Closure(Arc<PredicateFn>),
}

impl Condition {
    /// Creates a constant condition.
    #[must_use]
    pub fn literal(value: bool) -> Self {
        Self::Literal(value)
    }

    /// Creates a condition dispatching to a named policy predicate.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Creates an inline closure condition.
    #[must_use]
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> Result<bool, AuthzError> + Send + Sync + 'static,
    {
        Self::Closure(Arc::new(f))
    }

    fn resolve(
        &self,
        behavior: &dyn PolicyBehavior,
        ctx: &EvaluationContext<'_>,
    ) -> Result<bool, AuthzError> {
        match self {
            Self::Literal(value) => Ok(*value),
            Self::Named(name) => behavior.predicate(name, ctx),
            Self::Closure(f) => f(ctx),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Closure(_) => f.write_str("Closure(..)"),
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Named(a), Self::Named(b)) => a == b,
            (Self::Closure(a), Self::Closure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Value source for a `Require` clause.
#[derive(Clone)]
pub enum KeySource {
    /// A fixed key.
    Literal(String),
    /// Key computed from the context.
    Computed(Arc<KeyFn>),
}

impl KeySource {
    fn resolve(&self, ctx: &EvaluationContext<'_>) -> Result<String, AuthzError> {
        match self {
            Self::Literal(key) => Ok(key.clone()),
            Self::Computed(f) => f(ctx),
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(key) => f.debug_tuple("Literal").field(key).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl PartialEq for KeySource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Computed(a), Self::Computed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Value source for a `Permit` clause.
#[derive(Clone)]
pub enum FieldsSource {
    /// A fixed field list.
    Literal(Vec<String>),
    /// Field list computed from the context.
    Computed(Arc<FieldsFn>),
}

impl FieldsSource {
    fn resolve(&self, ctx: &EvaluationContext<'_>) -> Result<Vec<String>, AuthzError> {
        match self {
            Self::Literal(fields) => Ok(fields.clone()),
            Self::Computed(f) => f(ctx),
        }
    }
}

impl fmt::Debug for FieldsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(fields) => f.debug_tuple("Literal").field(fields).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl PartialEq for FieldsSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Computed(a), Self::Computed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// One clause of a rule's condition set.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionClause {
    /// Matches when the condition holds.
    If(Condition),
    /// Matches when the condition does not hold.
    Unless(Condition),
    /// Contributes the required payload key to the directive.
    Require(KeySource),
    /// Contributes the permitted payload fields to the directive.
    Permit(FieldsSource),
}

/// Directive values extracted from `Require`/`Permit` clauses of a matched
/// rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedValues {
    /// Required payload key, when the rule declares one.
    pub require_key: Option<String>,
    /// Permitted payload fields, when the rule declares them.
    pub permit_fields: Option<Vec<String>>,
}

/// Ordered clause set with AND semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    clauses: Vec<ConditionClause>,
}

impl ConditionSet {
    /// Creates an empty set (matches unconditionally).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a clause, preserving declaration order.
    pub fn push(&mut self, clause: ConditionClause) {
        self.clauses.push(clause);
    }

    /// Returns `true` if no clauses are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Iterates the clauses in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConditionClause> {
        self.clauses.iter()
    }

    /// Evaluates the set against `ctx`.
    ///
    /// Returns `Ok(Some(values))` when every gating clause holds (the
    /// values carry any `Require`/`Permit` contributions), `Ok(None)` when
    /// a gate fails, and an error when a predicate fails. Evaluation runs
    /// in declaration order and stops at the first failing gate.
    pub fn evaluate(
        &self,
        behavior: &dyn PolicyBehavior,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Option<ExtractedValues>, AuthzError> {
        let mut values = ExtractedValues::default();
        for clause in &self.clauses {
            match clause {
                ConditionClause::If(condition) => {
                    if !condition.resolve(behavior, ctx)? {
                        return Ok(None);
                    }
                }
                ConditionClause::Unless(condition) => {
                    if condition.resolve(behavior, ctx)? {
                        return Ok(None);
                    }
                }
                ConditionClause::Require(source) => {
                    values.require_key = Some(source.resolve(ctx)?);
                }
                ConditionClause::Permit(source) => {
                    values.permit_fields = Some(source.resolve(ctx)?);
                }
            }
        }
        Ok(Some(values))
    }
}

impl FromIterator<ConditionClause> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = ConditionClause>>(iter: I) -> Self {
        Self {
            clauses: iter.into_iter().collect(),
        }
    }
}
