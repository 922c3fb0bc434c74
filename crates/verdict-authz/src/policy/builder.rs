//! Policy declaration DSL.
//!
//! Declarations run against an explicit [`PolicyBuilder`] handed to the
//! registration closure. Two declaration forms exist, mirroring each other:
//!
//! - block form: `b.role(["tester"], |b| { b.can(["hi"], Grant::new()) })`
//! - inline form: `let g = b.granting(["hi"], Grant::new());
//!   b.assign(["tester"], g)`
//!
//! `can`/`cannot` outside an open role body fail with `NoBlock`; inline
//! rule sets left unconsumed fail with `RoleAssignmentMissing` before the
//! next declaration (or at build completion). Both are startup-time errors,
//! raised long before any decision is made.

use std::sync::Arc;

use verdict_core::RoleId;

use crate::action::{Action, ActionAliases};
use crate::condition::{Condition, ConditionClause, ConditionSet, FieldsSource, KeySource};
use crate::context::EvaluationContext;
use crate::error::AuthzError;
use crate::policy::merge;
use crate::policy::table::{PolicyDefaults, PolicyTable, Rule};

/// Options attached to a `can` declaration.
///
/// Clauses are recorded in call order, which becomes the evaluation order
/// of the resulting condition set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grant {
    clauses: Vec<ConditionClause>,
    enforce: bool,
}

impl Grant {
    /// Creates an empty (unconditional) grant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gates the grant on `condition` holding.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.clauses.push(ConditionClause::If(condition));
        self
    }

    /// Gates the grant on `condition` not holding.
    #[must_use]
    pub fn unless(mut self, condition: Condition) -> Self {
        self.clauses.push(ConditionClause::Unless(condition));
        self
    }

    /// Sets the required payload key for matched rules.
    #[must_use]
    pub fn require(mut self, key: impl Into<String>) -> Self {
        self.clauses
            .push(ConditionClause::Require(KeySource::Literal(key.into())));
        self
    }

    /// Sets a context-computed required payload key.
    #[must_use]
    pub fn require_computed<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> Result<String, AuthzError> + Send + Sync + 'static,
    {
        self.clauses
            .push(ConditionClause::Require(KeySource::Computed(Arc::new(f))));
        self
    }

    /// Sets the permitted payload fields for matched rules.
    #[must_use]
    pub fn permit<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.clauses.push(ConditionClause::Permit(FieldsSource::Literal(
            fields.into_iter().map(Into::into).collect(),
        )));
        self
    }

    /// Sets context-computed permitted payload fields.
    #[must_use]
    pub fn permit_computed<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> Result<Vec<String>, AuthzError> + Send + Sync + 'static,
    {
        self.clauses
            .push(ConditionClause::Permit(FieldsSource::Computed(Arc::new(f))));
        self
    }

    /// Marks the grant as enforcing: the declaration first revokes every
    /// inherited grant for the same actions, fully replacing them.
    #[must_use]
    pub fn enforce(mut self) -> Self {
        self.enforce = true;
        self
    }

    /// String-keyed clause entry point for declarations assembled from
    /// host-side configuration. Only `"if"` and `"unless"` are recognized;
    /// anything else fails with `UnsupportedCondition`.
    pub fn clause(self, key: &str, condition: Condition) -> Result<Self, AuthzError> {
        match key {
            "if" => Ok(self.when(condition)),
            "unless" => Ok(self.unless(condition)),
            other => Err(AuthzError::unsupported_condition(other)),
        }
    }

    fn conditions(&self) -> ConditionSet {
        self.clauses.iter().cloned().collect()
    }
}

/// An inline declaration produced by [`PolicyBuilder::granting`] or
/// [`PolicyBuilder::revoking`], waiting to be assigned to roles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    grants: Vec<Rule>,
    revocations: Vec<Action>,
}

/// Collects declarations for one policy class and assembles its tables.
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    table: PolicyTable,
    member_table: PolicyTable,
    aliases: ActionAliases,
    defaults: PolicyDefaults,
    body: Option<BodyState>,
    pending: usize,
}

#[derive(Debug)]
struct BodyState {
    member: bool,
    roles: Vec<RoleId>,
    revocations: Vec<Action>,
    grants: Vec<Rule>,
}

/// The assembled output of a builder, consumed by `PolicyClass::build`.
#[derive(Debug)]
pub(crate) struct BuiltPolicy {
    pub table: PolicyTable,
    pub member_table: PolicyTable,
    pub aliases: ActionAliases,
    pub defaults: PolicyDefaults,
}

impl PolicyBuilder {
    /// Creates a builder with no inherited state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from a parent's tables and alias map.
    pub(crate) fn from_parts(
        table: PolicyTable,
        member_table: PolicyTable,
        aliases: ActionAliases,
    ) -> Self {
        Self {
            table,
            member_table,
            aliases,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Class-level declarations
    // ------------------------------------------------------------------

    /// Defines (or redefines) an action alias for subsequent declarations.
    pub fn alias_action<A, I>(&mut self, alias: A, expansion: I)
    where
        A: Into<Action>,
        I: IntoIterator,
        I::Item: Into<Action>,
    {
        self.aliases.set(alias, expansion);
    }

    /// Replaces the whole alias table (e.g. with
    /// [`ActionAliases::conventional`]).
    pub fn set_action_aliases(&mut self, aliases: ActionAliases) {
        self.aliases = aliases;
    }

    /// Sets the class-level default required payload key.
    pub fn require_key(&mut self, key: impl Into<String>) {
        self.defaults.require_key = Some(key.into());
    }

    /// Sets the class-level default permitted payload fields.
    pub fn permit_fields<I>(&mut self, fields: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.defaults.permit_fields = Some(fields.into_iter().map(Into::into).collect());
    }

    // ------------------------------------------------------------------
    // Block form
    // ------------------------------------------------------------------

    /// Opens a role body for the given roles. `can`/`cannot` calls inside
    /// the body target exactly these roles; the body's revocations are
    /// applied before its grants when it closes.
    pub fn role<R, F>(&mut self, roles: R, body: F) -> Result<(), AuthzError>
    where
        R: IntoIterator,
        R::Item: Into<RoleId>,
        F: FnOnce(&mut Self) -> Result<(), AuthzError>,
    {
        self.run_body(roles, false, body)
    }

    /// Like [`role`](Self::role), but declarations land in the member-role
    /// table, keyed at decision time by the policy behavior's computed
    /// membership role.
    pub fn member_role<R, F>(&mut self, roles: R, body: F) -> Result<(), AuthzError>
    where
        R: IntoIterator,
        R::Item: Into<RoleId>,
        F: FnOnce(&mut Self) -> Result<(), AuthzError>,
    {
        self.run_body(roles, true, body)
    }

    fn run_body<R, F>(&mut self, roles: R, member: bool, body: F) -> Result<(), AuthzError>
    where
        R: IntoIterator,
        R::Item: Into<RoleId>,
        F: FnOnce(&mut Self) -> Result<(), AuthzError>,
    {
        if self.pending > 0 {
            return Err(AuthzError::role_assignment_missing(self.pending));
        }
        if self.body.is_some() {
            return Err(AuthzError::configuration("role bodies cannot be nested"));
        }
        self.body = Some(BodyState {
            member,
            roles: roles.into_iter().map(Into::into).collect(),
            revocations: Vec::new(),
            grants: Vec::new(),
        });
        let result = body(self);
        let state = self.body.take();
        result?;
        let state = state
            .ok_or_else(|| AuthzError::configuration("role body closed before completion"))?;
        let table = if state.member {
            &mut self.member_table
        } else {
            &mut self.table
        };
        merge::apply_body(table, &state.roles, &state.revocations, &state.grants);
        Ok(())
    }

    /// Grants `actions` (aliases expanded now) to the open body's roles.
    pub fn can<A>(&mut self, actions: A, grant: Grant) -> Result<(), AuthzError>
    where
        A: IntoIterator,
        A::Item: Into<Action>,
    {
        let (rules, revocations) = self.expand_grant(actions, &grant);
        let body = self
            .body
            .as_mut()
            .ok_or_else(|| AuthzError::no_block("can"))?;
        body.revocations.extend(revocations);
        body.grants.extend(rules);
        Ok(())
    }

    /// Revokes `actions` (aliases expanded now) from the open body's roles.
    /// Revocations only reach entries that predate the body.
    pub fn cannot<A>(&mut self, actions: A) -> Result<(), AuthzError>
    where
        A: IntoIterator,
        A::Item: Into<Action>,
    {
        let expanded = self.expand_actions(actions);
        let body = self
            .body
            .as_mut()
            .ok_or_else(|| AuthzError::no_block("cannot"))?;
        body.revocations.extend(expanded);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inline form
    // ------------------------------------------------------------------

    /// Builds an inline grant set for [`assign`](Self::assign). Counts as
    /// pending until consumed.
    #[must_use]
    pub fn granting<A>(&mut self, actions: A, grant: Grant) -> RuleSet
    where
        A: IntoIterator,
        A::Item: Into<Action>,
    {
        let (grants, revocations) = self.expand_grant(actions, &grant);
        self.pending += 1;
        RuleSet {
            grants,
            revocations,
        }
    }

    /// Builds an inline revocation set for [`assign`](Self::assign).
    /// Counts as pending until consumed.
    #[must_use]
    pub fn revoking<A>(&mut self, actions: A) -> RuleSet
    where
        A: IntoIterator,
        A::Item: Into<Action>,
    {
        let revocations = self.expand_actions(actions);
        self.pending += 1;
        RuleSet {
            grants: Vec::new(),
            revocations,
        }
    }

    /// Assigns an inline rule set to roles.
    pub fn assign<R>(&mut self, roles: R, set: RuleSet) -> Result<(), AuthzError>
    where
        R: IntoIterator,
        R::Item: Into<RoleId>,
    {
        self.consume(roles, set, false)
    }

    /// Assigns an inline rule set to the member-role table.
    pub fn assign_member<R>(&mut self, roles: R, set: RuleSet) -> Result<(), AuthzError>
    where
        R: IntoIterator,
        R::Item: Into<RoleId>,
    {
        self.consume(roles, set, true)
    }

    fn consume<R>(&mut self, roles: R, set: RuleSet, member: bool) -> Result<(), AuthzError>
    where
        R: IntoIterator,
        R::Item: Into<RoleId>,
    {
        if self.pending > 1 {
            return Err(AuthzError::role_assignment_missing(self.pending));
        }
        self.pending = 0;
        let roles: Vec<RoleId> = roles.into_iter().map(Into::into).collect();
        let table = if member {
            &mut self.member_table
        } else {
            &mut self.table
        };
        merge::apply_body(table, &roles, &set.revocations, &set.grants);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Assembly
    // ------------------------------------------------------------------

    /// Finalizes the builder. Fails if inline rule sets are still pending.
    pub(crate) fn finish(self) -> Result<BuiltPolicy, AuthzError> {
        if self.pending > 0 {
            return Err(AuthzError::role_assignment_missing(self.pending));
        }
        Ok(BuiltPolicy {
            table: self.table,
            member_table: self.member_table,
            aliases: self.aliases,
            defaults: self.defaults,
        })
    }

    fn expand_actions<A>(&self, actions: A) -> Vec<Action>
    where
        A: IntoIterator,
        A::Item: Into<Action>,
    {
        let declared: Vec<Action> = actions.into_iter().map(Into::into).collect();
        self.aliases.expand_all(declared.iter())
    }

    fn expand_grant<A>(&self, actions: A, grant: &Grant) -> (Vec<Rule>, Vec<Action>)
    where
        A: IntoIterator,
        A::Item: Into<Action>,
    {
        let expanded = self.expand_actions(actions);
        let conditions = grant.conditions();
        let revocations = if grant.enforce {
            expanded.clone()
        } else {
            Vec::new()
        };
        let rules = expanded
            .into_iter()
            .map(|action| Rule::new(action, conditions.clone()))
            .collect();
        (rules, revocations)
    }
}
