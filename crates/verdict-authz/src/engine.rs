//! Decision engine.
//!
//! The entry points are [`DecisionEngine::decide`] (pure decision),
//! [`DecisionEngine::preload`] (directive-only, before an instance exists)
//! and [`DecisionEngine::authorize`] (deny becomes an `AccessDenied`
//! error). A decision call is synchronous, bounded and side-effect-free;
//! the engine holds no per-request state, so one instance serves any
//! number of concurrent callers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use verdict_core::{NameMapper, Principal, Subject, TypeId};

use crate::action::Action;
use crate::condition::ExtractedValues;
use crate::context::EvaluationContext;
use crate::error::AuthzError;
use crate::policy::table::Rule;
use crate::policy::{PolicyBehavior, PolicyClass};
use crate::registry::PolicyRegistry;

/// Parameter-shaping directive attached to a successful decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directive {
    /// Top-level payload key the host must require.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_key: Option<String>,
    /// Payload fields the host may permit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permit_fields: Option<Vec<String>>,
}

impl Directive {
    /// Returns `true` if the directive carries no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.require_key.is_none() && self.permit_fields.is_none()
    }
}

/// The outcome of a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    directive: Option<Directive>,
}

impl Decision {
    /// An allowing decision carrying its directive.
    #[must_use]
    pub fn allow(directive: Directive) -> Self {
        Self {
            allowed: true,
            directive: Some(directive),
        }
    }

    /// A denying decision. Denials never carry a directive.
    #[must_use]
    pub fn deny() -> Self {
        Self {
            allowed: false,
            directive: None,
        }
    }

    /// Returns `true` if access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Returns `true` if access was denied.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        !self.allowed
    }

    /// The directive, when the decision allows.
    #[must_use]
    pub fn directive(&self) -> Option<&Directive> {
        self.directive.as_ref()
    }

    /// Consumes the decision into its directive, when it allows.
    #[must_use]
    pub fn into_directive(self) -> Option<Directive> {
        self.directive
    }
}

/// Stateless decision engine over a frozen [`PolicyRegistry`].
pub struct DecisionEngine {
    registry: PolicyRegistry,
    names: Arc<dyn NameMapper>,
}

impl DecisionEngine {
    /// Creates an engine. The registry should be fully populated; the name
    /// mapper derives fallback require keys from canonical type names.
    #[must_use]
    pub fn new(registry: PolicyRegistry, names: Arc<dyn NameMapper>) -> Self {
        Self { registry, names }
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Decides whether `actor` may perform `action` on the target.
    ///
    /// Evaluation errors (unknown predicates, subject access while
    /// preloading) propagate; they are configuration defects, not denials.
    pub fn decide(
        &self,
        actor: Option<&dyn Principal>,
        action: &Action,
        target: &TypeId,
        subject: Option<&dyn Subject>,
        parent: Option<&dyn Subject>,
    ) -> Result<Decision, AuthzError> {
        // 1. No anonymous grants.
        let Some(actor) = actor else {
            debug!(action = %action, target = %target, "denied: no actor");
            return Ok(Decision::deny());
        };

        // 2. Resolve the policy class and build the per-call context.
        let policy = self.registry.resolve(target);
        let ctx =
            EvaluationContext::new(Some(actor), action.clone(), target.clone(), subject, parent);

        // 3.-4. Scan role table, then the member-role path.
        match self.evaluate(&policy, &ctx, actor)? {
            Some(values) => {
                // 5. Fill directive defaults.
                let directive = self.fill_directive(values, &policy, target);
                debug!(
                    action = %action,
                    target = %target,
                    policy = policy.name(),
                    "access allowed"
                );
                Ok(Decision::allow(directive))
            }
            None => {
                debug!(
                    action = %action,
                    target = %target,
                    policy = policy.name(),
                    "access denied"
                );
                Ok(Decision::deny())
            }
        }
    }

    /// Computes only the directive, before any instance exists (new/create
    /// flows). The context is marked preloading, so predicates touching the
    /// subject fail with `SubjectInaccessible` instead of silently passing.
    /// A denial yields an empty directive, not an error.
    pub fn preload(
        &self,
        actor: Option<&dyn Principal>,
        action: &Action,
        target: &TypeId,
        parent: Option<&dyn Subject>,
    ) -> Result<Directive, AuthzError> {
        let Some(actor) = actor else {
            return Ok(Directive::default());
        };
        let policy = self.registry.resolve(target);
        let ctx = EvaluationContext::preloading(Some(actor), action.clone(), target.clone(), parent);
        match self.evaluate(&policy, &ctx, actor)? {
            Some(values) => Ok(self.fill_directive(values, &policy, target)),
            None => Ok(Directive::default()),
        }
    }

    /// Host-facing wrapper: returns the directive on success, an
    /// `AccessDenied` error on denial.
    pub fn authorize(
        &self,
        actor: Option<&dyn Principal>,
        action: &Action,
        target: &TypeId,
        subject: Option<&dyn Subject>,
        parent: Option<&dyn Subject>,
    ) -> Result<Directive, AuthzError> {
        let decision = self.decide(actor, action, target, subject, parent)?;
        match decision.into_directive() {
            Some(directive) => Ok(directive),
            None => {
                let subject_name = subject
                    .map(|s| s.subject_type().to_string())
                    .unwrap_or_else(|| target.to_string());
                Err(AuthzError::access_denied(action.as_str(), subject_name))
            }
        }
    }

    fn evaluate(
        &self,
        policy: &PolicyClass,
        ctx: &EvaluationContext<'_>,
        actor: &dyn Principal,
    ) -> Result<Option<ExtractedValues>, AuthzError> {
        // Role-based scan: actor roles in assignment order, first match
        // wins across roles and rules.
        for role in actor.roles() {
            if let Some(rules) = policy.table().rules_for(&role) {
                if let Some(values) = Self::scan_rules(rules, policy.behavior(), ctx)? {
                    trace!(role = %role, "role rule matched");
                    return Ok(Some(values));
                }
            }
        }

        // Member-role path: an independent OR keyed by the behavior's
        // computed membership role. Consulted only on a role-based miss, so
        // directives never merge across the two mechanisms.
        if let Some(member_role) = policy.behavior().members_role(ctx)? {
            if let Some(rules) = policy.member_table().rules_for(&member_role) {
                if let Some(values) = Self::scan_rules(rules, policy.behavior(), ctx)? {
                    trace!(member_role = %member_role, "member-role rule matched");
                    return Ok(Some(values));
                }
            }
        }

        Ok(None)
    }

    fn scan_rules(
        rules: &[Rule],
        behavior: &dyn PolicyBehavior,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Option<ExtractedValues>, AuthzError> {
        for rule in rules {
            if rule.action != *ctx.action() {
                continue;
            }
            if let Some(values) = rule.conditions.evaluate(behavior, ctx)? {
                return Ok(Some(values));
            }
        }
        Ok(None)
    }

    fn fill_directive(
        &self,
        values: ExtractedValues,
        policy: &PolicyClass,
        target: &TypeId,
    ) -> Directive {
        let require_key = values
            .require_key
            .or_else(|| policy.defaults().require_key.clone())
            .or_else(|| Some(self.route_key(target)));
        let permit_fields = values
            .permit_fields
            .or_else(|| policy.defaults().permit_fields.clone());
        Directive {
            require_key,
            permit_fields,
        }
    }

    // Fallback require key: the underscored canonical type name
    // ("Billing::Invoice" -> "billing_invoice").
    fn route_key(&self, target: &TypeId) -> String {
        self.names
            .underscore(&self.registry.catalog().canonical_name(target))
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
