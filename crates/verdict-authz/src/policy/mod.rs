//! Policy classes.
//!
//! A policy class binds one node of the target type hierarchy to a merged
//! rule table. Children are built onto a deep copy of their parent's
//! tables, so declaration never mutates an ancestor.
//!
//! - [`table`] - rule storage and class defaults
//! - [`builder`] - the declaration DSL
//! - [`merge`] - inheritance merging primitives

pub mod builder;
pub mod merge;
pub mod table;

use std::fmt;
use std::sync::Arc;

use verdict_core::RoleId;

use crate::action::ActionAliases;
use crate::context::EvaluationContext;
use crate::error::AuthzError;
use crate::policy::builder::PolicyBuilder;
use crate::policy::table::{PolicyDefaults, PolicyTable};

/// Host-defined behavior attached to a policy class.
///
/// Named conditions in rules dispatch here, so hosts write predicates like
/// `associated_with_client` as ordinary match arms with full access to the
/// evaluation context. The membership hook feeds the member-role table.
pub trait PolicyBehavior: Send + Sync {
    /// Resolves a named predicate. Unimplemented names must fail loudly;
    /// treating them as a denial would mask configuration defects.
    fn predicate(
        &self,
        name: &str,
        ctx: &EvaluationContext<'_>,
    ) -> Result<bool, AuthzError> {
        let _ = ctx;
        Err(AuthzError::unknown_predicate(name))
    }

    /// Computes the actor's contextual membership role, if any. The default
    /// never matches, disabling the member-role table.
    fn members_role(
        &self,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Option<RoleId>, AuthzError> {
        let _ = ctx;
        Ok(None)
    }
}

/// Behavior with no predicates and no membership roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBehavior;

impl PolicyBehavior for DefaultBehavior {}

/// One declaration unit: merged tables, directive defaults, alias map and
/// the behavior its named predicates dispatch to. Immutable once built.
#[derive(Clone)]
pub struct PolicyClass {
    name: String,
    table: PolicyTable,
    member_table: PolicyTable,
    defaults: PolicyDefaults,
    aliases: ActionAliases,
    behavior: Arc<dyn PolicyBehavior>,
}

impl PolicyClass {
    /// Builds a policy class by running `declarations` against a builder
    /// seeded from `parent` (deep-copied tables, inherited aliases and
    /// defaults). DSL misuse surfaces here, before the class ever serves a
    /// decision.
    pub fn build<F>(
        name: impl Into<String>,
        parent: Option<&PolicyClass>,
        behavior: Arc<dyn PolicyBehavior>,
        declarations: F,
    ) -> Result<Self, AuthzError>
    where
        F: FnOnce(&mut PolicyBuilder) -> Result<(), AuthzError>,
    {
        let mut builder = match parent {
            Some(parent) => PolicyBuilder::from_parts(
                merge::inherit(&parent.table),
                merge::inherit(&parent.member_table),
                parent.aliases.clone(),
            ),
            None => PolicyBuilder::new(),
        };
        declarations(&mut builder)?;
        let built = builder.finish()?;
        let defaults = match parent {
            Some(parent) => built.defaults.or_inherit(&parent.defaults),
            None => built.defaults,
        };
        Ok(Self {
            name: name.into(),
            table: built.table,
            member_table: built.member_table,
            defaults,
            aliases: built.aliases,
            behavior,
        })
    }

    /// Builds a policy class with [`DefaultBehavior`].
    pub fn build_plain<F>(
        name: impl Into<String>,
        parent: Option<&PolicyClass>,
        declarations: F,
    ) -> Result<Self, AuthzError>
    where
        F: FnOnce(&mut PolicyBuilder) -> Result<(), AuthzError>,
    {
        Self::build(name, parent, Arc::new(DefaultBehavior), declarations)
    }

    /// The declaration name (used in logs only).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The role-keyed rule table.
    #[must_use]
    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// The member-role rule table.
    #[must_use]
    pub fn member_table(&self) -> &PolicyTable {
        &self.member_table
    }

    /// Class-level directive defaults.
    #[must_use]
    pub fn defaults(&self) -> &PolicyDefaults {
        &self.defaults
    }

    /// The effective alias table (inherited, possibly redefined).
    #[must_use]
    pub fn aliases(&self) -> &ActionAliases {
        &self.aliases
    }

    /// The attached behavior.
    #[must_use]
    pub fn behavior(&self) -> &dyn PolicyBehavior {
        self.behavior.as_ref()
    }
}

impl fmt::Debug for PolicyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyClass")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("member_table", &self.member_table)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::condition::{Condition, ConditionClause, ConditionSet};
    use crate::policy::builder::Grant;

    fn actions_for(table: &PolicyTable, role: &str) -> Vec<String> {
        table
            .rules_for(&RoleId::from(role))
            .unwrap_or(&[])
            .iter()
            .map(|r| r.action.to_string())
            .collect()
    }

    fn build_parent() -> PolicyClass {
        PolicyClass::build_plain("Base", None, |b| {
            b.role(["tester"], |b| {
                b.can(["hi"], Grant::new().when(Condition::named("ho")))?;
                b.can(["wink"], Grant::new())
            })?;
            b.role(["friend"], |b| b.can(["wink"], Grant::new()))
        })
        .unwrap()
    }

    // ------------------------------------------------------------------
    // Inheritance
    // ------------------------------------------------------------------

    #[test]
    fn test_child_additions_do_not_touch_parent() {
        let parent = build_parent();
        let child = PolicyClass::build_plain("Child", Some(&parent), |b| {
            b.role(["tester"], |b| b.can(["pout"], Grant::new()))
        })
        .unwrap();

        assert_eq!(actions_for(child.table(), "tester"), vec!["hi", "wink", "pout"]);
        assert_eq!(actions_for(parent.table(), "tester"), vec!["hi", "wink"]);
    }

    #[test]
    fn test_child_cannot_revokes_inherited_grant() {
        let parent = build_parent();
        let child = PolicyClass::build_plain("Child", Some(&parent), |b| {
            b.role(["tester"], |b| b.cannot(["wink"]))
        })
        .unwrap();

        assert_eq!(actions_for(child.table(), "tester"), vec!["hi"]);
        assert_eq!(actions_for(child.table(), "friend"), vec!["wink"]);
        assert_eq!(actions_for(parent.table(), "tester"), vec!["hi", "wink"]);
    }

    #[test]
    fn test_enforce_replaces_inherited_grant() {
        let parent = build_parent();
        let child = PolicyClass::build_plain("Child", Some(&parent), |b| {
            b.role(["tester"], |b| {
                b.can(["wink"], Grant::new().when(Condition::named("yo")).enforce())
            })?;
            b.role(["friend"], |b| {
                b.cannot(["wink"])?;
                b.can(["wink"], Grant::new())?;
                b.can(["hi"], Grant::new().when(Condition::named("sure")))
            })
        })
        .unwrap();

        let tester = child.table().rules_for(&RoleId::from("tester")).unwrap();
        assert_eq!(actions_for(child.table(), "tester"), vec!["hi", "wink"]);
        let expected: ConditionSet = [ConditionClause::If(Condition::named("yo"))]
            .into_iter()
            .collect();
        assert_eq!(tester[1].conditions, expected);

        // Same-body grant survives the body's own revocation.
        assert_eq!(actions_for(child.table(), "friend"), vec!["wink", "hi"]);

        assert_eq!(actions_for(parent.table(), "tester"), vec!["hi", "wink"]);
        assert_eq!(actions_for(parent.table(), "friend"), vec!["wink"]);
    }

    #[test]
    fn test_aliases_inherited_and_redefinable() {
        let parent = PolicyClass::build_plain("Base", None, |b| {
            b.alias_action("update", ["update", "edit"]);
            Ok(())
        })
        .unwrap();

        let child = PolicyClass::build_plain("Child", Some(&parent), |b| {
            b.role(["tester"], |b| b.can(["update"], Grant::new()))
        })
        .unwrap();
        assert_eq!(actions_for(child.table(), "tester"), vec!["update", "edit"]);
    }

    #[test]
    fn test_defaults_inherit_unless_overridden() {
        let parent = PolicyClass::build_plain("Base", None, |b| {
            b.require_key("entity");
            b.permit_fields(["aha", "joho"]);
            Ok(())
        })
        .unwrap();

        let child = PolicyClass::build_plain("Child", Some(&parent), |_| Ok(())).unwrap();
        assert_eq!(child.defaults().require_key.as_deref(), Some("entity"));

        let overriding = PolicyClass::build_plain("Override", Some(&parent), |b| {
            b.require_key("special");
            b.permit_fields(["no", "way"]);
            Ok(())
        })
        .unwrap();
        assert_eq!(overriding.defaults().require_key.as_deref(), Some("special"));
        assert_eq!(
            overriding.defaults().permit_fields,
            Some(vec!["no".to_string(), "way".to_string()])
        );
        // Parent defaults unchanged.
        assert_eq!(parent.defaults().require_key.as_deref(), Some("entity"));
    }

    // ------------------------------------------------------------------
    // Build-time failure propagation
    // ------------------------------------------------------------------

    #[test]
    fn test_build_fails_on_pending_inline_set() {
        let result = PolicyClass::build_plain("Broken", None, |b| {
            let _unconsumed = b.granting([Action::from("hi")], Grant::new());
            Ok(())
        });
        assert!(matches!(
            result.unwrap_err(),
            AuthzError::RoleAssignmentMissing { .. }
        ));
    }

    #[test]
    fn test_build_fails_on_misplaced_can() {
        let result =
            PolicyClass::build_plain("Broken", None, |b| b.can(["hi"], Grant::new()));
        assert!(matches!(result.unwrap_err(), AuthzError::NoBlock { .. }));
    }

    // ------------------------------------------------------------------
    // Behavior dispatch
    // ------------------------------------------------------------------

    #[test]
    fn test_default_behavior_rejects_predicates_and_membership() {
        let ctx = EvaluationContext::new(
            None,
            Action::from("hi"),
            verdict_core::TypeId::from("Thing"),
            None,
            None,
        );
        let err = DefaultBehavior.predicate("owner", &ctx).unwrap_err();
        assert!(matches!(err, AuthzError::UnknownPredicate { .. }));
        assert_eq!(DefaultBehavior.members_role(&ctx).unwrap(), None);
    }

    #[test]
    fn test_member_table_isolated_from_role_table() {
        let policy = PolicyClass::build_plain("Project", None, |b| {
            b.role(["admin"], |b| b.can(["destroy"], Grant::new()))?;
            b.member_role(["scrum_master"], |b| b.can(["demote"], Grant::new()))
        })
        .unwrap();

        assert!(policy.table().rules_for(&RoleId::from("scrum_master")).is_none());
        assert_eq!(actions_for(policy.member_table(), "scrum_master"), vec!["demote"]);
    }
}
