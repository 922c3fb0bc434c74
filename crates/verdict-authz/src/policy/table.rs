//! Merged rule tables.
//!
//! A table maps each role to the rules declared for it, in declaration
//! order. Tables are assembled once at registration time and never change
//! afterwards; revocations and `enforce` adjustments mutate the table while
//! it is being built, not at decision time.

use std::collections::BTreeMap;

use verdict_core::RoleId;

use crate::action::Action;
use crate::condition::ConditionSet;

/// One grant: an action plus the conditions gating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// The concrete (already alias-expanded) action.
    pub action: Action,
    /// Ordered condition clauses; empty means the rule always matches.
    pub conditions: ConditionSet,
}

impl Rule {
    /// Creates a rule.
    #[must_use]
    pub fn new(action: Action, conditions: ConditionSet) -> Self {
        Self { action, conditions }
    }

    /// Creates an unconditional rule.
    #[must_use]
    pub fn unconditional(action: Action) -> Self {
        Self::new(action, ConditionSet::new())
    }
}

/// Per-policy rule storage: `role -> ordered list of rules`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyTable {
    rules: BTreeMap<RoleId, Vec<Rule>>,
}

impl PolicyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The rules declared for `role`, if any.
    #[must_use]
    pub fn rules_for(&self, role: &RoleId) -> Option<&[Rule]> {
        self.rules.get(role).map(Vec::as_slice)
    }

    /// Appends a rule to `role`'s list, creating the list if needed.
    pub fn append(&mut self, role: RoleId, rule: Rule) {
        self.rules.entry(role).or_default().push(rule);
    }

    /// Removes every rule for `role` whose action equals `action`.
    /// Deletion is by value, so it stays correct across repeated merges.
    pub fn revoke(&mut self, role: &RoleId, action: &Action) {
        if let Some(list) = self.rules.get_mut(role) {
            list.retain(|rule| rule.action != *action);
        }
    }

    /// Roles with at least one declared rule.
    pub fn roles(&self) -> impl Iterator<Item = &RoleId> {
        self.rules.keys()
    }

    /// Returns `true` if no rules are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.values().all(Vec::is_empty)
    }

    /// Structural deep copy: fresh map, fresh per-role lists, fresh rules.
    /// Child tables built from this copy can be mutated freely without the
    /// ancestor ever observing the change.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        let mut rules = BTreeMap::new();
        for (role, list) in &self.rules {
            let copied: Vec<Rule> = list
                .iter()
                .map(|rule| Rule::new(rule.action.clone(), rule.conditions.clone()))
                .collect();
            rules.insert(role.clone(), copied);
        }
        Self { rules }
    }
}

/// Class-level directive defaults, inherited with only-set-if-absent
/// semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyDefaults {
    /// Default required payload key for matched rules without their own.
    pub require_key: Option<String>,
    /// Default permitted payload fields.
    pub permit_fields: Option<Vec<String>>,
}

impl PolicyDefaults {
    /// Fills unset fields from `parent`, leaving explicit overrides alone.
    #[must_use]
    pub fn or_inherit(self, parent: &PolicyDefaults) -> Self {
        Self {
            require_key: self.require_key.or_else(|| parent.require_key.clone()),
            permit_fields: self.permit_fields.or_else(|| parent.permit_fields.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(action: &str) -> Rule {
        Rule::unconditional(Action::from(action))
    }

    #[test]
    fn test_append_preserves_declaration_order() {
        let mut table = PolicyTable::new();
        table.append(RoleId::from("tester"), rule("hi"));
        table.append(RoleId::from("tester"), rule("wink"));
        table.append(RoleId::from("tester"), rule("hi"));

        let actions: Vec<&str> = table
            .rules_for(&RoleId::from("tester"))
            .unwrap()
            .iter()
            .map(|r| r.action.as_str())
            .collect();
        assert_eq!(actions, vec!["hi", "wink", "hi"]);
    }

    #[test]
    fn test_revoke_deletes_all_matching_by_value() {
        let mut table = PolicyTable::new();
        table.append(RoleId::from("tester"), rule("hi"));
        table.append(RoleId::from("tester"), rule("wink"));
        table.append(RoleId::from("tester"), rule("hi"));

        table.revoke(&RoleId::from("tester"), &Action::from("hi"));

        let actions: Vec<&str> = table
            .rules_for(&RoleId::from("tester"))
            .unwrap()
            .iter()
            .map(|r| r.action.as_str())
            .collect();
        assert_eq!(actions, vec!["wink"]);
    }

    #[test]
    fn test_deep_copy_is_structurally_independent() {
        let mut parent = PolicyTable::new();
        parent.append(RoleId::from("tester"), rule("hi"));

        let mut child = parent.deep_copy();
        child.append(RoleId::from("tester"), rule("wink"));
        child.revoke(&RoleId::from("tester"), &Action::from("hi"));

        let parent_actions: Vec<&str> = parent
            .rules_for(&RoleId::from("tester"))
            .unwrap()
            .iter()
            .map(|r| r.action.as_str())
            .collect();
        assert_eq!(parent_actions, vec!["hi"]);
    }

    #[test]
    fn test_defaults_or_inherit() {
        let parent = PolicyDefaults {
            require_key: Some("entity".to_string()),
            permit_fields: Some(vec!["aha".to_string()]),
        };

        let child = PolicyDefaults::default().or_inherit(&parent);
        assert_eq!(child.require_key.as_deref(), Some("entity"));
        assert_eq!(child.permit_fields, Some(vec!["aha".to_string()]));

        let overridden = PolicyDefaults {
            require_key: Some("special".to_string()),
            permit_fields: None,
        }
        .or_inherit(&parent);
        assert_eq!(overridden.require_key.as_deref(), Some("special"));
        assert_eq!(overridden.permit_fields, Some(vec!["aha".to_string()]));
    }
}
