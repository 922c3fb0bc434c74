//! Inheritance merging.
//!
//! A child policy starts from a structural deep copy of its parent's
//! tables, then applies each declaration body in order: revocations first,
//! against the pre-existing entries only, then the body's own grants
//! appended after everything inherited. Grants declared within the same
//! body are never deleted by that body's revocations.

use verdict_core::RoleId;

use crate::action::Action;
use crate::policy::table::{PolicyTable, Rule};

/// Starts a child table from `parent` with independent storage.
#[must_use]
pub fn inherit(parent: &PolicyTable) -> PolicyTable {
    parent.deep_copy()
}

/// Applies one declaration body to `table` for the given roles.
///
/// `revocations` covers both explicit `cannot` entries and the implicit
/// revocations of `enforce` grants; each is deleted by action value before
/// any of `grants` is appended.
pub fn apply_body(
    table: &mut PolicyTable,
    roles: &[RoleId],
    revocations: &[Action],
    grants: &[Rule],
) {
    for role in roles {
        for action in revocations {
            table.revoke(role, action);
        }
        for rule in grants {
            table.append(role.clone(), rule.clone());
        }
    }
}
