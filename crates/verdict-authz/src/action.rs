//! Actions and declaration-time alias expansion.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The operation being authorized (e.g. `create`, `update`).
///
/// Actions are opaque identifiers; the engine compares them by value and
/// attaches no meaning to individual names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Creates a new action identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Maps meta-actions to the concrete actions they expand to.
///
/// Expansion is one level deep and happens once, when a rule is declared.
/// An alias never matches at decision time; only the expanded concrete
/// actions do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionAliases {
    map: BTreeMap<Action, Vec<Action>>,
}

impl ActionAliases {
    /// Creates an empty alias table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The conventional REST-style table:
    /// `read`, `create`, `update` and the catch-all `manage`.
    #[must_use]
    pub fn conventional() -> Self {
        let mut aliases = Self::new();
        aliases.set("read", ["index", "show"]);
        aliases.set("create", ["create", "new"]);
        aliases.set("update", ["update", "edit"]);
        aliases.set(
            "manage",
            ["index", "show", "create", "new", "update", "edit", "destroy"],
        );
        aliases
    }

    /// Defines (or redefines) an alias.
    pub fn set<A, I>(&mut self, alias: A, expansion: I)
    where
        A: Into<Action>,
        I: IntoIterator,
        I::Item: Into<Action>,
    {
        self.map.insert(
            alias.into(),
            expansion.into_iter().map(Into::into).collect(),
        );
    }

    /// Expands a single action. Non-aliases expand to themselves.
    #[must_use]
    pub fn expand(&self, action: &Action) -> Vec<Action> {
        match self.map.get(action) {
            Some(expansion) => expansion.clone(),
            None => vec![action.clone()],
        }
    }

    /// Expands a declaration list, flattening aliases in declaration order.
    #[must_use]
    pub fn expand_all<'a, I>(&self, actions: I) -> Vec<Action>
    where
        I: IntoIterator<Item = &'a Action>,
    {
        actions
            .into_iter()
            .flat_map(|action| self.expand(action))
            .collect()
    }
}
