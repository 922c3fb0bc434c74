//! Identity types and the host-facing actor/instance traits.
//!
//! The engine never inspects host objects directly. Actors implement
//! [`Principal`] to expose their role set, and resolved domain objects are
//! passed in behind the [`Subject`] trait so that host-specific predicates
//! can downcast to the concrete type when they need field access.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a node in the host's type hierarchy (e.g. `"Account"` or
/// `"Billing::Invoice"` for namespaced types).
///
/// Type identity is by name; the shape of the hierarchy itself comes from the
/// host's [`TypeCatalog`](crate::TypeCatalog).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(String);

impl TypeId {
    /// Creates a new type identifier.
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

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TypeId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Identifies a capability group a principal may hold (e.g. `"accountant"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    /// Creates a new role identifier.
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

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for RoleId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// An actor whose access is being decided.
///
/// Roles are returned in assignment order; the decision engine scans them in
/// that order and the first role producing a match wins.
pub trait Principal: Send + Sync {
    /// The roles held by this principal, in assignment order.
    fn roles(&self) -> Vec<RoleId>;

    /// Downcast seam for host-defined predicates that compare the actor
    /// against the subject or parent (e.g. ownership checks).
    fn as_any(&self) -> &dyn Any;
}

/// A resolved domain object passed into a decision as the subject or parent.
pub trait Subject: Send + Sync {
    /// The type identity of this object within the host's hierarchy.
    fn subject_type(&self) -> TypeId;

    /// Downcast seam for host-defined predicates.
    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn Subject + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("subject_type", &self.subject_type())
            .finish_non_exhaustive()
    }
}
