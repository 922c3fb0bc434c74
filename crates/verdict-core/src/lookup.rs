//! Instance lookup capability.

use crate::types::{Subject, TypeId};

/// Resolves an identifier to a domain object.
///
/// Used only by the association resolver; the decision engine itself never
/// fetches instances.
pub trait InstanceLookup: Send + Sync {
    /// Finds the instance of `ty` with the given id, if it exists.
    fn find(&self, ty: &TypeId, id: &str) -> Option<Box<dyn Subject>>;
}
