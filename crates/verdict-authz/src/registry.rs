//! Policy registry.
//!
//! Maps target types to the nearest declared policy class. Registration is
//! explicit: hosts call [`PolicyRegistry::register`] for each declared
//! type; resolution walks the type catalog's ancestor chain lazily and
//! memoizes the result. After startup the registry is immutable and safe
//! for unlimited concurrent readers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;
use verdict_core::{TypeCatalog, TypeId};

use crate::error::AuthzError;
use crate::policy::PolicyClass;

/// Type-to-policy resolution with ancestor-chain fallback.
pub struct PolicyRegistry {
    catalog: Arc<dyn TypeCatalog>,
    policies: HashMap<TypeId, Arc<PolicyClass>>,
    default_policy: Arc<PolicyClass>,
    boundary: Option<TypeId>,
    cache: RwLock<HashMap<TypeId, Arc<PolicyClass>>>,
}

impl PolicyRegistry {
    /// Creates a registry over `catalog` with a fallback policy for types
    /// that resolve to no declared ancestor.
    #[must_use]
    pub fn new(catalog: Arc<dyn TypeCatalog>, default_policy: Arc<PolicyClass>) -> Self {
        Self {
            catalog,
            policies: HashMap::new(),
            default_policy,
            boundary: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Stops the ancestor walk at `boundary` (exclusive). Ancestors at or
    /// above the boundary never resolve a policy.
    #[must_use]
    pub fn with_boundary(mut self, boundary: TypeId) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Registers the policy class declared for `ty`.
    ///
    /// Duplicate registration is a configuration error; the registry is
    /// meant to be populated once, before any decisions are served.
    pub fn register(&mut self, ty: TypeId, policy: Arc<PolicyClass>) -> Result<(), AuthzError> {
        if self.policies.contains_key(&ty) {
            return Err(AuthzError::configuration(format!(
                "policy already registered for type {ty}"
            )));
        }
        self.policies.insert(ty, policy);
        Ok(())
    }

    /// The catalog this registry resolves against.
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn TypeCatalog> {
        &self.catalog
    }

    /// The fallback policy.
    #[must_use]
    pub fn default_policy(&self) -> &Arc<PolicyClass> {
        &self.default_policy
    }

    /// Resolves the policy class governing `ty`: the first ancestor (most
    /// specific first, `ty` included) with a declared policy, else the
    /// default policy.
    ///
    /// Memoized per type. Two threads racing on a cold entry may both
    /// compute it; the walk is deterministic, so the duplicate write is
    /// idempotent.
    #[must_use]
    pub fn resolve(&self, ty: &TypeId) -> Arc<PolicyClass> {
        if let Some(policy) = self
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.get(ty).cloned())
        {
            return policy;
        }

        let policy = self.resolve_uncached(ty);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(ty.clone(), Arc::clone(&policy));
        }
        policy
    }

    fn resolve_uncached(&self, ty: &TypeId) -> Arc<PolicyClass> {
        for ancestor in self.catalog.ancestors(ty) {
            if self.boundary.as_ref() == Some(&ancestor) {
                break;
            }
            if let Some(policy) = self.policies.get(&ancestor) {
                debug!(
                    target_type = %ty,
                    resolved_via = %ancestor,
                    policy = policy.name(),
                    "resolved policy class"
                );
                return Arc::clone(policy);
            }
        }
        debug!(
            target_type = %ty,
            policy = self.default_policy.name(),
            "no declared policy along ancestor chain, using default"
        );
        Arc::clone(&self.default_policy)
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("registered", &self.policies.keys().collect::<Vec<_>>())
            .field("default_policy", &self.default_policy.name())
            .field("boundary", &self.boundary)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::builder::Grant;
    use verdict_core::MemoryTypeCatalog;

    fn create_test_catalog() -> Arc<MemoryTypeCatalog> {
        let mut catalog = MemoryTypeCatalog::new();
        catalog.register(TypeId::from("Record"), None).unwrap();
        catalog
            .register(TypeId::from("Account"), Some(&TypeId::from("Record")))
            .unwrap();
        catalog
            .register(TypeId::from("SavingsAccount"), Some(&TypeId::from("Account")))
            .unwrap();
        Arc::new(catalog)
    }

    fn plain_policy(name: &str) -> Arc<PolicyClass> {
        Arc::new(
            PolicyClass::build_plain(name, None, |b| {
                b.role(["admin"], |b| b.can(["show"], Grant::new()))
            })
            .unwrap(),
        )
    }

    fn create_test_registry() -> PolicyRegistry {
        let mut registry = PolicyRegistry::new(create_test_catalog(), plain_policy("Default"));
        registry
            .register(TypeId::from("Account"), plain_policy("Account"))
            .unwrap();
        registry
    }

    #[test]
    fn test_resolve_exact_type() {
        let registry = create_test_registry();
        assert_eq!(registry.resolve(&TypeId::from("Account")).name(), "Account");
    }

    #[test]
    fn test_resolve_walks_ancestor_chain() {
        let registry = create_test_registry();
        assert_eq!(
            registry.resolve(&TypeId::from("SavingsAccount")).name(),
            "Account"
        );
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let registry = create_test_registry();
        assert_eq!(registry.resolve(&TypeId::from("Record")).name(), "Default");
        assert_eq!(registry.resolve(&TypeId::from("Unmapped")).name(), "Default");
    }

    #[test]
    fn test_boundary_excludes_ancestors() {
        let mut registry = PolicyRegistry::new(create_test_catalog(), plain_policy("Default"))
            .with_boundary(TypeId::from("Account"));
        registry
            .register(TypeId::from("Account"), plain_policy("Account"))
            .unwrap();

        // The walk stops before reaching Account, so its policy is not
        // inherited by subclasses.
        assert_eq!(
            registry.resolve(&TypeId::from("SavingsAccount")).name(),
            "Default"
        );
        // Resolving the boundary type itself also stops immediately.
        assert_eq!(registry.resolve(&TypeId::from("Account")).name(), "Default");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = create_test_registry();
        let err = registry
            .register(TypeId::from("Account"), plain_policy("Account2"))
            .unwrap_err();
        assert!(matches!(err, AuthzError::Configuration { .. }));
    }

    #[test]
    fn test_resolution_is_memoized() {
        let registry = create_test_registry();
        let first = registry.resolve(&TypeId::from("SavingsAccount"));
        let second = registry.resolve(&TypeId::from("SavingsAccount"));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(
            registry
                .cache
                .read()
                .unwrap()
                .contains_key(&TypeId::from("SavingsAccount"))
        );
    }
}
