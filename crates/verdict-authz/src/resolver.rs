//! Association resolver.
//!
//! Maps convention-based route identifiers onto a concrete parent
//! instance. Candidates are tried in declaration order; within one
//! candidate, declared subclasses are checked most-specific-first before
//! the base type, so a shared route can serve several subclasses. A
//! namespaced type whose full key is absent falls back to its demodulized
//! key (`"billing_invoice_id"`, then `"invoice_id"`).

use tracing::trace;
use verdict_core::{InstanceLookup, NameMapper, RequestParameters, Subject, TypeCatalog, TypeId};

/// One parent type a route may nest under, with an optional association
/// alias the host uses when attaching the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentCandidate {
    /// The candidate parent type.
    pub ty: TypeId,
    /// Association alias, when the host's relation name differs from the
    /// type name.
    pub alias: Option<String>,
}

impl ParentCandidate {
    /// Creates a candidate without an alias.
    #[must_use]
    pub fn new(ty: impl Into<TypeId>) -> Self {
        Self {
            ty: ty.into(),
            alias: None,
        }
    }

    /// Creates a candidate with an association alias.
    #[must_use]
    pub fn with_alias(ty: impl Into<TypeId>, alias: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            alias: Some(alias.into()),
        }
    }
}

/// A resolved parent.
pub struct ParentInfo {
    /// The type whose key matched (a subclass when the route is
    /// polymorphic).
    pub ty: TypeId,
    /// The underscored key that matched (without the `_id` suffix).
    pub key: String,
    /// The matched identifier value.
    pub id: String,
    /// The candidate's association alias, carried through for the host.
    pub alias: Option<String>,
    /// The instance, when the lookup found one.
    pub instance: Option<Box<dyn Subject>>,
}

impl std::fmt::Debug for ParentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParentInfo")
            .field("ty", &self.ty)
            .field("key", &self.key)
            .field("id", &self.id)
            .field("alias", &self.alias)
            .field("found", &self.instance.is_some())
            .finish()
    }
}

/// Resolves the first candidate whose id is present in `params`.
///
/// Returns `None` when no candidate matches; that is an explicit "no
/// parent" result, not an error. Rules requiring a parent simply fail to
/// match.
#[must_use]
pub fn resolve_parent(
    candidates: &[ParentCandidate],
    params: &RequestParameters,
    catalog: &dyn TypeCatalog,
    names: &dyn NameMapper,
    lookup: &dyn InstanceLookup,
) -> Option<ParentInfo> {
    for candidate in candidates {
        // Subclasses first (deepest first), then the candidate itself.
        let mut search = catalog.subclasses(&candidate.ty);
        search.push(candidate.ty.clone());

        for ty in search {
            let canonical = catalog.canonical_name(&ty);
            if let Some((key, id)) = match_key(&canonical, params, names) {
                trace!(candidate = %candidate.ty, matched = %ty, key = %key, "parent id matched");
                let instance = lookup.find(&ty, id);
                return Some(ParentInfo {
                    ty,
                    key,
                    id: id.to_string(),
                    alias: candidate.alias.clone(),
                    instance,
                });
            }
        }
        trace!(candidate = %candidate.ty, "no id for candidate");
    }
    None
}

fn match_key<'p>(
    canonical: &str,
    params: &'p RequestParameters,
    names: &dyn NameMapper,
) -> Option<(String, &'p str)> {
    let key = names.underscore(canonical);
    if let Some(id) = params.present(&format!("{key}_id")) {
        return Some((key, id));
    }
    // Namespaced types also answer to their demodulized key.
    if canonical.contains("::") {
        let key = names.underscore(&names.demodulize(canonical));
        if let Some(id) = params.present(&format!("{key}_id")) {
            return Some((key, id));
        }
    }
    None
}
