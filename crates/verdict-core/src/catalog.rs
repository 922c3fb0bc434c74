//! Type hierarchy catalog.
//!
//! The engine resolves policies and parent identifiers by walking a type
//! hierarchy it does not own. Hosts describe that hierarchy through the
//! [`TypeCatalog`] trait; [`MemoryTypeCatalog`] is a ready-made
//! implementation for tests and hosts with a static type graph.

use std::collections::HashMap;

use crate::error::CatalogError;
use crate::types::TypeId;

/// Read access to the host's type hierarchy.
pub trait TypeCatalog: Send + Sync {
    /// The ancestor chain of `ty`, starting with `ty` itself and walking
    /// outward to the hierarchy root.
    fn ancestors(&self, ty: &TypeId) -> Vec<TypeId>;

    /// All declared descendants of `ty`, deepest first. Types with no
    /// registered subclasses return an empty list.
    fn subclasses(&self, ty: &TypeId) -> Vec<TypeId>;

    /// The human-readable canonical name for `ty`, used for deriving
    /// parameter keys (e.g. `"Billing::Invoice"`).
    fn canonical_name(&self, ty: &TypeId) -> String;
}

#[derive(Debug, Clone)]
struct TypeEntry {
    parent: Option<TypeId>,
    canonical_name: String,
    children: Vec<TypeId>,
}

/// In-memory [`TypeCatalog`] populated up front by the host.
///
/// Unregistered types are treated as roots with no subclasses and a
/// canonical name equal to their identifier, so partial registration
/// degrades gracefully.
#[derive(Debug, Clone, Default)]
pub struct MemoryTypeCatalog {
    entries: HashMap<TypeId, TypeEntry>,
}

impl MemoryTypeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `ty` with an optional parent. The canonical name defaults
    /// to the type identifier.
    pub fn register(&mut self, ty: TypeId, parent: Option<&TypeId>) -> Result<(), CatalogError> {
        let name = ty.as_str().to_string();
        self.register_named(ty, parent, name)
    }

    /// Registers `ty` with an explicit canonical name.
    ///
    /// Parents must be registered before their children so the subclass
    /// index stays consistent.
    pub fn register_named(
        &mut self,
        ty: TypeId,
        parent: Option<&TypeId>,
        canonical_name: impl Into<String>,
    ) -> Result<(), CatalogError> {
        if self.entries.contains_key(&ty) {
            return Err(CatalogError::duplicate_type(ty.as_str()));
        }
        if let Some(parent) = parent {
            let entry = self
                .entries
                .get_mut(parent)
                .ok_or_else(|| CatalogError::unknown_parent(parent.as_str()))?;
            entry.children.push(ty.clone());
        }
        self.entries.insert(
            ty,
            TypeEntry {
                parent: parent.cloned(),
                canonical_name: canonical_name.into(),
                children: Vec::new(),
            },
        );
        Ok(())
    }

    /// Returns `true` if `ty` has been registered.
    #[must_use]
    pub fn contains(&self, ty: &TypeId) -> bool {
        self.entries.contains_key(ty)
    }
}

impl TypeCatalog for MemoryTypeCatalog {
    fn ancestors(&self, ty: &TypeId) -> Vec<TypeId> {
        let mut chain = vec![ty.clone()];
        let mut current = ty;
        while let Some(entry) = self.entries.get(current) {
            match &entry.parent {
                Some(parent) => {
                    chain.push(parent.clone());
                    current = parent;
                }
                None => break,
            }
        }
        chain
    }

    fn subclasses(&self, ty: &TypeId) -> Vec<TypeId> {
        // Breadth-first by level, flattened deepest level first so callers
        // scanning for the most specific match can iterate in order.
        let mut levels: Vec<Vec<TypeId>> = Vec::new();
        let mut frontier: Vec<TypeId> = match self.entries.get(ty) {
            Some(entry) => entry.children.clone(),
            None => return Vec::new(),
        };
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for child in &frontier {
                if let Some(entry) = self.entries.get(child) {
                    next.extend(entry.children.iter().cloned());
                }
            }
            levels.push(frontier);
            frontier = next;
        }
        levels.into_iter().rev().flatten().collect()
    }

    fn canonical_name(&self, ty: &TypeId) -> String {
        match self.entries.get(ty) {
            Some(entry) => entry.canonical_name.clone(),
            None => ty.as_str().to_string(),
        }
    }
}
