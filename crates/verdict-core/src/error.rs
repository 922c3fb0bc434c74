//! Error types for catalog registration.

/// Errors raised while populating an in-memory type catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The type was already registered.
    #[error("Type already registered: {type_name}")]
    DuplicateType {
        /// The offending type name.
        type_name: String,
    },

    /// The declared parent type has not been registered yet.
    #[error("Unknown parent type: {type_name}")]
    UnknownParent {
        /// The missing parent type name.
        type_name: String,
    },
}

impl CatalogError {
    /// Creates a new `DuplicateType` error.
    #[must_use]
    pub fn duplicate_type(type_name: impl Into<String>) -> Self {
        Self::DuplicateType {
            type_name: type_name.into(),
        }
    }

    /// Creates a new `UnknownParent` error.
    #[must_use]
    pub fn unknown_parent(type_name: impl Into<String>) -> Self {
        Self::UnknownParent {
            type_name: type_name.into(),
        }
    }
}
