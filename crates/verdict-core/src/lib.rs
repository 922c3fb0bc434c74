//! # verdict-core
//!
//! Host capability traits and shared identity types for the Verdict
//! authorization engine.
//!
//! The decision engine in `verdict-authz` is deliberately ignorant of how a
//! host models its domain. Everything it needs to know arrives through the
//! small surface defined here:
//!
//! - [`types`] - `TypeId`/`RoleId` identifiers and the `Principal`/`Subject`
//!   traits for actors and resolved instances
//! - [`catalog`] - the `TypeCatalog` hierarchy trait plus an in-memory
//!   implementation
//! - [`naming`] - injectable name mapping (underscore/demodulize/pluralize)
//! - [`lookup`] - the `InstanceLookup` trait for id-to-instance resolution
//! - [`params`] - request parameter map used for parent-id resolution
//! - [`error`] - catalog registration errors

pub mod catalog;
pub mod error;
pub mod lookup;
pub mod naming;
pub mod params;
pub mod types;

pub use catalog::{MemoryTypeCatalog, TypeCatalog};
pub use error::CatalogError;
pub use lookup::InstanceLookup;
pub use naming::{EnglishNameMapper, NameMapper};
pub use params::RequestParameters;
pub use types::{Principal, RoleId, Subject, TypeId};
