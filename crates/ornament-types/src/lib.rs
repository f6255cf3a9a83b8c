//! Common types module for the ornament order system.
//!
//! This module defines the data model shared by every crate in the workspace:
//! the form schema, the wizard state, the persisted order record, money
//! amounts and the HTTP API payloads. Keeping them in one place ensures the
//! storage layer, the wizard core and the service agree on a single shape.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Form schema types: buyer fields, consent flags and ornament designs.
pub mod form;
/// Money amounts held in integer cents.
pub mod money;
/// Wizard state and persisted order record types.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Storage types for managing persistent data.
pub mod storage;
/// Log formatting helpers.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use form::*;
pub use money::Money;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use storage::*;
pub use utils::truncate_id;
pub use validation::*;
