//! Core of the ornament order service.
//!
//! This crate holds the order wizard: tiered pricing, the step-gated state
//! machine, the order writer that appends to the `orders` collection, the
//! per-visitor session registry, and the builder that assembles them from
//! configuration.

pub mod builder;
pub mod engine;
pub mod price;
pub mod session;
pub mod state;
pub mod view;
pub mod wizard;
pub mod writer;

pub use builder::{BuilderError, EngineBuilder, EngineFactories};
pub use engine::OrderEngine;
pub use price::{price, PriceSchedule};
pub use session::{SessionError, SessionRegistry};
pub use state::{OrderState, WizardError, WizardEvent};
pub use wizard::Wizard;
pub use writer::{OrderStore, OrderWriter, WriteError};
