//! Wizard state for a single order.
//!
//! This module provides the order state machine: step navigation gated by
//! the per-step predicates, ornament line editing, consents and the
//! submission lifecycle.

pub mod order;

pub use order::{OrderState, WizardError, WizardEvent};
