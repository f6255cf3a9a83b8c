//! Endpoint implementations behind the HTTP routes.

pub mod order;
pub mod session;
