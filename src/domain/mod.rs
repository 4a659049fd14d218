//! Domain layer for the difficulty controller
//!
//! Core models, errors and the ports the orchestration service depends on.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
