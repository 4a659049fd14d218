//! Adapters implementing the collaborator ports.

pub mod memory;
pub mod sqlite;
