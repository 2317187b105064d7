//! Variable schema registry.
//!
//! Declarative definitions of every extractable clinical variable: value
//! type, activation rule, resolution strategy and export mapping.

pub mod catalog;
pub mod schema;
pub mod types;
pub mod vocab;

pub use schema::{export_variable_definitions, PhaseSchema, Registry};
pub use types::*;
