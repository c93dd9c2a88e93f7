//! Operations
//!
//! This module turns the GraphQL type system into MCP tool material: JSON Schemas for tool
//! arguments, selection sets for return types, and the documents that execute them.

mod document;
mod input_schema;
mod mutation_mode;
mod selection;

pub use document::{QueryDocument, Variable, synthesize};
pub use input_schema::InputSchemaCompiler;
pub use mutation_mode::MutationMode;
pub use selection::{SelectionNode, build_selection, render_selection};

/// Default recursion bound for both input schemas and selection sets
pub const DEFAULT_MAX_DEPTH: usize = 3;
