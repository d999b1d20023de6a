//! Save document model for the AoR save editor: a loosely-typed value tree,
//! the load/reset/export store, pending-change tracking and typed field edits.

pub mod core_api;
pub mod document;
pub mod mutator;
pub mod path;
pub mod schema;
pub mod tracker;
pub mod value;
