//! Declarative command trees
//!
//! Commands live in a tree keyed by space-delimited paths such as `file move`.
//! Every node may declare options, help text, filters, triggers and an exec
//! handler. Options, filters and triggers flow down from a node to all of its
//! descendants, so a global option is declared once on the root.

pub mod builder;
pub mod inherit;
pub mod node;
pub mod registry;
