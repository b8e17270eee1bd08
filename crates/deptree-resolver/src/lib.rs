//! Dependency tree assembly: a resolution listener that records resolver
//! callbacks into a tree, visitors over that tree, and a builder that hides
//! which resolver generation produced it.

pub mod builder;
pub mod conflict;
pub mod event;
pub mod graph;
pub mod listener;
pub mod node;
pub mod serialize;
pub mod visitor;
