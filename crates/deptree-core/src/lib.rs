//! Core data types for deptree.
//!
//! This crate defines the artifact model shared by every resolver back-end:
//! coordinates, identities used for duplicate and conflict detection, scopes,
//! artifact filters, and the `deptree.toml` configuration.
//!
//! This crate is intentionally free of tree-building logic.

pub mod artifact;
pub mod config;
pub mod filter;
