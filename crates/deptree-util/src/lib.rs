//! Shared utilities for deptree.
//!
//! This crate provides the cross-cutting concerns used by the other deptree
//! crates: the unified error type and a couple of filesystem helpers.

pub mod errors;
pub mod fs;
