//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and pruning cache generations.

pub mod delete;
pub mod keys;
pub mod lookup;

pub use delete::{CacheDeleteParams, delete_impl};
pub use keys::keys_impl;
pub use lookup::{CacheMatchParams, match_impl};
