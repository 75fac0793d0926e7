//! SQLite-backed cache store for versioned response generations.
//!
//! This module provides the opaque key-value store the offline proxy owns,
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named generations, enumerated in creation order
//! - Request-keyed entries (method + URL) with optional query-insensitive lookup
//! - Whole-entry replacement on every write
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{EntryMeta, GenerationCache, MatchOptions};
pub use generations::GenerationInfo;
