//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Generation-scoped response cache with SQLite backend
//! - Request/response types shared by the proxy and its host
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;

pub use cache::{CacheDb, EntryMeta, GenerationCache, GenerationInfo, MatchOptions};
pub use config::{AppConfig, ConfigError, Deployment, Strategy};
pub use error::Error;
pub use message::{Request, RequestMode, Response};
