//! Client code for shellcache.
//!
//! This crate provides the network seam and the offline proxy that sits
//! between client requests, the origin server and the cache store.

pub mod fetch;
pub mod proxy;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use proxy::{ActivateReport, InstallReport, OfflineProxy, Outcome, Source};
