//! Resource API client for ECOE exam content.
//!
//! This crate defines the [`ResourceFetcher`] contract the editor is written
//! against, a structured [`Query`] builder for filtered listings, typed
//! helpers to decode records into model types, and an HTTP implementation
//! ([`HttpFetcher`]) that attaches a bearer credential to every request.
//!
//! With the `memory` feature, [`memory::MemoryFetcher`] provides an
//! in-memory implementation for tests.

mod config;
mod error;
mod fetcher;
mod http;
mod query;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use config::{ClientConfig, ConfigError, ENV_BASE_URL, ENV_TOKEN};
pub use error::{RequestError, Result};
pub use fetcher::{Record, ResourceFetcher, create, fetch_all, update};
pub use http::HttpFetcher;
pub use query::{Predicate, Query, SortKey};
