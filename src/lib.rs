//! Curated directory of performance tooling.
//!
//! The crate is organized around an in-memory aggregation engine: a flat-file
//! store is loaded once at boot, entries are enriched asynchronously from
//! external providers, and every public page is served from a render cache
//! that is invalidated whenever enrichment changes the underlying data.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod enrichment;
pub mod infra;
pub mod presentation;
pub mod render;
