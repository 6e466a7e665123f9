//! Integration test suite for useful
//!
//! End-to-end tests that go through the public API and the `useful` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **object_graph**: building configuration documents, aliasing and YAML anchors
//! - **cache_behavior**: cache regimes over real files on a paused clock
//! - **concurrency**: many concurrent loads through one shared cache
//! - **cli**: the `useful` binary

mod cache_behavior;
mod cli;
mod concurrency;
mod object_graph;
