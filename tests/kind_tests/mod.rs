//! Integration tests for the braid operator
//!
//! These tests require a Kubernetes cluster (kind) and tell the story of a
//! platform team publishing templates and application teams consuming them.
//!
//! - `application_lifecycle`: an Application is linked, its objects are
//!   created one pass at a time, and later passes apply fresh renders
//!
//! # Running These Tests
//!
//! ```bash
//! cargo test --test kind -- --ignored
//! ```

mod application_lifecycle;
mod helpers;
