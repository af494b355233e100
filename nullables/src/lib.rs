//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies (here: storage) are abstracted behind traits. This
//! crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (e.g. inject transient failures)
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod store;

pub use store::NullStore;
