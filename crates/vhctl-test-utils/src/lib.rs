#![deny(unsafe_code)]

//! Shared test utilities for the vhctl workspace.
//!
//! Config builders, in-memory and socket-level daemon fakes, a stub daemon
//! binary, and tracing helpers, so crate tests stay short and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! vhctl-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod daemon;
pub mod tracing_setup;
pub mod transport;
