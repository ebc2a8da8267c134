//! opsdemo core: transport-agnostic primitives shared by the service crates.
//!
//! This crate defines the error surface and the request correlation id. It
//! carries no HTTP or runtime dependencies so the same types can be used by
//! the API crate, its tests, and any future tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `OpsError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod correlation;
pub mod error;

pub use correlation::CorrelationId;
/// Shared result type.
pub use error::{ClientCode, OpsError, Result};
