//! opsdemo service library entry.
//!
//! A small item API whose substance is the instrumentation around it: every
//! request gets a correlation id, a metrics update, and one JSON access-log
//! line. The crate is consumed by the binary (`main.rs`) and by integration
//! tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod obs;
pub mod ops;
pub mod pipeline;
pub mod router;
pub mod services;
