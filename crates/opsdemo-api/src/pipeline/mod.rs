//! Request pipeline: the instrumentation wrapper applied to every route.

pub mod request_context;

pub use request_context::{track, UNMATCHED_ROUTE};
