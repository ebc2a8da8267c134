//! Request correlation ids.
//!
//! An inbound id supplied by the caller is reused verbatim so tracing stays
//! continuous across hops; otherwise a fresh UUID v4 (simple, 32 hex chars)
//! is minted. The id lives for one request only.

use std::fmt;

use uuid::Uuid;

/// Opaque request-scoped identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Reuse `inbound` when present and non-empty, otherwise generate.
    pub fn obtain(inbound: Option<&str>) -> Self {
        match inbound {
            Some(v) if !v.is_empty() => Self(v.to_owned()),
            _ => Self::generate(),
        }
    }

    /// Mint a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
