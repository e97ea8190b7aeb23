use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Classification of a single upstream call that did not produce usable data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network or connection failure.
    Transport,
    /// The request did not complete within its timeout.
    Timeout,
    /// Explicit error payload or non-2xx status.
    Provider,
    /// Rate or daily limit signalled by the provider (or by the local call budget).
    Quota,
    /// Expected field absent or malformed.
    Schema,
    /// The call was never dispatched because the caller cancelled.
    Cancelled,
}

/// Structured failure for one call. Recovered where it happens; never propagated as a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFailure {
    kind: FailureKind,
    message: String,
}

impl CallFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Provider, message)
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Quota, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Schema, message)
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "cancelled before dispatch")
    }

    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_quota(&self) -> bool {
        matches!(self.kind, FailureKind::Quota)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FailureKind::Transport => "call.transport",
            FailureKind::Timeout => "call.timeout",
            FailureKind::Provider => "call.provider",
            FailureKind::Quota => "call.quota",
            FailureKind::Schema => "call.schema",
            FailureKind::Cancelled => "call.cancelled",
        }
    }
}

impl Display for CallFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for CallFailure {}
