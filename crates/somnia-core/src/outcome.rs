//! Explicit result type for operations that must always produce a value
//!
//! Analytics never fail outward. Instead of swallowing problems, operations
//! that may fall back report *how* they produced their value so callers that
//! care can tell nominal results from degraded ones.

use serde::Serialize;

/// A value plus a note on how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// Produced by the normal path
    Nominal { value: T },
    /// Produced by a local stand-in because the data was too sparse
    Placeholder { value: T },
    /// Produced by a fallback after something went wrong
    Degraded { value: T, cause: String },
}

impl<T> Outcome<T> {
    pub fn nominal(value: T) -> Self {
        Outcome::Nominal { value }
    }

    pub fn placeholder(value: T) -> Self {
        Outcome::Placeholder { value }
    }

    pub fn degraded(value: T, cause: impl Into<String>) -> Self {
        Outcome::Degraded {
            value,
            cause: cause.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Nominal { value }
            | Outcome::Placeholder { value }
            | Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Nominal { value }
            | Outcome::Placeholder { value }
            | Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn is_nominal(&self) -> bool {
        matches!(self, Outcome::Nominal { .. })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    /// Why the fallback was used, if it was
    pub fn cause(&self) -> Option<&str> {
        match self {
            Outcome::Degraded { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Nominal { .. } => "nominal",
            Outcome::Placeholder { .. } => "placeholder",
            Outcome::Degraded { .. } => "degraded",
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Nominal { value } => Outcome::Nominal { value: f(value) },
            Outcome::Placeholder { value } => Outcome::Placeholder { value: f(value) },
            Outcome::Degraded { value, cause } => Outcome::Degraded {
                value: f(value),
                cause,
            },
        }
    }
}
