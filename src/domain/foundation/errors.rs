//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors raised when tool parameters (or other value objects) violate
/// their schema.
///
/// Validation collects every violation it finds instead of stopping at the
/// first one, so a single re-prompt can fix all of them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field '{field}'")]
    MissingRequired { field: String },

    #[error("Unknown field '{field}'")]
    UnknownField { field: String },

    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' expected {expected}, got {actual}")]
    InvalidType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Field '{field}' must be one of [{allowed}], got '{actual}'")]
    NotAllowed {
        field: String,
        allowed: String,
        actual: String,
    },

    #[error("Field '{field}' is out of range ({constraint}), got {actual}")]
    OutOfRange {
        field: String,
        constraint: String,
        actual: String,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{}", join_messages(.0))]
    Multiple(Vec<ValidationError>),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Creates a missing required field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Creates an empty field error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::EmptyField {
            field: field.into(),
        }
    }

    /// Creates an invalid type error.
    pub fn invalid_type(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidType {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an error for a value outside an enumerated literal set.
    pub fn not_allowed(field: impl Into<String>, allowed: &[String], actual: impl Into<String>) -> Self {
        Self::NotAllowed {
            field: field.into(),
            allowed: allowed.join(", "),
            actual: actual.into(),
        }
    }

    /// Creates an out of range error.
    pub fn out_of_range(
        field: impl Into<String>,
        constraint: impl Into<String>,
        actual: impl fmt::Display,
    ) -> Self {
        Self::OutOfRange {
            field: field.into(),
            constraint: constraint.into(),
            actual: actual.to_string(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Folds a list of violations into a single error.
    ///
    /// Returns `None` for an empty list and unwraps singletons.
    pub fn combine(mut errors: Vec<ValidationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Returns every individual violation, flattening nested `Multiple`s.
    pub fn violations(&self) -> Vec<&ValidationError> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(|e| e.violations()).collect(),
            other => vec![other],
        }
    }

    /// Returns the offending field name, if this is a single violation.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequired { field }
            | Self::UnknownField { field }
            | Self::EmptyField { field }
            | Self::InvalidType { field, .. }
            | Self::NotAllowed { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::InvalidFormat { field, .. } => Some(field),
            Self::Multiple(_) => None,
        }
    }

    /// Renders the violations as a bullet list suitable for feeding back
    /// to the model when asking it to correct its parameters.
    pub fn to_feedback(&self) -> String {
        self.violations()
            .iter()
            .map(|v| format!("- {}", v))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Error codes attached to user-visible failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    RoutingUnavailable,
    AllToolsFailed,
    SynthesisFailed,
    Cancelled,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::RoutingUnavailable => "ROUTING_UNAVAILABLE",
            ErrorCode::AllToolsFailed => "ALL_TOOLS_FAILED",
            ErrorCode::SynthesisFailed => "SYNTHESIS_FAILED",
            ErrorCode::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

impl serde::Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
