//! Unified error types for the domain layer
//!
//! Every fatal condition raised by the page tree model is a `DomainError`.
//! Recoverable anomalies (an LLM asking to remove an entry that does not exist)
//! are logged where they happen and never surface here.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A page was constructed with a shape the page tree can never contain
    #[error("Structural invariant violated: {0}")]
    StructuralInvariantViolation(String),

    /// A keyed-entry identifier did not match `{prefix}-{n}`
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if title.trim().is_empty() {
    ///     return Err(DomainError::validation("Story title cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a structural invariant violation (bad page shape)
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::StructuralInvariantViolation(msg.into())
    }

    /// Create a malformed identifier error
    pub fn malformed_id(id: impl Into<String>) -> Self {
        Self::MalformedIdentifier(id.into())
    }

    /// Returns true for errors raised by page construction.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::StructuralInvariantViolation(_))
    }
}
