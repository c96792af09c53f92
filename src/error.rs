//! Error types for projection binding.

use thiserror::Error;

use crate::shaping::ProjectionMember;
use crate::types::QueryId;

/// Result type alias using [`ShapeError`].
pub type Result<T> = std::result::Result<T, ShapeError>;

/// Errors raised while binding a shaping tree.
///
/// Server-side untranslatability is not an error: it is reported as `None`
/// by the server pass and triggers the client-eval retry. Every variant here
/// is either a defect in the tree handed to the binder or a configured
/// refusal, and is never retried.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// An entity shaper's value buffer was bound against another query.
    #[error("Value buffer belongs to query {actual}, but the shaper is being bound against query {expected}")]
    ValueBufferMismatch { expected: QueryId, actual: QueryId },

    /// A node that only the binder itself produces was found in its input.
    #[error("Unexpected {0} node in shaping tree")]
    UnexpectedNode(&'static str),

    /// No fragment is registered under the requested projection address.
    #[error("No projection registered for member {0}")]
    MissingProjection(ProjectionMember),

    /// A value buffer points at a slot the projection list does not have.
    #[error("Invalid value buffer: {0}")]
    InvalidValueBuffer(String),

    /// The shaper needs client evaluation but the configuration forbids it.
    #[error("Client evaluation is disabled: {node} at {member} cannot be translated to a store projection")]
    ClientEvaluationForbidden {
        node: &'static str,
        member: ProjectionMember,
    },

    /// A runtime parameter lookup found no value.
    #[error("Missing parameter value: {0}")]
    MissingParameter(String),

    /// Type mismatch errors.
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_display_names_both_queries() {
        let expected = QueryId::new();
        let actual = QueryId::new();
        let msg = ShapeError::ValueBufferMismatch { expected, actual }.to_string();
        assert!(msg.contains(&expected.to_string()));
        assert!(msg.contains(&actual.to_string()));
    }

    #[test]
    fn test_missing_projection_display() {
        let err = ShapeError::MissingProjection(ProjectionMember::root());
        assert_eq!(err.to_string(), "No projection registered for member <root>");
    }
}
