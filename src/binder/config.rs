//! Binder configuration.

use serde::{Deserialize, Serialize};

/// What to do when a shaper cannot be bound entirely on the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientEvalPolicy {
    /// Fall back to client evaluation silently.
    #[default]
    Allow,
    /// Fall back to client evaluation and log a warning.
    Warn,
    /// Refuse with [`crate::ShapeError::ClientEvaluationForbidden`].
    Forbid,
}

/// Configuration for the projection binder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinderConfig {
    /// Client-evaluation fallback policy.
    pub client_eval: ClientEvalPolicy,
    /// Include fragments and parameter names in log events.
    pub sensitive_data_logging: bool,
}

impl BinderConfig {
    /// Creates a new binder configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client-evaluation policy.
    #[must_use]
    pub fn with_client_eval(mut self, policy: ClientEvalPolicy) -> Self {
        self.client_eval = policy;
        self
    }

    /// Enables or disables sensitive data in log events.
    #[must_use]
    pub fn with_sensitive_data_logging(mut self, enabled: bool) -> Self {
        self.sensitive_data_logging = enabled;
        self
    }
}
