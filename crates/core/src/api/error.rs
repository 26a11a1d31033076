//! Failure taxonomy for the request-executor boundary.

use thiserror::Error;

/// Normalised failure classes for one backend call.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transport failure: no usable response arrived.
    #[error("network error: {0}")]
    Network(String),
    /// Authorization failure (401/403).
    #[error("request refused with status {status}")]
    Unauthorized {
        /// HTTP status code that triggered the refusal.
        status: u16,
        /// Message extracted from the response body, when present.
        message: Option<String>,
    },
    /// Application-level failure: the envelope did not report success.
    #[error("{}", message.as_deref().unwrap_or("request rejected by backend"))]
    Rejected {
        /// Backend-provided message, when present.
        message: Option<String>,
    },
    /// Precondition failure: an operation requiring a credential had none.
    #[error("no credential available")]
    MissingToken,
    /// The response payload did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl ApiError {
    /// Whether this failure is an authorization refusal.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Message supplied by the backend, when the failure carried one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message, .. } | Self::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }

    /// Select the user-visible message for this failure.
    ///
    /// Precedence: backend-provided message, then the caller's
    /// authorization hint for 401/403, then the generic fallback.
    pub fn user_message(&self, fallback: &str, forbidden_hint: Option<&str>) -> String {
        if let Some(message) = self.backend_message() {
            return message.to_string();
        }
        if self.is_authorization() {
            if let Some(hint) = forbidden_hint {
                return hint.to_string();
            }
        }
        fallback.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_wins_over_hint_and_fallback() {
        let error = ApiError::Unauthorized {
            status: 403,
            message: Some("No puedes abandonar esta comunidad porque eres el administrador".into()),
        };
        assert_eq!(
            error.user_message("Error al abandonar la comunidad", Some("hint")),
            "No puedes abandonar esta comunidad porque eres el administrador"
        );
    }

    #[test]
    fn hint_applies_only_to_authorization_failures() {
        let unauthorized = ApiError::Unauthorized {
            status: 403,
            message: None,
        };
        assert_eq!(unauthorized.user_message("fallback", Some("hint")), "hint");

        let network = ApiError::Network("boom".into());
        assert_eq!(network.user_message("fallback", Some("hint")), "fallback");
    }
}
