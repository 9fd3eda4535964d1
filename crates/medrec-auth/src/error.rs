//! Authentication and account error types.

use std::fmt;

use medrec_storage::StorageError;

/// Errors that can occur during authentication and account operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carries no valid session, or the credentials are wrong.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The caller is authenticated but may not perform the action.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// The request payload is missing data or carries a stale code or link.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// An account with the same email already exists.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// An error occurred while storing or retrieving account data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is caused by the client (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. }
                | Self::Forbidden { .. }
                | Self::InvalidRequest { .. }
                | Self::Conflict { .. }
        )
    }

    /// Returns `true` if this error is a server-side failure (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Message that is safe to show to clients.
    ///
    /// Server-side failures are collapsed into a generic message.
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self {
            Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::InvalidRequest { message }
            | Self::Conflict { message } => message,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "Server error"
            }
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::InvalidRequest { .. } | Self::Conflict { .. } => ErrorCategory::Request,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                ErrorCategory::Server
            }
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { message } => Self::conflict(message),
            other => Self::storage(other.to_string()),
        }
    }
}

/// Categories of auth errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or invalid credentials.
    Authentication,
    /// Authenticated but not allowed.
    Authorization,
    /// Bad request data.
    Request,
    /// Server-side failure.
    Server,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Request => write!(f, "request"),
            Self::Server => write!(f, "server"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::unauthorized("Invalid credentials");
        assert_eq!(err.to_string(), "Unauthorized: Invalid credentials");
        assert_eq!(err.public_message(), "Invalid credentials");
    }

    #[test]
    fn test_server_errors_are_hidden() {
        let err = AuthError::storage("connection refused by 10.0.0.3");
        assert!(err.is_server_error());
        assert_eq!(err.public_message(), "Server error");
    }

    #[test]
    fn test_storage_conflict_maps_to_conflict() {
        let err: AuthError = StorageError::conflict("User already exists").into();
        assert!(matches!(err, AuthError::Conflict { .. }));
        assert_eq!(err.public_message(), "User already exists");

        let err: AuthError = StorageError::internal("boom").into();
        assert!(matches!(err, AuthError::Storage { .. }));
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::forbidden("Email not verified").category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            AuthError::invalid_request("Invalid code").category().to_string(),
            "request"
        );
    }
}
