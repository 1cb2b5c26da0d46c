//! Error taxonomy for the administrator grant.

use std::fmt;

use thiserror::Error;

/// Failures surfaced to whoever invoked the grant.
///
/// Everything the operation does not anticipate ends up in
/// [`GrantError::Internal`]; its message is fixed so nothing about the
/// downstream failure reaches the caller. The wrapped error is still
/// available through [`std::error::Error::source`] for server-side logging.
#[derive(Debug, Error)]
pub enum GrantError {
    #[error("Only administrators can make other users admins.")]
    PermissionDenied,

    #[error("The function must be called with one argument 'email'.")]
    InvalidArgument,

    #[error("User with email {email} not found.")]
    NotFound { email: String },

    #[error("An unexpected error occurred.")]
    Internal(#[source] anyhow::Error),
}

impl GrantError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GrantError::PermissionDenied => ErrorKind::PermissionDenied,
            GrantError::InvalidArgument => ErrorKind::InvalidArgument,
            GrantError::NotFound { .. } => ErrorKind::NotFound,
            GrantError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PermissionDenied,
    InvalidArgument,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// Lower-case code, e.g. `permission-denied`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "permission-denied",
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Internal => "internal",
        }
    }

    /// Status string used in the callable error envelope.
    pub fn status(self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
