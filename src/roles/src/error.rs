//! Error types for role management

use thiserror::Error;

/// Failures raised by a role store adapter.
///
/// These are external failures: the role manager never reinterprets them as
/// graph-logic errors and propagates them unmodified.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is not reachable (not opened, closed, or down)
    #[error("Role store unavailable: {0}")]
    Unavailable(String),

    /// Backend-specific failure
    #[error("Role store backend error: {0}")]
    Backend(String),

    /// A stored record could not be encoded or decoded
    #[error("Role store serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Result type for role store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Role management errors
///
/// The first four variants are logical argument errors: they are never
/// transient and carry the offending role names for diagnostics.
#[derive(Debug, Error)]
pub enum RoleError {
    /// A role with this name has already been created
    #[error("Role {name} already exists.")]
    RoleAlreadyExists { name: String },

    /// The named role is not defined
    #[error("Role {name} doesn't exist.")]
    NonexistentRole { name: String },

    /// Granting would be redundant or would close a cycle
    #[error("{grantee} already includes role {role}.")]
    RoleAlreadyIncluded { grantee: String, role: String },

    /// No direct grant edge exists to revoke
    #[error("{revokee} was not granted role {role}, so it cannot be revoked.")]
    RevokeUngranted { revokee: String, role: String },

    /// Failure in the underlying role store
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RoleError {
    pub(crate) fn already_exists(name: &str) -> Self {
        RoleError::RoleAlreadyExists {
            name: name.to_string(),
        }
    }

    pub(crate) fn nonexistent(name: &str) -> Self {
        RoleError::NonexistentRole {
            name: name.to_string(),
        }
    }

    pub(crate) fn already_included(grantee: &str, role: &str) -> Self {
        RoleError::RoleAlreadyIncluded {
            grantee: grantee.to_string(),
            role: role.to_string(),
        }
    }

    pub(crate) fn revoke_ungranted(revokee: &str, role: &str) -> Self {
        RoleError::RevokeUngranted {
            revokee: revokee.to_string(),
            role: role.to_string(),
        }
    }

    /// True for the logical argument errors raised by the role graph itself
    pub fn is_argument_error(&self) -> bool {
        !matches!(self, RoleError::Store(_))
    }

    /// Argument errors are never retryable; store errors decide for themselves
    pub fn is_retryable(&self) -> bool {
        match self {
            RoleError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for role management operations
pub type Result<T> = std::result::Result<T, RoleError>;
