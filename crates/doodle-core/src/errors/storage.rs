// ABOUTME: Storage error types for the token store and client registry
// ABOUTME: Distinguishes backend, serialization, timeout and availability failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

/// Failures raised by a token store or client registry backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend rejected or failed the operation
    #[error("Storage backend error: {context}")]
    Backend {
        /// What the backend reported
        context: String,
    },

    /// A stored record could not be encoded or decoded
    #[error("Failed to (de)serialize stored record")]
    Serialization {
        /// Underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// The operation did not complete within the configured timeout
    #[error("Storage operation '{operation}' timed out")]
    Timeout {
        /// Name of the operation that timed out
        operation: &'static str,
    },

    /// The backend cannot be reached
    #[error("Storage unavailable: {context}")]
    Unavailable {
        /// Why the backend is unavailable
        context: String,
    },
}

impl StorageError {
    /// Backend failure with the given context
    pub fn backend(context: impl Into<String>) -> Self {
        Self::Backend {
            context: context.into(),
        }
    }

    /// Unreachable backend with the given context
    pub fn unavailable(context: impl Into<String>) -> Self {
        Self::Unavailable {
            context: context.into(),
        }
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::unavailable(error.to_string())
            }
            other => Self::backend(other.to_string()),
        }
    }
}
