//! Unified error type for the ledger.
//!
//! Every failure is surfaced synchronously to the caller with a human-readable message.
//! Nothing is retried internally; retry policy belongs to the invoking client.

use thiserror::Error;

/// All errors produced by the ledger core, the record store adapter and the front-end.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed request body or stored document.
    #[error("Decode error: {message}")]
    Decode {
        /// What could not be decoded
        message: String,
    },

    /// Field-level constraint violation.
    #[error("Validation error(s): {}", fields.join(", "))]
    Validation {
        /// Description of each failing field
        fields: Vec<String>,
    },

    /// The caller's role does not authorize the operation.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Why the caller was rejected
        message: String,
    },

    /// Referenced id/role is absent.
    #[error("Record does not exist for {doc_type} with ID: {id}")]
    NotFound {
        /// Identifier that was looked up
        id: String,
        /// Document type or role tag it was looked up under
        doc_type: String,
    },

    /// Duplicate id+type on create.
    #[error("Record already exists for {doc_type} with ID: {id}")]
    AlreadyExists {
        /// Identifier that collided
        id: String,
        /// Document type of the existing record
        doc_type: String,
    },

    /// Target party (or product) is suspended.
    #[error("{doc_type} {id} is not active")]
    NotActive {
        /// Identifier of the suspended record
        id: String,
        /// Document type of the suspended record
        doc_type: String,
    },

    /// Transfer predicate matched nothing owned by the caller.
    #[error("No records found for transaction: {selector}")]
    NoMatchingUnits {
        /// Human-readable rendering of the predicate
        selector: String,
    },

    /// A status-change request that would not change anything.
    #[error("Status is already {status}")]
    NoOp {
        /// The status that is already in effect
        status: String,
    },

    /// Receipt read by a party that is not named on it.
    #[error("You are not authorized to view receipt {receipt_id}")]
    NotAuthorized {
        /// Receipt that was requested
        receipt_id: String,
    },

    /// The key being tracked does not hold a unit record.
    #[error("This tracking ID does not belong to an asset: {key}")]
    NotAnAsset {
        /// Key that was tracked
        key: String,
    },

    /// Optimistic version check failed: the key changed since it was read.
    #[error("Version conflict on key {key}: read version {expected}, found {found}")]
    Conflict {
        /// Encoded record key
        key: String,
        /// Version observed by the earlier read
        expected: i64,
        /// Version currently stored
        found: i64,
    },

    /// Underlying store read or write failed.
    #[error("Store failure: {0}")]
    Store(#[from] sea_orm::DbErr),

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// I/O failure in the front-end.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode {
            message: value.to_string(),
        }
    }
}

impl Error {
    /// Shorthand for a [`Error::PermissionDenied`] with the given message.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(id: impl Into<String>, doc_type: impl ToString) -> Self {
        Self::NotFound {
            id: id.into(),
            doc_type: doc_type.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
