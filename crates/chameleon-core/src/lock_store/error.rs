//! Lock store errors.

use thiserror::Error;

/// Errors from a [`super::LockStore`] backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend I/O failure (open, transaction, commit)
    #[error("storage I/O error: {0}")]
    Io(String),

    /// Stored record could not be encoded or decoded
    #[error("storage serialization error: {0}")]
    Serialization(String),
}
