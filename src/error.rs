// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Error taxonomy shared by all engine modules. The CLI layer wraps these
/// in `anyhow` at the boundary; callers can match on the variant to render
/// a distinct message for structural and conflict failures.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Transaction of type {0} is system-managed and cannot be changed directly")]
    StructuralProtection(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        LedgerError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    /// True when the underlying sqlite failure is a uniqueness violation,
    /// used to turn a lost check-then-act race into a Conflict.
    pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: rusqlite::ffi::ErrorCode::ConstraintViolation,
                    ..
                },
                _,
            )
        )
    }
}
