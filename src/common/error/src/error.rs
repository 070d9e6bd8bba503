//! Core error types for sift.

use thiserror::Error;

/// Result type alias using `SiftError`.
pub type SiftResult<T> = std::result::Result<T, SiftError>;

/// Core error type for sift operations.
///
/// Every payload is a plain string: published action results are replayed to
/// each handle observation, so the error must be `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SiftError {
    /// A derived-column name collides with a persistent or booked name.
    #[error("DuplicateName: {0}")]
    DuplicateName(String),

    /// An input list disagrees with the callable arity.
    #[error("ArityMismatch: {0}")]
    ArityMismatch(String),

    /// A referenced column resolves to neither a persistent column nor a
    /// booked derived column.
    #[error("UnknownColumn: {0}")]
    UnknownColumn(String),

    /// The declared input type differs from the actual column type.
    #[error("TypeMismatch: {0}")]
    TypeMismatch(String),

    /// A reduction over zero accepted rows.
    #[error("EmptyInput: {0}")]
    EmptyInput(String),

    /// Booking attempted after the root completed a pass.
    #[error("RootFrozen: {0}")]
    RootFrozen(String),

    /// Propagated from a user callable; aborts the pass.
    #[error("UserCallable: {0}")]
    UserCallable(String),

    /// Internal error (engine invariant violated).
    #[error("InternalError: {0}")]
    Internal(String),
}

impl SiftError {
    /// Create a new `DuplicateName` error.
    pub fn duplicate_name<S: Into<String>>(msg: S) -> Self {
        Self::DuplicateName(msg.into())
    }

    /// Create a new `ArityMismatch` error.
    pub fn arity_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::ArityMismatch(msg.into())
    }

    /// Create a new `UnknownColumn` error.
    pub fn unknown_column<S: Into<String>>(msg: S) -> Self {
        Self::UnknownColumn(msg.into())
    }

    /// Create a `TypeMismatch` naming the column and both type kinds.
    pub fn type_mismatch(column: &str, expected: &str, actual: &str) -> Self {
        Self::TypeMismatch(format!(
            "column \"{column}\": expected {expected}, got {actual}"
        ))
    }

    /// Create a new `EmptyInput` error.
    pub fn empty_input<S: Into<String>>(msg: S) -> Self {
        Self::EmptyInput(msg.into())
    }

    /// Create a new `RootFrozen` error.
    pub fn root_frozen<S: Into<String>>(msg: S) -> Self {
        Self::RootFrozen(msg.into())
    }

    /// Create a new `UserCallable` error.
    pub fn user_callable<S: Into<String>>(msg: S) -> Self {
        Self::UserCallable(msg.into())
    }

    /// Create a new `Internal` error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Ensure a condition holds, returning the given error variant if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::SiftError::$variant(format!($($msg)*)));
        }
    };
}
