// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for loader operations.

use std::fmt::{self, Display};

/// The category of a load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The batch function failed as a whole. Every key of the batch fails
    /// with this error.
    BatchFailed,

    /// The batch function returned a different number of results than it
    /// was given keys. Every key of the batch fails with this error.
    ResultLengthMismatch {
        /// The number of keys passed to the batch function.
        expected: usize,
        /// The number of results it returned.
        actual: usize,
    },

    /// The batch function reported a failure for this key only.
    KeyFailed,

    /// A mapped batch function returned no value for this key.
    MissingValue,

    /// The failure was primed into the loader ahead of time.
    Primed,

    /// The dispatch that owed this load was dropped before completing, or the
    /// loader itself was dropped.
    Abandoned,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatchFailed => f.write_str("batch load failed"),
            Self::ResultLengthMismatch { expected, actual } => {
                write!(f, "batch load returned {actual} results for {expected} keys")
            }
            Self::KeyFailed => f.write_str("load failed for key"),
            Self::MissingValue => f.write_str("batch load returned no value for key"),
            Self::Primed => f.write_str("primed failure"),
            Self::Abandoned => f.write_str("load abandoned before completion"),
        }
    }
}

/// An error from a load.
///
/// Errors are cheap to clone: a single batch failure is handed to every
/// waiter of that batch. The failure reported by the batch function, if any,
/// is included in the message. When that failure is an error type rather
/// than a plain message, it is also kept as the error
/// [`source`](std::error::Error::source).
///
/// # Examples
///
/// ```
/// use multiflight::{Error, ErrorKind};
///
/// let error = Error::key_failed("row not found");
/// assert_eq!(error.kind(), ErrorKind::KeyFailed);
/// assert!(error.to_string().contains("row not found"));
/// ```
#[ohno::error]
#[derive(Clone)]
#[display("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Returns the category of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Creates an error that fails a whole batch.
    ///
    /// Use this from a custom [`BatchLoader`](crate::BatchLoader) when the
    /// fetch itself fails.
    pub fn batch_failed(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::BatchFailed, cause)
    }

    /// Creates an error that fails a single key of an otherwise successful batch.
    pub fn key_failed(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::KeyFailed, cause)
    }

    /// Creates an error for a key the batch function returned no value for.
    #[must_use]
    pub fn missing_value() -> Self {
        Self::new(ErrorKind::MissingValue)
    }

    pub(crate) fn primed(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Primed, cause)
    }

    pub(crate) fn abandoned() -> Self {
        Self::new(ErrorKind::Abandoned)
    }

    pub(crate) fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::ResultLengthMismatch { expected, actual })
    }
}

/// A specialized [`Result`] type for loader operations.
pub type Result<T> = std::result::Result<T, Error>;
