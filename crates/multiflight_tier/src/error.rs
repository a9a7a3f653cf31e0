// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache tier operations.

/// An error from a cache tier operation.
///
/// Tier errors are never fatal to a load: a failed value cache read is
/// treated as a miss and a failed write is absorbed. The error still carries
/// its cause so that it can be logged. Use [`std::error::Error::source()`]
/// to access the underlying cause if needed.
///
/// # Example
///
/// ```
/// use multiflight_tier::Error;
///
/// let error = Error::from_message("redis connection refused");
/// ```
#[ohno::error]
#[derive(Clone)]
pub struct Error {}

impl Error {
    /// Creates a new error from any type that can be converted to an error.
    ///
    /// This is the public API for creating tier errors from external crates.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiflight_tier::Error;
    ///
    /// let io = std::io::Error::other("socket closed");
    /// let error = Error::from_message(io);
    /// ```
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}

/// A specialized [`Result`] type for cache tier operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_contains_cause_message() {
        let error = Error::from_message("lookup timed out");
        let display_str = format!("{error}");
        assert!(
            display_str.contains("lookup timed out"),
            "display output should contain the cause message, got: {display_str}"
        );
    }

    #[test]
    fn clone_keeps_cause_message() {
        let error = Error::from_message("shared failure");
        let cloned = error.clone();
        assert_eq!(format!("{error}"), format!("{cloned}"));
    }

    #[test]
    fn result_alias_propagates_errors() {
        fn returns_err() -> Result<i32> {
            Err(Error::caused_by("expected failure"))
        }

        let err = returns_err().expect_err("should return an error");
        assert!(format!("{err}").contains("expected failure"));
    }
}
