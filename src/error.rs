//! Error handling for the crate.
//!
//! Internally everything is an `anyhow::Error` with context attached at each I/O and SQL boundary.
//! When an error is about to leave a command handler it is classified with an `ErrorType` using
//! `IntoResult::pub_result`, so that the user sees what kind of failure happened.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The category of an error that is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Malformed input: bad amounts, dates, kinds or empty labels. Nothing was written.
    Validation,
    /// Registration or login was rejected.
    Identity,
    /// The SQLite database could not be read or written.
    Database,
    /// The data directory or its configuration file is missing or invalid.
    Config,
    /// A backup could not be created or restored.
    Backup,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error that has been classified with an `ErrorType`.
pub struct PubError {
    error_type: ErrorType,
    source: Error,
}

impl PubError {
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for PubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PubError({}, {:?})", self.error_type, self.source)
    }
}

impl Display for PubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:#}", self.error_type, self.source)
    }
}

impl std::error::Error for PubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

/// Converts a `Result` into a `Result` whose error carries an `ErrorType`.
pub trait IntoResult<T> {
    /// Classifies the error, if any. An error that is already classified keeps its original
    /// `ErrorType`.
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let source: Error = e.into();
            if source.is::<PubError>() {
                source
            } else {
                Error::new(PubError { error_type, source })
            }
        })
    }
}

/// Returns the `ErrorType` of `error` if it was classified with `pub_result`.
pub fn error_type(error: &Error) -> Option<ErrorType> {
    error.downcast_ref::<PubError>().map(PubError::error_type)
}
