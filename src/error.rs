//! Error types for the public interface of the crate.
//!
//! Internally the crate uses `anyhow` and attaches context as errors bubble up. At the boundary of
//! a public function the error is tagged with an [`ErrorType`] through [`IntoResult::pub_result`],
//! so that callers (the CLI, the session loop and the error page) can tell a missing dataset apart
//! from a bad date or a failed chart.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The result type returned by public functions.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration file is missing, unreadable or invalid.
    Config,
    /// The data source is missing, unreadable, malformed or lacks required columns.
    Load,
    /// A date or number in the data source could not be parsed.
    Parse,
    /// The filter selection is invalid.
    Filter,
    /// Drawing a chart or writing the dashboard failed.
    Render,
    /// Reading from or writing to the terminal failed.
    Io,
    /// Anything that was not tagged with a more specific type.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type. It carries an [`ErrorType`] along with the full `anyhow` context chain.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// A one-line suggestion for the user on how to recover from this error.
    pub fn hint(&self) -> &'static str {
        match self.error_type {
            ErrorType::Load | ErrorType::Parse => {
                "Make sure the default dataset exists or upload a file (--file)."
            }
            ErrorType::Config => "Check the configuration file or remove --config to use defaults.",
            ErrorType::Filter => "Choose a start date that is on or before the end date.",
            ErrorType::Render | ErrorType::Io => "Check that the output location is writable.",
            ErrorType::Internal => "Run again with --log-level debug for more detail.",
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:#}", self.error_type, self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("error_type", &self.error_type)
            .field("inner", &self.inner)
            .finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::new(ErrorType::Internal, value)
    }
}

/// Converts an internal result into a public [`Result`] tagged with an [`ErrorType`].
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
