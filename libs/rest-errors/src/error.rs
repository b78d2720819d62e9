//! Single error conditions and the `ErrorCode` capability

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::ErrorCategory;

/// Interpolation arguments attached to an [`Error`].
pub type Arguments = BTreeMap<String, serde_json::Value>;

/// One error condition: a stable code, an optional payload location and the
/// arguments used to interpolate a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct Error {
    /// Stable machine-readable identifier.
    pub code: String,
    /// Dotted/bracketed path of the offending field, e.g. `user.email`.
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: Arguments,
    /// Per-error message; replaces the exception message when rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Error {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            location: None,
            arguments: Arguments::new(),
            message: None,
        }
    }

    pub fn at(code: impl Into<String>, location: impl Into<String>) -> Self {
        Self::new(code).with_location(location)
    }

    pub fn from_code<C: ErrorCode + ?Sized>(code: &C) -> Self {
        Self::new(code.code())
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }

    /// Add one argument. Values that cannot be represented as JSON are skipped.
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.arguments.insert(name.into(), v);
        }
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Closed sets of named error constants that know their wire code.
///
/// Usually implemented by fieldless enums, either by hand or with
/// `#[derive(ErrorCode)]` from `rest-errors-macro`.
pub trait ErrorCode {
    fn code(&self) -> &str;

    fn to_error(&self) -> Error {
        Error::new(self.code())
    }

    fn to_error_at(&self, location: &str) -> Error {
        Error::at(self.code(), location)
    }

    fn to_error_with(&self, arguments: Arguments) -> Error {
        Error::new(self.code()).with_arguments(arguments)
    }
}

impl ErrorCode for ErrorCategory {
    fn code(&self) -> &str {
        self.as_str()
    }
}

impl ErrorCode for str {
    fn code(&self) -> &str {
        self
    }
}
