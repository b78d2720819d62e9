//! `CoreException`: the canonical carrier of classified-failure state

use std::fmt;
use std::panic::Location;

use crate::category::ErrorCategory;
use crate::error::Error;
use crate::failure::Failure;

/// Raised when a [`CoreException`] is built without any [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("at least one error must be supplied")]
pub struct EmptyErrors;

/// A classified failure: category, ordered non-empty errors and a message.
///
/// Immutable once built. The optional cause is kept for diagnostics only and
/// never reaches the wire.
#[derive(Debug, Clone)]
pub struct CoreException {
    category: ErrorCategory,
    errors: Vec<Error>,
    message: String,
    cause: Option<Box<Failure>>,
    retryable: bool,
    trace: Vec<String>,
}

impl CoreException {
    /// # Panics
    /// Panics when `errors` is empty; that is a programming error at the call site.
    #[track_caller]
    #[must_use]
    pub fn new(category: ErrorCategory, errors: Vec<Error>, message: impl Into<String>) -> Self {
        assert!(!errors.is_empty(), "{}", EmptyErrors);
        Self::build(category, errors, message.into(), Location::caller())
    }

    /// Fallible twin of [`Self::new`].
    ///
    /// # Errors
    /// Returns [`EmptyErrors`] when `errors` is empty.
    #[track_caller]
    pub fn try_new(
        category: ErrorCategory,
        errors: Vec<Error>,
        message: impl Into<String>,
    ) -> Result<Self, EmptyErrors> {
        if errors.is_empty() {
            return Err(EmptyErrors);
        }
        Ok(Self::build(category, errors, message.into(), Location::caller()))
    }

    fn build(
        category: ErrorCategory,
        errors: Vec<Error>,
        message: String,
        origin: &Location<'_>,
    ) -> Self {
        Self {
            category,
            errors,
            message,
            cause: None,
            retryable: false,
            trace: vec![origin.to_string()],
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Failure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    #[must_use]
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Replace the recorded call site with externally captured trace lines.
    #[must_use]
    pub fn with_trace(mut self, lines: Vec<String>) -> Self {
        self.trace = lines;
        self
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_deref()
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    #[must_use]
    pub fn trace(&self) -> &[String] {
        &self.trace
    }
}

impl fmt::Display for CoreException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

impl std::error::Error for CoreException {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}
