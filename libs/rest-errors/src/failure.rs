//! Request-scoped failure values and the metadata side-channel
//!
//! A [`Failure`] is what the ingress layer hands to the mapper: a recognised
//! shape ([`FailureKind`]), the original message and type name, an explicit
//! wrapped cause, and an ordered list of auxiliary failures. Classification
//! metadata is attached through that auxiliary list so unrelated failure
//! types can carry a category without being converted into one.

use std::any::{Any, type_name};
use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};

use crate::category::ErrorCategory;
use crate::error::Error;
use crate::exception::CoreException;
use crate::extract::location::FieldPath;
use crate::extract::short_type_name;

/// Individual validation violation for a specific field or property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationViolation {
    /// field path, e.g. "email" or "user.email"
    pub field: String,
    /// Human-readable message describing the violation
    pub message: String,
    /// Optional machine-readable code, `VALIDATION` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ValidationViolation {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Type a payload value failed to convert into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    /// Closed set of accepted literals (an enum).
    Enumeration {
        name: Option<String>,
        accepted: Vec<String>,
    },
    Scalar {
        name: String,
    },
}

/// A value/type mismatch found while reading a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFormat {
    pub path: FieldPath,
    pub value: String,
    pub target: TargetType,
}

/// Recognised failure shapes. Produced once by the ingress layer; the
/// classifier matches on this instead of probing concrete error types.
#[derive(Debug, Clone)]
pub enum FailureKind {
    /// Already classified.
    Classified(Box<CoreException>),
    NotFound,
    UnsupportedMediaType,
    MethodNotAllowed,
    NotAcceptable,
    Unauthenticated,
    ConstraintViolations(Vec<ValidationViolation>),
    InvalidFormat(InvalidFormat),
    /// Payload mapping failure at a known field, without a type mismatch.
    FieldMapping(FieldPath),
    /// Malformed payload with no extractable field path.
    Parse,
    /// Any other framework-level client error.
    ClientError,
    Unrecognized,
}

impl FailureKind {
    /// Shapes that only wrap a more specific cause.
    #[must_use]
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Self::ClientError | Self::Parse | Self::FieldMapping(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Classified(_) => "classified",
            Self::NotFound => "not found",
            Self::UnsupportedMediaType => "unsupported media type",
            Self::MethodNotAllowed => "method not allowed",
            Self::NotAcceptable => "not acceptable",
            Self::Unauthenticated => "unauthenticated",
            Self::ConstraintViolations(_) => "constraint violations",
            Self::InvalidFormat(_) => "invalid format",
            Self::FieldMapping(_) => "field mapping",
            Self::Parse => "parse error",
            Self::ClientError => "client error",
            Self::Unrecognized => "unrecognized failure",
        }
    }
}

/// A failure observed while serving one request.
#[derive(Debug, Clone)]
pub struct Failure {
    kind: FailureKind,
    message: Option<String>,
    type_name: Option<String>,
    cause: Option<Box<Failure>>,
    trace: Vec<String>,
    auxiliary: Vec<Failure>,
}

impl Failure {
    #[track_caller]
    #[must_use]
    pub fn new(kind: FailureKind) -> Self {
        Self::at(kind, Location::caller())
    }

    fn at(kind: FailureKind, origin: &Location<'_>) -> Self {
        Self {
            kind,
            message: None,
            type_name: None,
            cause: None,
            trace: vec![origin.to_string()],
            auxiliary: Vec::new(),
        }
    }

    /// Unrecognised failure carrying only a message.
    #[track_caller]
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unrecognized).with_message(message)
    }

    /// Capture an arbitrary error, its concrete type name and its `source()` chain.
    ///
    /// A [`Failure`] or [`CoreException`] found anywhere in the chain keeps
    /// its shape.
    #[track_caller]
    #[must_use]
    pub fn from_error<E: std::error::Error + 'static>(err: &E) -> Self {
        let origin = Location::caller();
        let any: &dyn Any = err;
        if let Some(failure) = any.downcast_ref::<Failure>() {
            return failure.clone();
        }
        if let Some(core) = any.downcast_ref::<CoreException>() {
            return Self::from(core.clone());
        }
        let mut failure = Self::at(FailureKind::Unrecognized, origin)
            .with_message(err.to_string())
            .with_type_name(short_type_name(type_name::<E>()));
        failure.cause = err.source().map(|src| Box::new(Self::from_source(src, origin)));
        failure
    }

    fn from_source(err: &(dyn std::error::Error + 'static), origin: &Location<'_>) -> Self {
        if let Some(failure) = err.downcast_ref::<Failure>() {
            return failure.clone();
        }
        if let Some(core) = err.downcast_ref::<CoreException>() {
            return Self::from(core.clone());
        }
        let mut failure = Self::at(FailureKind::Unrecognized, origin).with_message(err.to_string());
        failure.cause = err.source().map(|src| Box::new(Self::from_source(src, origin)));
        failure
    }

    #[track_caller]
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(FailureKind::NotFound)
    }

    #[track_caller]
    #[must_use]
    pub fn unsupported_media_type() -> Self {
        Self::new(FailureKind::UnsupportedMediaType)
    }

    #[track_caller]
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(FailureKind::MethodNotAllowed)
    }

    #[track_caller]
    #[must_use]
    pub fn not_acceptable() -> Self {
        Self::new(FailureKind::NotAcceptable)
    }

    #[track_caller]
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(FailureKind::Unauthenticated)
    }

    #[track_caller]
    #[must_use]
    pub fn violations(violations: Vec<ValidationViolation>) -> Self {
        Self::new(FailureKind::ConstraintViolations(violations))
    }

    #[track_caller]
    #[must_use]
    pub fn invalid_format(invalid: InvalidFormat) -> Self {
        Self::new(FailureKind::InvalidFormat(invalid))
    }

    #[track_caller]
    #[must_use]
    pub fn field_mapping(path: FieldPath) -> Self {
        Self::new(FailureKind::FieldMapping(path))
    }

    #[track_caller]
    #[must_use]
    pub fn parse() -> Self {
        Self::new(FailureKind::Parse)
    }

    #[track_caller]
    #[must_use]
    pub fn client_error() -> Self {
        Self::new(FailureKind::ClientError)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Failure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Replace the recorded call site with externally captured trace lines.
    #[must_use]
    pub fn with_trace(mut self, lines: Vec<String>) -> Self {
        self.trace = lines;
        self
    }

    #[must_use]
    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// Own message; for a classified failure, the exception message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            FailureKind::Classified(core) => Some(core.message()),
            _ => self.message.as_deref(),
        }
    }

    /// Concrete type name of the original error, when it was known.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// The wrapped inner failure, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&Failure> {
        match (&self.cause, &self.kind) {
            (Some(cause), _) => Some(&**cause),
            (None, FailureKind::Classified(core)) => core.cause(),
            (None, _) => None,
        }
    }

    #[must_use]
    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    /// Attached failures, in attachment order.
    #[must_use]
    pub fn auxiliary(&self) -> &[Failure] {
        &self.auxiliary
    }

    #[must_use]
    pub fn as_core(&self) -> Option<&CoreException> {
        match &self.kind {
            FailureKind::Classified(core) => Some(core),
            _ => None,
        }
    }

    /// Attach classification metadata and hand the same failure back.
    ///
    /// # Panics
    /// Panics when `errors` is empty.
    #[track_caller]
    #[must_use]
    pub fn attach(
        mut self,
        category: ErrorCategory,
        errors: impl IntoIterator<Item = Error>,
    ) -> Self {
        self.attach_mut(category, errors, false);
        self
    }

    /// [`Self::attach`] with the retryable flag set.
    ///
    /// # Panics
    /// Panics when `errors` is empty.
    #[track_caller]
    #[must_use]
    pub fn attach_retryable(
        mut self,
        category: ErrorCategory,
        errors: impl IntoIterator<Item = Error>,
    ) -> Self {
        self.attach_mut(category, errors, true);
        self
    }

    /// Register a [`CoreException`] wrapping a snapshot of this failure as an
    /// auxiliary entry. Kind, message and cause are left untouched.
    ///
    /// # Panics
    /// Panics when `errors` is empty.
    #[track_caller]
    pub fn attach_mut(
        &mut self,
        category: ErrorCategory,
        errors: impl IntoIterator<Item = Error>,
        retryable: bool,
    ) -> &mut Self {
        let message = self
            .message()
            .or(self.type_name())
            .unwrap_or("Unknown error")
            .to_owned();
        let core = CoreException::new(category, errors.into_iter().collect(), message)
            .with_cause(self.without_auxiliary())
            .with_retryable(retryable);
        self.auxiliary.push(Failure::from(core));
        self
    }

    /// Copy of this failure with an empty auxiliary list.
    fn without_auxiliary(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            message: self.message.clone(),
            type_name: self.type_name.clone(),
            cause: self.cause.clone(),
            trace: self.trace.clone(),
            auxiliary: Vec::new(),
        }
    }

    /// Add an arbitrary failure to the auxiliary list.
    pub fn push_auxiliary(&mut self, failure: Failure) {
        self.auxiliary.push(failure);
    }

    /// Own flag for a classified failure; otherwise the first auxiliary
    /// entry decides, and no entries means `false`.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            FailureKind::Classified(core) => core.is_retryable(),
            _ => self.auxiliary.first().is_some_and(Failure::is_retryable),
        }
    }
}

impl From<CoreException> for Failure {
    fn from(core: CoreException) -> Self {
        let trace = core.trace().to_vec();
        Self {
            kind: FailureKind::Classified(Box::new(core)),
            message: None,
            type_name: Some("CoreException".to_owned()),
            cause: None,
            trace,
            auxiliary: Vec::new(),
        }
    }
}

impl From<anyhow::Error> for Failure {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        if let Some(failure) = err.downcast_ref::<Failure>() {
            return failure.clone();
        }
        if let Some(core) = err.downcast_ref::<CoreException>() {
            return Self::from(core.clone());
        }
        let origin = Location::caller();
        let mut failure = Self::at(FailureKind::Unrecognized, origin).with_message(err.to_string());
        failure.cause = err
            .source()
            .map(|src| Box::new(Self::from_source(src, origin)));
        failure
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .message()
            .or(self.type_name())
            .unwrap_or_else(|| self.kind.label());
        f.write_str(text)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

/// Conversions from plain `Result`s into [`Failure`]-carrying ones.
pub trait ResultExt<T> {
    /// Capture the error as an unclassified [`Failure`].
    ///
    /// # Errors
    /// Returns the converted error unchanged in meaning.
    fn into_failure(self) -> Result<T, Failure>;

    /// Capture the error and attach classification metadata in one step.
    ///
    /// # Errors
    /// Returns the converted error with the metadata attached.
    fn classify_err(
        self,
        category: ErrorCategory,
        errors: impl IntoIterator<Item = Error>,
    ) -> Result<T, Failure>;
}

impl<T, E: std::error::Error + 'static> ResultExt<T> for Result<T, E> {
    #[track_caller]
    fn into_failure(self) -> Result<T, Failure> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(Failure::from_error(&e)),
        }
    }

    #[track_caller]
    fn classify_err(
        self,
        category: ErrorCategory,
        errors: impl IntoIterator<Item = Error>,
    ) -> Result<T, Failure> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(Failure::from_error(&e).attach(category, errors)),
        }
    }
}
