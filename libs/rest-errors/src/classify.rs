//! Failure classification
//!
//! Built-in rules run in a fixed priority order; the first rule that
//! recognises a failure wins. Caller rules run after every built-in one.
//! Whatever is left falls back to auxiliary metadata and then to
//! `UNEXPECTED`.
//!
//! Priority:
//! 1. already classified
//! 2. type mismatch (searched through wrapper causes, most specific wins)
//! 3. field mapping (searched the same way)
//! 4. protocol signals: not found, unsupported media type, method not
//!    allowed, not acceptable, authentication
//! 5. constraint violations
//! 6. malformed payload
//! 7. other client errors

use std::sync::Arc;

use crate::category::ErrorCategory;
use crate::error::{Error, ErrorCode};
use crate::exception::CoreException;
use crate::extract::serde_msg::unexpected_value_literal;
use crate::failure::{Failure, FailureKind, InvalidFormat, TargetType};

pub const UNEXPECTED_CODE: &str = "UNEXPECTED";
pub const VIOLATIONS_MESSAGE: &str = "Validation failed";
pub const PARSE_MESSAGE: &str = "JSON processing error";

/// One entry of the classification priority list.
pub trait ClassificationRule: Send + Sync {
    /// Short name used in debug logs.
    fn name(&self) -> &'static str;

    /// `Some` when this rule recognises `failure`.
    fn classify(&self, failure: &Failure) -> Option<CoreException>;
}

/// Ordered priority list of rules plus the fixed fallbacks.
#[derive(Clone)]
pub struct Classifier {
    rules: Vec<Arc<dyn ClassificationRule>>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            rules: vec![
                Arc::new(AlreadyClassified),
                Arc::new(TypeMismatch),
                Arc::new(FieldMappingRule),
                Arc::new(ProtocolSignal),
                Arc::new(ConstraintViolations),
                Arc::new(MalformedPayload),
                Arc::new(ClientError),
            ],
        }
    }
}

impl Classifier {
    /// Append a rule after all existing ones.
    #[must_use]
    pub fn with_rule(mut self, rule: impl ClassificationRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Rule names in evaluation order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Classify a failure. Always yields an exception.
    #[must_use]
    pub fn classify(&self, failure: &Failure) -> CoreException {
        for rule in &self.rules {
            if let Some(core) = rule.classify(failure) {
                tracing::trace!(
                    rule = rule.name(),
                    category = %core.category(),
                    "failure classified"
                );
                return core;
            }
        }

        if let Some(core) = failure.auxiliary().iter().find_map(Failure::as_core) {
            return core.clone();
        }
        if let Some(first) = failure.auxiliary().first() {
            return self.classify(first);
        }
        unexpected(failure)
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rule_names())
            .finish()
    }
}

/// `UNEXPECTED` exception for a failure nothing else recognised.
#[must_use]
pub fn unexpected(failure: &Failure) -> CoreException {
    let mut error = Error::new(UNEXPECTED_CODE);
    error.location = failure.type_name().map(ToOwned::to_owned);
    CoreException::new(
        ErrorCategory::Unexpected,
        vec![error],
        failure.message().unwrap_or("Unexpected"),
    )
    .with_cause(failure.clone())
}

/// Exception carrying the category name as its single error code.
fn categorised(
    category: ErrorCategory,
    failure: &Failure,
    message: impl Into<String>,
) -> CoreException {
    CoreException::new(category, vec![category.to_error()], message).with_cause(failure.clone())
}

/// `failure` followed by the causes reachable through wrapper shapes only.
fn specific_causes(failure: &Failure) -> impl Iterator<Item = &Failure> {
    std::iter::successors(Some(failure), |f| {
        if f.kind().is_wrapper() { f.cause() } else { None }
    })
}

struct AlreadyClassified;

impl ClassificationRule for AlreadyClassified {
    fn name(&self) -> &'static str {
        "already_classified"
    }

    fn classify(&self, failure: &Failure) -> Option<CoreException> {
        failure.as_core().cloned()
    }
}

struct TypeMismatch;

impl TypeMismatch {
    fn message(invalid: &InvalidFormat) -> String {
        let path = invalid.path.render();
        match &invalid.target {
            TargetType::Enumeration { accepted, .. } => format!(
                "Invalid value for {path}: {}. Must be one of: {}",
                invalid.value,
                accepted.join(", ")
            ),
            TargetType::Scalar { name } => format!(
                "Invalid value '{}' for field '{path}' of type {name}",
                invalid.value
            ),
        }
    }
}

impl ClassificationRule for TypeMismatch {
    fn name(&self) -> &'static str {
        "type_mismatch"
    }

    fn classify(&self, failure: &Failure) -> Option<CoreException> {
        specific_causes(failure).find_map(|f| match f.kind() {
            // Nothing to point at: report it like any other unreadable payload.
            FailureKind::InvalidFormat(invalid) if invalid.path.is_empty() => Some(categorised(
                ErrorCategory::Validation,
                f,
                f.message().unwrap_or(PARSE_MESSAGE),
            )),
            FailureKind::InvalidFormat(invalid) => Some(
                CoreException::new(
                    ErrorCategory::Validation,
                    vec![Error::at(ErrorCategory::Validation.as_str(), invalid.path.render())],
                    Self::message(invalid),
                )
                .with_cause(f.clone()),
            ),
            _ => None,
        })
    }
}

struct FieldMappingRule;

impl ClassificationRule for FieldMappingRule {
    fn name(&self) -> &'static str {
        "field_mapping"
    }

    fn classify(&self, failure: &Failure) -> Option<CoreException> {
        specific_causes(failure).find_map(|f| {
            let FailureKind::FieldMapping(path) = f.kind() else {
                return None;
            };
            let path = path.render();
            let literal = f
                .cause()
                .and_then(Failure::message)
                .and_then(unexpected_value_literal);
            let message = match literal {
                Some(value) => format!("Invalid value for {path}: {value}"),
                None => format!("JSON mapping error at field: {path}"),
            };
            Some(
                CoreException::new(
                    ErrorCategory::Validation,
                    vec![Error::at(ErrorCategory::Validation.as_str(), path)],
                    message,
                )
                .with_cause(f.clone()),
            )
        })
    }
}

struct ProtocolSignal;

impl ClassificationRule for ProtocolSignal {
    fn name(&self) -> &'static str {
        "protocol_signal"
    }

    fn classify(&self, failure: &Failure) -> Option<CoreException> {
        let (category, message) = match failure.kind() {
            FailureKind::NotFound => (ErrorCategory::NotFound, "Resource Not Found"),
            FailureKind::UnsupportedMediaType => {
                (ErrorCategory::Validation, "Media Type Not Supported")
            }
            FailureKind::MethodNotAllowed => (ErrorCategory::Validation, "Method Not Allowed"),
            FailureKind::NotAcceptable => (ErrorCategory::Validation, "Request Not Acceptable"),
            FailureKind::Unauthenticated => {
                tracing::debug!(
                    reason = failure.message().unwrap_or_default(),
                    "Authentication failed"
                );
                (ErrorCategory::Authentication, "Authentication required")
            }
            _ => return None,
        };
        Some(categorised(category, failure, message))
    }
}

struct ConstraintViolations;

impl ClassificationRule for ConstraintViolations {
    fn name(&self) -> &'static str {
        "constraint_violations"
    }

    fn classify(&self, failure: &Failure) -> Option<CoreException> {
        let FailureKind::ConstraintViolations(violations) = failure.kind() else {
            return None;
        };
        let errors: Vec<Error> = violations
            .iter()
            .map(|v| {
                let code = v.code.as_deref().unwrap_or(ErrorCategory::Validation.as_str());
                Error::at(code, v.field.as_str()).with_message(v.message.as_str())
            })
            .collect();
        // An empty violation set is still a validation failure.
        let errors = if errors.is_empty() {
            vec![ErrorCategory::Validation.to_error()]
        } else {
            errors
        };
        Some(
            CoreException::new(ErrorCategory::Validation, errors, VIOLATIONS_MESSAGE)
                .with_cause(failure.clone()),
        )
    }
}

struct MalformedPayload;

impl ClassificationRule for MalformedPayload {
    fn name(&self) -> &'static str {
        "malformed_payload"
    }

    fn classify(&self, failure: &Failure) -> Option<CoreException> {
        matches!(failure.kind(), FailureKind::Parse).then(|| {
            categorised(
                ErrorCategory::Validation,
                failure,
                failure.message().unwrap_or(PARSE_MESSAGE),
            )
        })
    }
}

struct ClientError;

impl ClassificationRule for ClientError {
    fn name(&self) -> &'static str {
        "client_error"
    }

    fn classify(&self, failure: &Failure) -> Option<CoreException> {
        matches!(failure.kind(), FailureKind::ClientError).then(|| {
            categorised(
                ErrorCategory::Validation,
                failure,
                failure.message().unwrap_or("Bad Request"),
            )
        })
    }
}
