//! Terminal renderer: classified failure in, wire response out
//!
//! `ErrorMapper` never fails. If the response body cannot be serialised,
//! the failure is rerouted through the `UNEXPECTED` path and the body is
//! assembled from parts that cannot fail.

use std::borrow::Cow;

use serde::Serialize;

use crate::category::ErrorCategory;
use crate::classify::{self, Classifier};
use crate::config::MapperConfig;
use crate::correlation::CorrelationIdSource;
use crate::exception::CoreException;
use crate::extract::core_cause_lines;
use crate::failure::Failure;
use crate::request::{CoreExceptionInfo, RequestInfo, RequestLog};
use crate::response::{CommonError, CommonErrorResponse, MappedResponse};

/// Failure to turn a response body into JSON.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to serialise error response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Classifies failures and renders [`MappedResponse`]s.
///
/// Holds no per-request state; one instance serves all requests.
#[derive(Debug, Clone, Default)]
pub struct ErrorMapper {
    config: MapperConfig,
    classifier: Classifier,
}

impl ErrorMapper {
    #[must_use]
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            classifier: Classifier::default(),
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    #[must_use]
    pub fn classify(&self, failure: &Failure) -> CoreException {
        self.classifier.classify(failure)
    }

    /// Classify `failure` and render it.
    #[must_use]
    pub fn map(
        &self,
        failure: &Failure,
        request: &RequestInfo,
        ids: &dyn CorrelationIdSource,
    ) -> MappedResponse {
        let core = self.classify(failure);
        self.render(&core, request, ids)
    }

    /// Log `core` and render it. The correlation id is fetched exactly once.
    #[must_use]
    pub fn render(
        &self,
        core: &CoreException,
        request: &RequestInfo,
        ids: &dyn CorrelationIdSource,
    ) -> MappedResponse {
        let correlation_id = ids.get_id();
        self.render_with(core, request, correlation_id, encode)
    }

    fn render_with<F>(
        &self,
        core: &CoreException,
        request: &RequestInfo,
        correlation_id: String,
        encode: F,
    ) -> MappedResponse
    where
        F: FnOnce(&CommonErrorResponse) -> Result<String, RenderError>,
    {
        self.log(core, request);
        let body = CommonErrorResponse::from_core(core, correlation_id);
        match encode(&body) {
            Ok(json) => MappedResponse {
                status: core.category().status(),
                body,
                json,
            },
            Err(err) => {
                tracing::error!(error = %err, "Failed to render error response");
                let unexpected = classify::unexpected(&Failure::from_error(&err));
                self.log(&unexpected, request);
                let body = CommonErrorResponse::from_core(&unexpected, body.correlation_id);
                let json = encode_infallible(&body);
                MappedResponse {
                    status: ErrorCategory::Unexpected.status(),
                    body,
                    json,
                }
            }
        }
    }

    /// Serialise an already classified exception without logging.
    ///
    /// # Errors
    /// Returns [`RenderError`] if the body cannot be serialised.
    pub fn try_render(
        core: &CoreException,
        correlation_id: impl Into<String>,
    ) -> Result<MappedResponse, RenderError> {
        let body = CommonErrorResponse::from_core(core, correlation_id);
        let json = encode(&body)?;
        Ok(MappedResponse {
            status: core.category().status(),
            body,
            json,
        })
    }

    fn log(&self, core: &CoreException, request: &RequestInfo) {
        let request = if self.config.log_request_details {
            Cow::Borrowed(request)
        } else {
            Cow::Owned(request.redacted())
        };
        let payload = RequestLog {
            request: &request,
            exception: CoreExceptionInfo::of(core),
        };
        let payload = log_payload(&payload, || format!("{} {}", request.method, request.path));

        if core.category() == ErrorCategory::Unexpected {
            let trail = core_cause_lines(core, self.config.trail_limit).join(" | ");
            tracing::error!(
                category = %core.category(),
                method = %request.method,
                request = %payload,
                trail = %trail,
                "Unexpected error: {}",
                core.message()
            );
        } else {
            tracing::warn!(
                category = %core.category(),
                method = %request.method,
                request = %payload,
                "{}: {}",
                core.category(),
                core.message()
            );
        }
    }
}

/// JSON for a log record, or `fallback()` once the encoding error is logged.
fn log_payload<T: Serialize>(payload: &T, fallback: impl FnOnce() -> String) -> String {
    match serde_json::to_string(payload) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode request log payload");
            fallback()
        }
    }
}

fn encode(body: &CommonErrorResponse) -> Result<String, RenderError> {
    Ok(serde_json::to_string(body)?)
}

/// JSON for `body` built from string pieces only. Produces the same text as
/// the serde encoding.
fn encode_infallible(body: &CommonErrorResponse) -> String {
    fn quoted(s: &str) -> String {
        serde_json::Value::String(s.to_owned()).to_string()
    }
    fn entry(e: &CommonError) -> String {
        let location = e.location.as_deref().map_or_else(|| "null".to_owned(), quoted);
        format!(
            r#"{{"code":{},"message":{},"location":{location}}}"#,
            quoted(&e.code),
            quoted(&e.message)
        )
    }

    let errors: Vec<String> = body.errors.iter().map(entry).collect();
    format!(
        r#"{{"errors":[{}],"correlationId":{},"httpStatusCode":{}}}"#,
        errors.join(","),
        quoted(&body.correlation_id),
        body.http_status_code
    )
}
