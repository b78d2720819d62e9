//! Request descriptor and structured log payloads
//!
//! None of this reaches the response body.

use serde::Serialize;

use crate::exception::CoreException;
use crate::failure::Failure;

/// Read-only view of the inbound request, used for log lines only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub path: String,
    pub method: String,
    pub query: Option<String>,
    pub remote_address: Option<String>,
}

impl RequestInfo {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            query: None,
            remote_address: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_remote_address(mut self, addr: impl Into<String>) -> Self {
        self.remote_address = Some(addr.into());
        self
    }

    /// Same request with everything but the method blanked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            path: String::new(),
            method: self.method.clone(),
            query: None,
            remote_address: None,
        }
    }
}

/// Log view of an unclassified failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureInfo {
    pub message: Option<String>,
    pub cls: Option<String>,
    pub root_cause: Option<Box<FailureInfo>>,
}

impl FailureInfo {
    #[must_use]
    pub fn of(failure: &Failure) -> Self {
        Self {
            message: failure.message().map(ToOwned::to_owned),
            cls: failure.type_name().map(ToOwned::to_owned),
            root_cause: failure.cause().map(|c| Box::new(Self::of(c))),
        }
    }
}

/// Log view of a classified failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreExceptionInfo {
    pub category: String,
    pub message: String,
    pub errors: Vec<crate::error::Error>,
    pub retryable: bool,
    pub cls: &'static str,
    pub root_cause: Option<FailureInfo>,
}

impl CoreExceptionInfo {
    #[must_use]
    pub fn of(core: &CoreException) -> Self {
        Self {
            category: core.category().to_string(),
            message: core.message().to_owned(),
            errors: core.errors().to_vec(),
            retryable: core.is_retryable(),
            cls: "CoreException",
            root_cause: core.cause().map(FailureInfo::of),
        }
    }
}

/// Structured payload attached to each mapper log line.
#[derive(Debug, Clone, Serialize)]
pub struct RequestLog<'a> {
    pub request: &'a RequestInfo,
    pub exception: CoreExceptionInfo,
}
