//! Wire-format projection of a classified failure

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::exception::CoreException;

/// One entry of the `errors` array. Field order is part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonError {
    pub code: String,
    pub message: String,
    /// Always serialised, `null` when absent.
    pub location: Option<String>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonErrorResponse {
    pub errors: Vec<CommonError>,
    pub correlation_id: String,
    pub http_status_code: u16,
}

impl CommonErrorResponse {
    /// One [`CommonError`] per error of `core`, in order. Errors without their
    /// own message share the exception message.
    #[must_use]
    pub fn from_core(core: &CoreException, correlation_id: impl Into<String>) -> Self {
        let errors = core
            .errors()
            .iter()
            .map(|e| CommonError {
                code: e.code.clone(),
                message: e.message.clone().unwrap_or_else(|| core.message().to_owned()),
                location: e.location.clone(),
            })
            .collect();
        Self {
            errors,
            correlation_id: correlation_id.into(),
            http_status_code: core.category().status_code(),
        }
    }
}

/// Rendered response: status, body, and the body already serialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedResponse {
    pub status: StatusCode,
    pub body: CommonErrorResponse,
    pub json: String,
}

impl MappedResponse {
    pub const CONTENT_TYPE: &'static str = "application/json";
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::category::ErrorCategory;
    use crate::error::Error;

    #[test]
    fn serialises_fields_in_contract_order() {
        let body = CommonErrorResponse {
            errors: vec![CommonError {
                code: "VALIDATION".to_owned(),
                message: "bad".to_owned(),
                location: None,
            }],
            correlation_id: "abc".to_owned(),
            http_status_code: 400,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"errors":[{"code":"VALIDATION","message":"bad","location":null}],"correlationId":"abc","httpStatusCode":400}"#
        );
    }

    #[test]
    fn per_error_message_overrides_exception_message() {
        let core = CoreException::new(
            ErrorCategory::Validation,
            vec![
                Error::at("VALIDATION", "user.age").with_message("must be greater than 0"),
                Error::at("VALIDATION", "user.name"),
            ],
            "Validation failed",
        );
        let body = CommonErrorResponse::from_core(&core, "id-1");
        assert_eq!(body.errors[0].message, "must be greater than 0");
        assert_eq!(body.errors[1].message, "Validation failed");
        assert_eq!(body.errors[1].location.as_deref(), Some("user.name"));
        assert_eq!(body.http_status_code, 400);
        assert_eq!(body.correlation_id, "id-1");
    }

    #[test]
    fn status_follows_category() {
        for category in ErrorCategory::ALL {
            let core = CoreException::new(category, vec![Error::new(category.as_str())], "m");
            assert_eq!(
                CommonErrorResponse::from_core(&core, "x").http_status_code,
                category.status_code()
            );
        }
    }
}
