//! Error normalization for REST services
//!
//! Every failure raised while serving a request is classified into one of
//! seven [`ErrorCategory`] values and rendered as a [`CommonErrorResponse`]:
//!
//! ```json
//! { "errors": [ { "code": "...", "message": "...", "location": null } ],
//!   "correlationId": "...", "httpStatusCode": 400 }
//! ```
//!
//! - [`Error`], [`ErrorCode`], [`CoreException`]: the error model
//! - [`Failure`]: request-scoped failure value with attachable metadata
//! - [`Classifier`]: ordered classification rules
//! - [`ErrorMapper`]: terminal renderer with logging
//! - `web` (feature `axum`): middleware, rejections and fallbacks
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod category;
pub mod classify;
pub mod config;
pub mod correlation;
pub mod error;
pub mod exception;
pub mod extract;
pub mod failure;
pub mod ingress;
pub mod mapper;
pub mod request;
pub mod response;
#[cfg(feature = "axum")]
pub mod web;

pub use category::{ErrorCategory, ParseCategoryError};
pub use classify::{ClassificationRule, Classifier};
pub use config::{ConfigError, MapperConfig};
pub use correlation::{CorrelationId, CorrelationIdSource};
pub use error::{Arguments, Error, ErrorCode};
pub use exception::{CoreException, EmptyErrors};
pub use extract::{FieldPath, PathSegment};
pub use failure::{Failure, FailureKind, InvalidFormat, ResultExt, TargetType, ValidationViolation};
pub use mapper::{ErrorMapper, RenderError};
pub use request::RequestInfo;
pub use response::{CommonError, CommonErrorResponse, MappedResponse};

#[cfg(feature = "macros")]
pub use rest_errors_macro::ErrorCode;
