//! Axum binding
//!
//! Handlers return [`Failure`] (or anything convertible into it) as their
//! error type. [`error_mapping_middleware`] then re-renders the response with
//! the configured [`ErrorMapper`], the real request descriptor and the
//! request's correlation id.
//!
//! The middleware only sees failures, never plain rejection bodies, so
//! handlers read input through [`Payload`], [`FormPayload`], [`Params`] and
//! [`Segments`] instead of axum's `Json`, `Form`, `Query` and `Path`. A bare
//! axum extractor can be kept by taking `Result<Query<T>, QueryRejection>`
//! and returning `Failure::from(rejection)`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::path::ErrorKind;
use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{Extensions, HeaderValue, Method, StatusCode, Uri};
use serde::de::DeserializeOwned;

use crate::classify::Classifier;
use crate::correlation::CorrelationId;
use crate::extract::location::FieldPath;
use crate::failure::{Failure, InvalidFormat, TargetType};
use crate::ingress;
use crate::mapper::ErrorMapper;
use crate::request::RequestInfo;
use crate::response::MappedResponse;

impl IntoResponse for MappedResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(CONTENT_TYPE, HeaderValue::from_static(Self::CONTENT_TYPE))],
            self.json,
        )
            .into_response()
    }
}

/// Renders with the default classifier and a fresh correlation id, without
/// logging, and keeps the failure in the response extensions for
/// [`error_mapping_middleware`].
impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let core = Classifier::default().classify(&self);
        let correlation = CorrelationId::generate();
        let mut response = match ErrorMapper::try_render(&core, correlation.as_str()) {
            Ok(mapped) => mapped.into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Failed to render error response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };
        response.extensions_mut().insert(self);
        response
    }
}

/// Middleware replacing every failure response with the mapper's rendering.
///
/// ```ignore
/// let mapper = Arc::new(ErrorMapper::new(config));
/// let app = Router::new()
///     .route("/users", post(create_user))
///     .layer(axum::middleware::from_fn_with_state(mapper, error_mapping_middleware));
/// ```
pub async fn error_mapping_middleware(
    State(mapper): State<Arc<ErrorMapper>>,
    request: Request,
    next: Next,
) -> Response {
    let info = describe(request.method(), request.uri(), request.extensions());
    let correlation =
        CorrelationId::from_headers(request.headers(), &mapper.config().correlation_header);

    let mut response = next.run(request).await;
    match response.extensions_mut().remove::<Failure>() {
        Some(failure) => mapper.map(&failure, &info, &correlation).into_response(),
        None => response,
    }
}

impl RequestInfo {
    /// Descriptor for an inbound request head.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        describe(&parts.method, &parts.uri, &parts.extensions)
    }
}

fn describe(method: &Method, uri: &Uri, extensions: &Extensions) -> RequestInfo {
    RequestInfo {
        path: uri.path().to_owned(),
        method: method.as_str().to_owned(),
        query: uri.query().map(ToOwned::to_owned),
        remote_address: extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string()),
    }
}

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";
const QUERY_ERROR_PREFIX: &str = "Failed to deserialize query string: ";
const FORM_ERROR_PREFIX: &str = "Failed to deserialize form: ";
const FORM_BODY_ERROR_PREFIX: &str = "Failed to deserialize form body: ";

/// `[path: ]message` text of a deserialization rejection, read from its
/// source when present and from the body text otherwise.
fn rejection_detail(err: &dyn std::error::Error, body: &str, prefix: &str) -> String {
    std::error::Error::source(err).map_or_else(
        || body.strip_prefix(prefix).unwrap_or(body).to_owned(),
        ToString::to_string,
    )
}

/// Client error wrapping the located shape of a deserialization rejection.
#[track_caller]
fn deserialize_rejection(err: &dyn std::error::Error, body: &str, prefix: &str) -> Failure {
    Failure::client_error()
        .with_message(body)
        .with_cause(ingress::data_error_text(&rejection_detail(err, body, prefix)))
}

impl From<JsonRejection> for Failure {
    #[track_caller]
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                deserialize_rejection(&err, &err.body_text(), DATA_ERROR_PREFIX)
                    .with_type_name("JsonDataError")
            }
            JsonRejection::JsonSyntaxError(err) => Failure::parse()
                .with_message(err.body_text())
                .with_type_name("JsonSyntaxError"),
            JsonRejection::MissingJsonContentType(err) => Failure::unsupported_media_type()
                .with_message(err.body_text())
                .with_type_name("MissingJsonContentType"),
            other => Failure::client_error()
                .with_message(other.body_text())
                .with_type_name("JsonRejection"),
        }
    }
}

impl From<QueryRejection> for Failure {
    #[track_caller]
    fn from(rejection: QueryRejection) -> Self {
        match rejection {
            QueryRejection::FailedToDeserializeQueryString(err) => {
                deserialize_rejection(&err, &err.body_text(), QUERY_ERROR_PREFIX)
                    .with_type_name("FailedToDeserializeQueryString")
            }
            other => Failure::client_error()
                .with_message(other.body_text())
                .with_type_name("QueryRejection"),
        }
    }
}

impl From<FormRejection> for Failure {
    #[track_caller]
    fn from(rejection: FormRejection) -> Self {
        match rejection {
            FormRejection::InvalidFormContentType(err) => Failure::unsupported_media_type()
                .with_message(err.body_text())
                .with_type_name("InvalidFormContentType"),
            FormRejection::FailedToDeserializeForm(err) => {
                deserialize_rejection(&err, &err.body_text(), FORM_ERROR_PREFIX)
                    .with_type_name("FailedToDeserializeForm")
            }
            FormRejection::FailedToDeserializeFormBody(err) => {
                deserialize_rejection(&err, &err.body_text(), FORM_BODY_ERROR_PREFIX)
                    .with_type_name("FailedToDeserializeFormBody")
            }
            other => Failure::client_error()
                .with_message(other.body_text())
                .with_type_name("FormRejection"),
        }
    }
}

impl From<PathRejection> for Failure {
    #[track_caller]
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                let body = err.body_text();
                let cause = match err.kind() {
                    ErrorKind::ParseErrorAtKey {
                        key,
                        value,
                        expected_type,
                    } => {
                        let path = FieldPath::default().field(key.as_str());
                        segment_mismatch(path, value, expected_type).with_message(body.as_str())
                    }
                    ErrorKind::ParseErrorAtIndex {
                        index,
                        value,
                        expected_type,
                    } => {
                        let path = FieldPath::default().index(*index);
                        segment_mismatch(path, value, expected_type).with_message(body.as_str())
                    }
                    ErrorKind::DeserializeError { key, message, .. } => {
                        ingress::data_error(FieldPath::default().field(key.as_str()), message)
                    }
                    _ => Failure::parse().with_message(body.as_str()),
                };
                Failure::client_error()
                    .with_message(body.as_str())
                    .with_type_name("FailedToDeserializePathParams")
                    .with_cause(cause)
            }
            other => Failure::client_error()
                .with_message(other.body_text())
                .with_type_name("PathRejection"),
        }
    }
}

#[track_caller]
fn segment_mismatch(path: FieldPath, value: &str, expected_type: &str) -> Failure {
    Failure::invalid_format(InvalidFormat {
        path,
        value: value.to_owned(),
        target: TargetType::Scalar {
            name: expected_type.to_owned(),
        },
    })
}

/// JSON body extractor rejecting with a [`Failure`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Failure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Failure::from(rejection)),
        }
    }
}

/// URL-encoded form extractor rejecting with a [`Failure`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FormPayload<T>(pub T);

impl<S, T> FromRequest<S> for FormPayload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Failure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Form::<T>::from_request(req, state).await {
            Ok(axum::Form(value)) => Ok(Self(value)),
            Err(rejection) => Err(Failure::from(rejection)),
        }
    }
}

/// Query string extractor rejecting with a [`Failure`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Params<T>(pub T);

impl<S, T> FromRequestParts<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(Failure::from(rejection)),
        }
    }
}

/// Path parameter extractor rejecting with a [`Failure`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Segments<T>(pub T);

impl<S, T> FromRequestParts<S> for Segments<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(Failure::from(rejection)),
        }
    }
}

/// Router fallback for unmatched paths.
#[allow(clippy::unused_async)]
pub async fn not_found_fallback() -> Failure {
    Failure::not_found()
}

/// Router fallback for matched paths with an unsupported method.
#[allow(clippy::unused_async)]
pub async fn method_not_allowed_fallback() -> Failure {
    Failure::method_not_allowed()
}
