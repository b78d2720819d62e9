//! Correlation id sources

use http::HeaderMap;

/// Supplies the correlation id echoed in an error response.
///
/// Queried once per mapped response; implementations must be safe to call
/// from concurrent requests.
pub trait CorrelationIdSource: Send + Sync {
    fn get_id(&self) -> String;
}

impl<F> CorrelationIdSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn get_id(&self) -> String {
        self()
    }
}

/// A correlation id fixed for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Id from `header`, or a generated one when the header is absent,
    /// empty or not valid text.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, header: &str) -> Self {
        headers
            .get(header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(Self::generate, Self::new)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CorrelationIdSource for CorrelationId {
    fn get_id(&self) -> String {
        self.0.clone()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
