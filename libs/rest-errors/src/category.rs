//! Closed error taxonomy and its HTTP status table

use std::fmt;
use std::str::FromStr;

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Loose category of a failure, mapped 1:1 onto an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Authentication,
    Authorization,
    Validation,
    Conflict,
    NotFound,
    Unprocessable,
    Unexpected,
}

/// Returned by [`ErrorCategory::from_str`] for names outside the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown error category '{0}'")]
pub struct ParseCategoryError(pub String);

impl ErrorCategory {
    /// Every category, in declaration order.
    pub const ALL: [ErrorCategory; 7] = [
        Self::Authentication,
        Self::Authorization,
        Self::Validation,
        Self::Conflict,
        Self::NotFound,
        Self::Unprocessable,
        Self::Unexpected,
    ];

    /// Stable wire name (`"NOT_FOUND"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION",
            Self::Authorization => "AUTHORIZATION",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::Unprocessable => "UNPROCESSABLE",
            Self::Unexpected => "UNEXPECTED",
        }
    }

    /// HTTP status for this category.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Numeric form of [`Self::status`], as written into response bodies.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        self.status().as_u16()
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseCategoryError(s.to_owned()))
    }
}
