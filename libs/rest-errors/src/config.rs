//! Mapper configuration
//!
//! Loaded leniently: a missing section means defaults, a present but
//! malformed section is an error.

use serde::{Deserialize, Serialize};

use crate::extract::DEFAULT_TRAIL_LIMIT;

pub const DEFAULT_CORRELATION_HEADER: &str = "x-request-id";

/// Configuration error for the error mapper
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("error mapper config must be an object")]
    InvalidStructure,
    #[error("invalid error mapper config: {source}")]
    InvalidConfig {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    /// Max diagnostic lines logged for an unexpected failure.
    pub trail_limit: usize,
    /// Request header carrying the correlation id.
    pub correlation_header: String,
    /// When false, path, query and remote address are left out of log lines.
    pub log_request_details: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            trail_limit: DEFAULT_TRAIL_LIMIT,
            correlation_header: DEFAULT_CORRELATION_HEADER.to_owned(),
            log_request_details: true,
        }
    }
}

impl MapperConfig {
    /// Lenient loader:
    /// - no section → defaults
    /// - `null` → defaults
    /// - not an object → [`ConfigError::InvalidStructure`]
    /// - object that fails to deserialise → [`ConfigError::InvalidConfig`]
    ///
    /// # Errors
    /// Returns `ConfigError` if the section exists but cannot be used.
    pub fn from_section(section: Option<&serde_json::Value>) -> Result<Self, ConfigError> {
        let Some(raw) = section.filter(|v| !v.is_null()) else {
            return Ok(Self::default());
        };
        if !raw.is_object() {
            return Err(ConfigError::InvalidStructure);
        }
        serde_json::from_value(raw.clone()).map_err(|source| ConfigError::InvalidConfig { source })
    }
}
