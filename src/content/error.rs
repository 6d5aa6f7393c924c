//! Boundary error for content fetches.
//!
//! Callers that render pages mostly want "content or nothing", but anything
//! watching the site needs to tell "no content" apart from "upstream is
//! down". The `try_*` fetchers return this type; the plain fetchers log it
//! and fall back to an empty result.

use crate::error::{AppError, NotionErrorCode};
use std::fmt;

/// Why a content fetch failed.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The requested object was not found (404).
    NotFound { id: String },

    /// Authentication failed or the integration lacks access.
    Unauthorized { reason: String },

    /// The API rate limit was exceeded.
    RateLimited,

    /// Network or transport error, after retries.
    Network { message: String },

    /// An operation timed out.
    Timeout { operation: String },

    /// The response did not have the shape we rely on.
    MalformedSchema { reason: String },

    /// Notion API returned an error.
    Api {
        code: String,
        message: String,
        status: u16,
    },

    /// Some other error occurred.
    Other { message: String },
}

impl FetchError {
    /// Returns `true` if this error means the resource doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this error points at the upstream being unreachable.
    pub fn is_outage(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::RateLimited
                | Self::Api {
                    status: 500..=599,
                    ..
                }
        )
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "Object not found: {}", id),
            Self::Unauthorized { reason } => write!(f, "Unauthorized: {}", reason),
            Self::RateLimited => write!(f, "Rate limited"),
            Self::Network { message } => write!(f, "Network error: {}", message),
            Self::Timeout { operation } => write!(f, "Timeout during: {}", operation),
            Self::MalformedSchema { reason } => write!(f, "Malformed schema: {}", reason),
            Self::Api { code, message, .. } => write!(f, "API error [{}]: {}", code, message),
            Self::Other { message } => write!(f, "Error: {}", message),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<AppError> for FetchError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotionService {
                code,
                message,
                status,
            } => match code {
                NotionErrorCode::ObjectNotFound => Self::NotFound { id: message },
                NotionErrorCode::Unauthorized | NotionErrorCode::RestrictedResource => {
                    Self::Unauthorized { reason: message }
                }
                NotionErrorCode::RateLimited => Self::RateLimited,
                _ => Self::Api {
                    code: code.to_string(),
                    message,
                    status: status.as_u16(),
                },
            },
            AppError::NotFound(id) => Self::NotFound { id },
            AppError::Unauthorized(reason) => Self::Unauthorized { reason },
            AppError::Timeout { operation } => Self::Timeout { operation },
            AppError::NetworkFailure(ref e) if e.is_timeout() => Self::Timeout {
                operation: e
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "request".to_string()),
            },
            AppError::NetworkFailure(_) => Self::Network {
                message: err.to_string(),
            },
            AppError::MalformedResponse(reason) => Self::MalformedSchema { reason },
            other if other.is_transient() => Self::Network {
                message: other.to_string(),
            },
            other => Self::Other {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notion_codes_map_to_causes() {
        let err: FetchError = AppError::NotionService {
            code: NotionErrorCode::ObjectNotFound,
            message: "page abc".to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
        }
        .into();
        assert!(err.is_not_found());

        let err: FetchError = AppError::NotionService {
            code: NotionErrorCode::ServiceUnavailable,
            message: "down".to_string(),
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        }
        .into();
        assert!(err.is_outage());
        assert_eq!(err.to_string(), "API error [service_unavailable]: down");
    }

    #[test]
    fn malformed_responses_are_schema_errors() {
        let err: FetchError = AppError::MalformedResponse("missing results".to_string()).into();
        assert_eq!(
            err,
            FetchError::MalformedSchema {
                reason: "missing results".to_string()
            }
        );
        assert!(!err.is_outage());
    }

    #[test]
    fn transient_messages_are_network_errors() {
        let err: FetchError = AppError::InternalError {
            message: "fetch failed".to_string(),
            source: None,
        }
        .into();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
