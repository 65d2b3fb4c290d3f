//! Error taxonomy for the task service client.
//!
//! # Design
//! Every network-calling operation either succeeds or returns exactly one
//! `ApiError`. Server-side kinds keep the response body so callers can read
//! the service's diagnostics. Anything the taxonomy has no dedicated kind for
//! becomes `InternalServiceError`, which embeds the lower-level
//! `TransportError` as its source. Nothing here is retried.

use thiserror::Error;
use tracing::warn;

use crate::http::HttpResponse;

/// Failure below the taxonomy: either the round-trip itself failed or the
/// server answered with a status that has no dedicated kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with an unexpected non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// No response was received (connection refused, I/O error, ...).
    #[error("transport failure: {0}")]
    Io(String),
}

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the request as malformed (400).
    #[error("bad request: {body}")]
    BadRequest { body: String },

    /// The request conflicts with server state (409).
    #[error("conflict: {body}")]
    Conflict { body: String },

    /// Authentication failed while establishing a session.
    #[error("unauthorized: {body}")]
    Unauthorized { body: String },

    /// Any other failure.
    #[error("internal service error: {0}")]
    InternalServiceError(#[source] TransportError),

    /// Read or write of a field the record never had.
    #[error("field `{0}` does not exist")]
    UnknownField(String),

    /// Read or write of a name reserved for client bookkeeping.
    #[error("field `{0}` is reserved")]
    ReservedField(String),

    /// A required argument was empty or absent.
    #[error("missing required argument `{0}`")]
    MissingArgument(&'static str),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response body could not be deserialized into the expected shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

/// Field-less discriminant of `ApiError`, handy for matching in callers and
/// tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Conflict,
    Unauthorized,
    InternalServiceError,
    UnknownField,
    ReservedField,
    MissingArgument,
    Serialization,
    Deserialization,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest { .. } => ErrorKind::BadRequest,
            ApiError::Conflict { .. } => ErrorKind::Conflict,
            ApiError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ApiError::InternalServiceError(_) => ErrorKind::InternalServiceError,
            ApiError::UnknownField(_) => ErrorKind::UnknownField,
            ApiError::ReservedField(_) => ErrorKind::ReservedField,
            ApiError::MissingArgument(_) => ErrorKind::MissingArgument,
            ApiError::SerializationError(_) => ErrorKind::Serialization,
            ApiError::DeserializationError(_) => ErrorKind::Deserialization,
        }
    }

    /// Response body carried by server-side kinds.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest { body }
            | ApiError::Conflict { body }
            | ApiError::Unauthorized { body }
            | ApiError::InternalServiceError(TransportError::Status { body, .. }) => Some(body),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::InternalServiceError(err)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Map a non-2xx response to its error kind.
pub fn classify(response: &HttpResponse) -> ApiError {
    let body = response.body.clone();
    match response.status {
        400 => ApiError::BadRequest { body },
        409 => ApiError::Conflict { body },
        status => ApiError::InternalServiceError(TransportError::Status { status, body }),
    }
}

/// Like `classify`, but for the session-establishing request, where 401 and
/// 403 mean the credentials were rejected.
pub fn classify_login(response: &HttpResponse) -> ApiError {
    match response.status {
        401 | 403 => ApiError::Unauthorized {
            body: response.body.clone(),
        },
        _ => classify(response),
    }
}

/// Pass 2xx responses through; classify everything else.
pub fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    let err = classify(response);
    warn!(status = response.status, kind = ?err.kind(), "request rejected");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_400_is_bad_request_with_body() {
        let err = classify(&HttpResponse::new(400, r#"{"error":"name"}"#));
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.body(), Some(r#"{"error":"name"}"#));
    }

    #[test]
    fn status_409_is_conflict() {
        let err = classify(&HttpResponse::new(409, "stale"));
        assert!(matches!(err, ApiError::Conflict { ref body } if body == "stale"));
    }

    #[test]
    fn other_statuses_wrap_the_transport_error() {
        for status in [401, 404, 500, 503] {
            let err = classify(&HttpResponse::new(status, "boom"));
            match err {
                ApiError::InternalServiceError(TransportError::Status { status: s, ref body }) => {
                    assert_eq!(s, status);
                    assert_eq!(body, "boom");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn internal_service_error_exposes_source() {
        use std::error::Error as _;
        let err = classify(&HttpResponse::new(500, "down"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "HTTP 500: down");
    }

    #[test]
    fn login_rejections_are_unauthorized() {
        assert_eq!(
            classify_login(&HttpResponse::new(401, "")).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            classify_login(&HttpResponse::new(403, "")).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            classify_login(&HttpResponse::new(400, "")).kind(),
            ErrorKind::BadRequest
        );
    }

    #[test]
    fn check_status_passes_success_through() {
        assert!(check_status(&HttpResponse::new(200, "{}")).is_ok());
        assert!(check_status(&HttpResponse::new(204, "")).is_ok());
        assert!(check_status(&HttpResponse::new(409, "")).is_err());
    }

    #[test]
    fn transport_failure_converts_to_internal_service_error() {
        let err: ApiError = TransportError::Io("connection refused".into()).into();
        assert_eq!(err.kind(), ErrorKind::InternalServiceError);
        assert!(err.body().is_none());
    }
}
