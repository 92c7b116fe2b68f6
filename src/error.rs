use std::borrow::Cow;

use bytes::Bytes;
use derive_more::{Display, Error};
use http::{header, StatusCode};

use crate::Response;

/// Error carried through the dispatch chain.
///
/// Middleware and handlers surface failures as an `Error` with an HTTP status
/// and message; the router itself only ever raises [`not_found`](Self::not_found).
/// Everything else passes through dispatch unmodified, so an application
/// boundary can translate status codes into responses in one place, typically
/// via [`to_response`](Self::to_response).
#[derive(Debug, Clone, Display)]
#[display(fmt = "{}: {}", status, message)]
pub struct Error {
    status: StatusCode,
    message: Cow<'static, str>,
}

impl Error {
    /// Creates an error with an explicit status code and message.
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Error {
        Error {
            status,
            message: message.into(),
        }
    }

    /// No route matched the request. Raised by dispatch when the whole route
    /// tree misses; method mismatches fold into this as well.
    pub fn not_found() -> Error {
        Error::new(StatusCode::NOT_FOUND, "Not Found")
    }

    /// Reserved for applications that want a distinct method-mismatch signal;
    /// the router never raises it.
    pub fn method_not_allowed() -> Error {
        Error::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    /// Typical signal of authentication middleware.
    pub fn unauthorized() -> Error {
        Error::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    /// Typical signal of access-control middleware.
    pub fn forbidden() -> Error {
        Error::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    /// Wraps an unexpected failure as a 500-equivalent error.
    pub fn internal(err: impl std::fmt::Display) -> Error {
        Error::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }

    /// Returns the HTTP status code this error maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` for the router's no-route-matched signal.
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// Renders the error as a plain-text response.
    pub fn to_response(&self) -> Response {
        http::Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Bytes::from(self.message.to_string()))
            .expect("status and header are statically valid")
    }
}

impl std::error::Error for Error {}

/// Errors which can occur when building a path for a named route.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BuildPathError {
    /// No route is registered under the requested name.
    #[display(fmt = "no route named `{}`", _0)]
    UnknownName(#[error(not(source))] String),

    /// The template uses a parameter the value map does not provide.
    #[display(fmt = "missing value for path parameter `{}`", _0)]
    MissingParameter(#[error(not(source))] String),

    /// A provided value violates its parameter's constraint.
    #[display(fmt = "value for path parameter `{}` violates its constraint", _0)]
    InvalidParameter(#[error(not(source))] String),
}
