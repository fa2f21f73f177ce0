use thiserror::Error;

/// Errors that can occur while parsing an HTTP request.
///
/// Every variant is terminal: once a [`RequestBuffer`](crate::RequestBuffer)
/// has produced one, it ignores all further input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The start line does not have the `METHOD SP target SP HTTP/1.x` shape.
    #[error("malformed start line: '{0}'")]
    MalformedStartLine(String),
    /// The method token is not a recognized HTTP method.
    #[error("invalid HTTP method: '{0}'")]
    InvalidMethod(String),
    /// The request target is empty or contains forbidden bytes.
    #[error("invalid request target: '{0}'")]
    InvalidTarget(String),
    /// The protocol version is not `HTTP/1.0` or `HTTP/1.1`.
    #[error("invalid HTTP version: 'HTTP/{0}'")]
    InvalidVersion(String),
    /// The start line exceeds the configured maximum length.
    #[error("start line exceeds maximum allowed size")]
    StartLineTooLong,
    /// A header line does not match `name: value`.
    #[error("malformed header line: '{0}'")]
    MalformedHeader(String),
    /// The header factory declined to build a header.
    #[error("header '{0}' rejected by header factory")]
    HeaderRejected(String),
    /// A header line exceeds the configured maximum length.
    #[error("header exceeds maximum allowed size")]
    HeaderTooLarge,
    /// The number of headers exceeds the configured maximum.
    #[error("number of headers exceeds maximum")]
    TooManyHeaders,
    /// The request body exceeds the configured maximum size.
    #[error("body exceeds maximum allowed size")]
    BodyTooLarge,
    /// The body storage could not be created, written, or finalized.
    #[error("body storage failure: {0}")]
    BodyStorage(String),
    /// The byte source failed while reading.
    #[error("failed to read request bytes: {0}")]
    Read(String),
    /// The input ended before a complete HTTP request was parsed.
    #[error("incomplete HTTP request")]
    IncompleteRequest,
}

impl ParseError {
    pub(crate) fn storage(err: std::io::Error) -> Self {
        Self::BodyStorage(err.to_string())
    }
}
