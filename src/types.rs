use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::ParseError;
use crate::header::Headers;
use crate::line::is_target_byte;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// HTTP request methods accepted on the start line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
    LINK,
    UNLINK,
}

impl Method {
    /// Parse a method from its token bytes.
    ///
    /// Matching ignores ASCII case; the start-line grammar has already
    /// restricted the token to uppercase letters.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        const ALL: [Method; 11] = [
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::CONNECT,
            Method::OPTIONS,
            Method::TRACE,
            Method::PATCH,
            Method::LINK,
            Method::UNLINK,
        ];

        ALL.into_iter()
            .find(|m| m.as_str().as_bytes().eq_ignore_ascii_case(bytes))
            .ok_or_else(|| ParseError::InvalidMethod(String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Return the method as a static string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GET => "GET",
            Self::HEAD => "HEAD",
            Self::POST => "POST",
            Self::PUT => "PUT",
            Self::DELETE => "DELETE",
            Self::CONNECT => "CONNECT",
            Self::OPTIONS => "OPTIONS",
            Self::TRACE => "TRACE",
            Self::PATCH => "PATCH",
            Self::LINK => "LINK",
            Self::UNLINK => "UNLINK",
        }
    }

    /// Methods that carry no body unless the message says otherwise
    /// (a `Content-Length` or bytes after the header block).
    pub fn is_bodiless(&self) -> bool {
        matches!(
            self,
            Self::GET | Self::HEAD | Self::OPTIONS | Self::TRACE | Self::CONNECT | Self::DELETE
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProtocolVersion
// ---------------------------------------------------------------------------

/// HTTP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// HTTP/1.0
    Http10,
    /// HTTP/1.1
    Http11,
}

impl ProtocolVersion {
    /// Parse the part after `HTTP/` (e.g. `b"1.1"`).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        match bytes {
            b"1.0" => Ok(Self::Http10),
            b"1.1" => Ok(Self::Http11),
            _ => Err(ParseError::InvalidVersion(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
        }
    }

    /// Return the version as a static string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RequestTarget
// ---------------------------------------------------------------------------

/// The request target from the start line (origin-form, absolute-form,
/// authority-form or `*`).
///
/// Validated once when the start line is parsed and never modified
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestTarget(String);

impl RequestTarget {
    /// Validate a request target: non-empty, visible ASCII only.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.is_empty() || !bytes.iter().all(|&b| is_target_byte(b)) {
            return Err(ParseError::InvalidTarget(
                String::from_utf8_lossy(bytes).into_owned(),
            ));
        }
        // Visible ASCII is valid UTF-8.
        Ok(Self(String::from_utf8_lossy(bytes).into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path component (everything before `?` or `#`).
    pub fn path(&self) -> &str {
        let end = self.0.find(['?', '#']).unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// The query component without the leading `?`, if any.
    pub fn query(&self) -> Option<&str> {
        let start = self.0.find('?')? + 1;
        let rest = &self.0[start..];
        Some(rest.split('#').next().unwrap_or(rest))
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for RequestTarget {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for RequestTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A fully parsed HTTP request.
///
/// `B` is the body content produced by the body storage: `Vec<u8>` for
/// [`MemoryStorage`](crate::MemoryStorage), [`FileBody`](crate::FileBody)
/// for [`TempFileStorage`](crate::TempFileStorage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound(serialize = "B: AsRef<[u8]>"))]
pub struct Request<B = Vec<u8>> {
    /// The request method.
    pub method: Method,
    /// The request target.
    pub target: RequestTarget,
    /// The HTTP version.
    pub version: ProtocolVersion,
    /// Header fields in arrival order.
    pub headers: Headers,
    /// The body content, when the message carried one.
    #[serde(serialize_with = "serialize_body")]
    pub body: Option<B>,
}

/// Serialize body bytes as a UTF-8 string (lossy) for JSON output.
fn serialize_body<B: AsRef<[u8]>, S: Serializer>(
    body: &Option<B>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match body {
        None => s.serialize_none(),
        Some(bytes) => s.serialize_str(&String::from_utf8_lossy(bytes.as_ref())),
    }
}

impl<B> Request<B> {
    /// Look up the first header value by name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|h| h.value.as_str())
    }

    /// Return all values for headers matching `name` (case-insensitive).
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.is(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    /// The declared body length, if a well-formed `Content-Length` is present.
    pub fn content_length(&self) -> Option<u64> {
        self.headers.content_length()
    }

    /// Replace the body content, e.g. after reading a file body into memory.
    pub fn map_body<C>(self, f: impl FnOnce(B) -> C) -> Request<C> {
        Request {
            method: self.method,
            target: self.target,
            version: self.version,
            headers: self.headers,
            body: self.body.map(f),
        }
    }
}

impl<B: AsRef<[u8]>> Request<B> {
    /// Return the body as a UTF-8 `&str` if it is valid UTF-8.
    pub fn body_as_str(&self) -> Option<&str> {
        self.body_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Return the body as a lossy UTF-8 string (always succeeds).
    pub fn body_as_lossy_string(&self) -> Option<String> {
        self.body_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Return the raw body bytes.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_ref().map(AsRef::as_ref)
    }
}
