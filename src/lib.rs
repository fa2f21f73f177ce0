//! # wirefold
//!
//! An **incremental HTTP/1.x request parser** that folds a byte stream,
//! arriving in chunks of any size, into a structured request.
//!
//! Parsing runs through three stages (start line, header block, body), each
//! consuming what it needs from a chunk and handing the rest to the next.
//! Lines may be split anywhere across chunks and may end in `\n` or `\r\n`.
//! Bodies are streamed into a [`BodySink`] as they arrive, bounded either by
//! `Content-Length` or, when no length is declared, by a trailing blank line
//! (`\n\n` or `\r\n\r\n`).
//!
//! ## Quick start: one-shot parsing
//!
//! ```rust
//! use wirefold::{Method, parse_request};
//!
//! let raw = b"GET /hello HTTP/1.1\nHost: innmind.com\n\n";
//! let request = parse_request(raw).expect("valid request");
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.target, "/hello");
//! assert!(request.body.is_none());
//! ```
//!
//! ## Quick start: chunked input
//!
//! ```rust
//! use wirefold::parse_chunks;
//!
//! let request = parse_chunks(["POST /f HTT", "P/1.1\nConte", "nt-Length: 4\n\nab", "cd"])
//!     .expect("valid request");
//! assert_eq!(request.body_as_str(), Some("abcd"));
//! ```
//!
//! ## Spooling bodies to disk
//!
//! ```rust
//! use std::io::Read;
//! use wirefold::{DefaultHeaderFactory, ParserConfig, RequestBuffer, TempFileStorage};
//!
//! let mut buffer = RequestBuffer::with_parts(
//!     ParserConfig::default(),
//!     DefaultHeaderFactory,
//!     TempFileStorage::new(),
//! );
//! buffer.feed(b"POST /upload HTTP/1.1\r\n\r\nfile contents\r\n\r\n").unwrap();
//!
//! let request = buffer.finish().unwrap();
//! let mut body = String::new();
//! request.body.unwrap().read_to_string(&mut body).unwrap();
//! assert_eq!(body, "file contents");
//! ```

mod body;
mod buffer;
mod error;
mod header;
mod headers;
mod line;
mod output;
mod sink;
mod source;
mod start_line;
mod types;

// Re-export public API.
pub use buffer::{ParseStatus, ParserConfig, RequestBuffer};
pub use error::ParseError;
pub use header::{DefaultHeaderFactory, Header, HeaderFactory, HeaderKind, Headers};
pub use output::{format_debug, format_headers_only, format_json};
pub use sink::{
    BodySink, BodyStorage, ContentOf, FileBody, FileSink, MemorySink, MemoryStorage,
    TempFileStorage,
};
pub use source::{Chunks, chunks};
pub use types::{Method, ProtocolVersion, Request, RequestTarget};

/// Parse a **complete** HTTP request held in one byte slice.
///
/// This is a convenience wrapper around [`RequestBuffer`]. For incremental /
/// streaming use-cases, create a `RequestBuffer` directly.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed or incomplete.
pub fn parse_request(data: &[u8]) -> Result<Request, ParseError> {
    parse_request_with_config(data, ParserConfig::default())
}

/// Parse a **complete** HTTP request using custom [`ParserConfig`] limits.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed, incomplete, or
/// exceeds the configured limits.
pub fn parse_request_with_config(
    data: &[u8],
    config: ParserConfig,
) -> Result<Request, ParseError> {
    RequestBuffer::with_config(config).supply(data).finish()
}

/// Parse a request delivered as a sequence of chunks: the left fold of
/// [`RequestBuffer::supply`] over `chunks`, then [`RequestBuffer::finish`].
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed or ends before the
/// request is complete.
pub fn parse_chunks<I>(chunks: I) -> Result<Request, ParseError>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    chunks
        .into_iter()
        .fold(RequestBuffer::new(), |buffer, chunk| buffer.supply(chunk.as_ref()))
        .finish()
}

/// Parse a request pulled from `reader` in chunks of `chunk_size` bytes.
///
/// # Errors
///
/// Returns [`ParseError::Read`] if reading fails, otherwise as
/// [`parse_chunks`].
pub fn parse_reader<R: std::io::Read>(reader: R, chunk_size: usize) -> Result<Request, ParseError> {
    RequestBuffer::new().read_from(reader, chunk_size)
}
