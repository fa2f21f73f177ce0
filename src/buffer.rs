use std::mem;

use crate::body::BodyAccumulator;
use crate::error::ParseError;
use crate::header::{DefaultHeaderFactory, HeaderFactory};
use crate::headers::HeaderBlock;
use crate::sink::{BodySink, BodyStorage, ContentOf, MemoryStorage};
use crate::start_line::StartLine;
use crate::types::Request;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configurable limits for the request buffer.
///
/// All sizes are in bytes unless stated otherwise.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum length of the start line, terminator excluded (default: 8 192).
    pub max_start_line_len: usize,
    /// Maximum length of a single header line, terminator excluded
    /// (default: 8 192).
    pub max_header_line_len: usize,
    /// Maximum number of header fields (default: 128).
    pub max_headers_count: usize,
    /// Maximum body size (default: 10 MiB).
    pub max_body_size: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_start_line_len: 8_192,
            max_header_line_len: 8_192,
            max_headers_count: 128,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse status
// ---------------------------------------------------------------------------

/// Outcome of a successful [`RequestBuffer::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// A complete request is waiting in the buffer; further input is ignored.
    Complete,
    /// More input is needed.
    Incomplete,
}

// ---------------------------------------------------------------------------
// Stage plumbing
// ---------------------------------------------------------------------------

/// Everything a stage needs besides its own data.
pub(crate) struct Context<F, T> {
    pub(crate) config: ParserConfig,
    pub(crate) factory: F,
    pub(crate) storage: T,
}

/// A stage still waiting for input.
pub(crate) enum Stage<S> {
    StartLine(StartLine),
    Headers(HeaderBlock),
    Body(BodyAccumulator<S>),
}

/// Result of handing one chunk to a stage.
pub(crate) enum Step<S: BodySink> {
    NeedMore(Stage<S>),
    Done(Request<S::Content>),
    Failed(ParseError),
}

impl<S: BodySink> Stage<S> {
    pub(crate) fn add<F, T>(self, chunk: &[u8], ctx: &Context<F, T>) -> Step<S>
    where
        F: HeaderFactory,
        T: BodyStorage<Sink = S>,
    {
        match self {
            Self::StartLine(stage) => stage.add(chunk, ctx),
            Self::Headers(stage) => stage.add(chunk, ctx),
            Self::Body(stage) => stage.add(chunk, ctx),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::StartLine(_) => "start-line",
            Self::Headers(_) => "headers",
            Self::Body(_) => "body",
        }
    }
}

enum State<S: BodySink> {
    Active(Stage<S>),
    Done(Request<S::Content>),
    Failed(ParseError),
}

// ---------------------------------------------------------------------------
// RequestBuffer
// ---------------------------------------------------------------------------

/// Drives one request parse across any number of input chunks.
///
/// Each chunk goes to the current stage (start line, header block, body),
/// which hands back its successor. The buffer ends up either holding a
/// finished request or a failure; a failed buffer ignores all further
/// input.
///
/// # Usage
///
/// ```rust
/// use wirefold::{ParseStatus, RequestBuffer};
///
/// let mut buffer = RequestBuffer::new();
///
/// assert_eq!(buffer.feed(b"POST /f HTT").unwrap(), ParseStatus::Incomplete);
/// assert_eq!(buffer.feed(b"P/1.1\nContent-Length: 4\n\nab").unwrap(), ParseStatus::Incomplete);
/// assert_eq!(buffer.feed(b"cd").unwrap(), ParseStatus::Complete);
///
/// let request = buffer.finish().unwrap();
/// assert_eq!(request.body_as_str(), Some("abcd"));
/// ```
pub struct RequestBuffer<F = DefaultHeaderFactory, T = MemoryStorage>
where
    T: BodyStorage,
{
    state: State<T::Sink>,
    ctx: Context<F, T>,
}

impl RequestBuffer {
    /// Create a buffer with default limits, the default header registry and
    /// in-memory bodies.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Create a buffer with custom limits.
    pub fn with_config(config: ParserConfig) -> Self {
        Self::with_parts(config, DefaultHeaderFactory, MemoryStorage)
    }
}

impl Default for RequestBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, T> RequestBuffer<F, T>
where
    F: HeaderFactory,
    T: BodyStorage,
{
    /// Create a buffer with a custom header factory and body storage.
    pub fn with_parts(config: ParserConfig, factory: F, storage: T) -> Self {
        Self {
            state: State::Active(Stage::StartLine(StartLine::new())),
            ctx: Context {
                config,
                factory,
                storage,
            },
        }
    }

    /// Feed one chunk of input.
    ///
    /// Once the buffer is complete, further chunks are ignored and
    /// `Complete` is returned again.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] that failed the parse, on the failing call
    /// and on every call after it.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<ParseStatus, ParseError> {
        let placeholder = State::Failed(ParseError::IncompleteRequest);
        let stage = match mem::replace(&mut self.state, placeholder) {
            State::Active(stage) => stage,
            settled => {
                self.state = settled;
                return self.status();
            }
        };

        self.state = match stage.add(chunk, &self.ctx) {
            Step::NeedMore(next) => State::Active(next),
            Step::Done(request) => {
                tracing::debug!(
                    method = %request.method,
                    target = %request.target,
                    headers = request.headers.len(),
                    body = request.body.is_some(),
                    "request complete"
                );
                State::Done(request)
            }
            Step::Failed(err) => {
                tracing::warn!(error = %err, "request parse failed");
                State::Failed(err)
            }
        };

        self.status()
    }

    /// Fold form of [`feed`](Self::feed): consume the buffer, feed `chunk`,
    /// return the successor.
    ///
    /// ```rust
    /// use wirefold::RequestBuffer;
    ///
    /// let request = ["GET /hello HTTP/1.1\n", "Host: innmind.com\n", "\n"]
    ///     .iter()
    ///     .fold(RequestBuffer::new(), |buffer, chunk| buffer.supply(chunk.as_bytes()))
    ///     .finish()
    ///     .unwrap();
    /// assert_eq!(request.target, "/hello");
    /// ```
    #[must_use]
    pub fn supply(mut self, chunk: &[u8]) -> Self {
        // The outcome is kept in the buffer and surfaces at `finish`.
        let _ = self.feed(chunk);
        self
    }

    /// Returns `true` when a complete request has been parsed.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, State::Done(_))
    }

    /// Returns `true` when the parse has failed.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed(_))
    }

    /// The error that failed the parse, if any.
    pub fn failure(&self) -> Option<&ParseError> {
        match &self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Discard all progress, dropping any half-written body, and start over
    /// with a fresh start-line stage.
    pub fn reset(&mut self) {
        self.state = State::Active(Stage::StartLine(StartLine::new()));
    }

    /// Consume the buffer at end of input and return the parsed request.
    ///
    /// # Errors
    ///
    /// Returns the recorded failure if the parse failed, or
    /// [`ParseError::IncompleteRequest`] if the input ended before the
    /// request was complete.
    pub fn finish(self) -> Result<Request<ContentOf<T>>, ParseError> {
        match self.state {
            State::Done(request) => Ok(request),
            State::Failed(err) => Err(err),
            State::Active(stage) => {
                tracing::debug!(stage = stage.name(), "input ended before request was complete");
                Err(ParseError::IncompleteRequest)
            }
        }
    }

    fn status(&self) -> Result<ParseStatus, ParseError> {
        match &self.state {
            State::Active(_) => Ok(ParseStatus::Incomplete),
            State::Done(_) => Ok(ParseStatus::Complete),
            State::Failed(err) => Err(err.clone()),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> Context<DefaultHeaderFactory, MemoryStorage> {
    Context {
        config: ParserConfig::default(),
        factory: DefaultHeaderFactory,
        storage: MemoryStorage,
    }
}
