use crate::body::BodyAccumulator;
use crate::buffer::{Context, Stage, Step};
use crate::error::ParseError;
use crate::header::{Header, HeaderFactory, Headers};
use crate::line::{is_header_name_byte, split_line, trim_cr};
use crate::sink::BodyStorage;
use crate::start_line::RequestLine;
use crate::types::Request;

/// Start line plus the complete header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Head {
    pub(crate) line: RequestLine,
    pub(crate) headers: Headers,
}

impl Head {
    pub(crate) fn into_request<B>(self, body: Option<B>) -> Request<B> {
        Request {
            method: self.line.method,
            target: self.line.target,
            version: self.line.version,
            headers: self.headers,
            body,
        }
    }
}

/// Accumulating header lines until the blank line.
#[derive(Debug)]
pub(crate) struct HeaderBlock {
    line: RequestLine,
    headers: Headers,
    /// Bytes of the current, not yet terminated, header line.
    buffer: Vec<u8>,
}

impl HeaderBlock {
    pub(crate) fn new(line: RequestLine) -> Self {
        Self {
            line,
            headers: Headers::new(),
            buffer: Vec::new(),
        }
    }

    pub(crate) fn add<F, T>(mut self, chunk: &[u8], ctx: &Context<F, T>) -> Step<T::Sink>
    where
        F: HeaderFactory,
        T: BodyStorage,
    {
        self.buffer.extend_from_slice(chunk);
        let config = &ctx.config;

        // Every complete line already in the buffer is handled before asking
        // for more input.
        let mut consumed = 0;
        while let Some((line, _)) = split_line(&self.buffer[consumed..]) {
            let next = consumed + line.len() + 1;
            let line = trim_cr(line);
            if line.len() > config.max_header_line_len {
                return Step::Failed(ParseError::HeaderTooLarge);
            }

            if line.is_empty() {
                let rest = self.buffer.split_off(next);
                return self.end_of_headers(rest, ctx);
            }

            match parse_header_line(line, &ctx.factory) {
                Ok(header) => self.headers.push(header),
                Err(err) => return Step::Failed(err),
            }
            if self.headers.len() > config.max_headers_count {
                return Step::Failed(ParseError::TooManyHeaders);
            }
            consumed = next;
        }

        self.buffer.drain(..consumed);
        // The unterminated tail may still end in the line's `\r`.
        if self.buffer.len() > config.max_header_line_len + 1 {
            return Step::Failed(ParseError::HeaderTooLarge);
        }
        Step::NeedMore(Stage::Headers(self))
    }

    /// The blank line has been read; `rest` is whatever followed it.
    fn end_of_headers<F, T>(self, rest: Vec<u8>, ctx: &Context<F, T>) -> Step<T::Sink>
    where
        F: HeaderFactory,
        T: BodyStorage,
    {
        let declared = self.headers.content_length();
        if declared.is_none() && self.headers.get("content-length").is_some() {
            tracing::warn!("unparsable Content-Length treated as absent");
        }

        let expects_body = !rest.is_empty()
            || declared.is_some_and(|length| length > 0)
            || (declared.is_none() && !self.line.method.is_bodiless());

        let head = Head {
            line: self.line,
            headers: self.headers,
        };

        if !expects_body {
            tracing::debug!(headers = head.headers.len(), "headers complete, no body");
            return Step::Done(head.into_request(None));
        }

        if declared.is_some_and(|length| length > ctx.config.max_body_size) {
            return Step::Failed(ParseError::BodyTooLarge);
        }

        let sink = match ctx.storage.create() {
            Ok(sink) => sink,
            Err(err) => return Step::Failed(ParseError::storage(err)),
        };
        tracing::debug!(
            headers = head.headers.len(),
            content_length = ?declared,
            buffered = rest.len(),
            "headers complete, reading body"
        );

        let body = BodyAccumulator::new(head, declared, sink);
        if rest.is_empty() {
            Step::NeedMore(Stage::Body(body))
        } else {
            body.add(&rest, ctx)
        }
    }
}

/// Parse `name: value` (terminator already removed).
///
/// Exactly one space must follow the colon; everything after it is the
/// value, untrimmed.
pub(crate) fn parse_header_line<F: HeaderFactory>(
    line: &[u8],
    factory: &F,
) -> Result<Header, ParseError> {
    let malformed = || ParseError::MalformedHeader(String::from_utf8_lossy(line).into_owned());

    let colon = memchr::memchr(b':', line).ok_or_else(malformed)?;
    let name = &line[..colon];
    if name.is_empty() || !name.iter().all(|&b| is_header_name_byte(b)) {
        return Err(malformed());
    }
    let value = line[colon + 1..].strip_prefix(b" ").ok_or_else(malformed)?;

    let name = String::from_utf8_lossy(name);
    let value = String::from_utf8_lossy(value);
    factory
        .create(&name, &value)
        .ok_or_else(|| ParseError::HeaderRejected(name.into_owned()))
}
