use crate::buffer::{Context, Stage, Step};
use crate::error::ParseError;
use crate::header::HeaderFactory;
use crate::headers::HeaderBlock;
use crate::line::{is_method_byte, split_line, trim_cr};
use crate::sink::BodyStorage;
use crate::types::{Method, ProtocolVersion, RequestTarget};

/// The three fields fixed by the start line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestLine {
    pub(crate) method: Method,
    pub(crate) target: RequestTarget,
    pub(crate) version: ProtocolVersion,
}

/// Waiting for the first `\n`.
#[derive(Debug, Default)]
pub(crate) struct StartLine {
    buffer: Vec<u8>,
}

impl StartLine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add<F, T>(mut self, chunk: &[u8], ctx: &Context<F, T>) -> Step<T::Sink>
    where
        F: HeaderFactory,
        T: BodyStorage,
    {
        self.buffer.extend_from_slice(chunk);
        let max = ctx.config.max_start_line_len;

        if let Some((line, rest)) = split_line(&self.buffer) {
            let line = trim_cr(line);
            if line.len() > max {
                return Step::Failed(ParseError::StartLineTooLong);
            }
            let request_line = match parse_start_line(line) {
                Ok(request_line) => request_line,
                Err(err) => return Step::Failed(err),
            };
            tracing::debug!(
                method = %request_line.method,
                target = %request_line.target,
                version = %request_line.version,
                "start line parsed"
            );

            let headers = HeaderBlock::new(request_line);
            // An empty remainder must not reach the header block: it would
            // read as the blank line that ends the headers.
            return if rest.is_empty() {
                Step::NeedMore(Stage::Headers(headers))
            } else {
                headers.add(rest, ctx)
            };
        }

        // Without a terminator the buffer may still end in the line's `\r`.
        if self.buffer.len() > max + 1 {
            return Step::Failed(ParseError::StartLineTooLong);
        }
        Step::NeedMore(Stage::StartLine(self))
    }
}

/// Parse `METHOD SP target SP HTTP/1.(0|1)` (terminator already removed).
///
/// The target is everything between the first space and the last
/// `" HTTP/"`, mirroring the anchored grammar
/// `^[A-Z]+ .+ HTTP/1(\.[01])?$`.
pub(crate) fn parse_start_line(line: &[u8]) -> Result<RequestLine, ParseError> {
    let malformed = || ParseError::MalformedStartLine(String::from_utf8_lossy(line).into_owned());

    let space = memchr::memchr(b' ', line).ok_or_else(malformed)?;
    let (method, rest) = (&line[..space], &line[space + 1..]);
    if method.is_empty() || !method.iter().all(|&b| is_method_byte(b)) {
        return Err(malformed());
    }

    let marker = memchr::memmem::rfind(rest, b" HTTP/").ok_or_else(malformed)?;
    let (target, version) = (&rest[..marker], &rest[marker + b" HTTP/".len()..]);
    if target.is_empty() {
        return Err(malformed());
    }

    Ok(RequestLine {
        method: Method::from_bytes(method)?,
        target: RequestTarget::parse(target)?,
        version: ProtocolVersion::from_bytes(version)?,
    })
}
