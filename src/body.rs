//! Body accumulation.
//!
//! Two strategies, fixed when the header block ends:
//!
//! * **bounded**: a well-formed `Content-Length` is present. Exactly that
//!   many bytes are written to the sink; anything after them is ignored.
//! * **sentinel**: no usable `Content-Length`. The body runs until the first
//!   `\n\n` or `\r\n\r\n`. Bytes that could be the start of a sentinel split
//!   across chunks are held back (at most 3) until the next chunk decides
//!   them, so the sink never sees any part of the sentinel.

use memchr::memmem;

use crate::buffer::{Context, Stage, Step};
use crate::error::ParseError;
use crate::header::HeaderFactory;
use crate::headers::Head;
use crate::sink::{BodySink, BodyStorage};

const LF_SENTINEL: &[u8] = b"\n\n";
const CRLF_SENTINEL: &[u8] = b"\r\n\r\n";

/// Proper prefixes of either sentinel, longest first.
const SENTINEL_PREFIXES: [&[u8]; 4] = [b"\r\n\r", b"\r\n", b"\r", b"\n"];

enum Strategy {
    Bounded { length: u64 },
    Sentinel { held: Vec<u8> },
}

pub(crate) struct BodyAccumulator<S> {
    head: Head,
    sink: S,
    strategy: Strategy,
    /// Bytes handed to the sink so far.
    written: u64,
}

impl<S: BodySink> BodyAccumulator<S> {
    pub(crate) fn new(head: Head, content_length: Option<u64>, sink: S) -> Self {
        let strategy = match content_length {
            Some(length) => Strategy::Bounded { length },
            None => Strategy::Sentinel { held: Vec::new() },
        };
        Self {
            head,
            sink,
            strategy,
            written: 0,
        }
    }

    pub(crate) fn add<F, T>(self, chunk: &[u8], ctx: &Context<F, T>) -> Step<S>
    where
        F: HeaderFactory,
        T: BodyStorage<Sink = S>,
    {
        if let Strategy::Bounded { length } = self.strategy {
            return self.accumulate_up_to(chunk, length);
        }
        self.accumulate_until_sentinel(chunk, ctx.config.max_body_size)
    }

    fn accumulate_up_to(mut self, chunk: &[u8], length: u64) -> Step<S> {
        let remaining = length - self.written;
        let take = usize::try_from(remaining).map_or(chunk.len(), |r| r.min(chunk.len()));

        if let Err(err) = self.write(&chunk[..take]) {
            return Step::Failed(err);
        }
        if take < chunk.len() {
            tracing::trace!(
                discarded = chunk.len() - take,
                "ignoring bytes past declared Content-Length"
            );
        }

        if self.written == length {
            self.complete()
        } else {
            tracing::trace!(written = self.written, length, "bounded body in progress");
            Step::NeedMore(Stage::Body(self))
        }
    }

    fn accumulate_until_sentinel(mut self, chunk: &[u8], max_body_size: u64) -> Step<S> {
        let mut window = match &mut self.strategy {
            Strategy::Sentinel { held } => std::mem::take(held),
            Strategy::Bounded { .. } => Vec::new(),
        };
        window.extend_from_slice(chunk);

        if let Some((at, len)) = find_sentinel(&window) {
            if self.written + at as u64 > max_body_size {
                return Step::Failed(ParseError::BodyTooLarge);
            }
            if let Err(err) = self.write(&window[..at]) {
                return Step::Failed(err);
            }
            let trailing = window.len() - at - len;
            if trailing > 0 {
                tracing::trace!(discarded = trailing, "ignoring bytes past body sentinel");
            }
            return self.complete();
        }

        let ready = window.len() - pending_sentinel_prefix(&window);
        if self.written + ready as u64 > max_body_size {
            return Step::Failed(ParseError::BodyTooLarge);
        }
        if let Err(err) = self.write(&window[..ready]) {
            return Step::Failed(err);
        }

        let held = window[ready..].to_vec();
        tracing::trace!(written = self.written, held = held.len(), "scanning for body sentinel");
        self.strategy = Strategy::Sentinel { held };
        Step::NeedMore(Stage::Body(self))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.sink.write(bytes).map_err(ParseError::storage)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn complete(self) -> Step<S> {
        let written = self.written;
        match self.sink.finalize() {
            Ok(content) => {
                tracing::debug!(bytes = written, "body complete");
                Step::Done(self.head.into_request(Some(content)))
            }
            Err(err) => Step::Failed(ParseError::storage(err)),
        }
    }
}

/// Earliest sentinel in `window`, as `(position, sentinel length)`.
fn find_sentinel(window: &[u8]) -> Option<(usize, usize)> {
    let lf = memmem::find(window, LF_SENTINEL).map(|at| (at, LF_SENTINEL.len()));
    let crlf = memmem::find(window, CRLF_SENTINEL).map(|at| (at, CRLF_SENTINEL.len()));
    lf.into_iter().chain(crlf).min_by_key(|&(at, _)| at)
}

/// Length of the longest suffix of `window` that could begin a sentinel.
fn pending_sentinel_prefix(window: &[u8]) -> usize {
    SENTINEL_PREFIXES
        .iter()
        .find(|prefix| window.ends_with(prefix))
        .map_or(0, |prefix| prefix.len())
}
